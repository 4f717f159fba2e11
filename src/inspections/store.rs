use crate::inspections::models::{InspectionPlan, InspectionRecord, InspectionStatus};
use crate::inspections::scoring::Flag;
use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

pub struct InspectionStore {
    db_path: String,
}

impl InspectionStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS inspection_plans (
                id TEXT PRIMARY KEY,
                minesite_id TEXT NOT NULL,
                inspector_id TEXT NOT NULL,
                status TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS inspection_records (
                id TEXT PRIMARY KEY,
                plan_id TEXT NOT NULL,
                category_id TEXT NOT NULL,
                title TEXT NOT NULL,
                pseudo_name TEXT NOT NULL,
                box_value TEXT NOT NULL,
                flag_value TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (plan_id) REFERENCES inspection_plans (id)
            )",
            [],
        )?;
        Ok(())
    }

    pub fn insert_plan(
        &self,
        minesite_id: Uuid,
        inspector_id: Uuid,
        start_date: &str,
        end_date: &str,
    ) -> Result<InspectionPlan> {
        let plan = InspectionPlan {
            id: Uuid::new_v4(),
            minesite_id,
            inspector_id,
            status: InspectionStatus::Submitted,
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO inspection_plans
             (id, minesite_id, inspector_id, status, start_date, end_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                plan.id.to_string(),
                plan.minesite_id.to_string(),
                plan.inspector_id.to_string(),
                plan.status.as_str(),
                plan.start_date,
                plan.end_date,
                plan.created_at,
            ],
        )?;
        Ok(plan)
    }

    pub fn insert_record(
        &self,
        plan_id: Uuid,
        category_id: Uuid,
        title: &str,
        pseudo_name: &str,
        box_value: &str,
        flag_value: Flag,
    ) -> Result<InspectionRecord> {
        let record = InspectionRecord {
            id: Uuid::new_v4(),
            plan_id,
            category_id,
            title: title.to_string(),
            pseudo_name: pseudo_name.to_string(),
            box_value: box_value.to_string(),
            flag_value,
            created_at: Utc::now().to_rfc3339(),
        };
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO inspection_records
             (id, plan_id, category_id, title, pseudo_name, box_value, flag_value, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id.to_string(),
                record.plan_id.to_string(),
                record.category_id.to_string(),
                record.title,
                record.pseudo_name,
                record.box_value,
                record.flag_value.as_str(),
                record.created_at,
            ],
        )?;
        Ok(record)
    }

    pub fn find_plan(&self, id: Uuid) -> Result<Option<InspectionPlan>> {
        let conn = Connection::open(&self.db_path)?;
        let plan = conn
            .query_row(
                "SELECT id, minesite_id, inspector_id, status, start_date, end_date, created_at
                 FROM inspection_plans WHERE id = ?1",
                params![id.to_string()],
                map_plan_row,
            )
            .optional()?;
        Ok(plan)
    }

    pub fn list_plans_by_status(&self, status: InspectionStatus) -> Result<Vec<InspectionPlan>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT id, minesite_id, inspector_id, status, start_date, end_date, created_at
             FROM inspection_plans WHERE status = ?1 ORDER BY created_at DESC",
        )?;
        let plans = stmt
            .query_map(params![status.as_str()], map_plan_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(plans)
    }

    pub fn set_plan_status(&self, id: Uuid, status: InspectionStatus) -> Result<usize> {
        let conn = Connection::open(&self.db_path)?;
        Ok(conn.execute(
            "UPDATE inspection_plans SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id.to_string()],
        )?)
    }

    pub fn records_for_plan(&self, plan_id: Uuid) -> Result<Vec<InspectionRecord>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT id, plan_id, category_id, title, pseudo_name, box_value, flag_value, created_at
             FROM inspection_records WHERE plan_id = ?1 ORDER BY created_at",
        )?;
        let records = stmt
            .query_map(params![plan_id.to_string()], map_record_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

fn map_plan_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InspectionPlan> {
    let id: String = row.get(0)?;
    let minesite_id: String = row.get(1)?;
    let inspector_id: String = row.get(2)?;
    let status: String = row.get(3)?;
    Ok(InspectionPlan {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        minesite_id: Uuid::parse_str(&minesite_id).unwrap_or_default(),
        inspector_id: Uuid::parse_str(&inspector_id).unwrap_or_default(),
        status: InspectionStatus::parse(&status).unwrap_or(InspectionStatus::Submitted),
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn map_record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InspectionRecord> {
    let id: String = row.get(0)?;
    let plan_id: String = row.get(1)?;
    let category_id: String = row.get(2)?;
    let flag_value: String = row.get(6)?;
    Ok(InspectionRecord {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        plan_id: Uuid::parse_str(&plan_id).unwrap_or_default(),
        category_id: Uuid::parse_str(&category_id).unwrap_or_default(),
        title: row.get(3)?,
        pseudo_name: row.get(4)?,
        box_value: row.get(5)?,
        flag_value: Flag::parse(&flag_value).unwrap_or(Flag::No),
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn store() -> (InspectionStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = InspectionStore::new(temp_file.path().to_str().unwrap()).unwrap();
        (store, temp_file)
    }

    #[test]
    fn test_plan_starts_submitted() {
        let (store, _guard) = store();
        let plan = store
            .insert_plan(Uuid::new_v4(), Uuid::new_v4(), "2026-09-01", "2026-09-05")
            .unwrap();
        assert_eq!(plan.status, InspectionStatus::Submitted);
        assert_eq!(store.find_plan(plan.id).unwrap().unwrap(), plan);
    }

    #[test]
    fn test_status_transition_and_listing() {
        let (store, _guard) = store();
        let plan = store
            .insert_plan(Uuid::new_v4(), Uuid::new_v4(), "2026-09-01", "2026-09-05")
            .unwrap();

        assert_eq!(
            store
                .list_plans_by_status(InspectionStatus::Submitted)
                .unwrap()
                .len(),
            1
        );
        assert!(store
            .list_plans_by_status(InspectionStatus::Reviewed)
            .unwrap()
            .is_empty());

        assert_eq!(
            store
                .set_plan_status(plan.id, InspectionStatus::Reviewed)
                .unwrap(),
            1
        );
        assert_eq!(
            store.find_plan(plan.id).unwrap().unwrap().status,
            InspectionStatus::Reviewed
        );
    }

    #[test]
    fn test_records_attach_to_plan() {
        let (store, _guard) = store();
        let plan = store
            .insert_plan(Uuid::new_v4(), Uuid::new_v4(), "2026-09-01", "2026-09-05")
            .unwrap();

        let record = store
            .insert_record(
                plan.id,
                Uuid::new_v4(),
                "Ventilation shaft",
                "vent-a",
                "yes",
                Flag::Red,
            )
            .unwrap();
        let records = store.records_for_plan(plan.id).unwrap();
        assert_eq!(records, vec![record]);
        assert!(store.records_for_plan(Uuid::new_v4()).unwrap().is_empty());
    }
}
