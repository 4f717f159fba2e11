//! Minesites
//! Mission: Registry of mine sites with unique site codes

use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MineSite {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub province: String,
    pub district: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateMineSiteRequest {
    pub name: String,
    pub code: String,
    pub province: String,
    pub district: String,
}

impl CreateMineSiteRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("name", &self.name),
            ("code", &self.code),
            ("province", &self.province),
            ("district", &self.district),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{field} must not be empty"));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

pub struct MinesiteStore {
    db_path: String,
}

impl MinesiteStore {
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
            "CREATE TABLE IF NOT EXISTS minesites (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                code TEXT UNIQUE NOT NULL,
                province TEXT NOT NULL,
                district TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'ACTIVE',
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn insert(&self, dto: &CreateMineSiteRequest) -> Result<MineSite> {
        let site = MineSite {
            id: Uuid::new_v4(),
            name: dto.name.clone(),
            code: dto.code.clone(),
            province: dto.province.clone(),
            district: dto.district.clone(),
            status: "ACTIVE".to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO minesites (id, name, code, province, district, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                site.id.to_string(),
                site.name,
                site.code,
                site.province,
                site.district,
                site.status,
                site.created_at,
            ],
        )?;
        Ok(site)
    }

    pub fn update(&self, id: Uuid, dto: &CreateMineSiteRequest) -> Result<usize> {
        let conn = Connection::open(&self.db_path)?;
        let changed = conn.execute(
            "UPDATE minesites SET name = ?1, code = ?2, province = ?3, district = ?4 WHERE id = ?5",
            params![dto.name, dto.code, dto.province, dto.district, id.to_string()],
        )?;
        Ok(changed)
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<MineSite>> {
        let conn = Connection::open(&self.db_path)?;
        let site = conn
            .query_row(
                "SELECT id, name, code, province, district, status, created_at
                 FROM minesites WHERE id = ?1",
                params![id.to_string()],
                map_row,
            )
            .optional()?;
        Ok(site)
    }

    pub fn find_by_code(&self, code: &str) -> Result<Option<MineSite>> {
        let conn = Connection::open(&self.db_path)?;
        let site = conn
            .query_row(
                "SELECT id, name, code, province, district, status, created_at
                 FROM minesites WHERE code = ?1",
                params![code],
                map_row,
            )
            .optional()?;
        Ok(site)
    }

    pub fn list(&self) -> Result<Vec<MineSite>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT id, name, code, province, district, status, created_at
             FROM minesites ORDER BY name",
        )?;
        let sites = stmt.query_map([], map_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    pub fn exists_by_code(&self, code: &str) -> Result<bool> {
        Ok(self.find_by_code(code)?.is_some())
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MineSite> {
    let id: String = row.get(0)?;
    Ok(MineSite {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        name: row.get(1)?,
        code: row.get(2)?,
        province: row.get(3)?,
        district: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// POST /api/minesites (ADMIN)
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateMineSiteRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    payload.validate().map_err(ApiError::Validation)?;
    if state.minesites.exists_by_code(&payload.code)? {
        return Err(ApiError::AlreadyExists(
            "The minesite with the provided code is already registered".to_string(),
        ));
    }
    let site = state.minesites.insert(&payload)?;
    info!(code = %site.code, "minesite created");
    Ok(ApiResponse::ok("The minesite was created successfully", site))
}

/// PUT /api/minesites/:id (ADMIN)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateMineSiteRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    payload.validate().map_err(ApiError::Validation)?;
    // The code stays unique across sites other than the one being updated.
    if let Some(holder) = state.minesites.find_by_code(&payload.code)? {
        if holder.id != id {
            return Err(ApiError::AlreadyExists(
                "The minesite with the provided code is already registered".to_string(),
            ));
        }
    }
    if state.minesites.update(id, &payload)? == 0 {
        return Err(ApiError::NotFound(
            "The minesite with the provided id is not found".to_string(),
        ));
    }
    let site = state.minesites.find_by_id(id)?;
    Ok(ApiResponse::ok("The minesite was updated successfully", site))
}

/// GET /api/minesites/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse>, ApiError> {
    let site = state.minesites.find_by_id(id)?.ok_or_else(|| {
        ApiError::NotFound("The minesite with the provided id is not found".to_string())
    })?;
    Ok(ApiResponse::ok("The minesite was retrieved successfully", site))
}

/// GET /api/minesites/code/:code
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let site = state.minesites.find_by_code(&code)?.ok_or_else(|| {
        ApiError::NotFound("The minesite with the provided code is not found".to_string())
    })?;
    Ok(ApiResponse::ok("The minesite was retrieved successfully", site))
}

/// GET /api/minesites
pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse>, ApiError> {
    let sites = state.minesites.list()?;
    Ok(ApiResponse::ok(
        "All minesites were retrieved successfully",
        sites,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (MinesiteStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = MinesiteStore::new(temp_file.path().to_str().unwrap()).unwrap();
        (store, temp_file)
    }

    fn request(code: &str) -> CreateMineSiteRequest {
        CreateMineSiteRequest {
            name: "Rutongo".to_string(),
            code: code.to_string(),
            province: "Kigali".to_string(),
            district: "Rulindo".to_string(),
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let (store, _temp) = create_test_store();
        let site = store.insert(&request("MS-001")).unwrap();

        assert_eq!(store.find_by_id(site.id).unwrap().unwrap(), site);
        assert_eq!(store.find_by_code("MS-001").unwrap().unwrap(), site);
        assert!(store.find_by_code("MS-404").unwrap().is_none());
        assert!(store.exists_by_code("MS-001").unwrap());
    }

    #[test]
    fn test_duplicate_code_rejected_by_schema() {
        let (store, _temp) = create_test_store();
        store.insert(&request("MS-001")).unwrap();
        assert!(store.insert(&request("MS-001")).is_err());
    }

    #[test]
    fn test_update_missing_site_changes_nothing() {
        let (store, _temp) = create_test_store();
        assert_eq!(store.update(Uuid::new_v4(), &request("MS-001")).unwrap(), 0);
    }

    #[test]
    fn test_update_overwrites_fields() {
        let (store, _temp) = create_test_store();
        let site = store.insert(&request("MS-001")).unwrap();

        let mut dto = request("MS-002");
        dto.name = "Nyakabingo".to_string();
        assert_eq!(store.update(site.id, &dto).unwrap(), 1);

        let updated = store.find_by_id(site.id).unwrap().unwrap();
        assert_eq!(updated.code, "MS-002");
        assert_eq!(updated.name, "Nyakabingo");
    }

    #[test]
    fn test_validation_rejects_blank_fields() {
        let mut dto = request("MS-001");
        dto.province = "  ".to_string();
        dto.name = String::new();
        assert_eq!(dto.validate().unwrap_err().len(), 2);
    }

    #[tokio::test]
    async fn test_update_rejects_code_taken_by_another_site() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = crate::config::AppConfig::for_tests(temp_file.path().to_str().unwrap());
        let state = crate::state::AppState::new(&config).unwrap();

        let site = state.minesites.insert(&request("MS-001")).unwrap();
        state.minesites.insert(&request("MS-002")).unwrap();

        let claimed = update(
            State(state.clone()),
            Path(site.id),
            Json(request("MS-002")),
        )
        .await;
        assert!(matches!(claimed, Err(ApiError::AlreadyExists(_))));

        // Keeping its own code is not a collision.
        let mut dto = request("MS-001");
        dto.district = "Gakenke".to_string();
        update(State(state), Path(site.id), Json(dto)).await.unwrap();
    }
}
