//! Inspection Categories
//! Mission: Category groupings under a section, holding inspection records

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
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub section_id: Uuid,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub section_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RenameCategoryRequest {
    pub name: String,
}

pub struct CategoryStore {
    db_path: String,
}

impl CategoryStore {
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
            "CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                section_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (section_id) REFERENCES sections(id)
            )",
            [],
        )?;
        Ok(())
    }

    pub fn insert(&self, name: &str, section_id: Uuid) -> Result<Category> {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            section_id,
            created_at: Utc::now().to_rfc3339(),
        };
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO categories (id, name, section_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                category.id.to_string(),
                category.name,
                category.section_id.to_string(),
                category.created_at,
            ],
        )?;
        Ok(category)
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        let conn = Connection::open(&self.db_path)?;
        let category = conn
            .query_row(
                "SELECT id, name, section_id, created_at FROM categories WHERE id = ?1",
                params![id.to_string()],
                map_row,
            )
            .optional()?;
        Ok(category)
    }

    pub fn list_by_section(&self, section_id: Uuid) -> Result<Vec<Category>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT id, name, section_id, created_at FROM categories
             WHERE section_id = ?1 ORDER BY name",
        )?;
        let categories = stmt
            .query_map(params![section_id.to_string()], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    pub fn rename(&self, id: Uuid, name: &str) -> Result<usize> {
        let conn = Connection::open(&self.db_path)?;
        Ok(conn.execute(
            "UPDATE categories SET name = ?1 WHERE id = ?2",
            params![name, id.to_string()],
        )?)
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    let id: String = row.get(0)?;
    let section_id: String = row.get(2)?;
    Ok(Category {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        name: row.get(1)?,
        section_id: Uuid::parse_str(&section_id).unwrap_or_default(),
        created_at: row.get(3)?,
    })
}

/// POST /api/categories (ADMIN)
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation(vec![
            "name must not be empty".to_string(),
        ]));
    }
    if state.sections.find_by_id(payload.section_id)?.is_none() {
        return Err(ApiError::NotFound(
            "The section with the provided id is not found".to_string(),
        ));
    }
    let category = state.categories.insert(&payload.name, payload.section_id)?;
    Ok(ApiResponse::ok(
        "The category was created successfully",
        category,
    ))
}

/// PATCH /api/categories/:id (ADMIN)
pub async fn rename(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RenameCategoryRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation(vec![
            "name must not be empty".to_string(),
        ]));
    }
    if state.categories.rename(id, &payload.name)? == 0 {
        return Err(ApiError::NotFound(
            "The category with the provided id is not found".to_string(),
        ));
    }
    let category = state.categories.find_by_id(id)?;
    Ok(ApiResponse::ok(
        "The category was updated successfully",
        category,
    ))
}

/// GET /api/categories/section/:section_id
pub async fn list_by_section(
    State(state): State<AppState>,
    Path(section_id): Path<Uuid>,
) -> Result<Json<ApiResponse>, ApiError> {
    if state.sections.find_by_id(section_id)?.is_none() {
        return Err(ApiError::NotFound(
            "The section with the provided id is not found".to_string(),
        ));
    }
    let categories = state.categories.list_by_section(section_id)?;
    Ok(ApiResponse::ok(
        "All categories were retrieved successfully",
        categories,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::{FlagStandard, SectionStore};
    use tempfile::NamedTempFile;

    // Categories reference sections, so the fixture seeds real section rows.
    fn create_test_store() -> (CategoryStore, SectionStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();
        let sections = SectionStore::new(path).unwrap();
        let store = CategoryStore::new(path).unwrap();
        (store, sections, temp_file)
    }

    #[test]
    fn test_insert_and_list_by_section() {
        let (store, sections, _temp) = create_test_store();
        let section = sections.insert("Labor", FlagStandard::Red).unwrap();
        let other = sections.insert("Environment", FlagStandard::Yellow).unwrap();

        let a = store.insert("Child labor", section.id).unwrap();
        let b = store.insert("Armed groups", section.id).unwrap();
        store.insert("Sampling", other.id).unwrap();

        let listed = store.list_by_section(section.id).unwrap();
        assert_eq!(listed, vec![b, a]);
    }

    #[test]
    fn test_find_missing_is_none() {
        let (store, _sections, _temp) = create_test_store();
        assert!(store.find_by_id(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_rename() {
        let (store, sections, _temp) = create_test_store();
        let section = sections.insert("Health", FlagStandard::Yellow).unwrap();
        let category = store.insert("PPE", section.id).unwrap();
        assert_eq!(store.rename(category.id, "PPE available").unwrap(), 1);
        assert_eq!(
            store.find_by_id(category.id).unwrap().unwrap().name,
            "PPE available"
        );
    }
}
