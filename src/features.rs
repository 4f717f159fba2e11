//! Features
//! Mission: Named feature toggles/capabilities exposed to clients

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
pub struct Feature {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFeatureRequest {
    pub name: String,
}

pub struct FeatureStore {
    db_path: String,
}

impl FeatureStore {
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
            "CREATE TABLE IF NOT EXISTS features (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn insert(&self, name: &str) -> Result<Feature> {
        let feature = Feature {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO features (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![feature.id.to_string(), feature.name, feature.created_at],
        )?;
        Ok(feature)
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Feature>> {
        let conn = Connection::open(&self.db_path)?;
        let feature = conn
            .query_row(
                "SELECT id, name, created_at FROM features WHERE name = ?1",
                params![name],
                map_row,
            )
            .optional()?;
        Ok(feature)
    }

    pub fn list(&self) -> Result<Vec<Feature>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare("SELECT id, name, created_at FROM features ORDER BY name")?;
        let features = stmt.query_map([], map_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(features)
    }

    pub fn delete(&self, id: Uuid) -> Result<usize> {
        let conn = Connection::open(&self.db_path)?;
        Ok(conn.execute("DELETE FROM features WHERE id = ?1", params![id.to_string()])?)
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Feature> {
    let id: String = row.get(0)?;
    Ok(Feature {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

/// POST /api/features (ADMIN)
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateFeatureRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation(vec![
            "name must not be empty".to_string(),
        ]));
    }
    if state.features.find_by_name(&payload.name)?.is_some() {
        return Err(ApiError::AlreadyExists(
            "The feature with the provided name already exists".to_string(),
        ));
    }
    let feature = state.features.insert(&payload.name)?;
    Ok(ApiResponse::ok("The feature was created successfully", feature))
}

/// GET /api/features
pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse>, ApiError> {
    let features = state.features.list()?;
    Ok(ApiResponse::ok(
        "All features were retrieved successfully",
        features,
    ))
}

/// DELETE /api/features/:id (ADMIN)
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse>, ApiError> {
    if state.features.delete(id)? == 0 {
        return Err(ApiError::NotFound(
            "The feature with the provided id is not found".to_string(),
        ));
    }
    Ok(ApiResponse::message("The feature was deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_feature_crud() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = FeatureStore::new(temp_file.path().to_str().unwrap()).unwrap();

        let feature = store.insert("offline-sync").unwrap();
        assert_eq!(store.find_by_name("offline-sync").unwrap().unwrap(), feature);
        assert!(store.insert("offline-sync").is_err());

        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.delete(feature.id).unwrap(), 1);
        assert_eq!(store.delete(feature.id).unwrap(), 0);
    }
}
