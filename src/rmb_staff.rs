//! RMB Staff
//! Mission: Regulatory-board staff registry

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
pub struct RmbStaff {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub national_id: String,
    pub profile_id: Option<Uuid>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRmbStaffRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub national_id: String,
}

impl CreateRmbStaffRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.first_name.trim().is_empty() {
            errors.push("first_name must not be empty".to_string());
        }
        if self.last_name.trim().is_empty() {
            errors.push("last_name must not be empty".to_string());
        }
        if !crate::auth::models::is_valid_email(&self.email) {
            errors.push("email must be a valid email address".to_string());
        }
        if self.national_id.trim().is_empty() {
            errors.push("national_id must not be empty".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

pub struct RmbStaffStore {
    db_path: String,
}

impl RmbStaffStore {
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
            "CREATE TABLE IF NOT EXISTS rmb_staff (
                id TEXT PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                phone_number TEXT NOT NULL,
                national_id TEXT UNIQUE NOT NULL,
                profile_id TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn insert(
        &self,
        dto: &CreateRmbStaffRequest,
        profile_id: Option<Uuid>,
    ) -> Result<RmbStaff> {
        let staff = RmbStaff {
            id: Uuid::new_v4(),
            first_name: dto.first_name.clone(),
            last_name: dto.last_name.clone(),
            email: dto.email.clone(),
            phone_number: dto.phone_number.clone(),
            national_id: dto.national_id.clone(),
            profile_id,
            created_at: Utc::now().to_rfc3339(),
        };
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO rmb_staff
             (id, first_name, last_name, email, phone_number, national_id, profile_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                staff.id.to_string(),
                staff.first_name,
                staff.last_name,
                staff.email,
                staff.phone_number,
                staff.national_id,
                staff.profile_id.map(|id| id.to_string()),
                staff.created_at,
            ],
        )?;
        Ok(staff)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<RmbStaff>> {
        let conn = Connection::open(&self.db_path)?;
        let staff = conn
            .query_row(
                "SELECT id, first_name, last_name, email, phone_number, national_id,
                        profile_id, created_at
                 FROM rmb_staff WHERE email = ?1",
                params![email],
                map_row,
            )
            .optional()?;
        Ok(staff)
    }

    pub fn list(&self) -> Result<Vec<RmbStaff>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT id, first_name, last_name, email, phone_number, national_id,
                    profile_id, created_at
             FROM rmb_staff ORDER BY last_name, first_name",
        )?;
        let staff = stmt.query_map([], map_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(staff)
    }

    pub fn delete(&self, id: Uuid) -> Result<usize> {
        let conn = Connection::open(&self.db_path)?;
        Ok(conn.execute(
            "DELETE FROM rmb_staff WHERE id = ?1",
            params![id.to_string()],
        )?)
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RmbStaff> {
    let id: String = row.get(0)?;
    let profile_id: Option<String> = row.get(6)?;
    Ok(RmbStaff {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone_number: row.get(4)?,
        national_id: row.get(5)?,
        profile_id: profile_id.and_then(|s| Uuid::parse_str(&s).ok()),
        created_at: row.get(7)?,
    })
}

/// POST /api/rmb-staff (ADMIN)
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateRmbStaffRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    payload.validate().map_err(ApiError::Validation)?;
    if state.rmb_staff.find_by_email(&payload.email)?.is_some() {
        return Err(ApiError::AlreadyExists(
            "The RMB staff with the provided email is already registered".to_string(),
        ));
    }
    let profile_id = state
        .auth_store
        .find_profile_by_email(&payload.email)?
        .map(|p| p.id);
    let staff = state.rmb_staff.insert(&payload, profile_id)?;
    Ok(ApiResponse::ok(
        "The RMB staff was registered successfully",
        staff,
    ))
}

/// GET /api/rmb-staff (ADMIN, RMB)
pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse>, ApiError> {
    let staff = state.rmb_staff.list()?;
    Ok(ApiResponse::ok(
        "All RMB staff were retrieved successfully",
        staff,
    ))
}

/// DELETE /api/rmb-staff/:id (ADMIN)
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse>, ApiError> {
    if state.rmb_staff.delete(id)? == 0 {
        return Err(ApiError::NotFound(
            "The RMB staff with the provided id is not found".to_string(),
        ));
    }
    Ok(ApiResponse::message("The RMB staff was deleted successfully"))
}
