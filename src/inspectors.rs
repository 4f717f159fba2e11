//! Inspectors
//! Mission: Field inspector registry linked to minesites and profiles

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

/// Operational role of an inspector in the field, distinct from the RBAC
/// role attached to their login profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InspectorRole {
    #[serde(rename = "INSPECTOR")]
    Inspector,
    #[serde(rename = "ENVIRONMENTALIST")]
    Environmentalist,
    #[serde(rename = "SUPERVISOR")]
    Supervisor,
}

impl InspectorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectorRole::Inspector => "INSPECTOR",
            InspectorRole::Environmentalist => "ENVIRONMENTALIST",
            InspectorRole::Supervisor => "SUPERVISOR",
        }
    }

    /// Recognized labels: inspector, environmentalist, supervisor.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "inspector" => Some(InspectorRole::Inspector),
            "environmentalist" => Some(InspectorRole::Environmentalist),
            "supervisor" => Some(InspectorRole::Supervisor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Inspector {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub national_id: String,
    pub inspector_role: InspectorRole,
    pub minesite_id: Option<Uuid>,
    pub profile_id: Option<Uuid>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateInspectorRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub national_id: String,
    pub role: String,
    pub minesite_id: Option<Uuid>,
}

impl CreateInspectorRequest {
    pub fn validate(&self) -> Result<InspectorRole, Vec<String>> {
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
        if !is_valid_phone(&self.phone_number) {
            errors.push("phone_number must be a valid phone number".to_string());
        }
        if self.national_id.trim().is_empty() {
            errors.push("national_id must not be empty".to_string());
        }
        let role = InspectorRole::parse(&self.role);
        if role.is_none() {
            errors.push(
                "role must be one of [inspector, environmentalist, supervisor]".to_string(),
            );
        }
        match role {
            Some(role) if errors.is_empty() => Ok(role),
            _ => Err(errors),
        }
    }
}

fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (2..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

pub struct InspectorStore {
    db_path: String,
}

impl InspectorStore {
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
            "CREATE TABLE IF NOT EXISTS inspectors (
                id TEXT PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                phone_number TEXT NOT NULL,
                national_id TEXT UNIQUE NOT NULL,
                inspector_role TEXT NOT NULL,
                minesite_id TEXT,
                profile_id TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn insert(
        &self,
        dto: &CreateInspectorRequest,
        role: InspectorRole,
        profile_id: Option<Uuid>,
    ) -> Result<Inspector> {
        let inspector = Inspector {
            id: Uuid::new_v4(),
            first_name: dto.first_name.clone(),
            last_name: dto.last_name.clone(),
            email: dto.email.clone(),
            phone_number: dto.phone_number.clone(),
            national_id: dto.national_id.clone(),
            inspector_role: role,
            minesite_id: dto.minesite_id,
            profile_id,
            created_at: Utc::now().to_rfc3339(),
        };
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO inspectors
             (id, first_name, last_name, email, phone_number, national_id,
              inspector_role, minesite_id, profile_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                inspector.id.to_string(),
                inspector.first_name,
                inspector.last_name,
                inspector.email,
                inspector.phone_number,
                inspector.national_id,
                inspector.inspector_role.as_str(),
                inspector.minesite_id.map(|id| id.to_string()),
                inspector.profile_id.map(|id| id.to_string()),
                inspector.created_at,
            ],
        )?;
        Ok(inspector)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<Inspector>> {
        let conn = Connection::open(&self.db_path)?;
        let inspector = conn
            .query_row(
                "SELECT id, first_name, last_name, email, phone_number, national_id,
                        inspector_role, minesite_id, profile_id, created_at
                 FROM inspectors WHERE email = ?1",
                params![email],
                map_row,
            )
            .optional()?;
        Ok(inspector)
    }

    pub fn list(&self) -> Result<Vec<Inspector>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT id, first_name, last_name, email, phone_number, national_id,
                    inspector_role, minesite_id, profile_id, created_at
             FROM inspectors ORDER BY last_name, first_name",
        )?;
        let inspectors = stmt.query_map([], map_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(inspectors)
    }

    pub fn delete(&self, id: Uuid) -> Result<usize> {
        let conn = Connection::open(&self.db_path)?;
        Ok(conn.execute(
            "DELETE FROM inspectors WHERE id = ?1",
            params![id.to_string()],
        )?)
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Inspector> {
    let id: String = row.get(0)?;
    let role: String = row.get(6)?;
    let minesite_id: Option<String> = row.get(7)?;
    let profile_id: Option<String> = row.get(8)?;
    Ok(Inspector {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone_number: row.get(4)?,
        national_id: row.get(5)?,
        inspector_role: InspectorRole::parse(&role).unwrap_or(InspectorRole::Inspector),
        minesite_id: minesite_id.and_then(|s| Uuid::parse_str(&s).ok()),
        profile_id: profile_id.and_then(|s| Uuid::parse_str(&s).ok()),
        created_at: row.get(9)?,
    })
}

/// POST /api/inspectors (ADMIN, RMB)
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateInspectorRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let role = payload.validate().map_err(ApiError::Validation)?;

    if state.inspectors.find_by_email(&payload.email)?.is_some() {
        return Err(ApiError::AlreadyExists(
            "The inspector with the provided email is already registered".to_string(),
        ));
    }
    if let Some(minesite_id) = payload.minesite_id {
        if state.minesites.find_by_id(minesite_id)?.is_none() {
            return Err(ApiError::NotFound(
                "The minesite with the provided id is not found".to_string(),
            ));
        }
    }

    // Link the login profile when one already exists for this email.
    let profile_id = state
        .auth_store
        .find_profile_by_email(&payload.email)?
        .map(|p| p.id);

    let inspector = state.inspectors.insert(&payload, role, profile_id)?;
    info!(email = %inspector.email, role = role.as_str(), "inspector registered");
    Ok(ApiResponse::ok(
        "The inspector was registered successfully",
        inspector,
    ))
}

/// GET /api/inspectors (ADMIN, RMB)
pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse>, ApiError> {
    let inspectors = state.inspectors.list()?;
    Ok(ApiResponse::ok(
        "All inspectors were retrieved successfully",
        inspectors,
    ))
}

/// GET /api/inspectors/email/:email
pub async fn get_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let inspector = state.inspectors.find_by_email(&email)?.ok_or_else(|| {
        ApiError::NotFound("The inspector with the provided email is not found".to_string())
    })?;
    Ok(ApiResponse::ok(
        "The inspector was retrieved successfully",
        inspector,
    ))
}

/// DELETE /api/inspectors/:id (ADMIN)
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse>, ApiError> {
    if state.inspectors.delete(id)? == 0 {
        return Err(ApiError::NotFound(
            "The inspector with the provided id is not found".to_string(),
        ));
    }
    Ok(ApiResponse::message("The inspector was deleted successfully"))
}
