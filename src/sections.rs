//! Inspection Sections
//! Mission: Plan sections carrying the severity standard that drives scoring

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

/// Per-section severity classification. An affirmative record answer under a
/// RED section is a red flag; under YELLOW, a yellow one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FlagStandard {
    #[serde(rename = "RED")]
    Red,
    #[serde(rename = "YELLOW")]
    Yellow,
}

impl FlagStandard {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagStandard::Red => "RED",
            FlagStandard::Yellow => "YELLOW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RED" => Some(FlagStandard::Red),
            "YELLOW" => Some(FlagStandard::Yellow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub id: Uuid,
    pub title: String,
    pub flag_standard: FlagStandard,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSectionRequest {
    pub title: String,
    pub flag_standard: String,
}

impl CreateSectionRequest {
    pub fn validate(&self) -> Result<FlagStandard, Vec<String>> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push("title must not be empty".to_string());
        }
        let standard = FlagStandard::parse(&self.flag_standard);
        if standard.is_none() {
            errors.push("flag_standard must be RED or YELLOW".to_string());
        }
        match standard {
            Some(standard) if errors.is_empty() => Ok(standard),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateFlagRequest {
    pub flag_standard: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameSectionRequest {
    pub title: String,
}

pub struct SectionStore {
    db_path: String,
}

impl SectionStore {
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
            "CREATE TABLE IF NOT EXISTS sections (
                id TEXT PRIMARY KEY,
                title TEXT UNIQUE NOT NULL,
                flag_standard TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn insert(&self, title: &str, standard: FlagStandard) -> Result<Section> {
        let section = Section {
            id: Uuid::new_v4(),
            title: title.to_string(),
            flag_standard: standard,
            created_at: Utc::now().to_rfc3339(),
        };
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO sections (id, title, flag_standard, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                section.id.to_string(),
                section.title,
                section.flag_standard.as_str(),
                section.created_at,
            ],
        )?;
        Ok(section)
    }

    pub fn update_title(&self, id: Uuid, title: &str) -> Result<usize> {
        let conn = Connection::open(&self.db_path)?;
        Ok(conn.execute(
            "UPDATE sections SET title = ?1 WHERE id = ?2",
            params![title, id.to_string()],
        )?)
    }

    pub fn update_flag(&self, id: Uuid, standard: FlagStandard) -> Result<usize> {
        let conn = Connection::open(&self.db_path)?;
        Ok(conn.execute(
            "UPDATE sections SET flag_standard = ?1 WHERE id = ?2",
            params![standard.as_str(), id.to_string()],
        )?)
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Section>> {
        let conn = Connection::open(&self.db_path)?;
        let section = conn
            .query_row(
                "SELECT id, title, flag_standard, created_at FROM sections WHERE id = ?1",
                params![id.to_string()],
                map_row,
            )
            .optional()?;
        Ok(section)
    }

    pub fn find_by_title(&self, title: &str) -> Result<Option<Section>> {
        let conn = Connection::open(&self.db_path)?;
        let section = conn
            .query_row(
                "SELECT id, title, flag_standard, created_at FROM sections WHERE title = ?1",
                params![title],
                map_row,
            )
            .optional()?;
        Ok(section)
    }

    pub fn list(&self) -> Result<Vec<Section>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt =
            conn.prepare("SELECT id, title, flag_standard, created_at FROM sections ORDER BY title")?;
        let sections = stmt.query_map([], map_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(sections)
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Section> {
    let id: String = row.get(0)?;
    let standard: String = row.get(2)?;
    Ok(Section {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        title: row.get(1)?,
        flag_standard: FlagStandard::parse(&standard).unwrap_or(FlagStandard::Yellow),
        created_at: row.get(3)?,
    })
}

/// POST /api/sections (ADMIN)
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateSectionRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let standard = payload.validate().map_err(ApiError::Validation)?;
    if state.sections.find_by_title(&payload.title)?.is_some() {
        return Err(ApiError::AlreadyExists(
            "The section with the provided title already exists".to_string(),
        ));
    }
    let section = state.sections.insert(&payload.title, standard)?;
    Ok(ApiResponse::ok("The section was created successfully", section))
}

/// PATCH /api/sections/:id (ADMIN)
pub async fn rename(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RenameSectionRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::Validation(vec![
            "title must not be empty".to_string(),
        ]));
    }
    if state.sections.find_by_title(&payload.title)?.is_some() {
        return Err(ApiError::AlreadyExists(
            "The section with the provided title already exists".to_string(),
        ));
    }
    if state.sections.update_title(id, &payload.title)? == 0 {
        return Err(ApiError::NotFound(
            "The section with the provided id is not found".to_string(),
        ));
    }
    let section = state.sections.find_by_id(id)?;
    Ok(ApiResponse::ok("The section was updated successfully", section))
}

/// PATCH /api/sections/:id/flag (ADMIN)
pub async fn change_flag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFlagRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let standard = FlagStandard::parse(&payload.flag_standard)
        .ok_or_else(|| ApiError::BadRequest("flag_standard must be RED or YELLOW".to_string()))?;
    if state.sections.update_flag(id, standard)? == 0 {
        return Err(ApiError::NotFound(
            "The section with the provided id is not found".to_string(),
        ));
    }
    let section = state.sections.find_by_id(id)?;
    Ok(ApiResponse::ok("The section was updated successfully", section))
}

/// GET /api/sections/title/:title
pub async fn get_by_title(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let section = state.sections.find_by_title(&title)?.ok_or_else(|| {
        ApiError::NotFound("The section with the provided title is not found".to_string())
    })?;
    Ok(ApiResponse::ok("The section was retrieved successfully", section))
}

/// GET /api/sections
pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse>, ApiError> {
    let sections = state.sections.list()?;
    Ok(ApiResponse::ok(
        "All sections are retrieved successfully",
        sections,
    ))
}
