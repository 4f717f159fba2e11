use crate::inspections::models::{
    AddRecordRequest, CreatePlanRequest, InspectionStatus, PlanWithRecords, ReviewPlanRequest,
};
use crate::inspections::scoring::rank_record;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use uuid::Uuid;

/// POST /api/inspections (INSPECTOR)
///
/// The plan's inspector is the caller: the token is resolved to a profile and
/// that profile's email must belong to a registered inspector.
pub async fn create_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePlanRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    payload.validate().map_err(ApiError::Validation)?;

    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let profile = state
        .resolver
        .resolve_caller_profile(authorization.as_deref())
        .await?;
    let inspector = state
        .inspectors
        .find_by_email(&profile.email)?
        .ok_or_else(|| {
            ApiError::NotFound("The caller is not a registered inspector".to_string())
        })?;

    if state.minesites.find_by_id(payload.minesite_id)?.is_none() {
        return Err(ApiError::NotFound(
            "The minesite with the provided id is not found".to_string(),
        ));
    }

    let plan = state.inspections.insert_plan(
        payload.minesite_id,
        inspector.id,
        &payload.start_date,
        &payload.end_date,
    )?;
    Ok(ApiResponse::ok(
        "Inspection plan was created successfully",
        plan,
    ))
}

/// POST /api/inspections/:id/records (INSPECTOR)
///
/// Records are scored at write time against the severity standard of the
/// section owning the record's category.
pub async fn add_record(
    State(state): State<AppState>,
    Path(plan_id): Path<Uuid>,
    Json(payload): Json<AddRecordRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    payload.validate().map_err(ApiError::Validation)?;

    if state.inspections.find_plan(plan_id)?.is_none() {
        return Err(ApiError::NotFound(
            "The inspection plan with the provided id is not found".to_string(),
        ));
    }
    let category = state
        .categories
        .find_by_id(payload.category_id)?
        .ok_or_else(|| {
            ApiError::NotFound("The category with the provided id is not found".to_string())
        })?;
    let section = state
        .sections
        .find_by_id(category.section_id)?
        .ok_or_else(|| {
            ApiError::NotFound("The section owning the category is not found".to_string())
        })?;

    let flag = rank_record(&payload.box_value, section.flag_standard);
    let record = state.inspections.insert_record(
        plan_id,
        category.id,
        &payload.title,
        &payload.pseudo_name,
        &payload.box_value,
        flag,
    )?;
    Ok(ApiResponse::ok(
        "Inspection record was added successfully",
        record,
    ))
}

/// GET /api/inspections/status/:status (RMB, ADMIN)
pub async fn list_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let status = InspectionStatus::parse(&status).ok_or_else(|| {
        ApiError::BadRequest("The provided inspection status is invalid".to_string())
    })?;
    let plans = state.inspections.list_plans_by_status(status)?;
    Ok(ApiResponse::ok(
        "Inspection plans were retrieved successfully",
        plans,
    ))
}

/// GET /api/inspections/:id (RMB, ADMIN, INSPECTOR)
pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse>, ApiError> {
    let plan = state.inspections.find_plan(id)?.ok_or_else(|| {
        ApiError::NotFound("The inspection plan with the provided id is not found".to_string())
    })?;
    let records = state.inspections.records_for_plan(id)?;
    Ok(ApiResponse::ok(
        "Inspection plan was retrieved successfully",
        PlanWithRecords::new(plan, records),
    ))
}

/// PATCH /api/inspections/:id/review (RMB, ADMIN)
pub async fn review_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewPlanRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let status = InspectionStatus::parse(&payload.status).ok_or_else(|| {
        ApiError::BadRequest("The provided inspection status is invalid".to_string())
    })?;
    if state.inspections.set_plan_status(id, status)? == 0 {
        return Err(ApiError::NotFound(
            "The inspection plan with the provided id is not found".to_string(),
        ));
    }
    Ok(ApiResponse::message(
        "Inspection plan status was updated successfully",
    ))
}
