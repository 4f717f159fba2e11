//! Router Assembly
//! Mission: Compose public, authenticated, and role-restricted route groups

use crate::auth::api as auth_api;
use crate::auth::middleware::{auth_gate, roles_gate, RoleGate};
use crate::auth::RoleName;
use crate::inspections::api as inspections_api;
use crate::middleware::request_logging;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::{categories, features, inspectors, minesites, rmb_staff, sections};
use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

async fn health() -> Json<ApiResponse> {
    ApiResponse::ok("Service is healthy", json!({ "status": "UP" }))
}

/// Route groups by gate:
/// - public: liveness plus the auth entry points.
/// - authenticated: any valid token.
/// - role-restricted: mutations for ADMIN, oversight reads for ADMIN/RMB,
///   plan submission for INSPECTOR.
pub fn build_router(state: AppState) -> Router {
    let gates = state.gates();

    let public = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/login", post(auth_api::login))
        .route("/api/auth/verify", post(auth_api::verify_account));

    let authenticated = Router::new()
        .route("/api/auth/me", get(auth_api::me))
        .route("/api/auth/password", patch(auth_api::change_password))
        .route("/api/auth/profile", delete(auth_api::remove_account))
        .route("/api/auth/roles", get(auth_api::list_roles))
        .route("/api/minesites", get(minesites::list))
        .route("/api/minesites/:id", get(minesites::get_by_id))
        .route("/api/minesites/code/:code", get(minesites::get_by_code))
        .route("/api/sections", get(sections::list))
        .route("/api/sections/title/:title", get(sections::get_by_title))
        .route(
            "/api/categories/section/:section_id",
            get(categories::list_by_section),
        )
        .route("/api/features", get(features::list))
        .route("/api/inspections/:id", get(inspections_api::get_plan));

    let admin = RoleGate::require(gates.clone(), &[RoleName::Admin]);
    let admin_routes = Router::new()
        .route("/api/minesites", post(minesites::create))
        .route("/api/minesites/:id", put(minesites::update))
        .route("/api/sections", post(sections::create))
        .route("/api/sections/:id", patch(sections::rename))
        .route("/api/sections/:id/flag", patch(sections::change_flag))
        .route("/api/categories", post(categories::create))
        .route("/api/categories/:id", patch(categories::rename))
        .route("/api/features", post(features::create))
        .route("/api/features/:id", delete(features::delete))
        .route("/api/inspectors", post(inspectors::create))
        .route("/api/inspectors/:id", delete(inspectors::delete))
        .route("/api/rmb-staff", post(rmb_staff::create))
        .route("/api/rmb-staff/:id", delete(rmb_staff::delete))
        .route_layer(middleware::from_fn_with_state(admin, roles_gate));

    let oversight = RoleGate::require(gates.clone(), &[RoleName::Admin, RoleName::Rmb]);
    let oversight_routes = Router::new()
        .route("/api/inspectors", get(inspectors::list))
        .route("/api/inspectors/email/:email", get(inspectors::get_by_email))
        .route("/api/rmb-staff", get(rmb_staff::list))
        .route(
            "/api/inspections/status/:status",
            get(inspections_api::list_by_status),
        )
        .route(
            "/api/inspections/:id/review",
            patch(inspections_api::review_plan),
        )
        .route_layer(middleware::from_fn_with_state(oversight, roles_gate));

    let field = RoleGate::require(gates.clone(), &[RoleName::Inspector]);
    let field_routes = Router::new()
        .route("/api/inspections", post(inspections_api::create_plan))
        .route(
            "/api/inspections/:id/records",
            post(inspections_api::add_record),
        )
        .route_layer(middleware::from_fn_with_state(field, roles_gate));

    let protected = authenticated
        .merge(admin_routes)
        .merge(oversight_routes)
        .merge(field_routes)
        .route_layer(middleware::from_fn_with_state(gates, auth_gate));

    public
        .merge(protected)
        .layer(middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
