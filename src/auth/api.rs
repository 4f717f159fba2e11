//! Authentication API Endpoints
//! Mission: Registration, login, account verification, and caller identity

use crate::auth::models::{
    ChangePasswordRequest, LoginRequest, LoginResponse, ProfileResponse, ProfileStatus,
    RegisterRequest, VerifyRequest,
};
use crate::cache::{Brain, CachePrefix};
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use rand::Rng;
use tracing::{info, warn};

/// Shared secret invitees must present to register at all.
const REGISTER_CODE: &str = "DMIM232@3$";
const DEFAULT_ROLE_LABEL: &str = "rmb";

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    payload.validate().map_err(ApiError::Validation)?;

    if payload.register_code != REGISTER_CODE {
        return Err(ApiError::BadRequest(
            "The provided register code is invalid".to_string(),
        ));
    }

    if state.auth_store.exists_by_email(&payload.email)? {
        return Err(ApiError::AlreadyExists(
            "The profile with the provided email already exists".to_string(),
        ));
    }

    let label = payload.role.as_deref().unwrap_or(DEFAULT_ROLE_LABEL);
    let role = state.resolver.resolve_role(label).await?;

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    // Six digits, delivered out of band; never echoed in the response.
    let activation_code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);

    let profile =
        state
            .auth_store
            .create_profile(&payload.email, &password_hash, activation_code, &role)?;

    info!(email = %profile.email, "registration accepted, pending verification");

    Ok(ApiResponse::ok(
        "The profile was created successfully, verify with the activation code sent to your email",
        ProfileResponse::from_profile(&profile),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let profile = state
        .auth_store
        .find_profile_by_email(&payload.email)?
        .ok_or_else(invalid)?;

    let valid = verify(&payload.password, &profile.password_hash)
        .map_err(|e| anyhow::anyhow!("password verification failed: {e}"))?;
    if !valid {
        warn!(email = %payload.email, "failed login attempt");
        return Err(invalid());
    }

    match profile.status {
        ProfileStatus::Active => {}
        ProfileStatus::Pending => {
            return Err(ApiError::BadRequest(
                "The account is not yet verified".to_string(),
            ))
        }
        ProfileStatus::Deleted => return Err(invalid()),
    }

    state.auth_store.set_last_login(&profile.email)?;
    let pair = state.tokens.issue_token_pair(&profile)?;

    info!(email = %profile.email, "login successful");

    Ok(Json(LoginResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        profile: ProfileResponse::from_profile(&profile),
    }))
}

/// POST /api/auth/verify
pub async fn verify_account(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let profile = state
        .auth_store
        .find_profile_by_email(&payload.email)?
        .ok_or_else(|| {
            ApiError::NotFound("The profile with the provided email is not found".to_string())
        })?;

    if profile.activation_code != payload.code {
        return Err(ApiError::BadRequest(
            "The provided activation code is invalid".to_string(),
        ));
    }

    state.auth_store.activate(&profile.email)?;
    info!(email = %profile.email, "account verified");

    Ok(ApiResponse::message("The account was verified successfully"))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse>, ApiError> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let profile = state
        .resolver
        .resolve_caller_profile(authorization.as_deref())
        .await?;

    Ok(ApiResponse::ok(
        "The profile was retrieved successfully",
        ProfileResponse::from_profile(&profile),
    ))
}

/// PATCH /api/auth/password
pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    if payload.new_password.len() < 8 {
        return Err(ApiError::Validation(vec![
            "new_password must be at least 8 characters".to_string(),
        ]));
    }

    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let profile = state
        .resolver
        .resolve_caller_profile(authorization.as_deref())
        .await?;

    let valid = verify(&payload.old_password, &profile.password_hash)
        .map_err(|e| anyhow::anyhow!("password verification failed: {e}"))?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let password_hash = hash(&payload.new_password, DEFAULT_COST)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    state
        .auth_store
        .update_password(&profile.email, &password_hash)?;

    info!(email = %profile.email, "password changed");
    Ok(ApiResponse::message("The password was updated successfully"))
}

/// DELETE /api/auth/profile
///
/// Soft delete: the row stays, the status flag blocks future logins. The
/// cached profile is dropped so the deletion takes effect immediately.
pub async fn remove_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse>, ApiError> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let profile = state
        .resolver
        .resolve_caller_profile(authorization.as_deref())
        .await?;

    state.auth_store.soft_delete(&profile.email)?;
    state
        .brain
        .forget(&Brain::cache_key(&profile.email, CachePrefix::USER))
        .await;

    info!(email = %profile.email, "account soft-deleted");
    Ok(ApiResponse::message("The account was deleted successfully"))
}

/// GET /api/roles (ADMIN)
pub async fn list_roles(State(state): State<AppState>) -> Result<Json<ApiResponse>, ApiError> {
    let roles = state.auth_store.list_roles()?;
    Ok(ApiResponse::ok(
        "All roles were retrieved successfully",
        roles,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::RoleName;
    use crate::config::AppConfig;
    use tempfile::NamedTempFile;

    fn create_state() -> (AppState, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let config = AppConfig::for_tests(temp_file.path().to_str().unwrap());
        (AppState::new(&config).unwrap(), temp_file)
    }

    fn register_payload(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "strong-password".to_string(),
            register_code: REGISTER_CODE.to_string(),
            role: Some("inspector".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_login_flow() {
        let (state, _temp) = create_state();

        register(State(state.clone()), Json(register_payload("a@b.rw")))
            .await
            .unwrap();

        // Unverified accounts cannot log in yet.
        let attempt = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "a@b.rw".to_string(),
                password: "strong-password".to_string(),
            }),
        )
        .await;
        assert!(matches!(attempt, Err(ApiError::BadRequest(_))));

        let code = state
            .auth_store
            .find_profile_by_email("a@b.rw")
            .unwrap()
            .unwrap()
            .activation_code;
        verify_account(
            State(state.clone()),
            Json(VerifyRequest {
                email: "a@b.rw".to_string(),
                code,
            }),
        )
        .await
        .unwrap();

        let response = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "a@b.rw".to_string(),
                password: "strong-password".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(!response.access_token.is_empty());
        assert_eq!(response.profile.roles, vec!["INSPECTOR"]);

        let stored = state
            .auth_store
            .find_profile_by_email("a@b.rw")
            .unwrap()
            .unwrap();
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn test_register_rejects_bad_code_and_duplicates() {
        let (state, _temp) = create_state();

        let mut bad_code = register_payload("a@b.rw");
        bad_code.register_code = "wrong".to_string();
        assert!(matches!(
            register(State(state.clone()), Json(bad_code)).await,
            Err(ApiError::BadRequest(_))
        ));

        register(State(state.clone()), Json(register_payload("a@b.rw")))
            .await
            .unwrap();
        assert!(matches!(
            register(State(state.clone()), Json(register_payload("a@b.rw"))).await,
            Err(ApiError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_unrecognized_role() {
        let (state, _temp) = create_state();
        let mut payload = register_payload("a@b.rw");
        payload.role = Some("admin".to_string());
        assert!(matches!(
            register(State(state.clone()), Json(payload)).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (state, _temp) = create_state();
        register(State(state.clone()), Json(register_payload("a@b.rw")))
            .await
            .unwrap();
        state.auth_store.activate("a@b.rw").unwrap();

        let attempt = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "a@b.rw".to_string(),
                password: "not-the-password".to_string(),
            }),
        )
        .await;
        assert!(matches!(attempt, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_verify_wrong_code_rejected() {
        let (state, _temp) = create_state();
        register(State(state.clone()), Json(register_payload("a@b.rw")))
            .await
            .unwrap();
        let code = state
            .auth_store
            .find_profile_by_email("a@b.rw")
            .unwrap()
            .unwrap()
            .activation_code;
        let wrong = if code == 999_999 { 100_000 } else { code + 1 };

        assert!(matches!(
            verify_account(
                State(state.clone()),
                Json(VerifyRequest {
                    email: "a@b.rw".to_string(),
                    code: wrong,
                }),
            )
            .await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_me_roundtrip() {
        let (state, _temp) = create_state();
        register(State(state.clone()), Json(register_payload("a@b.rw")))
            .await
            .unwrap();
        state.auth_store.activate("a@b.rw").unwrap();
        let response = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "a@b.rw".to_string(),
                password: "strong-password".to_string(),
            }),
        )
        .await
        .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", response.access_token).parse().unwrap(),
        );
        let envelope = me(State(state.clone()), headers).await.unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data["email"], "a@b.rw");
    }

    #[tokio::test]
    async fn test_list_roles_contains_fixed_set() {
        let (state, _temp) = create_state();
        let envelope = list_roles(State(state)).await.unwrap();
        let roles = envelope.data.as_array().unwrap();
        assert_eq!(roles.len(), RoleName::ALL.len());
    }

    async fn active_session(state: &AppState, email: &str) -> HeaderMap {
        register(State(state.clone()), Json(register_payload(email)))
            .await
            .unwrap();
        state.auth_store.activate(email).unwrap();
        let response = login(
            State(state.clone()),
            Json(LoginRequest {
                email: email.to_string(),
                password: "strong-password".to_string(),
            }),
        )
        .await
        .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", response.access_token).parse().unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn test_change_password_requires_old_password() {
        let (state, _temp) = create_state();
        let headers = active_session(&state, "a@b.rw").await;

        let rejected = change_password(
            State(state.clone()),
            headers.clone(),
            Json(ChangePasswordRequest {
                old_password: "not-the-password".to_string(),
                new_password: "another-password".to_string(),
            }),
        )
        .await;
        assert!(matches!(rejected, Err(ApiError::Unauthorized(_))));

        change_password(
            State(state.clone()),
            headers,
            Json(ChangePasswordRequest {
                old_password: "strong-password".to_string(),
                new_password: "another-password".to_string(),
            }),
        )
        .await
        .unwrap();

        let response = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "a@b.rw".to_string(),
                password: "another-password".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(!response.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_remove_account_blocks_future_logins() {
        let (state, _temp) = create_state();
        let headers = active_session(&state, "a@b.rw").await;

        remove_account(State(state.clone()), headers).await.unwrap();

        // Deleted accounts fail with the same message as bad credentials.
        let attempt = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "a@b.rw".to_string(),
                password: "strong-password".to_string(),
            }),
        )
        .await;
        assert!(matches!(attempt, Err(ApiError::Unauthorized(_))));
    }
}
