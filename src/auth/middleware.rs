//! Authorization Gates
//! Mission: Per-request authentication and role checks ahead of every handler

use crate::auth::jwt::TokenService;
use crate::auth::models::{Claims, RoleName};
use crate::auth::resolver::Resolver;
use crate::response::ApiError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";
/// The authentication middleware collapses every failure mode into this one
/// message; the specific reason is never leaked to the caller.
const AUTH_GATE_MESSAGE: &str = "You are not authorized to access this resource";

/// Explicit per-route metadata evaluated by the gates. Routes declare what
/// they need; nothing is discovered by reflection.
#[derive(Debug, Clone, Default)]
pub struct RouteMeta {
    pub public: bool,
    pub required_roles: Vec<RoleName>,
}

impl RouteMeta {
    /// Bypasses the authentication gate entirely.
    pub fn public() -> Self {
        Self {
            public: true,
            required_roles: Vec::new(),
        }
    }

    /// Requires a valid token but no particular role.
    pub fn protected() -> Self {
        Self::default()
    }

    /// Requires a valid token and at least one of `roles`.
    pub fn with_roles(roles: &[RoleName]) -> Self {
        Self {
            public: false,
            required_roles: roles.to_vec(),
        }
    }
}

/// Shared state for both gates.
#[derive(Clone)]
pub struct GateState {
    pub tokens: Arc<TokenService>,
    pub resolver: Arc<Resolver>,
}

/// Authentication check.
///
/// Public routes pass untouched, even without an Authorization header.
/// Otherwise the bearer token is extracted and verified; the decoded claims
/// are returned for attachment to the request. Missing header, malformed
/// scheme, bad signature, and expiry all fail with the same uniform 401.
pub async fn evaluate_auth(
    gates: &GateState,
    meta: &RouteMeta,
    authorization: Option<&str>,
) -> Result<Option<Claims>, ApiError> {
    if meta.public {
        return Ok(None);
    }

    let token = authorization
        .and_then(|header| header.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| ApiError::Unauthorized(AUTH_GATE_MESSAGE.to_string()))?;

    let claims = gates
        .tokens
        .verify(token)
        .map_err(|_| ApiError::Unauthorized(AUTH_GATE_MESSAGE.to_string()))?;

    Ok(Some(claims))
}

/// Role guard.
///
/// An empty required set authorizes immediately without any lookup. A
/// non-empty set re-verifies the token independently of the authentication
/// middleware, resolves the
/// caller's profile by email (cache-aside), and requires a non-empty
/// intersection between the profile's roles and the required set.
pub async fn evaluate_roles(
    gates: &GateState,
    meta: &RouteMeta,
    authorization: Option<&str>,
) -> Result<(), ApiError> {
    if meta.required_roles.is_empty() {
        return Ok(());
    }

    let header = authorization.ok_or(ApiError::NoToken)?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| ApiError::Unauthorized("The provided token is invalid".to_string()))?;
    gates
        .tokens
        .verify(token)
        .map_err(|_| ApiError::Unauthorized("The provided token is invalid".to_string()))?;

    let profile = gates.resolver.resolve_caller_profile(Some(header)).await?;

    if profile.has_any_role(&meta.required_roles) {
        Ok(())
    } else {
        let names: Vec<&str> = meta.required_roles.iter().map(|r| r.as_str()).collect();
        Err(ApiError::Forbidden(format!(
            "This resource is only for {}",
            names.join(", ")
        )))
    }
}

/// Authentication middleware for protected route groups. Public routes
/// simply never get this layer.
pub async fn auth_gate(
    State(gates): State<GateState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = authorization_header(&req);
    let meta = RouteMeta::protected();

    if let Some(claims) = evaluate_auth(&gates, &meta, authorization.as_deref()).await? {
        req.extensions_mut().insert(claims);
    }

    Ok(next.run(req).await)
}

/// Role guard state: the shared gate state plus this route group's explicit
/// required-role metadata.
#[derive(Clone)]
pub struct RoleGate {
    gates: GateState,
    required: Arc<Vec<RoleName>>,
}

impl RoleGate {
    pub fn require(gates: GateState, roles: &[RoleName]) -> Self {
        Self {
            gates,
            required: Arc::new(roles.to_vec()),
        }
    }
}

/// Role guard middleware for role-restricted route groups.
pub async fn roles_gate(
    State(gate): State<RoleGate>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = authorization_header(&req);
    let meta = RouteMeta::with_roles(&gate.required);

    evaluate_roles(&gate.gates, &meta, authorization.as_deref()).await?;

    Ok(next.run(req).await)
}

fn authorization_header(req: &Request) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{test_profile_with_roles, Profile};
    use crate::auth::store::AuthStore;
    use crate::cache::{Brain, MemoryBackend};
    use tempfile::NamedTempFile;

    fn create_gates() -> (GateState, Arc<AuthStore>, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = Arc::new(AuthStore::new(temp_file.path().to_str().unwrap()).unwrap());
        let tokens = Arc::new(TokenService::new("test-secret-key-12345".to_string()));
        let brain = Brain::new(Arc::new(MemoryBackend::new()), "mims-test");
        let resolver = Arc::new(Resolver::new(brain, store.clone(), tokens.clone()));
        (GateState { tokens, resolver }, store, temp_file)
    }

    fn persisted_profile(store: &AuthStore, email: &str, roles: &[RoleName]) -> Profile {
        let first = store.find_role_by_name(roles[0]).unwrap().unwrap();
        let profile = store.create_profile(email, "hash", 1, &first).unwrap();
        for name in &roles[1..] {
            let role = store.find_role_by_name(*name).unwrap().unwrap();
            store.assign_role(profile.id, &role).unwrap();
        }
        store.find_profile_by_email(email).unwrap().unwrap()
    }

    fn bearer_for(profile: &Profile) -> String {
        let tokens = TokenService::new("test-secret-key-12345".to_string());
        let pair = tokens.issue_token_pair(profile).unwrap();
        format!("Bearer {}", pair.access_token)
    }

    #[tokio::test]
    async fn test_public_route_bypasses_auth_without_header() {
        let (gates, _store, _temp) = create_gates();
        let result = evaluate_auth(&gates, &RouteMeta::public(), None).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_protected_route_rejects_missing_header() {
        let (gates, _store, _temp) = create_gates();
        let err = evaluate_auth(&gates, &RouteMeta::protected(), None)
            .await
            .unwrap_err();
        match err {
            ApiError::Unauthorized(msg) => assert_eq!(msg, AUTH_GATE_MESSAGE),
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_auth_failures_share_one_message() {
        let (gates, _store, _temp) = create_gates();
        let meta = RouteMeta::protected();
        let bogus = TokenService::new("another-secret".to_string())
            .issue_token_pair(&test_profile_with_roles(vec![RoleName::Admin]))
            .unwrap();

        let cases = [
            None,
            Some("Basic abc".to_string()),
            Some(format!("Bearer {}", bogus.access_token)),
            Some("Bearer not.a.token".to_string()),
        ];
        for header in cases {
            match evaluate_auth(&gates, &meta, header.as_deref()).await {
                Err(ApiError::Unauthorized(msg)) => assert_eq!(msg, AUTH_GATE_MESSAGE),
                other => panic!("expected uniform Unauthorized for {header:?}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_valid_token_yields_claims() {
        let (gates, store, _temp) = create_gates();
        let profile = persisted_profile(&store, "a@b.rw", &[RoleName::Inspector]);
        let header = bearer_for(&profile);

        let claims = evaluate_auth(&gates, &RouteMeta::protected(), Some(&header))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claims.sub, "a@b.rw");
        assert_eq!(claims.roles, vec!["INSPECTOR"]);
    }

    #[tokio::test]
    async fn test_empty_required_set_authorizes_without_lookup() {
        let (gates, _store, _temp) = create_gates();
        // No header at all: an empty required set must still authorize,
        // proving no token or profile work happens.
        let result = evaluate_roles(&gates, &RouteMeta::protected(), None).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_role_intersection_accepts() {
        let (gates, store, _temp) = create_gates();
        let profile =
            persisted_profile(&store, "a@b.rw", &[RoleName::Admin, RoleName::Inspector]);
        let header = bearer_for(&profile);

        let meta = RouteMeta::with_roles(&[RoleName::Admin]);
        assert!(evaluate_roles(&gates, &meta, Some(&header)).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_role_is_forbidden_and_names_it() {
        let (gates, store, _temp) = create_gates();
        let profile = persisted_profile(&store, "a@b.rw", &[RoleName::Inspector]);
        let header = bearer_for(&profile);

        let meta = RouteMeta::with_roles(&[RoleName::Admin]);
        match evaluate_roles(&gates, &meta, Some(&header)).await {
            Err(ApiError::Forbidden(msg)) => {
                assert_eq!(msg, "This resource is only for ADMIN");
            }
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_role_gate_missing_header_is_unauthorized_not_forbidden() {
        let (gates, _store, _temp) = create_gates();
        let meta = RouteMeta::with_roles(&[RoleName::Admin]);
        assert!(matches!(
            evaluate_roles(&gates, &meta, None).await,
            Err(ApiError::NoToken)
        ));
    }
}
