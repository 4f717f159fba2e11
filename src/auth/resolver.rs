//! Role & Profile Resolution
//! Mission: Cache-aside lookup of roles and caller identity in front of SQLite

use crate::auth::jwt::TokenService;
use crate::auth::models::{Profile, Role, RoleName};
use crate::auth::store::AuthStore;
use crate::cache::{Brain, CachePrefix};
use crate::config::CACHE_TTL_MS;
use crate::response::ApiError;
use std::sync::Arc;
use tracing::debug;

const BEARER_PREFIX: &str = "Bearer ";

/// Resolution failures, kept distinct so callers can map them to the right
/// HTTP status.
#[derive(Debug)]
pub enum ResolveError {
    /// Authorization header absent on a non-public route.
    NoToken,
    /// Malformed scheme, bad signature, or expired token.
    InvalidToken(String),
    /// Role label outside the recognized set.
    InvalidRole,
    /// Recognized label with no persisted role behind it.
    RoleNotFound,
    /// Verified caller without a persisted profile.
    ProfileNotFound,
    Store(anyhow::Error),
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NoToken => ApiError::NoToken,
            ResolveError::InvalidToken(msg) => ApiError::Unauthorized(msg),
            ResolveError::InvalidRole => {
                ApiError::BadRequest("The provided role is invalid".to_string())
            }
            ResolveError::RoleNotFound => {
                ApiError::NotFound("The requested role is not found".to_string())
            }
            ResolveError::ProfileNotFound => {
                ApiError::NotFound("The profile with the provided email is not found".to_string())
            }
            ResolveError::Store(e) => e.into(),
        }
    }
}

/// Read-heavy role and profile lookups behind a cache-aside layer.
///
/// Cache entries take precedence for their full TTL window: nothing here
/// invalidates on mutation, so authorization data may be up to one hour
/// stale. That bound is intentional and documented, not a bug.
pub struct Resolver {
    brain: Brain,
    store: Arc<AuthStore>,
    tokens: Arc<TokenService>,
}

impl Resolver {
    pub fn new(brain: Brain, store: Arc<AuthStore>, tokens: Arc<TokenService>) -> Self {
        Self {
            brain,
            store,
            tokens,
        }
    }

    /// Map a free-form label to its canonical persisted role.
    ///
    /// Only {inspector, rmb, environomist, supervisor} are accepted here;
    /// unrecognized labels fail before any cache or persistence access.
    pub async fn resolve_role(&self, label: &str) -> Result<Role, ResolveError> {
        let label = label.to_lowercase();
        let role_name = match label.as_str() {
            "inspector" => RoleName::Inspector,
            "rmb" => RoleName::Rmb,
            "environomist" => RoleName::Environomist,
            "supervisor" => RoleName::Supervisor,
            _ => return Err(ResolveError::InvalidRole),
        };

        let cache_key = Brain::cache_key(&label, CachePrefix::ROLE);
        if let Some(cached) = self.brain.remind::<Role>(&cache_key).await {
            debug!(role = %label, "role served from cache");
            return Ok(cached);
        }

        let role = self
            .store
            .find_role_by_name(role_name)
            .map_err(ResolveError::Store)?
            .ok_or(ResolveError::RoleNotFound)?;

        self.brain
            .memorize(&cache_key, &role, Some(CACHE_TTL_MS))
            .await;

        Ok(role)
    }

    /// Identify the caller from a bearer token and load the full profile,
    /// cache first.
    pub async fn resolve_caller_profile(
        &self,
        authorization: Option<&str>,
    ) -> Result<Profile, ResolveError> {
        let authorization = authorization.ok_or(ResolveError::NoToken)?;
        let token = authorization
            .strip_prefix(BEARER_PREFIX)
            .ok_or_else(|| ResolveError::InvalidToken("The provided token is invalid".to_string()))?;

        self.tokens
            .verify(token)
            .map_err(|e| ResolveError::InvalidToken(format!("The provided token is invalid: {e}")))?;
        // Signature is checked above; decode only extracts the claims.
        let claims = self
            .tokens
            .decode_unverified(token)
            .map_err(|e| ResolveError::InvalidToken(format!("The provided token is invalid: {e}")))?;

        let cache_key = Brain::cache_key(&claims.sub, CachePrefix::USER);
        if let Some(cached) = self.brain.remind::<Profile>(&cache_key).await {
            debug!(email = %claims.sub, "profile served from cache");
            return Ok(cached);
        }

        let profile = self
            .store
            .find_profile_by_email(&claims.sub)
            .map_err(ResolveError::Store)?
            .ok_or(ResolveError::ProfileNotFound)?;

        self.brain
            .memorize(&cache_key, &profile, Some(CACHE_TTL_MS))
            .await;

        Ok(profile)
    }
}
