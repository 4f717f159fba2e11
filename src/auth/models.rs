//! Authentication Models
//! Mission: Profiles, roles, and token claims shared across guards and services

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical role names for RBAC.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RoleName {
    #[serde(rename = "INSPECTOR")]
    Inspector,
    #[serde(rename = "RMB")]
    Rmb,
    #[serde(rename = "ENVIRONOMIST")]
    Environomist,
    #[serde(rename = "SUPERVISOR")]
    Supervisor,
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "MCIS")]
    Mcis,
}

impl RoleName {
    pub const ALL: [RoleName; 6] = [
        RoleName::Inspector,
        RoleName::Rmb,
        RoleName::Environomist,
        RoleName::Supervisor,
        RoleName::Admin,
        RoleName::Mcis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Inspector => "INSPECTOR",
            RoleName::Rmb => "RMB",
            RoleName::Environomist => "ENVIRONOMIST",
            RoleName::Supervisor => "SUPERVISOR",
            RoleName::Admin => "ADMIN",
            RoleName::Mcis => "MCIS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "INSPECTOR" => Some(RoleName::Inspector),
            "RMB" => Some(RoleName::Rmb),
            "ENVIRONOMIST" => Some(RoleName::Environomist),
            "SUPERVISOR" => Some(RoleName::Supervisor),
            "ADMIN" => Some(RoleName::Admin),
            "MCIS" => Some(RoleName::Mcis),
            _ => None,
        }
    }
}

/// A persisted role. Immutable after creation except for soft-delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: Uuid,
    pub role_name: RoleName,
    pub status: String,
    pub created_at: String,
}

/// Account lifecycle status. Soft delete flips the flag, never removes rows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProfileStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "DELETED")]
    Deleted,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Active => "ACTIVE",
            ProfileStatus::Pending => "PENDING",
            ProfileStatus::Deleted => "DELETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(ProfileStatus::Active),
            "PENDING" => Some(ProfileStatus::Pending),
            "DELETED" => Some(ProfileStatus::Deleted),
            _ => None,
        }
    }
}

/// Identity record with its ordered set of assigned roles.
///
/// The full struct round-trips through the cache, so the password hash stays
/// serializable here; [`ProfileResponse`] is the sanitized shape that leaves
/// the process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub activation_code: u32,
    pub status: ProfileStatus,
    pub last_login: Option<String>,
    pub roles: Vec<Role>,
    pub created_at: String,
}

impl Profile {
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.role_name.as_str().to_string()).collect()
    }

    /// True when any assigned role intersects `required`.
    pub fn has_any_role(&self, required: &[RoleName]) -> bool {
        self.roles.iter().any(|r| required.contains(&r.role_name))
    }
}

/// JWT claims payload: `{ sub: email, roles, exp }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub roles: Vec<String>,
    pub exp: usize,
}

/// Access/refresh pair returned on login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Sanitized profile view for API responses. No password hash, no
/// activation code.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub status: ProfileStatus,
    pub roles: Vec<String>,
    pub last_login: Option<String>,
    pub created_at: String,
}

impl ProfileResponse {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            status: profile.status,
            roles: profile.role_names(),
            last_login: profile.last_login.clone(),
            created_at: profile.created_at.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub register_code: String,
    pub role: Option<String>,
}

impl RegisterRequest {
    /// Explicit request validation, returning every failure at once.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if !is_valid_email(&self.email) {
            errors.push("email must be a valid email address".to_string());
        }
        if self.password.len() < 8 {
            errors.push("password must be at least 8 characters".to_string());
        }
        if self.register_code.trim().is_empty() {
            errors.push("register_code must not be empty".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: u32,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub profile: ProfileResponse,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// Test fixture: an active profile holding the given roles.
#[cfg(test)]
pub fn test_profile_with_roles(roles: Vec<RoleName>) -> Profile {
    use chrono::Utc;
    Profile {
        id: Uuid::new_v4(),
        email: "inspector@rmb.gov.rw".to_string(),
        password_hash: "hash".to_string(),
        activation_code: 123456,
        status: ProfileStatus::Active,
        last_login: None,
        roles: roles
            .into_iter()
            .map(|name| Role {
                id: Uuid::new_v4(),
                role_name: name,
                status: "ACTIVE".to_string(),
                created_at: Utc::now().to_rfc3339(),
            })
            .collect(),
        created_at: Utc::now().to_rfc3339(),
    }
}
