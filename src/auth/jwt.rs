//! Token Service
//! Mission: Issue and verify signed, time-limited access/refresh tokens

use crate::auth::models::{Claims, Profile, TokenPair};
use crate::config::{ACCESS_TOKEN_HOURS, REFRESH_TOKEN_HOURS};
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Signs and verifies HS256 tokens with the shared secret.
///
/// Tokens are stateless: validity is fully determined by signature and
/// expiry at verification time, never by server-side state.
pub struct TokenService {
    secret: String,
}

impl TokenService {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Produce an access/refresh pair for `profile`, both carrying the
    /// profile's email and role names. Access expires in 3 hours, refresh
    /// in 1 day.
    pub fn issue_token_pair(&self, profile: &Profile) -> Result<TokenPair> {
        let access_token = self.sign(profile, ACCESS_TOKEN_HOURS)?;
        let refresh_token = self.sign(profile, REFRESH_TOKEN_HOURS)?;

        debug!(email = %profile.email, "issued token pair");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    fn sign(&self, profile: &Profile, expiration_hours: i64) -> Result<String> {
        let expiration = Utc::now()
            .checked_add_signed(chrono::Duration::hours(expiration_hours))
            .context("Invalid timestamp")?
            .timestamp() as usize;

        let claims = Claims {
            sub: profile.email.clone(),
            roles: profile.role_names(),
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")
    }

    /// Check signature and expiry, returning the claims. No leeway: a token
    /// is rejected from the first instant past its expiration.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .context("Invalid or expired token")?;

        Ok(decoded.claims)
    }

    /// Extract claims without checking the signature or expiry. Only valid
    /// after a prior [`verify`](Self::verify) on the same token, never as a
    /// substitute for it.
    pub fn decode_unverified(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let decoded = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .context("Malformed token")?;

        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{test_profile_with_roles, RoleName};

    fn service() -> TokenService {
        TokenService::new("test-secret-key-12345".to_string())
    }

    /// Signs claims directly so expiry can be forced into the past.
    fn sign_raw(secret: &str, claims: &Claims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let svc = service();
        let profile = test_profile_with_roles(vec![RoleName::Inspector, RoleName::Rmb]);

        let pair = svc.issue_token_pair(&profile).unwrap();

        for token in [&pair.access_token, &pair.refresh_token] {
            let claims = svc.verify(token).unwrap();
            assert_eq!(claims.sub, profile.email);
            assert_eq!(claims.roles, vec!["INSPECTOR", "RMB"]);
            assert!(claims.exp > Utc::now().timestamp() as usize);
        }
    }

    #[test]
    fn test_refresh_outlives_access() {
        let svc = service();
        let profile = test_profile_with_roles(vec![RoleName::Admin]);
        let pair = svc.issue_token_pair(&profile).unwrap();

        let access = svc.verify(&pair.access_token).unwrap();
        let refresh = svc.verify(&pair.refresh_token).unwrap();
        // 3h vs 1d windows; one second of slack for a clock tick between
        // the two signings.
        let diff = refresh.exp - access.exp;
        assert!(diff >= (24 - 3) * 3600 && diff <= (24 - 3) * 3600 + 1);
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = service();
        let claims = Claims {
            sub: "late@rmb.gov.rw".to_string(),
            roles: vec![],
            exp: (Utc::now().timestamp() - 1) as usize,
        };
        let token = sign_raw("test-secret-key-12345", &claims);

        assert!(svc.verify(&token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let profile = test_profile_with_roles(vec![RoleName::Admin]);
        let pair = service().issue_token_pair(&profile).unwrap();

        let other = TokenService::new("another-secret".to_string());
        assert!(other.verify(&pair.access_token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(service().verify("not.a.token").is_err());
    }

    #[test]
    fn test_decode_unverified_ignores_expiry_and_signature() {
        let svc = service();
        let claims = Claims {
            sub: "late@rmb.gov.rw".to_string(),
            roles: vec!["RMB".to_string()],
            exp: (Utc::now().timestamp() - 1000) as usize,
        };
        // Signed with a different secret AND expired; decode still yields claims.
        let token = sign_raw("some-other-secret", &claims);

        let decoded = svc.decode_unverified(&token).unwrap();
        assert_eq!(decoded, claims);
    }
}
