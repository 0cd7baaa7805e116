//! JWT access-token validation.
//!
//! Access tokens are HS256-signed JWTs whose `sub` claim is the caller's
//! user id. Every owner-scoped row stores that id directly.

use adaptlabel_core::types::DbId;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims read from every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's id.
    pub sub: DbId,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to verify tokens.
    pub secret: String,
}

impl JwtConfig {
    /// Load JWT configuration from `JWT_SECRET`.
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");
        Self { secret }
    }
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Validates the signature and expiration. The subject must be a positive
/// id since it becomes the owner of everything the caller creates.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    if token_data.claims.sub <= 0 {
        return Err(ErrorKind::InvalidSubject.into());
    }
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
        }
    }

    fn token(sub: DbId, exp_offset: i64, secret: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub,
            exp: now + exp_offset,
            iat: now,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_yields_subject() {
        let claims = validate_token(&token(42, 900, "alpha"), &config("alpha")).unwrap();
        assert_eq!(claims.sub, 42);
    }

    #[test]
    fn expired_token_fails() {
        // Well past the default 60-second leeway.
        assert!(validate_token(&token(1, -300, "alpha"), &config("alpha")).is_err());
    }

    #[test]
    fn non_positive_subject_fails() {
        let err = validate_token(&token(0, 900, "alpha"), &config("alpha")).unwrap_err();
        assert_matches!(err.kind(), ErrorKind::InvalidSubject);
    }

    #[test]
    fn different_secret_fails() {
        assert!(validate_token(&token(1, 900, "alpha"), &config("bravo")).is_err());
    }
}
