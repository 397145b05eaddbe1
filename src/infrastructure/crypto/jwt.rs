//! HS256 bearer tokens.
//!
//! Sign-in happens at the external identity provider, which shares the
//! signing secret with this service. Here tokens are only verified;
//! [`create_token`] is kept for the CLI and the test suites.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::UserRole;

const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Clone)]
pub struct JwtConfig {
    issuer: String,
    ttl: Duration,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtConfig {
    pub fn new(secret: impl AsRef<[u8]>, issuer: impl Into<String>) -> Self {
        let secret = secret.as_ref();
        Self {
            issuer: issuer.into(),
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Lifetime stamped into tokens minted by [`create_token`].
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl TokenClaims {
    /// Unknown or missing roles read as guest.
    pub fn role(&self) -> UserRole {
        UserRole::from_str(&self.role)
    }
}

pub fn create_token(
    user_id: &str,
    email: &str,
    role: UserRole,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let issued = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_owned(),
        email: email.to_owned(),
        role: role.as_str().to_owned(),
        exp: (issued + config.ttl).timestamp(),
        iat: issued.timestamp(),
        iss: config.issuer.clone(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &config.encoding)
}

/// Checks signature, expiry and issuer.
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    decode::<TokenClaims>(token, &config.decoding, &config.validation()).map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig::new("test-secret", "stayhub-auth")
    }

    #[test]
    fn minted_token_round_trips_the_identity() {
        let token = create_token("hank", "hank@example.com", UserRole::Host, &config()).unwrap();
        let claims = verify_token(&token, &config()).unwrap();
        assert_eq!(claims.sub, "hank");
        assert_eq!(claims.email, "hank@example.com");
        assert_eq!(claims.role(), UserRole::Host);
    }

    #[test]
    fn foreign_secret_or_issuer_fails() {
        let token = create_token("gina", "gina@example.com", UserRole::Guest, &config()).unwrap();
        assert!(verify_token(&token, &JwtConfig::new("other", "stayhub-auth")).is_err());
        assert!(verify_token(&token, &JwtConfig::new("test-secret", "elsewhere")).is_err());
    }

    #[test]
    fn expired_token_fails() {
        let stale = config().with_ttl(Duration::hours(-2));
        let token = create_token("gina", "gina@example.com", UserRole::Guest, &stale).unwrap();
        assert!(verify_token(&token, &config()).is_err());
    }
}
