// JWT session tokens
// Decision: HS256 with a symmetric secret
// Decision: Claims carry only the email; the user is re-resolved on every request

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::config::AuthConfig;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtService {
    lifetime: std::time::Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            lifetime: config.session_lifetime,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        }
    }

    /// Mint a session token for `email`.
    pub fn issue(&self, email: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::from_std(self.lifetime)?;

        let claims = SessionClaims {
            email: email.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to encode session token")
    }

    /// Check signature and expiry and return the claims.
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .context("Invalid session token")?;

        if data.claims.email.trim().is_empty() {
            bail!("Session token has no email");
        }

        Ok(data.claims)
    }
}
