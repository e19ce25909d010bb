// Authentication configuration
// Decision: AUTH_ prefix for all auth config
// Decision: Missing AUTH_JWT_SECRET gets a random per-process secret (sessions do not survive restarts)

use rand::Rng;
use std::time::Duration;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "auth_token";

/// Session lifetime: 7 days.
pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Token `exp` and cookie max-age
    pub session_lifetime: Duration,
    /// Set `Secure` on the session cookie
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: random_secret(),
            session_lifetime: DEFAULT_SESSION_LIFETIME,
            cookie_secure: false,
        }
    }
}

fn random_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

impl AuthConfig {
    /// Build from a variable lookup (the process environment in production).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let jwt_secret = match get("AUTH_JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!(
                    "AUTH_JWT_SECRET not set, using a random secret; sessions end on restart"
                );
                random_secret()
            }
        };

        let cookie_secure = get("AUTH_COOKIE_SECURE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            jwt_secret,
            session_lifetime: DEFAULT_SESSION_LIFETIME,
            cookie_secure,
        }
    }

    pub fn session_lifetime_secs(&self) -> i64 {
        self.session_lifetime.as_secs() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::from_lookup(lookup(&[]));
        assert_eq!(config.jwt_secret.len(), 64);
        assert_eq!(config.session_lifetime_secs(), 604_800);
        assert!(!config.cookie_secure);
    }

    #[test]
    fn test_explicit_secret_and_secure_cookie() {
        let config = AuthConfig::from_lookup(lookup(&[
            ("AUTH_JWT_SECRET", "s3cret"),
            ("AUTH_COOKIE_SECURE", "TRUE"),
        ]));
        assert_eq!(config.jwt_secret, "s3cret");
        assert!(config.cookie_secure);
    }

    #[test]
    fn test_blank_secret_is_replaced() {
        let config = AuthConfig::from_lookup(lookup(&[("AUTH_JWT_SECRET", "   ")]));
        assert_ne!(config.jwt_secret.trim(), "");
    }
}
