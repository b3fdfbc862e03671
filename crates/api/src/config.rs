//! Process configuration, read once at startup from the environment.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use backoffice_auth::token::DEFAULT_TTL_SECS;
use backoffice_infra::MasterSeed;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MASTER_NAME: &str = "Master";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a non-empty value")]
    MissingSecret,

    #[error("invalid {var}='{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// Master account to create on startup, if configured.
    pub master: Option<MasterSeed>,
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("master", &self.master)
            .finish()
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::MissingSecret)?;

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            var: "BIND_ADDR",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let token_ttl = match get("TOKEN_TTL_SECS") {
            None => Duration::seconds(DEFAULT_TTL_SECS),
            Some(raw) => match raw.parse::<i64>() {
                Ok(secs) if secs > 0 => Duration::seconds(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "TOKEN_TTL_SECS",
                        value: raw,
                        reason: "expected a positive number of seconds".to_string(),
                    });
                }
            },
        };

        let master = match (get("MASTER_EMAIL"), get("MASTER_PASSWORD")) {
            (Some(email), Some(password)) => Some(MasterSeed {
                email,
                password,
                name: get("MASTER_NAME").unwrap_or_else(|| DEFAULT_MASTER_NAME.to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl,
            master,
        })
    }

    /// Minimal configuration for tests: ephemeral port, default ttl, no seed.
    pub fn for_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::seconds(DEFAULT_TTL_SECS),
            master: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn secret_is_required() {
        assert_eq!(ApiConfig::from_lookup(lookup(&[])).unwrap_err(), ConfigError::MissingSecret);
        assert_eq!(
            ApiConfig::from_lookup(lookup(&[("JWT_SECRET", "  ")])).unwrap_err(),
            ConfigError::MissingSecret
        );
    }

    #[test]
    fn defaults_apply() {
        let cfg = ApiConfig::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.token_ttl, Duration::hours(1));
        assert!(cfg.master.is_none());
        assert!(!format!("{cfg:?}").contains("s3cret"));
    }

    #[test]
    fn master_seed_needs_email_and_password() {
        let cfg = ApiConfig::from_lookup(lookup(&[("JWT_SECRET", "s"), ("MASTER_EMAIL", "root@x.com")])).unwrap();
        assert!(cfg.master.is_none());

        let cfg = ApiConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "s"),
            ("MASTER_EMAIL", "root@x.com"),
            ("MASTER_PASSWORD", "pw!pw!pw!"),
        ]))
        .unwrap();
        let seed = cfg.master.unwrap();
        assert_eq!(seed.email, "root@x.com");
        assert_eq!(seed.name, DEFAULT_MASTER_NAME);
    }

    #[test]
    fn rejects_bad_values() {
        let err = ApiConfig::from_lookup(lookup(&[("JWT_SECRET", "s"), ("TOKEN_TTL_SECS", "-5")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TOKEN_TTL_SECS", .. }));

        let err = ApiConfig::from_lookup(lookup(&[("JWT_SECRET", "s"), ("BIND_ADDR", "nowhere")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "BIND_ADDR", .. }));
    }
}
