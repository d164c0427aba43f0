use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Accepted range for `MURMUR_TOKEN_TTL_DAYS`.
const TOKEN_TTL_DAYS: std::ops::RangeInclusive<i64> = 1..=3650;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MURMUR_JWT_SECRET is unset or still a placeholder")]
    InsecureSecret,

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub site_title: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("MURMUR_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::InsecureSecret);
        }

        let token_ttl_days = parse(&lookup, "MURMUR_TOKEN_TTL_DAYS", 30)?;
        if !TOKEN_TTL_DAYS.contains(&token_ttl_days) {
            return Err(ConfigError::Invalid {
                name: "MURMUR_TOKEN_TTL_DAYS",
                value: token_ttl_days.to_string(),
            });
        }

        Ok(Self {
            host: lookup("MURMUR_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse(&lookup, "MURMUR_PORT", 3000)?,
            db_path: lookup("MURMUR_DB_PATH")
                .unwrap_or_else(|| "murmur.db".into())
                .into(),
            jwt_secret,
            token_ttl_days,
            site_title: lookup("MURMUR_SITE_TITLE").unwrap_or_else(|| "Murmur".into()),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            name: "MURMUR_HOST",
            value: raw,
        })
    }
}

fn parse<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("MURMUR_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_path, PathBuf::from("murmur.db"));
        assert_eq!(cfg.token_ttl_days, 30);
        assert_eq!(cfg.site_title, "Murmur");
        assert_eq!(cfg.addr().unwrap().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn rejects_missing_or_placeholder_secret() {
        assert!(matches!(config(&[]), Err(ConfigError::InsecureSecret)));
        assert!(matches!(
            config(&[("MURMUR_JWT_SECRET", "dev-secret-change-me")]),
            Err(ConfigError::InsecureSecret)
        ));
    }

    #[test]
    fn token_ttl_must_be_in_range() {
        for bad in ["0", "-5", "3651", "100000000"] {
            let err = config(&[("MURMUR_JWT_SECRET", "s3cret"), ("MURMUR_TOKEN_TTL_DAYS", bad)])
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { name: "MURMUR_TOKEN_TTL_DAYS", .. }),
                "{bad} should be rejected"
            );
        }
        for good in ["1", "3650"] {
            let cfg = config(&[("MURMUR_JWT_SECRET", "s3cret"), ("MURMUR_TOKEN_TTL_DAYS", good)])
                .unwrap();
            assert_eq!(cfg.token_ttl_days.to_string(), good);
        }
    }

    #[test]
    fn rejects_bad_port() {
        let err = config(&[("MURMUR_JWT_SECRET", "s3cret"), ("MURMUR_PORT", "http")]).unwrap_err();
        assert_eq!(err.to_string(), "MURMUR_PORT has an invalid value 'http'");
    }
}
