// config.rs
use std::time::Duration;

use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    /// Token lifetime in minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub provider_timeout: Duration,
    pub sentiment_model_path: Option<String>,
    pub priority_model_path: Option<String>,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't have to touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = lookup("JWT_SECRET_KEY").ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;

        let jwt_maxage = parse_or(&lookup, "JWT_MAXAGE", 24 * 60)?;
        let port = parse_or(&lookup, "PORT", 5001)?;
        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;
        let provider_timeout_ms: u64 = parse_or(&lookup, "PROVIDER_TIMEOUT_MS", 2000)?;
        let log_level = parse_or(&lookup, "LOG_LEVEL", LevelFilter::DEBUG)?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000,http://localhost:5001".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Config {
            database_url,
            database_max_connections,
            redis_url: non_empty("REDIS_URL"),
            jwt_secret,
            jwt_maxage,
            port,
            cors_origins,
            provider_timeout: Duration::from_millis(provider_timeout_ms),
            sentiment_model_path: non_empty("SENTIMENT_MODEL_PATH"),
            priority_model_path: non_empty("PRIORITY_MODEL_PATH"),
            log_level,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_values_missing() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/helpdesk"),
            ("JWT_SECRET_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.jwt_maxage, 1440);
        assert_eq!(config.port, 5001);
        assert_eq!(config.provider_timeout, Duration::from_millis(2000));
        assert_eq!(config.cors_origins.len(), 2);
        assert!(config.redis_url.is_none());
        assert!(config.sentiment_model_path.is_none());
        assert_eq!(config.log_level, LevelFilter::DEBUG);
    }

    #[test]
    fn missing_database_url_is_reported() {
        let err = Config::from_lookup(lookup_from(&[("JWT_SECRET_KEY", "secret")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn invalid_number_is_reported() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/helpdesk"),
            ("JWT_SECRET_KEY", "secret"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn blank_redis_url_is_treated_as_unset() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/helpdesk"),
            ("JWT_SECRET_KEY", "secret"),
            ("REDIS_URL", "  "),
            ("CORS_ORIGINS", "https://support.example.com, ,http://localhost:3000"),
        ]))
        .unwrap();

        assert!(config.redis_url.is_none());
        assert_eq!(
            config.cors_origins,
            vec!["https://support.example.com".to_string(), "http://localhost:3000".to_string()]
        );
    }
}
