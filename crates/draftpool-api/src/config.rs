//! Server configuration read from the environment at startup.

use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub database_max_connections: u32,
    /// How often WebSocket observers get a `resync` hint per subscribed league.
    pub resync_interval: Duration,
    /// Notices buffered per observer before further ones are dropped.
    pub observer_outbox_capacity: usize,
    pub run_migrations: bool,
    /// OTLP/gRPC collector endpoint; span export is off when unset.
    pub otlp_endpoint: Option<String>,
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
    }
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when `DATABASE_URL` is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when `DATABASE_URL` is missing or a value
    /// does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| {
            AppError::Config("DATABASE_URL environment variable must be set".to_owned())
        })?;

        let resync_secs: u64 = parsed(&lookup, "DRAFT_RESYNC_INTERVAL_SECS", 30)?;
        if resync_secs == 0 {
            return Err(AppError::Config(
                "DRAFT_RESYNC_INTERVAL_SECS must be at least 1".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parsed(&lookup, "PORT", 3000)?,
            database_max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            resync_interval: Duration::from_secs(resync_secs),
            observer_outbox_capacity: parsed(&lookup, "OBSERVER_OUTBOX_CAPACITY", 32)?,
            run_migrations: parsed(&lookup, "RUN_MIGRATIONS", true)?,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply_when_only_database_url_is_set() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/draft")]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.resync_interval, Duration::from_secs(30));
        assert_eq!(config.observer_outbox_capacity, 32);
        assert!(config.run_migrations);
        assert_eq!(config.otlp_endpoint, None);
    }

    #[test]
    fn test_missing_database_url_is_config_error() {
        let result = config_from(&[("PORT", "8080")]);

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://db/draft"),
            ("PORT", "8080"),
            ("DRAFT_RESYNC_INTERVAL_SECS", "5"),
            ("RUN_MIGRATIONS", "false"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.resync_interval, Duration::from_secs(5));
        assert!(!config.run_migrations);
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://collector:4317"));
    }

    #[test]
    fn test_unparsable_port_is_config_error() {
        let result = config_from(&[("DATABASE_URL", "postgres://db"), ("PORT", "http")]);

        assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains("PORT")));
    }

    #[test]
    fn test_zero_resync_interval_is_rejected() {
        let result = config_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("DRAFT_RESYNC_INTERVAL_SECS", "0"),
        ]);

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
