pub mod amqp;
pub mod logger;
pub mod server;
pub mod storage;

use std::str::FromStr;

use thiserror::Error;

use amqp::AmqpConfig;
use logger::LoggerConfig;
use server::{GrpcConfig, HttpConfig};
use storage::StorageConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Process configuration, read once at startup and handed to each component.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub grpc: GrpcConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub amqp: AmqpConfig,
    pub logger: LoggerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env { lookup: &lookup };
        Ok(Self {
            grpc: GrpcConfig::load(&env)?,
            http: HttpConfig::load(&env)?,
            storage: StorageConfig::load(&env)?,
            amqp: AmqpConfig::load(&env)?,
            logger: LoggerConfig::load(&env)?,
        })
    }
}

/// Typed access to the variables of one lookup source.
pub(crate) struct Env<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Env<'_> {
    /// Unset and blank values are treated the same.
    pub fn optional(&self, key: &'static str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    pub fn or(&self, key: &'static str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    pub fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use logger::LogFormat;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("S3_BUCKET", "photos"),
        ("S3_ACCESS_KEY_ID", "key"),
        ("S3_SECRET_ACCESS_KEY", "secret"),
    ];

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.grpc.addr(), "0.0.0.0:9090");
        assert!(config.http.enabled);
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.storage.bucket_name, "photos");
        assert_eq!(config.storage.region, "us-east-1");
        assert!(config.storage.force_path_style);
        assert!(!config.amqp.enabled);
        assert_eq!(config.amqp.delete_queue, "file_storage.delete_files");
        assert_eq!(config.logger.level, "info");
        assert_eq!(config.logger.format, LogFormat::Text);
    }

    #[test]
    fn missing_bucket_is_reported() {
        let err = AppConfig::from_lookup(lookup(&REQUIRED[1..])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("S3_BUCKET"));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[0] = ("S3_BUCKET", "   ");
        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("S3_BUCKET"));
    }

    #[test]
    fn invalid_port_is_reported() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("GRPC_PORT", "not-a-port"));
        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "GRPC_PORT", .. }));
    }

    #[test]
    fn overrides_are_read() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("GRPC_HOST", "127.0.0.1"),
            ("GRPC_PORT", "7000"),
            ("HTTP_ENABLED", "false"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example"),
            ("S3_ENDPOINT", "http://localhost:9000"),
            ("AMQP_ENABLED", "true"),
            ("AMQP_EXCHANGE", "files"),
            ("AMQP_ROUTING_KEY", "files.delete"),
            ("LOG_FORMAT", "json"),
        ]);
        let config = AppConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.grpc.addr(), "127.0.0.1:7000");
        assert!(!config.http.enabled);
        assert_eq!(
            config.http.cors_allowed_origins,
            Some(vec!["https://a.example".to_string(), "https://b.example".to_string()])
        );
        assert_eq!(config.storage.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.storage.public_base_url().as_str(), "http://localhost:9000/");
        assert!(config.amqp.enabled);
        assert_eq!(config.amqp.exchange.as_deref(), Some("files"));
        assert_eq!(config.amqp.routing_key.as_deref(), Some("files.delete"));
        assert_eq!(config.logger.format, LogFormat::Json);
    }
}
