use super::{ConfigError, Env};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrpcConfig {
    pub host: String,
    pub port: u16,
}

impl GrpcConfig {
    pub(crate) fn load(env: &Env<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: env.or("GRPC_HOST", "0.0.0.0"),
            port: env.parse_or("GRPC_PORT", 9090)?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// `None` means any origin is accepted.
    pub cors_allowed_origins: Option<Vec<String>>,
    pub max_upload_bytes: usize,
}

impl HttpConfig {
    pub(crate) fn load(env: &Env<'_>) -> Result<Self, ConfigError> {
        let cors_allowed_origins = env.optional("CORS_ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect()
        });

        Ok(Self {
            enabled: env.parse_or("HTTP_ENABLED", true)?,
            host: env.or("HTTP_HOST", "0.0.0.0"),
            port: env.parse_or("HTTP_PORT", 8080)?,
            cors_allowed_origins,
            max_upload_bytes: env.parse_or("HTTP_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
