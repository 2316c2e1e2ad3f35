use std::fmt;

use url::Url;

use super::{ConfigError, Env};

#[derive(Clone)]
pub struct StorageConfig {
    pub bucket_name: String,
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, R2, ...).
    pub endpoint: Option<String>,
    /// Base of the public URLs handed back to clients. Defaults to the endpoint,
    /// or the regional AWS endpoint when no endpoint is set.
    pub public_url: Option<Url>,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub force_path_style: bool,
}

impl StorageConfig {
    pub(crate) fn load(env: &Env<'_>) -> Result<Self, ConfigError> {
        let public_url = match env.optional("S3_PUBLIC_URL") {
            Some(value) => Some(Url::parse(&value).map_err(|e| ConfigError::Invalid {
                key: "S3_PUBLIC_URL",
                reason: e.to_string(),
                value,
            })?),
            None => None,
        };

        let endpoint = env.optional("S3_ENDPOINT");
        if let Some(endpoint) = &endpoint {
            Url::parse(endpoint).map_err(|e| ConfigError::Invalid {
                key: "S3_ENDPOINT",
                value: endpoint.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(Self {
            bucket_name: env.required("S3_BUCKET")?,
            region: env.or("S3_REGION", "us-east-1"),
            endpoint,
            public_url,
            access_key_id: env.required("S3_ACCESS_KEY_ID")?,
            secret_access_key: env.required("S3_SECRET_ACCESS_KEY")?,
            force_path_style: env.parse_or("S3_FORCE_PATH_STYLE", true)?,
        })
    }

    pub fn public_base_url(&self) -> Url {
        if let Some(url) = &self.public_url {
            return url.clone();
        }
        self.endpoint
            .as_deref()
            .and_then(|endpoint| Url::parse(endpoint).ok())
            .or_else(|| Url::parse(&format!("https://s3.{}.amazonaws.com", self.region)).ok())
            .unwrap_or_else(|| Url::parse("https://s3.amazonaws.com").expect("static url"))
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("public_url", &self.public_url.as_ref().map(Url::as_str))
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}
