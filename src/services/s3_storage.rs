use async_trait::async_trait;
use aws_sdk_s3::{
    config::{BehaviorVersion, Credentials, Region},
    primitives::ByteStream,
    types::{Delete, ObjectCannedAcl, ObjectIdentifier},
    Client,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    application::{error::ApplicationError, services::StorageService},
    domain::{
        config::storage::StorageConfig,
        models::{file::AccessPolicy, object_url::object_url},
    },
    services::error::StorageError,
};

/// S3 rejects DeleteObjects requests with more keys than this.
const MAX_KEYS_PER_DELETE: usize = 1000;

pub struct S3StorageService {
    client: Client,
    public_base_url: Url,
}

impl S3StorageService {
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "file-storage-gateway",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(config.force_path_style);

        if let Some(endpoint) = &config.endpoint {
            debug!("Using custom S3 endpoint: {}", endpoint);
            builder = builder.endpoint_url(endpoint);
        }

        info!(
            "S3 client initialized for region {} (path style: {})",
            config.region, config.force_path_style
        );

        Self::from_client(Client::from_conf(builder.build()), config.public_base_url())
    }

    pub fn from_client(client: Client, public_base_url: Url) -> Self {
        Self {
            client,
            public_base_url,
        }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content: Vec<u8>,
        acl: AccessPolicy,
    ) -> Result<String, ApplicationError> {
        let location = object_url(&self.public_base_url, bucket, key)
            .map_err(|e| StorageError::InternalError(format!("{} for key {}", e, key)))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .acl(ObjectCannedAcl::from(acl.as_str()))
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(StorageError::from)?;

        Ok(location.to_string())
    }

    async fn delete_one(&self, bucket: &str, key: &str) -> Result<(), ApplicationError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn delete_many(&self, bucket: &str, keys: Vec<String>) -> Result<(), ApplicationError> {
        for chunk in keys.chunks(MAX_KEYS_PER_DELETE) {
            let objects = chunk
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(StorageError::from)?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(StorageError::from)?;

            let output = self
                .client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(StorageError::from)?;

            // Quiet mode only reports failures; any of them fails the batch.
            if let Some(failure) = output.errors().first() {
                warn!(
                    "Batch delete reported {} failed keys in bucket {}",
                    output.errors().len(),
                    bucket
                );
                let message = format!(
                    "{}: {}",
                    failure.key().unwrap_or_default(),
                    failure.message().unwrap_or("delete failed")
                );
                return Err(StorageError::from_code(failure.code(), message).into());
            }
        }

        Ok(())
    }
}
