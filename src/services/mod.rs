mod error;
mod s3_storage;

pub use s3_storage::S3StorageService;

use std::sync::Arc;

use crate::{application::services::StorageService, domain::config::storage::StorageConfig};

pub fn create_storage_service(config: &StorageConfig) -> Arc<dyn StorageService> {
    Arc::new(S3StorageService::new(config))
}
