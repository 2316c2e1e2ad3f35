use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::{application::error::ApplicationError, domain::models::file::AccessPolicy};

/// Object storage backend. Keys are bucket-relative.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Stores `content` under `key` and returns the canonical public URL.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content: Vec<u8>,
        acl: AccessPolicy,
    ) -> Result<String, ApplicationError>;

    async fn delete_one(&self, bucket: &str, key: &str) -> Result<(), ApplicationError>;

    /// Removes every key or fails as a whole.
    async fn delete_many(&self, bucket: &str, keys: Vec<String>) -> Result<(), ApplicationError>;
}
