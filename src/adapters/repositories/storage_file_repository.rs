use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    application::{
        context::RequestContext, error::ApplicationError,
        repositories::file_repository::FileRepository, services::StorageService,
    },
    domain::models::{
        file::{BatchDeleteRequest, DeleteRequest, FileUpload, UploadResult},
        object_url::decode_object_key,
    },
};

/// File repository over an object storage bucket.
pub struct StorageFileRepository {
    storage: Arc<dyn StorageService>,
    bucket_name: String,
}

impl StorageFileRepository {
    pub fn new(storage: Arc<dyn StorageService>, bucket_name: impl Into<String>) -> Self {
        Self {
            storage,
            bucket_name: bucket_name.into(),
        }
    }

    fn resolve_key(&self, field: &str, url: &str) -> Result<String, ApplicationError> {
        decode_object_key(url, &self.bucket_name).map_err(|_| {
            warn!("URL {} does not point into bucket {}", url, self.bucket_name);
            ApplicationError::invalid_url(field, url)
        })
    }
}

#[async_trait]
impl FileRepository for StorageFileRepository {
    async fn upload(
        &self,
        ctx: &RequestContext,
        file: FileUpload,
    ) -> Result<UploadResult, ApplicationError> {
        let key = file.object_key();
        let size = file.size();
        let acl = file.parsed_access_policy().ok_or_else(|| {
            ApplicationError::Protocol(format!("unsupported access policy '{}'", file.access_policy))
        })?;
        let content = file.content.unwrap_or_default();

        let started = Instant::now();
        let location_url = ctx
            .run(self.storage.put(&self.bucket_name, &key, content, acl))
            .await?;
        info!(
            "Stored {} ({} bytes, {}) in {:?}",
            key,
            size,
            acl,
            started.elapsed()
        );

        Ok(UploadResult { location_url })
    }

    async fn delete(
        &self,
        ctx: &RequestContext,
        request: &DeleteRequest,
    ) -> Result<(), ApplicationError> {
        let key = self.resolve_key("url", &request.url)?;
        ctx.run(self.storage.delete_one(&self.bucket_name, &key)).await
    }

    async fn batch_delete(
        &self,
        ctx: &RequestContext,
        requests: &BatchDeleteRequest,
    ) -> Result<(), ApplicationError> {
        let keys = requests
            .iter()
            .enumerate()
            .map(|(i, request)| self.resolve_key(&format!("urls[{}]", i), &request.url))
            .collect::<Result<Vec<_>, _>>()?;

        if keys.is_empty() {
            return Ok(());
        }

        // Once issued, the batch runs to completion.
        ctx.check()?;
        let count = keys.len();
        self.storage.delete_many(&self.bucket_name, keys).await?;
        info!("Deleted {} objects from {}", count, self.bucket_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockall::predicate::eq;

    use super::*;
    use crate::{application::services::MockStorageService, domain::models::file::AccessPolicy};

    fn repository(storage: MockStorageService) -> StorageFileRepository {
        StorageFileRepository::new(Arc::new(storage), "mybucket")
    }

    #[tokio::test]
    async fn upload_stores_joined_key_with_acl() {
        let mut storage = MockStorageService::new();
        storage
            .expect_put()
            .withf(|bucket, key, content, acl| {
                bucket == "mybucket"
                    && key == "test/1mb.jpg"
                    && content.as_slice() == b"abc"
                    && *acl == AccessPolicy::PublicRead
            })
            .times(1)
            .returning(|_, _, _, _| Ok("https://host/mybucket/test/1mb.jpg".to_string()));

        let result = repository(storage)
            .upload(
                &RequestContext::new(),
                FileUpload::new(b"abc".to_vec(), "test", "1mb.jpg", "public-read"),
            )
            .await
            .unwrap();
        assert_eq!(result.location_url, "https://host/mybucket/test/1mb.jpg");
    }

    #[tokio::test]
    async fn cancelled_upload_never_calls_put() {
        let mut storage = MockStorageService::new();
        storage.expect_put().never();

        let ctx = RequestContext::new();
        ctx.cancel();
        let err = repository(storage)
            .upload(&ctx, FileUpload::new(b"abc".to_vec(), "", "a.txt", "public-read"))
            .await
            .unwrap_err();
        assert_eq!(err, ApplicationError::Cancelled);
    }

    #[tokio::test]
    async fn delete_resolves_key_from_url() {
        let mut storage = MockStorageService::new();
        storage
            .expect_delete_one()
            .with(eq("mybucket"), eq("a/b.jpg"))
            .times(1)
            .returning(|_, _| Ok(()));

        repository(storage)
            .delete(&RequestContext::new(), &DeleteRequest::new("https://host/mybucket/a/b.jpg"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_outside_bucket_never_reaches_storage() {
        let mut storage = MockStorageService::new();
        storage.expect_delete_one().never();

        let err = repository(storage)
            .delete(&RequestContext::new(), &DeleteRequest::new("https://host/other/a/b.jpg"))
            .await
            .unwrap_err();
        assert_eq!(err, ApplicationError::invalid_url("url", "https://host/other/a/b.jpg"));
    }

    #[tokio::test]
    async fn backend_failure_is_returned() {
        let mut storage = MockStorageService::new();
        storage
            .expect_delete_one()
            .returning(|_, _| Err(ApplicationError::Backend("Authentication failed: denied".into())));

        let err = repository(storage)
            .delete(&RequestContext::new(), &DeleteRequest::new("https://host/mybucket/a.jpg"))
            .await
            .unwrap_err();
        assert_eq!(err, ApplicationError::Backend("Authentication failed: denied".into()));
    }

    #[tokio::test]
    async fn batch_delete_is_one_call_with_all_keys() {
        let mut storage = MockStorageService::new();
        storage
            .expect_delete_many()
            .with(eq("mybucket"), eq(vec!["a.jpg".to_string(), "dir/b.jpg".to_string()]))
            .times(1)
            .returning(|_, _| Ok(()));

        let batch: BatchDeleteRequest = vec!["https://host/mybucket/a.jpg", "https://host/mybucket/dir/b.jpg"]
            .into_iter()
            .collect();
        repository(storage)
            .batch_delete(&RequestContext::new(), &batch)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn batch_with_foreign_url_deletes_nothing() {
        let mut storage = MockStorageService::new();
        storage.expect_delete_many().never();

        let batch: BatchDeleteRequest = vec!["https://host/mybucket/a.jpg", "https://host/other/b.jpg"]
            .into_iter()
            .collect();
        let err = repository(storage)
            .batch_delete(&RequestContext::new(), &batch)
            .await
            .unwrap_err();
        assert_eq!(err.field_violations()[0].field, "urls[1]");
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let mut storage = MockStorageService::new();
        storage.expect_delete_many().never();

        repository(storage)
            .batch_delete(&RequestContext::new(), &BatchDeleteRequest::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn expired_batch_is_not_issued() {
        let mut storage = MockStorageService::new();
        storage.expect_delete_many().never();

        let ctx = RequestContext::new().with_timeout(Duration::ZERO);
        let batch: BatchDeleteRequest = vec!["https://host/mybucket/a.jpg"].into_iter().collect();
        let err = repository(storage).batch_delete(&ctx, &batch).await.unwrap_err();
        assert_eq!(err, ApplicationError::DeadlineExceeded);
    }
}
