use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::{info, warn};

use crate::{
    application::{
        context::RequestContext, error::ApplicationError,
        repositories::file_repository::FileRepository, validation::Validate,
    },
    domain::models::file::{BatchDeleteRequest, DeleteRequest, FileUpload, UploadResult},
};

/// Entry point shared by every transport.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FileUseCase: Send + Sync {
    async fn upload(
        &self,
        ctx: &RequestContext,
        file: FileUpload,
    ) -> Result<UploadResult, ApplicationError>;

    async fn delete(
        &self,
        ctx: &RequestContext,
        request: DeleteRequest,
    ) -> Result<(), ApplicationError>;

    async fn batch_delete(
        &self,
        ctx: &RequestContext,
        requests: BatchDeleteRequest,
    ) -> Result<(), ApplicationError>;
}

pub struct FileService {
    repository: Arc<dyn FileRepository>,
}

impl FileService {
    pub fn new(repository: Arc<dyn FileRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl FileUseCase for FileService {
    async fn upload(
        &self,
        ctx: &RequestContext,
        file: FileUpload,
    ) -> Result<UploadResult, ApplicationError> {
        ctx.check()?;
        file.validate().inspect_err(|e| warn!("Rejected upload of '{}': {}", file.filename, e))?;

        let result = self.repository.upload(ctx, file).await?;
        info!("File uploaded: {}", result.location_url);
        Ok(result)
    }

    async fn delete(
        &self,
        ctx: &RequestContext,
        request: DeleteRequest,
    ) -> Result<(), ApplicationError> {
        ctx.check()?;
        request.validate()?;

        self.repository.delete(ctx, &request).await?;
        info!("File deleted: {}", request.url);
        Ok(())
    }

    async fn batch_delete(
        &self,
        ctx: &RequestContext,
        requests: BatchDeleteRequest,
    ) -> Result<(), ApplicationError> {
        ctx.check()?;
        requests.validate()?;

        self.repository.batch_delete(ctx, &requests).await?;
        info!("Batch of {} files deleted", requests.len());
        Ok(())
    }
}
