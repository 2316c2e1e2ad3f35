use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::{
    application::{context::RequestContext, error::ApplicationError},
    domain::models::file::{BatchDeleteRequest, DeleteRequest, FileUpload, UploadResult},
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn upload(
        &self,
        ctx: &RequestContext,
        file: FileUpload,
    ) -> Result<UploadResult, ApplicationError>;

    async fn delete(
        &self,
        ctx: &RequestContext,
        request: &DeleteRequest,
    ) -> Result<(), ApplicationError>;

    async fn batch_delete(
        &self,
        ctx: &RequestContext,
        requests: &BatchDeleteRequest,
    ) -> Result<(), ApplicationError>;
}
