use aws_sdk_s3::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

use crate::application::error::ApplicationError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Storage provider error: {0}")]
    ProviderError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl StorageError {
    /// Classifies an S3 error code as returned in the response body.
    pub fn from_code(code: Option<&str>, message: String) -> Self {
        match code {
            Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "ExpiredToken") => {
                StorageError::Unauthorized(message)
            }
            Some("NoSuchBucket" | "NoSuchKey") => StorageError::NotFound(message),
            Some("RequestTimeout" | "SlowDown" | "ServiceUnavailable") => {
                StorageError::NetworkError(message)
            }
            _ => StorageError::ProviderError(message),
        }
    }
}

impl From<StorageError> for ApplicationError {
    fn from(error: StorageError) -> Self {
        ApplicationError::Backend(error.to_string())
    }
}

impl<E, R> From<SdkError<E, R>> for StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn from(error: SdkError<E, R>) -> Self {
        let message = DisplayErrorContext(&error).to_string();
        match &error {
            SdkError::TimeoutError(_) => StorageError::NetworkError("Request timeout".to_string()),
            SdkError::DispatchFailure(_) => {
                StorageError::NetworkError(format!("Connection failed: {}", message))
            }
            SdkError::ConstructionFailure(_) => StorageError::InternalError(message),
            _ => StorageError::from_code(error.code(), message),
        }
    }
}

impl From<BuildError> for StorageError {
    fn from(error: BuildError) -> Self {
        StorageError::InternalError(error.to_string())
    }
}
