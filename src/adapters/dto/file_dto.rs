use serde::{Deserialize, Serialize};

use crate::domain::models::file::{BatchDeleteRequest, UploadResult};

#[derive(Debug, Serialize)]
pub struct UploadFileResponse {
    pub url: String,
}

impl From<UploadResult> for UploadFileResponse {
    fn from(result: UploadResult) -> Self {
        Self {
            url: result.location_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub pong: bool,
}

/// Body of a delete message on the broker: a bare JSON array of object URLs.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct DeleteFilesMessage {
    pub urls: Vec<String>,
}

impl From<DeleteFilesMessage> for BatchDeleteRequest {
    fn from(message: DeleteFilesMessage) -> Self {
        message.urls.into_iter().collect()
    }
}
