use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::{info, info_span, warn, Instrument};

use crate::{
    adapters::{
        dto::file_dto::{PingResponse, UploadFileResponse},
        state::AppState,
    },
    application::{
        context::RequestContext,
        error::{ApplicationError, ValidationErrors, ViolationKind},
    },
    domain::models::file::{AccessPolicy, FileUpload},
};

pub struct FileController;

impl FileController {
    /// GET /api/v1/ping
    pub async fn ping() -> Json<PingResponse> {
        Json(PingResponse { pong: true })
    }

    /// POST /api/v1/upload
    /// Multipart fields: `file` (required), `directory`, `acl`
    pub async fn upload_file(
        State(app_state): State<AppState>,
        mut multipart: Multipart,
    ) -> Result<(StatusCode, Json<UploadFileResponse>), ApplicationError> {
        let ctx = RequestContext::new();
        let span = info_span!("http_upload", request_id = %ctx.request_id());

        async move {
            let mut file_bytes: Option<Vec<u8>> = None;
            let mut filename = String::new();
            let mut directory = String::new();
            let mut acl: Option<String> = None;

            while let Some(field) = multipart.next_field().await.map_err(|e| {
                warn!("Invalid multipart data: {}", e);
                ApplicationError::Protocol("Invalid request format".to_string())
            })? {
                let name = field.name().unwrap_or("").to_string();

                match name.as_str() {
                    "file" => {
                        filename = field.file_name().unwrap_or("").to_string();
                        file_bytes = Some(
                            field
                                .bytes()
                                .await
                                .map_err(|e| {
                                    warn!("Cannot read file bytes: {}", e);
                                    ApplicationError::Protocol("Invalid file data".to_string())
                                })?
                                .to_vec(),
                        );
                    }
                    "directory" => directory = read_text(field).await?,
                    "acl" => acl = Some(read_text(field).await?),
                    _ => {}
                }
            }

            let file_bytes = file_bytes.ok_or_else(|| {
                warn!("Missing required 'file' field in upload");
                let mut errors = ValidationErrors::new();
                errors.add("file", ViolationKind::MissingField, "cannot be blank");
                ApplicationError::Validation(errors)
            })?;

            let file = FileUpload::new(
                file_bytes,
                directory,
                filename,
                acl.unwrap_or_else(|| AccessPolicy::PublicRead.as_str().to_string()),
            );
            info!("Received upload of {} ({} bytes)", file.filename, file.size());

            let result = app_state.file_use_case.upload(&ctx, file).await?;
            Ok::<_, ApplicationError>((StatusCode::CREATED, Json(UploadFileResponse::from(result))))
        }
        .instrument(span)
        .await
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApplicationError> {
    let name = field.name().unwrap_or("").to_string();
    field.text().await.map_err(|e| {
        warn!("Invalid {} field: {}", name, e);
        ApplicationError::Protocol("Invalid request data".to_string())
    })
}
