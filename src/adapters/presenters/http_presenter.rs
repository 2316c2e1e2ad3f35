use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use tracing::{error, warn};

use crate::application::error::ApplicationError;

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApplicationError::Cancelled | ApplicationError::DeadlineExceeded => {
                warn!("Request aborted: {}", self);
                (
                    StatusCode::REQUEST_TIMEOUT,
                    json!({ "error": "Request timeout" }),
                )
            }
            ApplicationError::Validation(_) | ApplicationError::InvalidUrl { .. } => {
                warn!("Bad request: {}", self);
                let fields: Map<String, Value> = self
                    .field_violations()
                    .into_iter()
                    .map(|v| (v.field, Value::String(v.message)))
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "Bad request", "fields": fields }),
                )
            }
            ApplicationError::Protocol(ref msg) => {
                warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            ApplicationError::Backend(ref msg) => {
                error!("Internal server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
