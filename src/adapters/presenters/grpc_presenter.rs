use tonic::{Code, Status};
use tonic_types::{ErrorDetails, StatusExt};
use tracing::{error, warn};

use crate::application::error::ApplicationError;

impl From<ApplicationError> for Status {
    fn from(err: ApplicationError) -> Status {
        match err {
            ApplicationError::Cancelled => {
                warn!("Request cancelled by caller");
                Status::cancelled(err.to_string())
            }
            ApplicationError::DeadlineExceeded => {
                warn!("Request deadline exceeded");
                Status::deadline_exceeded(err.to_string())
            }
            ApplicationError::Validation(_) | ApplicationError::InvalidUrl { .. } => {
                warn!("Invalid request: {}", err);
                let mut details = ErrorDetails::new();
                for violation in err.field_violations() {
                    details.add_bad_request_violation(violation.field, violation.message);
                }
                Status::with_error_details(Code::InvalidArgument, err.to_string(), details)
            }
            ApplicationError::Protocol(ref msg) => {
                warn!("Malformed request stream: {}", msg);
                Status::invalid_argument(msg.clone())
            }
            ApplicationError::Backend(ref msg) => {
                error!("Storage backend failure: {}", msg);
                Status::internal(err.to_string())
            }
        }
    }
}
