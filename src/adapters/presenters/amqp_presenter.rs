use tracing::{error, warn};

use crate::application::error::ApplicationError;

/// What to tell the broker about a consumed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Ack,
    Reject { requeue: bool },
}

impl DeliveryOutcome {
    pub fn from_result(result: Result<(), ApplicationError>) -> Self {
        match result {
            Ok(()) => DeliveryOutcome::Ack,
            Err(err) => err.into(),
        }
    }
}

impl From<ApplicationError> for DeliveryOutcome {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::Cancelled | ApplicationError::DeadlineExceeded => {
                warn!("Delete request interrupted, requeueing: {}", err);
                DeliveryOutcome::Reject { requeue: true }
            }
            ApplicationError::Validation(_)
            | ApplicationError::InvalidUrl { .. }
            | ApplicationError::Protocol(_) => {
                warn!("Dropping invalid delete request: {}", err);
                DeliveryOutcome::Reject { requeue: false }
            }
            ApplicationError::Backend(ref msg) => {
                error!("Storage backend failure, requeueing: {}", msg);
                DeliveryOutcome::Reject { requeue: true }
            }
        }
    }
}
