use std::sync::Arc;

use tracing::{info_span, warn, Instrument};

use crate::{
    adapters::{dto::file_dto::DeleteFilesMessage, presenters::amqp_presenter::DeliveryOutcome},
    application::{context::RequestContext, use_cases::file_use_case::FileUseCase},
};

/// Turns delete messages from the broker into batch deletes.
#[derive(Clone)]
pub struct DeleteFilesHandler {
    file_use_case: Arc<dyn FileUseCase>,
}

impl DeleteFilesHandler {
    pub fn new(file_use_case: Arc<dyn FileUseCase>) -> Self {
        Self { file_use_case }
    }

    pub async fn handle(&self, ctx: &RequestContext, body: &[u8]) -> DeliveryOutcome {
        let message: DeleteFilesMessage = match serde_json::from_slice(body) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping malformed delete message: {}", e);
                return DeliveryOutcome::Reject { requeue: false };
            }
        };

        let span = info_span!("delete_files", request_id = %ctx.request_id());
        let result = self
            .file_use_case
            .batch_delete(ctx, message.into())
            .instrument(span)
            .await;
        DeliveryOutcome::from_result(result)
    }
}
