use std::sync::Arc;

use axum::extract::FromRef;

use crate::application::use_cases::file_use_case::FileUseCase;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub file_use_case: Arc<dyn FileUseCase>,
}
