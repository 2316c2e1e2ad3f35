use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    MissingField,
    InvalidEnum,
    InvalidFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
}

/// Field-level validation failures of a single request, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, kind: ViolationKind, message: impl Into<String>) {
        self.0.push(FieldViolation {
            field: field.into(),
            kind,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    pub fn into_result(self) -> Result<(), ApplicationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApplicationError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", violation.field, violation.message)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationError {
    #[error("request cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("{0}")]
    Validation(ValidationErrors),

    /// The URL is well formed but does not point into the configured bucket.
    #[error("{field}: invalid format")]
    InvalidUrl { field: String, url: String },

    #[error("{0}")]
    Protocol(String),

    #[error("Storage error: {0}")]
    Backend(String),
}

impl ApplicationError {
    pub fn invalid_url(field: impl Into<String>, url: impl Into<String>) -> Self {
        ApplicationError::InvalidUrl {
            field: field.into(),
            url: url.into(),
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, ApplicationError::Cancelled | ApplicationError::DeadlineExceeded)
    }

    /// True for every error caused by the request content itself.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ApplicationError::Validation(_) | ApplicationError::InvalidUrl { .. }
        )
    }

    /// Field violations carried by validation failures, empty otherwise.
    pub fn field_violations(&self) -> Vec<FieldViolation> {
        match self {
            ApplicationError::Validation(errors) => errors.violations().to_vec(),
            ApplicationError::InvalidUrl { field, .. } => vec![FieldViolation {
                field: field.clone(),
                kind: ViolationKind::InvalidFormat,
                message: "invalid format".to_string(),
            }],
            _ => Vec::new(),
        }
    }
}
