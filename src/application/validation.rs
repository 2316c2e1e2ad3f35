//! Request checks that run before anything reaches storage.

use url::Url;

use crate::{
    application::error::{ApplicationError, ValidationErrors, ViolationKind},
    domain::models::file::{join_key, BatchDeleteRequest, DeleteRequest, FileUpload},
};

const BLANK: &str = "cannot be blank";

pub trait Validate {
    fn validate(&self) -> Result<(), ApplicationError>;
}

impl Validate for FileUpload {
    fn validate(&self) -> Result<(), ApplicationError> {
        let mut errors = ValidationErrors::new();

        if self.filename.trim().is_empty() {
            errors.add("filename", ViolationKind::MissingField, BLANK);
        } else if join_key("", &self.filename).is_empty() {
            // "." / ".." / "a/.." leave no segment of their own
            errors.add("filename", ViolationKind::InvalidFormat, "must name a file");
        }
        if self.content.is_none() {
            errors.add("file", ViolationKind::MissingField, BLANK);
        }
        if self.parsed_access_policy().is_none() {
            errors.add("acl", ViolationKind::InvalidEnum, "must be a valid value");
        }

        errors.into_result()
    }
}

impl Validate for DeleteRequest {
    fn validate(&self) -> Result<(), ApplicationError> {
        validate_url("url", &self.url)
    }
}

impl Validate for BatchDeleteRequest {
    /// Stops at the first invalid element; later ones are never looked at.
    fn validate(&self) -> Result<(), ApplicationError> {
        self.iter()
            .enumerate()
            .try_for_each(|(i, request)| validate_url(&format!("urls[{}]", i), &request.url))
    }
}

fn validate_url(field: &str, value: &str) -> Result<(), ApplicationError> {
    let mut errors = ValidationErrors::new();

    if value.trim().is_empty() {
        errors.add(field, ViolationKind::MissingField, BLANK);
    } else if !is_absolute_url(value) {
        errors.add(field, ViolationKind::InvalidFormat, "must be a valid URL");
    }

    errors.into_result()
}

fn is_absolute_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| url.has_host() && url.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}
