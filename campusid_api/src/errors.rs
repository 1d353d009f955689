//! Error types for the API client.

use crate::types::ValidationErrors;

/// Errors that can occur when making API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or unexpected response).
    #[error("Request failed")]
    RequestFailed,
    /// The API returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The backend rejected the submitted fields (HTTP 422).
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    /// A request URL could not be built from the base URL and path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Returns the field errors when the backend rejected the submission.
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            Error::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
