//! Error types for the library layer.

use std::fmt;

use crate::imaging::ImagingError;

/// Errors produced by the library layer, wrapping upstream API errors
/// and adding imaging, serialization, configuration and input
/// validation failures.
#[derive(Debug)]
pub enum CampusIdError {
    /// An error from the underlying API client.
    Api(campusid_api::Error),
    /// A stage of the photo or signature pipeline failed.
    Imaging(ImagingError),
    /// JSON or TOML (de)serialization failed.
    Serialization(String),
    /// User-provided input failed validation.
    InvalidInput(String),
    /// Settings could not be loaded.
    Config(String),
}

impl CampusIdError {
    /// Field errors reported by the backend, if this is a rejected submission.
    pub fn validation(&self) -> Option<&campusid_api::types::ValidationErrors> {
        match self {
            Self::Api(e) => e.validation(),
            _ => None,
        }
    }
}

impl fmt::Display for CampusIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::Imaging(e) => write!(f, "Image processing error: {}", e),
            Self::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CampusIdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Imaging(e) => Some(e),
            _ => None,
        }
    }
}

impl From<campusid_api::Error> for CampusIdError {
    fn from(e: campusid_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<ImagingError> for CampusIdError {
    fn from(e: ImagingError) -> Self {
        Self::Imaging(e)
    }
}

impl From<serde_json::Error> for CampusIdError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for CampusIdError {
    fn from(e: toml::de::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
