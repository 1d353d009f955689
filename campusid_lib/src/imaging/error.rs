//! Error types for photo and signature preparation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Background removal failed: {0}")]
    BackgroundRemoval(String),
    #[error("Face detection failed: {0}")]
    FaceDetection(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("An ID number is required before saving")]
    MissingIdNumber,
    #[error("The signature pad is empty")]
    EmptySignature,
    #[error("Image task failed: {0}")]
    Task(String),
}
