//! Scaleway provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScalewayError {
    #[error("scw not found. Please install: brew install scw")]
    ScwNotFound,

    #[error("scw command failed: {0}")]
    CommandFailed(String),

    #[error("Unsupported resource type: {0}")]
    UnsupportedResource(String),

    #[error("Missing property {property} on {resource}")]
    MissingProperty { resource: String, property: String },

    #[error("No id in scw output: {0}")]
    MissingId(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScalewayError>;
