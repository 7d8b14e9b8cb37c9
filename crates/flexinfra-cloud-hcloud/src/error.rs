//! Hetzner Cloud provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HcloudError {
    #[error("hcloud not found. Please install: brew install hcloud")]
    HcloudNotFound,

    #[error("hcloud command failed: {0}")]
    CommandFailed(String),

    #[error("Unsupported resource type: {0}")]
    UnsupportedResource(String),

    #[error("Missing property {property} on {resource}")]
    MissingProperty { resource: String, property: String },

    #[error("No id in hcloud output: {0}")]
    MissingId(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HcloudError>;
