//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Chart not found: {path}")]
    ChartNotFound { path: String },

    #[error("Invalid Chart.yaml: {message}")]
    InvalidChart { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid image reference '{reference}': {message}")]
    InvalidImageReference { reference: String, message: String },

    #[error("Invalid value path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("Cannot set value at '{path}': {message}")]
    PathConflict { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
