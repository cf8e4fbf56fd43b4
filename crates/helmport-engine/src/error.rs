//! Engine error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid mappings file '{path}': {message}")]
    InvalidMappingConfig { path: String, message: String },

    #[error("Chart contains {} unsupported image structure(s)", .details.len())]
    UnsupportedStructures { details: Vec<String> },

    #[error("No registry mapping for '{registry}' and no target registry configured")]
    UnresolvedRegistry { registry: String },

    #[error("Unknown path strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error(transparent)]
    Core(#[from] helmport_core::CoreError),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
