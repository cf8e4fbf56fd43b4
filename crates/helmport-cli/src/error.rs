//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps every failure to one of the documented exit codes.

#![allow(dead_code)] // Some variants/methods are for future use

use helmport_core::CoreError;
use helmport_engine::EngineError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Required flags are missing or combined inconsistently
    #[error("Invalid usage: {message}")]
    #[diagnostic(code(helmport::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Mappings file or flag values cannot be used
    #[error("Configuration error: {message}")]
    #[diagnostic(code(helmport::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Chart directory or values file does not exist
    #[error("Chart not found: {path}")]
    #[diagnostic(code(helmport::cli::chart_not_found))]
    ChartNotFound {
        path: String,
        #[help]
        help: Option<String>,
    },

    /// Scanning or override generation failed
    #[error("Chart processing failed: {message}")]
    #[diagnostic(code(helmport::cli::processing))]
    Processing { message: String },

    /// Strict mode found image values the scanner cannot rewrite
    #[error("Found {count} unsupported image structure(s):\n{details}")]
    #[diagnostic(
        code(helmport::cli::unsupported),
        help("Re-run without --strict to skip these values, or fix them in the chart")
    )]
    Unsupported { count: usize, details: String },

    /// An external renderer subprocess failed
    #[error("Renderer failed: {message}")]
    #[diagnostic(code(helmport::cli::renderer))]
    Renderer { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(helmport::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage { .. } => exit_codes::MISSING_FLAGS,
            CliError::Config { .. } => exit_codes::INPUT_CONFIG_ERROR,
            CliError::ChartNotFound { .. } => exit_codes::CHART_NOT_FOUND,
            CliError::Processing { .. } => exit_codes::PROCESSING_FAILED,
            CliError::Unsupported { .. } => exit_codes::UNSUPPORTED_STRUCTURE,
            CliError::Renderer { .. } => exit_codes::RENDERER_FAILED,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: None,
        }
    }

    /// Create a usage error with help text
    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a processing error
    pub fn processing(message: impl Into<String>) -> Self {
        Self::Processing {
            message: message.into(),
        }
    }

    /// Create an IO error with file context
    pub fn io_at(path: &std::path::Path, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", path.display(), err),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ChartNotFound { path } => CliError::ChartNotFound {
                path,
                help: Some(
                    "Pass --chart-path pointing at an unpacked chart directory containing \
                     Chart.yaml"
                        .to_string(),
                ),
            },
            CoreError::Io(inner) => CliError::Io {
                message: inner.to_string(),
            },
            other => CliError::Processing {
                message: other.to_string(),
            },
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::UnsupportedStructures { details } => CliError::Unsupported {
                count: details.len(),
                details: details.join("\n"),
            },
            EngineError::InvalidMappingConfig { .. } => CliError::Config {
                message: err.to_string(),
                help: Some(
                    "Run 'helmport inspect --generate-config-skeleton' to produce a valid \
                     starting file"
                        .to_string(),
                ),
            },
            EngineError::UnresolvedRegistry { .. } => CliError::Config {
                message: err.to_string(),
                help: Some(
                    "Add a mapping for this registry or pass --target-registry".to_string(),
                ),
            },
            EngineError::UnknownStrategy { .. } => CliError::Usage {
                message: err.to_string(),
                help: Some(
                    "Supported strategies: prefix-source-registry, flat".to_string(),
                ),
            },
            EngineError::Core(core) => CliError::from(core),
            EngineError::Io(inner) => CliError::Io {
                message: inner.to_string(),
            },
            other => CliError::Processing {
                message: other.to_string(),
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_match_contract() {
        assert_eq!(CliError::usage("x").exit_code(), 1);
        assert_eq!(CliError::config("x").exit_code(), 2);
        let not_found = CliError::ChartNotFound {
            path: "x".to_string(),
            help: None,
        };
        assert_eq!(not_found.exit_code(), 4);
        assert_eq!(CliError::processing("x").exit_code(), 10);
        let unsupported = CliError::Unsupported {
            count: 1,
            details: "x".to_string(),
        };
        assert_eq!(unsupported.exit_code(), 12);
        let io = CliError::Io {
            message: "x".to_string(),
        };
        assert_eq!(io.exit_code(), 20);
    }

    #[test]
    fn test_chart_not_found_maps_from_core() {
        let err = CliError::from(CoreError::ChartNotFound {
            path: "./missing".to_string(),
        });
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("./missing"));
    }

    #[test]
    fn test_strict_findings_map_to_unsupported() {
        let err = CliError::from(EngineError::UnsupportedStructures {
            details: vec!["a: bad".to_string(), "b: worse".to_string()],
        });
        assert_eq!(err.exit_code(), 12);
        assert!(err.to_string().contains("2 unsupported"));
        assert!(err.to_string().contains("b: worse"));
    }

    #[test]
    fn test_mapping_errors_are_configuration_errors() {
        let err = CliError::from(EngineError::InvalidMappingConfig {
            path: "mappings.yaml".to_string(),
            message: "mappings file is empty".to_string(),
        });
        assert_eq!(err.exit_code(), 2);
    }
}
