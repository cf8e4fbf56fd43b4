//! Command implementations

pub mod inspect;
pub mod override_cmd;

use crate::error::{CliError, Result};

/// Serialization format for documents printed by commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            other => Err(CliError::usage_with_help(
                format!("unknown output format '{other}'"),
                "Supported formats: yaml, json",
            )),
        }
    }
}

/// Ensure a serialized document ends with exactly one trailing newline.
///
/// serde_yaml emits one, serde_json's pretty printer does not; piping
/// either to a file must behave the same.
pub(crate) fn finish_document(mut document: String) -> String {
    if !document.ends_with('\n') {
        document.push('\n');
    }
    document
}
