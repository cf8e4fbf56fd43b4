//! Registry mapping configuration and target resolution
//!
//! A mappings file routes images from source registries to targets in a
//! private registry:
//!
//! ```yaml
//! version: "1.0"
//! registries:
//!   mappings:
//!     - source: quay.io
//!       target: harbor.example.com/quay
//!     - source: quay.io/jetstack
//!       target: harbor.example.com/jetstack
//!       description: cert-manager images
//!   defaultTarget: harbor.example.com/default
//!   strictMode: false
//! compatibility:
//!   ignoreEmptyFields: true
//! ```
//!
//! Sources may be bare hosts or host/namespace prefixes; the most
//! specific enabled match wins. The flat `source: target` layout some
//! older tools used is rejected outright rather than half-parsed.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use helmport_core::{ImageReference, normalize_registry};

use crate::error::{EngineError, Result};

fn default_true() -> bool {
    true
}

/// One source-to-target route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryMapping {
    /// Source registry, optionally namespace-qualified (`quay.io/jetstack`)
    pub source: String,
    /// Target registry the images should come from instead
    pub target: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parsed and validated mappings file
#[derive(Debug, Clone, Default)]
pub struct MappingConfig {
    pub mappings: Vec<RegistryMapping>,
    pub default_target: Option<String>,
    /// When set, an image whose source matches no mapping is an error
    /// instead of falling through to the command-line target
    pub strict_mode: bool,
}

// On-disk layout. Kept separate from the runtime type so validation has
// one place to happen.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MappingsFile {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    registries: Option<RegistriesSection>,
    #[serde(default)]
    compatibility: Option<CompatibilitySection>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistriesSection {
    #[serde(default)]
    mappings: Option<Vec<RegistryMapping>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_target: Option<String>,
    #[serde(default)]
    strict_mode: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompatibilitySection {
    #[serde(default)]
    ignore_empty_fields: bool,
}

impl MappingConfig {
    /// Load and validate a mappings file
    pub fn load(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|err| EngineError::InvalidMappingConfig {
            path: display.clone(),
            message: format!("cannot read file: {err}"),
        })?;
        Self::from_str_named(&raw, &display)
    }

    /// Parse mappings file content; `name` is used in error messages
    pub fn from_str_named(raw: &str, name: &str) -> Result<Self> {
        let invalid = |message: String| EngineError::InvalidMappingConfig {
            path: name.to_string(),
            message,
        };

        if raw.trim().is_empty() {
            return Err(invalid("mappings file is empty".to_string()));
        }

        let value: Value = serde_yaml::from_str(raw)
            .map_err(|err| invalid(format!("failed to parse mappings file: {err}")))?;

        match &value {
            Value::Null => return Err(invalid("mappings file is empty".to_string())),
            Value::Mapping(map) => {
                if is_legacy_flat_format(map) {
                    return Err(invalid(
                        "legacy flat 'source: target' format is not supported; \
                         use the structured format with a registries.mappings list"
                            .to_string(),
                    ));
                }
            }
            _ => {
                return Err(invalid(
                    "failed to parse mappings file: expected a mapping at the top level".to_string(),
                ));
            }
        }

        let file: MappingsFile = serde_yaml::from_value(value)
            .map_err(|err| invalid(format!("failed to parse mappings file: {err}")))?;

        if let Some(version) = &file.version {
            if version != "1.0" {
                tracing::warn!(version, "unrecognized mappings file version, continuing anyway");
            }
        }

        let ignore_empty = file
            .compatibility
            .as_ref()
            .is_some_and(|c| c.ignore_empty_fields);

        let section = file.registries.ok_or_else(|| {
            invalid("failed to parse mappings file: missing registries.mappings".to_string())
        })?;
        let entries = section.mappings.ok_or_else(|| {
            invalid("failed to parse mappings file: missing registries.mappings".to_string())
        })?;
        if entries.is_empty() {
            return Err(invalid("mappings file contains no mappings".to_string()));
        }

        let mut mappings = Vec::with_capacity(entries.len());
        let mut seen: Vec<String> = Vec::new();
        for entry in entries {
            let source = entry.source.trim();
            let target = entry.target.trim();
            if source.is_empty() || target.is_empty() {
                if ignore_empty {
                    tracing::warn!(
                        source,
                        target,
                        "skipping mapping with empty source or target"
                    );
                    continue;
                }
                return Err(invalid(format!(
                    "mapping with empty {} (set compatibility.ignoreEmptyFields to skip instead)",
                    if source.is_empty() { "source" } else { "target" }
                )));
            }
            if source.contains("://") || source.chars().any(char::is_whitespace) {
                return Err(invalid(format!("invalid mapping source '{source}'")));
            }
            if target.contains("://") || target.chars().any(char::is_whitespace) {
                return Err(invalid(format!("invalid mapping target '{target}'")));
            }

            let key = source_key_string(source);
            if seen.contains(&key) {
                return Err(invalid(format!("duplicate mapping source '{source}'")));
            }
            seen.push(key);

            mappings.push(RegistryMapping {
                source: source.to_string(),
                target: target.to_string(),
                enabled: entry.enabled,
                description: entry.description,
            });
        }

        Ok(Self {
            mappings,
            default_target: section.default_target,
            strict_mode: section.strict_mode,
        })
    }
}

/// A top-level mapping whose values are all strings, with none of the
/// structured keys, is the legacy flat layout.
fn is_legacy_flat_format(map: &serde_yaml::Mapping) -> bool {
    if map.is_empty() || map.contains_key("registries") || map.contains_key("version") {
        return false;
    }
    map.values().all(|v| matches!(v, Value::String(_)))
}

/// Canonical comparison key for a mapping source: normalized host plus
/// any namespace path, lowercased.
fn source_key(source: &str) -> (String, Option<String>) {
    let trimmed = source.trim().to_lowercase();
    match trimmed.split_once('/') {
        Some((host, path)) => {
            let path = path.trim_matches('/');
            let qualifier = (!path.is_empty()).then(|| path.to_string());
            (normalize_registry(host), qualifier)
        }
        None => (normalize_registry(&trimmed), None),
    }
}

fn source_key_string(source: &str) -> String {
    match source_key(source) {
        (host, Some(path)) => format!("{host}/{path}"),
        (host, None) => host,
    }
}

/// Picks the target registry for each image
///
/// Precedence: most specific enabled mapping, then the file's
/// `defaultTarget`, then the command-line target. With `strictMode` set
/// in the file the command-line fallback is not consulted.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: Option<MappingConfig>,
    fallback_target: Option<String>,
}

impl Resolver {
    pub fn new(config: Option<MappingConfig>, fallback_target: Option<String>) -> Self {
        Self {
            config,
            fallback_target: fallback_target.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Resolve the target registry for `reference`
    pub fn resolve(&self, reference: &ImageReference) -> Result<String> {
        let host = normalize_registry(&reference.registry);
        let repository = &reference.repository;

        if let Some(config) = &self.config {
            let mut best: Option<(&RegistryMapping, usize)> = None;
            for mapping in config.mappings.iter().filter(|m| m.enabled) {
                let (m_host, m_path) = source_key(&mapping.source);
                if m_host != host {
                    continue;
                }
                let specificity = match &m_path {
                    None => m_host.len(),
                    Some(prefix) => {
                        let qualified = repository == prefix
                            || repository.starts_with(&format!("{prefix}/"));
                        if !qualified {
                            continue;
                        }
                        m_host.len() + 1 + prefix.len()
                    }
                };
                // Ties go to the first declared mapping
                if best.is_none_or(|(_, s)| specificity > s) {
                    best = Some((mapping, specificity));
                }
            }
            if let Some((mapping, _)) = best {
                return Ok(mapping.target.clone());
            }
            if let Some(default_target) = &config.default_target {
                return Ok(default_target.clone());
            }
            if config.strict_mode {
                return Err(EngineError::UnresolvedRegistry {
                    registry: host.clone(),
                });
            }
        }

        match &self.fallback_target {
            Some(target) => Ok(target.clone()),
            None => Err(EngineError::UnresolvedRegistry { registry: host }),
        }
    }
}

/// Render the mappings-file skeleton `inspect --generate-config-skeleton`
/// writes.
///
/// `sources` are the normalized registries found in a chart; the default
/// public registry is left out since routing it is rarely wanted. Targets
/// are placeholders under `registry.local` for the operator to edit.
pub fn render_config_skeleton(sources: &[String]) -> Result<String> {
    let mut registries: Vec<String> = sources
        .iter()
        .map(|s| normalize_registry(s))
        .filter(|s| s != helmport_core::DEFAULT_REGISTRY)
        .collect();
    registries.sort();
    registries.dedup();

    let mappings: Vec<RegistryMapping> = registries
        .iter()
        .map(|registry| RegistryMapping {
            source: registry.clone(),
            target: format!("registry.local/{}", registry.replace('.', "-")),
            enabled: true,
            description: Some(format!("Mapping for {registry}")),
        })
        .collect();

    let file = MappingsFile {
        version: Some("1.0".to_string()),
        registries: Some(RegistriesSection {
            mappings: Some(mappings),
            default_target: Some("registry.local/default".to_string()),
            strict_mode: false,
        }),
        compatibility: Some(CompatibilitySection {
            ignore_empty_fields: true,
        }),
    };

    let body = serde_yaml::to_string(&file)?;
    Ok(format!(
        "# helmport registry mappings\n\
         #\n\
         # Generated from the registries detected in your chart. Update the\n\
         # 'target' values to match your registry layout, then pass this file\n\
         # to 'helmport override --config'.\n\
         #\n\
         # Sources may be namespace-qualified (quay.io/jetstack) to route\n\
         # part of a registry differently; the most specific match wins.\n\
         {body}"
    ))
}
