//! Image pattern recognition in chart values
//!
//! The scanner walks a values tree depth-first in declaration order and
//! reports every container image coordinate it can recognize, in two
//! shapes:
//!
//! - map form: a mapping with a string `repository` key, plus optional
//!   `registry`, `tag` and `digest` fields
//! - string form: a scalar holding `[registry/]repository[:tag][@digest]`,
//!   either under an image-like key or matching the reference grammar
//!
//! Recognition is purely structural. The scanner does not know which
//! registries a run cares about; filtering happens in the engine so that
//! `inspect` can show everything.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use helmport_core::{ImageReference, ValuePath, normalize_registry};

/// Which syntactic shape a pattern was found in
///
/// Overrides preserve the shape: map form is rewritten field by field,
/// string form as a single reference string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternShape {
    Map,
    String,
}

/// One recognized image coordinate in the values tree
#[derive(Debug, Clone, Serialize)]
pub struct ImagePattern {
    /// Where in the tree the pattern sits
    pub path: ValuePath,
    pub shape: PatternShape,
    /// The normalized reference found at `path`
    pub reference: ImageReference,
    /// Normalized registry the image currently comes from
    pub source_registry: String,
}

/// Why a node that looks image-related could not be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnsupportedKind {
    /// A coordinate field holds a `{{ ... }}` template expression
    TemplateExpression,
    /// The value does not parse as an image reference
    InvalidReference,
    /// Both a tag and a digest are set
    TagAndDigest,
    /// A coordinate field is not a string
    NonStringField,
}

/// A node the scanner recognized as image-related but cannot rewrite
#[derive(Debug, Clone, Serialize)]
pub struct UnsupportedFinding {
    pub path: ValuePath,
    pub kind: UnsupportedKind,
    pub reason: String,
}

impl std::fmt::Display for UnsupportedFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Everything one scan pass found, in input traversal order
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub patterns: Vec<ImagePattern>,
    pub unsupported: Vec<UnsupportedFinding>,
}

impl ScanReport {
    pub fn has_unsupported(&self) -> bool {
        !self.unsupported.is_empty()
    }
}

/// Structural image recognizer for a values tree
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    global_registry: Option<String>,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry applied to map-form patterns that name none themselves
    ///
    /// Charts following the Bitnami convention set this through
    /// `global.imageRegistry` (see [`global_image_registry`]).
    pub fn with_global_registry(mut self, registry: Option<String>) -> Self {
        self.global_registry = registry;
        self
    }

    /// Walk the tree and collect every pattern and unsupported finding
    pub fn scan(&self, values: &Value) -> ScanReport {
        let mut report = ScanReport::default();
        self.walk(values, ValuePath::root(), &mut report);
        report
    }

    fn walk(&self, value: &Value, path: ValuePath, report: &mut ScanReport) {
        match value {
            Value::Mapping(map) => {
                if self.classify_mapping(map, &path, report) {
                    return;
                }
                for (key, child) in map {
                    let Some(key) = key.as_str() else {
                        tracing::debug!(path = %path, "skipping non-string mapping key");
                        continue;
                    };
                    self.walk(child, path.push_key(key), report);
                }
            }
            Value::Sequence(items) => {
                for (index, child) in items.iter().enumerate() {
                    self.walk(child, path.push_index(index), report);
                }
            }
            Value::String(s) => self.classify_string(s, &path, report),
            _ => {}
        }
    }

    /// Try to read `map` as a map-form image pattern.
    ///
    /// Returns true when the node was consumed, either as a pattern or as
    /// an unsupported finding; false means the walk should descend into
    /// its children. A mapping without a string `repository` key is never
    /// an image node.
    fn classify_mapping(&self, map: &Mapping, path: &ValuePath, report: &mut ScanReport) -> bool {
        let repository = match map.get("repository") {
            Some(Value::String(s)) => s.clone(),
            _ => return false,
        };

        for field in ["registry", "repository", "tag", "digest"] {
            if let Some(Value::String(s)) = map.get(field) {
                if contains_template(s) {
                    report.unsupported.push(UnsupportedFinding {
                        path: path.clone(),
                        kind: UnsupportedKind::TemplateExpression,
                        reason: format!("field '{field}' contains a template expression"),
                    });
                    return true;
                }
            }
        }

        let registry = match map.get("registry") {
            Some(Value::String(s)) => Some(s.clone()),
            None | Some(Value::Null) => None,
            Some(_) => {
                report.unsupported.push(non_string_field(path, "registry"));
                return true;
            }
        };

        // Numeric and boolean tags are common in hand-written values
        let tag = match map.get("tag") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            None | Some(Value::Null) => None,
            Some(_) => {
                report.unsupported.push(non_string_field(path, "tag"));
                return true;
            }
        };

        let digest = match map.get("digest") {
            Some(Value::String(s)) => Some(s.clone()),
            None | Some(Value::Null) => None,
            Some(_) => {
                report.unsupported.push(non_string_field(path, "digest"));
                return true;
            }
        };

        if tag.is_some() && digest.is_some() {
            report.unsupported.push(UnsupportedFinding {
                path: path.clone(),
                kind: UnsupportedKind::TagAndDigest,
                reason: "both 'tag' and 'digest' are set".to_string(),
            });
            return true;
        }

        // An explicit registry repeated at the head of the repository is
        // redundant and would otherwise double up in the rewritten path
        let repository = match &registry {
            Some(reg) => {
                let prefix = format!("{reg}/");
                repository
                    .strip_prefix(&prefix)
                    .map(str::to_string)
                    .unwrap_or(repository)
            }
            None => repository,
        };

        let mut reference = match ImageReference::from_parts(
            registry.as_deref(),
            &repository,
            tag.as_deref(),
            digest.as_deref(),
        ) {
            Ok(reference) => reference,
            Err(err) => {
                report.unsupported.push(UnsupportedFinding {
                    path: path.clone(),
                    kind: UnsupportedKind::InvalidReference,
                    reason: err.to_string(),
                });
                return true;
            }
        };

        if reference.registry.is_empty() {
            if let Some(global) = &self.global_registry {
                reference.registry = global.clone();
            }
        }
        reference.normalize();

        report.patterns.push(ImagePattern {
            path: path.clone(),
            shape: PatternShape::Map,
            source_registry: normalize_registry(&reference.registry),
            reference,
        });
        true
    }

    fn classify_string(&self, raw: &str, path: &ValuePath, report: &mut ScanReport) {
        let image_key = is_image_like_key(path);

        if contains_template(raw) {
            if image_key {
                report.unsupported.push(UnsupportedFinding {
                    path: path.clone(),
                    kind: UnsupportedKind::TemplateExpression,
                    reason: "value contains a template expression".to_string(),
                });
            } else {
                tracing::debug!(path = %path, "skipping templated string");
            }
            return;
        }

        if image_key {
            // An empty string under an image key means "no image set"
            if raw.trim().is_empty() {
                return;
            }
            match ImageReference::parse(raw) {
                Ok(reference) => {
                    if reference.has_tag_and_digest() {
                        report.unsupported.push(UnsupportedFinding {
                            path: path.clone(),
                            kind: UnsupportedKind::TagAndDigest,
                            reason: "reference carries both a tag and a digest".to_string(),
                        });
                        return;
                    }
                    self.push_string_pattern(reference, path, report);
                }
                Err(err) => report.unsupported.push(UnsupportedFinding {
                    path: path.clone(),
                    kind: UnsupportedKind::InvalidReference,
                    reason: err.to_string(),
                }),
            }
            return;
        }

        // Under arbitrary keys only strings that already look like image
        // references are considered, and failures stay silent: most values
        // are hostnames, file paths or labels.
        if !helmport_core::looks_like_image_string(raw) {
            return;
        }
        let Ok(reference) = ImageReference::parse(raw) else {
            return;
        };
        if reference.has_tag_and_digest() {
            return;
        }
        self.push_string_pattern(reference, path, report);
    }

    fn push_string_pattern(
        &self,
        mut reference: ImageReference,
        path: &ValuePath,
        report: &mut ScanReport,
    ) {
        reference.normalize();
        report.patterns.push(ImagePattern {
            path: path.clone(),
            shape: PatternShape::String,
            source_registry: normalize_registry(&reference.registry),
            reference,
        });
    }
}

fn non_string_field(path: &ValuePath, field: &str) -> UnsupportedFinding {
    UnsupportedFinding {
        path: path.clone(),
        kind: UnsupportedKind::NonStringField,
        reason: format!("field '{field}' must be a string"),
    }
}

/// Does `path` end in a key naming an image?
///
/// Matches `image` and any key ending in `Image` (`sidecarImage`,
/// `initImage`), case-insensitively. Sequence indices are skipped, so
/// `initContainers[0].image` qualifies.
pub fn is_image_like_key(path: &ValuePath) -> bool {
    path.last_key()
        .is_some_and(|key| key.to_ascii_lowercase().ends_with("image"))
}

/// Helm template expressions cannot be rewritten statically
pub fn contains_template(s: &str) -> bool {
    s.contains("{{") && s.contains("}}")
}

/// Read the Bitnami-convention global registry override from a values tree
pub fn global_image_registry(values: &Value) -> Option<String> {
    let registry = values.get("global")?.get("imageRegistry")?.as_str()?;
    let trimmed = registry.trim();
    if trimmed.is_empty() {
        return None;
    }
    if contains_template(trimmed) {
        tracing::warn!("global.imageRegistry contains a template expression, ignoring");
        return None;
    }
    Some(trimmed.to_string())
}
