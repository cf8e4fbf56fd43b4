//! Container image references
//!
//! Parsing and normalization of `[registry/]repository[:tag][@digest]`
//! coordinates, plus the registry sanitization used when a source registry
//! becomes a repository path segment.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Registry assumed when a reference names none
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Namespace for official images on the default registry
pub const LIBRARY_NAMESPACE: &str = "library";

/// Tag assumed when a reference carries neither tag nor digest
pub const DEFAULT_TAG: &str = "latest";

static REPOSITORY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:[._-][a-z0-9]+)*(?:/[a-z0-9]+(?:[._-][a-z0-9]+)*)*$")
        .expect("valid regex")
});

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]{0,127}$").expect("valid regex"));

static DIGEST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^sha256:[a-fA-F0-9]{64}$").expect("valid regex"));

static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*(?::[0-9]+)?$")
        .expect("valid regex")
});

static PORT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid regex"));

/// A container image coordinate
///
/// `registry` may be empty directly after [`ImageReference::parse`]; after
/// [`ImageReference::normalize`] it always names a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub registry: String,
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse a raw reference string into its components
    ///
    /// Purely structural: no default registry, tag, or namespace is
    /// substituted here (see [`ImageReference::normalize`]). A reference
    /// carrying both a tag and a digest parses successfully with both
    /// fields set; callers decide whether that combination is acceptable.
    pub fn parse(reference: &str) -> Result<Self> {
        let raw = reference.trim();

        let invalid = |message: &str| CoreError::InvalidImageReference {
            reference: reference.to_string(),
            message: message.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("empty reference"));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(invalid("contains whitespace"));
        }
        if raw.contains("://") {
            return Err(invalid("looks like a URL, not an image reference"));
        }
        if raw.starts_with('/') || raw.starts_with("./") || raw.starts_with("../") {
            return Err(invalid("looks like a filesystem path, not an image reference"));
        }

        // Digest comes after '@'
        let (rest, digest) = match raw.split_once('@') {
            Some((name, digest)) => {
                if !DIGEST_RE.is_match(digest) {
                    return Err(invalid("invalid digest (expected sha256:<64 hex chars>)"));
                }
                (name, Some(digest.to_string()))
            }
            None => (raw, None),
        };

        // Tag is after the last ':' that follows the last '/'
        let name_start = rest.rfind('/').map_or(0, |idx| idx + 1);
        let (name, tag) = match rest[name_start..].find(':') {
            Some(rel) => {
                let split = name_start + rel;
                let tag = &rest[split + 1..];
                if !TAG_RE.is_match(tag) {
                    return Err(invalid("invalid tag"));
                }
                (&rest[..split], Some(tag.to_string()))
            }
            None => (rest, None),
        };

        if name.is_empty() {
            return Err(invalid("missing repository"));
        }

        // A first segment that looks like a host is the registry
        let (registry, repository) = match name.split_once('/') {
            Some((first, path)) if looks_like_host(first) => {
                if !is_valid_host(first) {
                    return Err(invalid("invalid registry host"));
                }
                (first.to_lowercase(), path)
            }
            _ => (String::new(), name),
        };

        if !REPOSITORY_RE.is_match(repository) {
            return Err(invalid("invalid repository (lowercase alphanumerics and . _ - / only)"));
        }

        Ok(Self {
            registry,
            repository: repository.to_string(),
            tag,
            digest,
        })
    }

    /// Apply the conventional defaults in place
    ///
    /// - empty registry becomes `docker.io`; `index.docker.io` is folded
    ///   into `docker.io`; the registry is lowercased (ports kept)
    /// - a bare repository on the default registry gains the `library/`
    ///   namespace
    /// - a reference with neither tag nor digest gains the `latest` tag
    pub fn normalize(&mut self) {
        let registry = self.registry.trim().to_lowercase();
        self.registry = if registry.is_empty() || registry == "index.docker.io" {
            DEFAULT_REGISTRY.to_string()
        } else {
            registry
        };

        if self.registry == DEFAULT_REGISTRY && !self.repository.contains('/') {
            self.repository = format!("{LIBRARY_NAMESPACE}/{}", self.repository);
        }

        if self.tag.is_none() && self.digest.is_none() {
            self.tag = Some(DEFAULT_TAG.to_string());
        }
    }

    /// Parse and normalize in one step
    pub fn parse_normalized(reference: &str) -> Result<Self> {
        let mut parsed = Self::parse(reference)?;
        parsed.normalize();
        Ok(parsed)
    }

    /// Build a reference from already-separated components
    ///
    /// Each component is validated against the same grammar [`parse`] uses.
    /// With no explicit registry, a host-like first repository segment is
    /// promoted to the registry, exactly as in the string form. An explicit
    /// registry is taken verbatim (lowercased), so single-label hosts that
    /// a string parse could not distinguish from a namespace are preserved.
    ///
    /// [`parse`]: ImageReference::parse
    pub fn from_parts(
        registry: Option<&str>,
        repository: &str,
        tag: Option<&str>,
        digest: Option<&str>,
    ) -> Result<Self> {
        let invalid = |message: String| CoreError::InvalidImageReference {
            reference: format!(
                "{}{repository}{}{}",
                registry.map(|r| format!("{r}/")).unwrap_or_default(),
                tag.map(|t| format!(":{t}")).unwrap_or_default(),
                digest.map(|d| format!("@{d}")).unwrap_or_default(),
            ),
            message,
        };

        let registry = match registry.map(str::trim) {
            Some(reg) if !reg.is_empty() => {
                let reg = reg.to_lowercase();
                if !is_valid_host(&reg) {
                    return Err(invalid(format!("invalid registry host '{reg}'")));
                }
                reg
            }
            _ => String::new(),
        };

        let (registry, repository) = if registry.is_empty() {
            match repository.split_once('/') {
                Some((first, path)) if looks_like_host(first) => {
                    if !is_valid_host(first) {
                        return Err(invalid(format!("invalid registry host '{first}'")));
                    }
                    (first.to_lowercase(), path)
                }
                _ => (registry, repository),
            }
        } else {
            (registry, repository)
        };

        if repository.is_empty() {
            return Err(invalid("missing repository".to_string()));
        }
        if !REPOSITORY_RE.is_match(repository) {
            return Err(invalid(format!(
                "invalid repository '{repository}' (lowercase alphanumerics and . _ - / only)"
            )));
        }
        if let Some(tag) = tag {
            if !TAG_RE.is_match(tag) {
                return Err(invalid(format!("invalid tag '{tag}'")));
            }
        }
        if let Some(digest) = digest {
            if !DIGEST_RE.is_match(digest) {
                return Err(invalid(format!(
                    "invalid digest '{digest}' (expected sha256:<64 hex chars>)"
                )));
            }
        }

        Ok(Self {
            registry,
            repository: repository.to_string(),
            tag: tag.map(str::to_string),
            digest: digest.map(str::to_string),
        })
    }

    pub fn has_tag_and_digest(&self) -> bool {
        self.tag.is_some() && self.digest.is_some()
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.registry.is_empty() {
            write!(f, "{}/", self.registry)?;
        }
        write!(f, "{}", self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

fn looks_like_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment.eq_ignore_ascii_case("localhost")
}

fn is_valid_host(segment: &str) -> bool {
    if segment.eq_ignore_ascii_case("localhost") {
        return true;
    }
    if let Some((host, port)) = segment.rsplit_once(':') {
        if PORT_RE.is_match(port) {
            return !host.is_empty() && DOMAIN_RE.is_match(host);
        }
    }
    DOMAIN_RE.is_match(segment)
}

/// Canonical form of a registry name for comparisons
///
/// Lowercases, folds `index.docker.io` into `docker.io`, strips any path
/// component and numeric port. An empty input is the default registry.
pub fn normalize_registry(registry: &str) -> String {
    let trimmed = registry.trim().to_lowercase();
    if trimmed.is_empty() {
        return DEFAULT_REGISTRY.to_string();
    }
    if trimmed == DEFAULT_REGISTRY || trimmed == "index.docker.io" {
        return DEFAULT_REGISTRY.to_string();
    }

    let host = match trimmed.split_once('/') {
        Some((host, _path)) => host,
        None => &trimmed,
    };

    match host.rsplit_once(':') {
        Some((name, port)) if PORT_RE.is_match(port) => name.to_string(),
        _ => host.to_string(),
    }
}

/// Make a registry name safe for use as a repository path segment
///
/// Drops any numeric port, then strips `.` and `-`. The default registry
/// and its aliases become `dockerio`.
pub fn sanitize_registry_for_path(registry: &str) -> String {
    let normalized = registry.trim().to_lowercase();
    if normalized.is_empty() || normalized == DEFAULT_REGISTRY || normalized == "index.docker.io" {
        return "dockerio".to_string();
    }

    let without_port = match normalized.rsplit_once(':') {
        Some((name, port)) if PORT_RE.is_match(port) => name.to_string(),
        _ => normalized,
    };

    without_port.replace(['.', '-'], "")
}

/// Quick test for "could this string be an image reference at all"
///
/// Used before attempting a full parse on strings found under arbitrary
/// keys: the string must carry at least one reference separator and must
/// not look like a filesystem path or URL.
pub fn looks_like_image_string(s: &str) -> bool {
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return false;
    }
    if !s.contains(['/', ':', '@']) {
        return false;
    }
    if s.contains("://") || s.starts_with('/') || s.starts_with("./") || s.starts_with("../") {
        return false;
    }
    true
}
