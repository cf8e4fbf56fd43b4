//! Run context: which registries are in scope for an override run

use helmport_core::normalize_registry;

/// Scoping and policy for a single override run.
///
/// The scanner reports every image it can recognize; the context decides
/// which of those are actually rewritten. Exclusions win over sources,
/// and an empty source list makes nothing eligible.
#[derive(Debug, Clone)]
pub struct RunContext {
    sources: Vec<String>,
    excludes: Vec<String>,
    /// Abort on unsupported structures instead of skipping them
    pub strict: bool,
    /// Run chart-specific rules after the override tree is built
    pub rules_enabled: bool,
}

impl RunContext {
    /// Create a context from raw registry lists.
    ///
    /// Both lists are normalized on the way in, so `index.docker.io`,
    /// `DOCKER.IO` and `docker.io` all refer to the same source.
    pub fn new(sources: &[String], excludes: &[String]) -> Self {
        Self {
            sources: sources.iter().map(|s| normalize_registry(s)).collect(),
            excludes: excludes.iter().map(|s| normalize_registry(s)).collect(),
            strict: false,
            rules_enabled: true,
        }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_rules(mut self, enabled: bool) -> Self {
        self.rules_enabled = enabled;
        self
    }

    /// Whether an image from `registry` should be rewritten.
    ///
    /// The registry is compared in normalized form. Exclusions take
    /// precedence over sources.
    pub fn is_source_eligible(&self, registry: &str) -> bool {
        let normalized = normalize_registry(registry);
        if self.excludes.iter().any(|e| e == &normalized) {
            return false;
        }
        self.sources.iter().any(|s| s == &normalized)
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }
}
