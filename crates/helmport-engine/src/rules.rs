//! Chart-specific rules applied after the override tree is built
//!
//! Some chart families need extra values alongside rewritten images. The
//! canonical case: Bitnami templates verify image origins and refuse to
//! render a non-default registry unless
//! `global.security.allowInsecureImages` is set.
//!
//! Rules are an ordered list of `{matches, apply}` pairs evaluated once
//! per run. They only ever see chart metadata and the finished override
//! tree, never the patterns, and the whole list is skipped when rules are
//! disabled.

use serde_yaml::Value;

use helmport_core::{ChartMetadata, ValuePath, set_at};

/// How sure the provider detection is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

/// Chart families with known rule sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Unknown,
    Bitnami,
}

/// Outcome of provider detection, with the evidence that led to it
#[derive(Debug, Clone)]
pub struct Detection {
    pub provider: Provider,
    pub confidence: Confidence,
    pub indicators: Vec<String>,
}

impl Detection {
    fn unknown() -> Self {
        Self {
            provider: Provider::Unknown,
            confidence: Confidence::None,
            indicators: Vec::new(),
        }
    }
}

/// Identify the chart's provider family from its metadata
pub fn detect_provider(metadata: &ChartMetadata) -> Detection {
    let bitnami = detect_bitnami(metadata);
    if bitnami.confidence > Confidence::None {
        return bitnami;
    }
    Detection::unknown()
}

fn detect_bitnami(metadata: &ChartMetadata) -> Detection {
    let mut indicators = Vec::new();

    if let Some(home) = &metadata.home {
        if home.to_lowercase().contains("bitnami.com") {
            indicators.push("home field contains bitnami.com".to_string());
        }
    }

    for source in &metadata.sources {
        if source.to_lowercase().contains("github.com/bitnami/charts") {
            indicators.push("sources reference github.com/bitnami/charts".to_string());
        }
    }

    for maintainer in &metadata.maintainers {
        let name = maintainer.name.to_lowercase();
        if name.contains("bitnami") || name.contains("broadcom") {
            indicators.push("maintainer references Bitnami/Broadcom".to_string());
        }
        if let Some(url) = &maintainer.url {
            let url = url.to_lowercase();
            if url.contains("bitnami") || url.contains("broadcom") {
                indicators.push("maintainer URL references Bitnami/Broadcom".to_string());
            }
        }
    }

    for dependency in &metadata.dependencies {
        if dependency.name.to_lowercase().contains("bitnami-common") {
            indicators.push("dependency references bitnami-common".to_string());
        }
    }

    // Sorted so the indicator list is stable across runs
    let mut annotations: Vec<(&String, &String)> = metadata.annotations.iter().collect();
    annotations.sort_by_key(|(key, _)| key.as_str());
    for (key, value) in annotations {
        let key = key.to_lowercase();
        if !key.contains("copyright") && !key.contains("license") {
            continue;
        }
        let value = value.to_lowercase();
        if value.contains("bitnami") || value.contains("broadcom") {
            indicators.push("annotations contain Bitnami/Broadcom copyright".to_string());
        }
    }

    let mut confidence = match indicators.len() {
        0 => Confidence::None,
        1 => Confidence::Low,
        2 => Confidence::Medium,
        _ => Confidence::High,
    };

    // Home page plus maintainer together identify the vendor outright
    let has_home = indicators.iter().any(|i| i.contains("home field"));
    let has_maintainer = indicators.iter().any(|i| i.contains("maintainer"));
    if indicators.len() >= 2 && has_home && has_maintainer {
        confidence = Confidence::High;
    }

    tracing::debug!(
        chart = %metadata.name,
        ?confidence,
        indicators = indicators.len(),
        "bitnami detection"
    );

    Detection {
        provider: Provider::Bitnami,
        confidence,
        indicators,
    }
}

/// One post-build adjustment to the override tree
pub trait Rule: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Should this rule run for the given chart?
    fn matches(&self, metadata: &ChartMetadata) -> bool;

    /// Adjust the finished override tree. Rules must not fail the run; a
    /// write that cannot land (conflicting node shape) is logged and
    /// dropped.
    fn apply(&self, overrides: &mut Value);
}

/// Lets Bitnami templates accept rewritten image registries
#[derive(Debug, Default)]
pub struct BitnamiSecurityBypass;

impl Rule for BitnamiSecurityBypass {
    fn name(&self) -> &'static str {
        "bitnami-security-bypass"
    }

    fn matches(&self, metadata: &ChartMetadata) -> bool {
        let detection = detect_bitnami(metadata);
        detection.confidence >= Confidence::Medium
    }

    fn apply(&self, overrides: &mut Value) {
        let path = ValuePath::root()
            .push_key("global")
            .push_key("security")
            .push_key("allowInsecureImages");
        if let Err(err) = set_at(overrides, &path, Value::Bool(true)) {
            tracing::warn!(rule = self.name(), %err, "rule write skipped");
        }
    }
}

/// The ordered rule list for a run
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    /// The built-in rules, in evaluation order
    pub fn standard() -> Self {
        Self {
            rules: vec![Box::new(BitnamiSecurityBypass)],
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Run every matching rule against the override tree; returns the
    /// names of the rules that applied.
    pub fn apply(&self, metadata: &ChartMetadata, overrides: &mut Value) -> Vec<&'static str> {
        let mut applied = Vec::new();
        for rule in &self.rules {
            if rule.matches(metadata) {
                rule.apply(overrides);
                applied.push(rule.name());
            }
        }
        applied
    }
}
