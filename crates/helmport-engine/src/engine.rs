//! Run orchestration: scan, resolve, build, rules
//!
//! `OverrideEngine` wires the pipeline together for one chart:
//!
//! ```text
//! values tree -> scanner -> eligibility filter -> builder -> rules
//! ```
//!
//! The engine is configured once (resolver, strategy, rules) and can then
//! run any number of charts; each run is an independent, synchronous
//! computation with no shared mutable state.

use serde::Serialize;
use serde_yaml::Value;

use helmport_core::LoadedChart;

use crate::builder::OverrideBuilder;
use crate::context::RunContext;
use crate::error::Result;
use crate::mapping::Resolver;
use crate::rules::RuleSet;
use crate::scan::{
    ImagePattern, Scanner, UnsupportedFinding, global_image_registry,
};
use crate::strategy::{PrefixSourceRegistry, RewriteStrategy};

/// Everything one override run produced
#[derive(Debug)]
pub struct OverrideOutcome {
    /// The sparse override tree; an empty mapping when nothing matched
    pub overrides: Value,
    /// Patterns recognized in the chart, eligible or not
    pub images_found: usize,
    /// Patterns actually rewritten into the override tree
    pub images_rewritten: usize,
    /// Recognized patterns whose registry was out of scope
    pub skipped: Vec<ImagePattern>,
    /// Structures the scanner could not handle
    pub unsupported: Vec<UnsupportedFinding>,
    /// Names of the rules that fired
    pub rules_applied: Vec<&'static str>,
}

impl OverrideOutcome {
    /// A run that found nothing to rewrite is a valid, empty result
    pub fn is_empty(&self) -> bool {
        self.images_rewritten == 0
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.overrides)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.overrides)?)
    }
}

/// What `inspect` reports about a chart
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub chart: ChartSummary,
    /// Distinct source registries of the listed images, sorted
    pub registries: Vec<String>,
    pub images: Vec<ImagePattern>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unsupported: Vec<UnsupportedFinding>,
}

#[derive(Debug, Serialize)]
pub struct ChartSummary {
    pub name: String,
    pub version: String,
}

/// Scan a chart and summarize what an override run would see.
///
/// With a context, images are filtered the way `override` would filter
/// them, except that an empty source list means "show everything" here.
pub fn inspect_chart(chart: &LoadedChart, context: Option<&RunContext>) -> InspectReport {
    let scanner = Scanner::new().with_global_registry(global_image_registry(&chart.values));
    let report = scanner.scan(&chart.values);

    let images: Vec<ImagePattern> = report
        .patterns
        .into_iter()
        .filter(|pattern| match context {
            None => true,
            Some(ctx) => {
                let registry = &pattern.source_registry;
                if ctx.excludes().iter().any(|e| e == registry) {
                    return false;
                }
                ctx.sources().is_empty() || ctx.sources().iter().any(|s| s == registry)
            }
        })
        .collect();

    let mut registries: Vec<String> = images.iter().map(|p| p.source_registry.clone()).collect();
    registries.sort();
    registries.dedup();

    InspectReport {
        chart: ChartSummary {
            name: chart.metadata.name.clone(),
            version: chart.metadata.version.clone(),
        },
        registries,
        images,
        unsupported: report.unsupported,
    }
}

/// The override pipeline, configured once per process
pub struct OverrideEngine {
    resolver: Resolver,
    strategy: Box<dyn RewriteStrategy>,
    rules: RuleSet,
}

impl OverrideEngine {
    /// Engine with the default strategy and the standard rule set
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            strategy: Box::new(PrefixSourceRegistry),
            rules: RuleSet::standard(),
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn RewriteStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Run the full pipeline for one chart
    pub fn run(&self, chart: &LoadedChart, context: &RunContext) -> Result<OverrideOutcome> {
        let scanner =
            Scanner::new().with_global_registry(global_image_registry(&chart.values));
        let report = scanner.scan(&chart.values);

        let (eligible, skipped): (Vec<ImagePattern>, Vec<ImagePattern>) = report
            .patterns
            .into_iter()
            .partition(|pattern| context.is_source_eligible(&pattern.source_registry));
        for pattern in &skipped {
            tracing::debug!(
                path = %pattern.path,
                registry = %pattern.source_registry,
                "image out of scope, skipping"
            );
        }

        let images_found = eligible.len() + skipped.len();

        let builder = OverrideBuilder::new(&self.resolver, self.strategy.as_ref())
            .with_strict(context.strict)
            .with_dependencies(&chart.metadata.dependencies);
        let mut overrides = builder.build(&eligible, &report.unsupported)?;

        let rules_applied = if context.rules_enabled && !eligible.is_empty() {
            self.rules.apply(&chart.metadata, &mut overrides)
        } else {
            Vec::new()
        };

        Ok(OverrideOutcome {
            overrides,
            images_found,
            images_rewritten: eligible.len(),
            skipped,
            unsupported: report.unsupported,
            rules_applied,
        })
    }
}
