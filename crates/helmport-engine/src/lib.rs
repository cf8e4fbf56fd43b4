//! Helmport Engine - Image detection and override generation
//!
//! This crate implements the override pipeline for chart values:
//! - `Scanner`: finds image coordinates (map and string form) in a values tree
//! - `Resolver` + `MappingConfig`: route source registries to targets
//! - `RewriteStrategy`: lay repositories out under the target registry
//! - `OverrideBuilder`: construct the sparse override tree
//! - `RuleSet`: chart-family adjustments applied after the build
//! - `OverrideEngine`: wire the above into one run

pub mod builder;
pub mod context;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod rules;
pub mod scan;
pub mod strategy;

pub use builder::OverrideBuilder;
pub use context::RunContext;
pub use engine::{ChartSummary, InspectReport, OverrideEngine, OverrideOutcome, inspect_chart};
pub use error::{EngineError, Result};
pub use mapping::{MappingConfig, RegistryMapping, Resolver, render_config_skeleton};
pub use rules::{Confidence, Detection, Provider, Rule, RuleSet, detect_provider};
pub use scan::{
    ImagePattern, PatternShape, ScanReport, Scanner, UnsupportedFinding, UnsupportedKind,
    global_image_registry,
};
pub use strategy::{DEFAULT_STRATEGY, Flat, PrefixSourceRegistry, RewriteStrategy};
