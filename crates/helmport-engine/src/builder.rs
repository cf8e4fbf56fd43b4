//! Override tree construction
//!
//! The builder turns recognized image patterns into a sparse values tree
//! holding only the rewritten coordinates. Helm merges that tree over the
//! chart's own values, so everything the builder does not write (pull
//! policies, resource blocks, sibling keys) keeps its original value.

use std::collections::HashMap;

use indexmap::IndexSet;
use serde_yaml::{Mapping, Value};

use helmport_core::{ChartDependency, ImageReference, PathSegment, ValuePath, set_at};

use crate::error::Result;
use crate::mapping::Resolver;
use crate::scan::{ImagePattern, PatternShape, UnsupportedFinding};
use crate::strategy::RewriteStrategy;

/// Builds the override tree for one run
///
/// One builder per invocation; it owns no state that survives `build`.
pub struct OverrideBuilder<'a> {
    resolver: &'a Resolver,
    strategy: &'a dyn RewriteStrategy,
    strict: bool,
    aliases: HashMap<String, String>,
}

impl<'a> OverrideBuilder<'a> {
    pub fn new(resolver: &'a Resolver, strategy: &'a dyn RewriteStrategy) -> Self {
        Self {
            resolver,
            strategy,
            strict: false,
            aliases: HashMap::new(),
        }
    }

    /// Abort instead of skipping when the scan saw unsupported structures
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Register the chart's dependencies so overrides for a subchart nest
    /// under its declared alias rather than its registered name.
    pub fn with_dependencies(mut self, dependencies: &[ChartDependency]) -> Self {
        for dependency in dependencies {
            if let Some(alias) = &dependency.alias {
                if alias != &dependency.name {
                    self.aliases.insert(dependency.name.clone(), alias.clone());
                }
            }
        }
        self
    }

    /// Build the override tree for `patterns`, in their given order.
    ///
    /// `unsupported` holds the findings from the same scan; in strict mode
    /// any finding aborts the run before a single node is written.
    pub fn build(
        &self,
        patterns: &[ImagePattern],
        unsupported: &[UnsupportedFinding],
    ) -> Result<Value> {
        if self.strict && !unsupported.is_empty() {
            return Err(crate::error::EngineError::UnsupportedStructures {
                details: unsupported.iter().map(ToString::to_string).collect(),
            });
        }

        let mut root = Value::Mapping(Mapping::new());
        let mut written: IndexSet<ValuePath> = IndexSet::new();

        for pattern in patterns {
            let path = self.aliased_path(&pattern.path);
            if !written.insert(path.clone()) {
                tracing::warn!(path = %path, "duplicate override path, keeping the first");
                continue;
            }

            let target = self.resolver.resolve(&pattern.reference)?;
            let rewritten = self.strategy.rewrite(&pattern.reference, &target);
            let node = match pattern.shape {
                PatternShape::Map => map_override(&rewritten),
                PatternShape::String => Value::String(rewritten.to_string()),
            };
            set_at(&mut root, &path, node)?;
        }

        Ok(root)
    }

    fn aliased_path(&self, path: &ValuePath) -> ValuePath {
        if self.aliases.is_empty() {
            return path.clone();
        }
        let mut segments = path.segments().to_vec();
        if let Some(PathSegment::Key(first)) = segments.first_mut() {
            if let Some(alias) = self.aliases.get(first.as_str()) {
                *first = alias.clone();
            }
        }
        ValuePath::from(segments)
    }
}

/// Map-form override node: exactly `registry`, `repository` and the
/// tag or digest, nothing else.
fn map_override(reference: &ImageReference) -> Value {
    let mut map = Mapping::new();
    map.insert("registry".into(), reference.registry.clone().into());
    map.insert("repository".into(), reference.repository.clone().into());
    if let Some(tag) = &reference.tag {
        map.insert("tag".into(), tag.clone().into());
    }
    if let Some(digest) = &reference.digest {
        map.insert("digest".into(), digest.clone().into());
    }
    Value::Mapping(map)
}
