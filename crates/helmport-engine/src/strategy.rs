//! Repository path layout under the target registry

use helmport_core::{ImageReference, sanitize_registry_for_path};

use crate::error::{EngineError, Result};

/// Strategy name used when none is requested
pub const DEFAULT_STRATEGY: &str = "prefix-source-registry";

/// Computes where an image lives under its resolved target registry
///
/// Strategies are pure: the same reference and target always give the
/// same result. The target registry string is carried into the result
/// verbatim, including any namespace suffix it has.
pub trait RewriteStrategy: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn rewrite(&self, original: &ImageReference, target_registry: &str) -> ImageReference;
}

/// Default layout: the sanitized source registry becomes the leading
/// repository segment, so images from different sources cannot collide.
///
/// `docker.io/library/nginx` under `registry.local` becomes
/// `registry.local/dockerio/library/nginx`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixSourceRegistry;

impl RewriteStrategy for PrefixSourceRegistry {
    fn name(&self) -> &'static str {
        "prefix-source-registry"
    }

    fn rewrite(&self, original: &ImageReference, target_registry: &str) -> ImageReference {
        ImageReference {
            registry: target_registry.to_string(),
            repository: format!(
                "{}/{}",
                sanitize_registry_for_path(&original.registry),
                original.repository
            ),
            tag: original.tag.clone(),
            digest: original.digest.clone(),
        }
    }
}

/// Single-level layout for registries that do not allow nested
/// repositories: path separators collapse to dashes.
///
/// `quay.io/jetstack/cert-manager` becomes
/// `quayio-jetstack-cert-manager`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flat;

impl RewriteStrategy for Flat {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn rewrite(&self, original: &ImageReference, target_registry: &str) -> ImageReference {
        ImageReference {
            registry: target_registry.to_string(),
            repository: format!(
                "{}-{}",
                sanitize_registry_for_path(&original.registry),
                original.repository.replace('/', "-")
            ),
            tag: original.tag.clone(),
            digest: original.digest.clone(),
        }
    }
}

/// Look a strategy up by its CLI name
pub fn from_name(name: &str) -> Result<Box<dyn RewriteStrategy>> {
    match name {
        "prefix-source-registry" => Ok(Box::new(PrefixSourceRegistry)),
        "flat" => Ok(Box::new(Flat)),
        _ => Err(EngineError::UnknownStrategy {
            name: name.to_string(),
        }),
    }
}
