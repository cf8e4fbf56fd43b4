//! Helmport Core - Shared types for the chart image rewriting tool
//!
//! This crate provides the foundational types used throughout helmport:
//! - `ImageReference`: parsed container image coordinates
//! - `ValuePath`: key/index paths into a chart's values tree
//! - `LoadedChart`: chart metadata plus its default values
//! - Tree helpers: get/set by path, deep merge

pub mod chart;
pub mod error;
pub mod image;
pub mod path;

pub use chart::{ChartDependency, ChartMetadata, LoadedChart, Maintainer};
pub use error::{CoreError, Result};
pub use image::{
    DEFAULT_REGISTRY, DEFAULT_TAG, ImageReference, LIBRARY_NAMESPACE, looks_like_image_string,
    normalize_registry, sanitize_registry_for_path,
};
pub use path::{PathSegment, ValuePath, deep_merge, get_at, set_at};
