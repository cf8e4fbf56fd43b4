//! Standard exit codes for CLI operations
//!
//! Scripts and CI pipelines branch on these values, so they are part of
//! the public contract and only change with a major release.

#![allow(dead_code)]

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// Missing or invalid required flags
pub const MISSING_FLAGS: i32 = 1;

/// Input configuration error - unusable mappings file or flag values
pub const INPUT_CONFIG_ERROR: i32 = 2;

/// Chart not found at the given path
pub const CHART_NOT_FOUND: i32 = 4;

/// Chart processing failed during scanning or override generation
pub const PROCESSING_FAILED: i32 = 10;

/// Unsupported image structure found while running in strict mode
pub const UNSUPPORTED_STRUCTURE: i32 = 12;

/// External renderer failed (reserved for subprocess integration)
pub const RENDERER_FAILED: i32 = 16;

/// IO error - could not write the requested output
pub const IO_ERROR: i32 = 20;
