//! Configuration management for the OCR pipeline.
//!
//! This module provides configuration validation traits and the shared
//! parallelism settings used by the region loop.

pub mod errors;
pub mod parallel;

// Re-export commonly used types
pub use errors::{ConfigError, ConfigValidator, ConfigValidatorExt};
pub use parallel::{EnginePolicy, ParallelPolicy};
