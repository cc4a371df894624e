//! The OCR pipeline module.
//!
//! This module provides the pipeline that turns detector output into
//! located, upright, transcribed text regions: detection, region cropping,
//! orientation correction, recognition and post-filtering.

mod config;
pub mod oarocr;
pub mod stages;

// Re-export the main OCR pipeline components for easier access
pub use config::{ConfigFormat, ConfigLoader};
pub use oarocr::{
    CancellationToken, DetectionEntry, DetectionResult, ErrorMetrics, PipelineStats, RegionOCR,
    RegionOCRBuilder, RegionOCRConfig,
};
pub use stages::{StageMetrics, StageResult};
