//! Stage processors for the region OCR pipeline.
//!
//! Each stage covers one step of the per-image flow:
//!
//! - [`text_detection`] runs the detector and applies the skip policy
//! - [`cropping`] expands and crops each region
//! - [`orientation`] rotates crops upright
//! - [`recognition`] transcribes crops and filters low-confidence characters
//!
//! The orchestrator in [`crate::pipeline::oarocr`] wires them together.

pub mod cropping;
pub mod orientation;
pub mod recognition;
pub mod text_detection;
mod types;

pub use cropping::{CroppingConfig, RegionExtractor};
pub use orientation::{
    ClassifierScope, NormalizedCrop, OrientationConfig, OrientationMode, OrientationNormalizer,
    OrientationPolicy, is_vertical,
};
pub use recognition::{RecognitionFilterConfig, RecognitionStage, filter_low_confidence};
pub use text_detection::{TextDetectionConfig, TextDetectionResult, TextDetectionStageProcessor};
pub use types::{StageMetrics, StageResult};
