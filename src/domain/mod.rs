//! Domain types for the region OCR pipeline.
//!
//! This module holds the records exchanged with inference engines and the
//! orientation helpers shared by the orientation stage.

pub mod orientation;
pub mod text_region;

pub use orientation::{OrientationAngle, OrientationPrediction, apply_orientation};
pub use text_region::{DetectedRegion, RecognizedText, UNSCORED};
