//! # OAR Region OCR
//!
//! Pipeline orchestration for region-based OCR. Text detection, orientation
//! classification and text-line recognition are supplied as opaque inference
//! engines; this crate turns the detector's boxes into well-formed
//! recognition inputs, corrects their orientation, cleans the recognizer's
//! output, and assembles the results in detection order.
//!
//! ## Features
//!
//! - Short-side region expansion with clamping to the image
//! - Heuristic or classifier-driven orientation correction
//! - Low-confidence character filtering
//! - Parallel region processing with bounded engine pools
//! - Cooperative cancellation between regions
//! - TOML and JSON configuration files
//!
//! ## Modules
//!
//! * [`core`] - Engine traits, engine pools, error handling and configuration validation
//! * [`domain`] - Detection, recognition and orientation records
//! * [`pipeline`] - The region pipeline, its stages and results
//! * [`processors`] - Region geometry
//! * [`utils`] - Image loading and cropping helpers
//!
//! ## Quick Start
//!
//! ```rust
//! use oar_region_ocr::prelude::*;
//! use image::RgbImage;
//!
//! # fn main() -> Result<(), OCRError> {
//! let ocr = RegionOCRBuilder::new()
//!     .detector(|_: &RgbImage| -> OcrResult<Vec<DetectedRegion>> {
//!         let rect = Rect::new(10.0, 10.0, 60.0, 12.0);
//!         Ok(vec![DetectedRegion::new(RegionGeometry::Pixel(rect))])
//!     })
//!     .recognizer(|_: &RgbImage| -> OcrResult<RecognizedText> {
//!         Ok(RecognizedText::new("EXIT", vec![0.98, 0.97, 0.99, 0.95]))
//!     })
//!     .build()?;
//!
//! let result = ocr.run(&RgbImage::new(128, 64))?;
//! assert_eq!(result.all_text(), vec!["EXIT"]);
//! println!("{}", result.to_json());
//! # Ok(())
//! # }
//! ```
//!
//! ### TOML Configuration
//!
//! ```rust,no_run
//! use oar_region_ocr::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // [detection]
//! // min_detection_score = 0.3
//! //
//! // [orientation]
//! // mode = "heuristic"
//! // aspect_ratio_threshold = 1.5
//! let config = ConfigLoader::load_from_file(Path::new("pipeline.toml"))?;
//! let builder = RegionOCRBuilder::from_config(config);
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod core;
pub mod domain;

pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use oar_region_ocr::prelude::*;
/// ```
///
/// Included items cover building and running a pipeline. Stage-level types
/// live in [`crate::pipeline::stages`].
pub mod prelude {
    // Pipeline (essential)
    pub use crate::pipeline::{
        CancellationToken, ConfigLoader, DetectionEntry, DetectionResult, RegionOCR,
        RegionOCRBuilder, RegionOCRConfig,
    };

    // Engine contracts and their records
    pub use crate::core::traits::{DetectorEngine, OrientationEngine, RecognizerEngine};
    pub use crate::domain::{
        DetectedRegion, OrientationAngle, OrientationPrediction, RecognizedText,
    };
    pub use crate::processors::{BoundingBox, Point, Rect, RegionGeometry};

    // Error Handling (essential)
    pub use crate::core::{OCRError, OcrResult};

    // Image Utility (minimal)
    pub use crate::utils::{load_image, load_images};
}
