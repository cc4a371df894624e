//! Capability contracts for the external inference engines.
//!
//! The pipeline treats every model as an opaque engine with a single
//! predict-style call. Engines take `&mut self` so that implementations
//! wrapping non-thread-safe native sessions are legal; the pipeline serializes
//! access through [`crate::core::EnginePool`].
//!
//! Closures with the matching signature implement each trait, which keeps
//! tests and small integrations free of boilerplate:
//!
//! ```rust
//! use oar_region_ocr::core::{OCRError, traits::RecognizerEngine};
//! use oar_region_ocr::domain::RecognizedText;
//! use image::RgbImage;
//!
//! let mut engine = |_crop: &RgbImage| -> Result<RecognizedText, OCRError> {
//!     Ok(RecognizedText::new("42", vec![0.9, 0.8]))
//! };
//! let out = engine.recognize(&RgbImage::new(8, 4)).unwrap();
//! assert_eq!(out.text, "42");
//! ```

use image::RgbImage;

use crate::core::OCRError;
use crate::domain::{DetectedRegion, OrientationPrediction, RecognizedText};

/// Locates text regions in a full image.
pub trait DetectorEngine: Send {
    /// Detects regions, in the order the detector emits them.
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<DetectedRegion>, OCRError>;

    /// Name used in logs and error reports.
    fn name(&self) -> &str {
        "detector"
    }
}

/// Transcribes a single cropped text region.
pub trait RecognizerEngine: Send {
    /// Recognizes the text of a crop with per-character confidences.
    fn recognize(&mut self, image: &RgbImage) -> Result<RecognizedText, OCRError>;

    /// Name used in logs and error reports.
    fn name(&self) -> &str {
        "recognizer"
    }
}

/// Classifies the orientation of an image or crop.
pub trait OrientationEngine: Send {
    /// Predicts one of the four orientation classes.
    fn classify(&mut self, image: &RgbImage) -> Result<OrientationPrediction, OCRError>;

    /// Name used in logs and error reports.
    fn name(&self) -> &str {
        "orientation_classifier"
    }
}

impl<F> DetectorEngine for F
where
    F: FnMut(&RgbImage) -> Result<Vec<DetectedRegion>, OCRError> + Send,
{
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<DetectedRegion>, OCRError> {
        self(image)
    }
}

impl<F> RecognizerEngine for F
where
    F: FnMut(&RgbImage) -> Result<RecognizedText, OCRError> + Send,
{
    fn recognize(&mut self, image: &RgbImage) -> Result<RecognizedText, OCRError> {
        self(image)
    }
}

impl<F> OrientationEngine for F
where
    F: FnMut(&RgbImage) -> Result<OrientationPrediction, OCRError> + Send,
{
    fn classify(&mut self, image: &RgbImage) -> Result<OrientationPrediction, OCRError> {
        self(image)
    }
}
