//! Error types for the OCR pipeline.
//!
//! This module defines the errors that can occur while running the region
//! pipeline: degenerate region geometry, inference engine faults, invalid
//! configuration, cancellation, and the image/IO errors of the surrounding
//! utilities. Region-local errors (`InvalidRegion`, `Inference`) are caught by
//! the orchestrator and never abort a whole image.

use thiserror::Error;

/// Enum representing the per-region stages of the OCR pipeline.
///
/// Used to tag region failures so that reporters and metrics can tell which
/// step of the region loop went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingStage {
    /// Full-image text detection.
    Detection,
    /// Region expansion and cropping.
    Cropping,
    /// Orientation classification or correction.
    Orientation,
    /// Text recognition.
    Recognition,
    /// Recognition post-filtering.
    PostProcessing,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Detection => write!(f, "detection"),
            ProcessingStage::Cropping => write!(f, "cropping"),
            ProcessingStage::Orientation => write!(f, "orientation"),
            ProcessingStage::Recognition => write!(f, "recognition"),
            ProcessingStage::PostProcessing => write!(f, "post-processing"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Enum representing various errors that can occur in the OCR pipeline.
#[derive(Error, Debug)]
pub enum OCRError {
    /// The region geometry is degenerate or lies outside the image.
    #[error("invalid region: {message}")]
    InvalidRegion {
        /// A message describing the geometry problem.
        message: String,
    },

    /// An inference engine failed.
    #[error("inference failed in {engine}: {context}")]
    Inference {
        /// The engine that failed (detector, recognizer, orientation).
        engine: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying engine error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// The run was cancelled between regions.
    #[error("cancelled after {processed} of {total} regions")]
    Cancelled {
        /// Regions that had already been started when cancellation was observed.
        processed: usize,
        /// Regions scheduled for the run.
        total: usize,
    },

    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl OCRError {
    /// Creates an OCRError for degenerate or out-of-bounds region geometry.
    pub fn invalid_region(message: impl Into<String>) -> Self {
        Self::InvalidRegion {
            message: message.into(),
        }
    }

    /// Creates an OCRError for an engine fault described only by a message.
    pub fn inference_message(engine: &str, context: impl Into<String>) -> Self {
        Self::Inference {
            engine: engine.to_string(),
            context: context.into(),
            source: None,
        }
    }

    /// Creates an OCRError for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an OCRError for configuration errors.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Returns true for errors that only affect a single region.
    ///
    /// The orchestrator skips the region and keeps going for these.
    pub fn is_region_local(&self) -> bool {
        matches!(self, Self::InvalidRegion { .. } | Self::Inference { .. })
    }
}

impl From<image::ImageError> for OCRError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

impl From<crate::core::config::ConfigError> for OCRError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

/// Convenient result alias for OCR operations.
pub type OcrResult<T> = Result<T, OCRError>;
