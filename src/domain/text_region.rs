//! Records exchanged with the inference engines.
//!
//! A detector produces [`DetectedRegion`]s for the full image; a recognizer
//! produces one [`RecognizedText`] per cropped region.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::processors::RegionGeometry;

/// Score sentinel for detections and results that carry no native confidence.
pub const UNSCORED: f32 = -1.0;

/// A located text region prior to transcription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedRegion {
    /// Where the region lies in the original image.
    pub geometry: RegionGeometry,
    /// Optional class label assigned by the detector.
    pub label: Option<Arc<str>>,
    /// Detection confidence in [0, 1], or [`UNSCORED`].
    pub score: f32,
}

impl DetectedRegion {
    /// Creates an unlabeled, unscored region.
    pub fn new(geometry: RegionGeometry) -> Self {
        Self {
            geometry,
            label: None,
            score: UNSCORED,
        }
    }

    /// Sets the detection score.
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    /// Sets the class label.
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// True when the detector reported a confidence for this region.
    pub fn is_scored(&self) -> bool {
        self.score != UNSCORED
    }
}

/// Transcription of a single region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedText {
    /// The recognized text.
    pub text: String,
    /// Per-character confidences, aligned 1:1 with `text.chars()`.
    pub char_scores: Vec<f32>,
    /// Recognition-level confidence, when the recognizer emits one.
    pub score: Option<f32>,
}

impl RecognizedText {
    /// Creates a recognition result without a recognition-level score.
    pub fn new(text: impl Into<String>, char_scores: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            char_scores,
            score: None,
        }
    }

    /// Sets the recognition-level score.
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// True when `char_scores` lines up with the characters of `text`.
    pub fn is_aligned(&self) -> bool {
        self.text.chars().count() == self.char_scores.len()
    }
}
