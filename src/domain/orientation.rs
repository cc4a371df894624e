//! Orientation angle parsing and rotation utilities
//!
//! Orientation classifiers emit one of four discrete classes. This module
//! provides the strongly-typed angle, robust parsing of the label formats
//! classifiers commonly use, and the rotations that bring a crop upright.

use image::{RgbImage, imageops};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// A discrete text orientation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrientationAngle {
    /// Upright, no rotation needed.
    #[default]
    Deg0,
    /// Corrected by a 90° clockwise rotation.
    Deg90,
    /// Upside down.
    Deg180,
    /// Corrected by a 270° clockwise (90° counter-clockwise) rotation.
    Deg270,
}

impl OrientationAngle {
    /// All classes in ascending order.
    pub const ALL: [OrientationAngle; 4] = [
        OrientationAngle::Deg0,
        OrientationAngle::Deg90,
        OrientationAngle::Deg180,
        OrientationAngle::Deg270,
    ];

    /// The angle in degrees.
    pub fn degrees(&self) -> u16 {
        match self {
            OrientationAngle::Deg0 => 0,
            OrientationAngle::Deg90 => 90,
            OrientationAngle::Deg180 => 180,
            OrientationAngle::Deg270 => 270,
        }
    }

    /// Maps a class index (0..4, in the order of [`OrientationAngle::ALL`]).
    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Maps a degree value, tolerating small floating point noise.
    pub fn from_degrees(degrees: f32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|angle| (degrees - angle.degrees() as f32).abs() < 0.1)
    }

    /// Parses an orientation label from a classifier.
    ///
    /// Accepts numeric labels ("90", "90.0"), degree suffixes ("90°", "90deg")
    /// and the common word labels ("upright", "left", "inverted", ...).
    /// Returns None for unknown labels.
    pub fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if let Ok(degrees) = f32::from_str(trimmed) {
            return Self::from_degrees(degrees);
        }

        match trimmed.to_lowercase().as_str() {
            "0°" | "0deg" | "normal" | "upright" => Some(OrientationAngle::Deg0),
            "90°" | "90deg" | "right" | "clockwise" => Some(OrientationAngle::Deg90),
            "180°" | "180deg" | "inverted" | "upside_down" => Some(OrientationAngle::Deg180),
            "270°" | "270deg" | "left" | "counterclockwise" => Some(OrientationAngle::Deg270),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrientationAngle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Output of an orientation classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationPrediction {
    /// The predicted orientation class.
    pub angle: OrientationAngle,
    /// The classifier's confidence in [0, 1], when it reports one.
    pub confidence: Option<f32>,
}

impl OrientationPrediction {
    /// Creates a prediction with a confidence score.
    pub fn new(angle: OrientationAngle, confidence: f32) -> Self {
        Self {
            angle,
            confidence: Some(confidence),
        }
    }

    /// Creates a prediction without a confidence score.
    pub fn unscored(angle: OrientationAngle) -> Self {
        Self {
            angle,
            confidence: None,
        }
    }

    /// Parses a label-based classifier output.
    ///
    /// Unknown labels fall back to an upright prediction with zero confidence.
    pub fn from_label(label: &str, confidence: f32) -> Self {
        match OrientationAngle::from_label(label) {
            Some(angle) => Self::new(angle, confidence),
            None => {
                warn!("Unknown orientation label: '{}', defaulting to 0°", label);
                Self::new(OrientationAngle::Deg0, 0.0)
            }
        }
    }

    /// The angle to apply given an optional confidence floor.
    ///
    /// Predictions below the threshold are treated as upright; unscored
    /// predictions are always accepted.
    pub fn accepted_angle(&self, threshold: Option<f32>) -> OrientationAngle {
        match (self.confidence, threshold) {
            (Some(confidence), Some(threshold)) if confidence < threshold => OrientationAngle::Deg0,
            _ => self.angle,
        }
    }
}

/// Rotates an image to correct the given orientation.
///
/// Always returns a new buffer, including for [`OrientationAngle::Deg0`].
pub fn apply_orientation(image: &RgbImage, angle: OrientationAngle) -> RgbImage {
    match angle {
        OrientationAngle::Deg0 => image.clone(),
        OrientationAngle::Deg90 => imageops::rotate90(image),
        OrientationAngle::Deg180 => imageops::rotate180(image),
        OrientationAngle::Deg270 => imageops::rotate270(image),
    }
}
