//! Result types for the region OCR pipeline.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{OrientationAngle, UNSCORED};
use crate::processors::{Rect, RegionGeometry};

/// One recognized region.
///
/// The geometry is the detector's original box in the source image; it is
/// never the expanded, cropped, or rotated box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEntry {
    /// Index of the region in the detector's output.
    pub region_index: usize,
    /// The recognized text after post-filtering.
    pub text: String,
    /// The recognizer's own confidence, or [`UNSCORED`].
    pub score: f32,
    /// The detector's confidence, or [`UNSCORED`].
    pub detection_score: f32,
    /// The region as the detector reported it.
    pub geometry: RegionGeometry,
    /// Axis-aligned pixel rectangle of `geometry`.
    pub bbox: Rect,
    pub label: Option<Arc<str>>,
    /// Rotation applied to the crop before recognition.
    pub orientation: OrientationAngle,
}

impl DetectionEntry {
    /// True when the recognizer reported a confidence.
    pub fn has_score(&self) -> bool {
        self.score != UNSCORED
    }
}

/// Error metrics for monitoring data quality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    /// Number of regions the detector emitted.
    pub total_regions: usize,
    /// Number of regions dropped by the minimum detection score.
    pub skipped_low_score: usize,
    /// Number of regions whose crop could not be extracted.
    pub failed_crops: usize,
    /// Number of orientation classification failures.
    pub failed_orientations: usize,
    /// Number of text recognition failures.
    pub failed_recognitions: usize,
}

impl ErrorMetrics {
    /// Creates a new ErrorMetrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Regions that entered per-region processing.
    pub fn considered_regions(&self) -> usize {
        self.total_regions.saturating_sub(self.skipped_low_score)
    }

    /// Returns the success rate for cropping operations (0.0 to 1.0).
    pub fn crop_success_rate(&self) -> f32 {
        let considered = self.considered_regions();
        if considered == 0 {
            1.0
        } else {
            considered.saturating_sub(self.failed_crops) as f32 / considered as f32
        }
    }

    /// Returns the success rate for recognition operations (0.0 to 1.0).
    pub fn recognition_success_rate(&self) -> f32 {
        let successful_crops = self.considered_regions().saturating_sub(self.failed_crops);
        if successful_crops == 0 {
            1.0
        } else {
            successful_crops.saturating_sub(self.failed_recognitions) as f32
                / successful_crops as f32
        }
    }

    /// Returns true if there are any errors that indicate data quality issues.
    pub fn has_quality_issues(&self) -> bool {
        self.failed_crops > 0 || self.failed_recognitions > 0 || self.failed_orientations > 0
    }
}

/// Result of running the pipeline on one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Recognized regions in detection order.
    pub entries: Vec<DetectionEntry>,
    pub image_width: u32,
    pub image_height: u32,
    /// Full-image orientation, when a full-image classifier ran.
    pub orientation_angle: Option<OrientationAngle>,
    pub error_metrics: ErrorMetrics,
    #[serde(skip)]
    pub processing_time: Duration,
}

impl DetectionResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DetectionEntry> {
        self.entries.iter()
    }

    /// Returns all recognized text in detection order.
    pub fn all_text(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.text.as_str()).collect()
    }

    /// Returns the recognized text joined with newlines.
    pub fn concatenated_text(&self) -> String {
        self.all_text().join("\n")
    }

    /// Persisted form: an ordered list of `{text, score, box: [x, y, w, h]}`
    /// with the box in source-image pixels.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.entries
                .iter()
                .map(|entry| {
                    json!({
                        "text": entry.text,
                        "score": entry.score,
                        "box": [entry.bbox.x, entry.bbox.y, entry.bbox.width, entry.bbox.height],
                    })
                })
                .collect(),
        )
    }

    /// [`Self::to_json_value`] rendered as a compact JSON string.
    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }
}

impl<'a> IntoIterator for &'a DetectionResult {
    type Item = &'a DetectionEntry;
    type IntoIter = std::slice::Iter<'a, DetectionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for DetectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Image dimensions: [{}, {}]",
            self.image_width, self.image_height
        )?;

        match self.orientation_angle {
            Some(angle) => writeln!(f, "Orientation angle: {angle}")?,
            None => writeln!(f, "Orientation angle: not classified")?,
        }

        writeln!(
            f,
            "Regions: {} recognized of {} detected",
            self.entries.len(),
            self.error_metrics.total_regions
        )?;

        for entry in &self.entries {
            let bbox = &entry.bbox;
            write!(
                f,
                "  Region {}: [{:.0}, {:.0}, {:.0}, {:.0}]",
                entry.region_index, bbox.x, bbox.y, bbox.width, bbox.height
            )?;
            if entry.has_score() {
                write!(f, " -> '{}' (confidence: {:.3})", entry.text, entry.score)?;
            } else {
                write!(f, " -> '{}'", entry.text)?;
            }
            if entry.orientation != OrientationAngle::Deg0 {
                write!(f, " (rotated {})", entry.orientation)?;
            }
            writeln!(f)?;
        }

        if self.error_metrics.has_quality_issues() {
            writeln!(f, "Error metrics:")?;
            writeln!(
                f,
                "  Failed crops: {}/{} ({:.1}% success)",
                self.error_metrics.failed_crops,
                self.error_metrics.considered_regions(),
                self.error_metrics.crop_success_rate() * 100.0
            )?;
            writeln!(
                f,
                "  Failed recognitions: {} ({:.1}% success)",
                self.error_metrics.failed_recognitions,
                self.error_metrics.recognition_success_rate() * 100.0
            )?;
            writeln!(
                f,
                "  Failed orientations: {}",
                self.error_metrics.failed_orientations
            )?;
        }

        Ok(())
    }
}
