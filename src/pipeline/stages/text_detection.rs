//! Text detection stage.
//!
//! Runs the detector once over the full image and applies the optional
//! minimum-score skip policy. Skipped regions keep their detection index so
//! results stay addressable by the detector's ordering.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::types::{StageMetrics, StageResult};
use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::traits::DetectorEngine;
use crate::core::{EnginePool, OCRError};
use crate::domain::DetectedRegion;

/// Configuration for text detection processing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextDetectionConfig {
    /// Scored detections below this value are not recognized.
    ///
    /// Unscored detections are never skipped.
    #[serde(default)]
    pub min_detection_score: Option<f32>,
}

impl TextDetectionConfig {
    pub fn with_min_detection_score(mut self, score: Option<f32>) -> Self {
        self.min_detection_score = score;
        self
    }

    /// Whether the region passes the skip policy.
    pub fn accepts(&self, region: &DetectedRegion) -> bool {
        match self.min_detection_score {
            Some(min) if region.is_scored() => region.score >= min,
            _ => true,
        }
    }
}

impl ConfigValidator for TextDetectionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(threshold) = self.min_detection_score {
            self.validate_confidence_threshold(threshold)?;
        }
        Ok(())
    }
}

/// Regions that passed the skip policy, each with its detection index.
#[derive(Debug, Clone, Default)]
pub struct TextDetectionResult {
    pub regions: Vec<(usize, DetectedRegion)>,
    /// Total number of regions the detector emitted.
    pub detected: usize,
}

impl TextDetectionResult {
    /// Number of regions dropped by the skip policy.
    pub fn skipped(&self) -> usize {
        self.detected - self.regions.len()
    }
}

/// Text detection stage processor.
pub struct TextDetectionStageProcessor;

impl TextDetectionStageProcessor {
    /// Detects regions in `image`.
    ///
    /// # Errors
    ///
    /// A detector failure is returned as-is; it aborts processing of the
    /// image.
    pub fn process(
        image: &RgbImage,
        detector: &EnginePool<dyn DetectorEngine>,
        config: &TextDetectionConfig,
    ) -> Result<StageResult<TextDetectionResult>, OCRError> {
        let start = Instant::now();
        let detections = detector.with_engine(|engine| engine.detect(image))?;
        let detected = detections.len();

        let regions: Vec<(usize, DetectedRegion)> = detections
            .into_iter()
            .enumerate()
            .filter(|(_, region)| config.accepts(region))
            .collect();

        let result = TextDetectionResult { regions, detected };
        if result.skipped() > 0 {
            debug!(
                "Skipped {} of {} detections below the minimum score",
                result.skipped(),
                detected
            );
        }

        let metrics = StageMetrics::new(result.regions.len(), 0)
            .with_processing_time(start.elapsed())
            .with_info("stage", "text_detection")
            .with_info("detected", detected.to_string())
            .with_info("skipped", result.skipped().to_string());

        Ok(StageResult::new(result, metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::{Rect, RegionGeometry};

    fn region(score: Option<f32>) -> DetectedRegion {
        let region = DetectedRegion::new(RegionGeometry::Normalized(Rect::new(0.1, 0.1, 0.2, 0.1)));
        match score {
            Some(score) => region.with_score(score),
            None => region,
        }
    }

    fn pool(regions: Vec<DetectedRegion>) -> EnginePool<dyn DetectorEngine> {
        let engine = move |_: &RgbImage| -> Result<Vec<DetectedRegion>, OCRError> { Ok(regions.clone()) };
        let boxed: Box<dyn DetectorEngine> = Box::new(engine);
        EnginePool::single("detector", boxed)
    }

    #[test]
    fn test_skip_policy_keeps_indices_and_unscored() {
        let detector = pool(vec![region(Some(0.9)), region(Some(0.1)), region(None)]);
        let config = TextDetectionConfig::default().with_min_detection_score(Some(0.3));

        let result = TextDetectionStageProcessor::process(&RgbImage::new(10, 10), &detector, &config)
            .unwrap()
            .data;

        let indices: Vec<usize> = result.regions.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(result.detected, 3);
        assert_eq!(result.skipped(), 1);
    }

    #[test]
    fn test_no_policy_keeps_everything() {
        let detector = pool(vec![region(Some(0.01)), region(None)]);
        let result = TextDetectionStageProcessor::process(
            &RgbImage::new(10, 10),
            &detector,
            &TextDetectionConfig::default(),
        )
        .unwrap();

        assert_eq!(result.data.regions.len(), 2);
        assert_eq!(result.metrics.success_count, 2);
        assert_eq!(result.metrics.additional_info["skipped"], "0");
    }

    #[test]
    fn test_detector_failure_is_returned() {
        let engine = |_: &RgbImage| -> Result<Vec<DetectedRegion>, OCRError> {
            Err(OCRError::inference_message("detector", "no session"))
        };
        let boxed: Box<dyn DetectorEngine> = Box::new(engine);
        let detector = EnginePool::single("detector", boxed);

        let result = TextDetectionStageProcessor::process(
            &RgbImage::new(10, 10),
            &detector,
            &TextDetectionConfig::default(),
        );
        assert!(matches!(result, Err(OCRError::Inference { .. })));
    }
}
