//! Recognition stage: runs the recognizer on an upright crop and cleans up
//! the transcription.
//!
//! CTC-style recognizers tend to emit spurious low-confidence characters,
//! often as a duplicate next to the real glyph. The post-filter removes every
//! character whose confidence falls below a threshold.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::traits::RecognizerEngine;
use crate::core::{EnginePool, OCRError};
use crate::domain::RecognizedText;

/// Configuration for the low-confidence character filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecognitionFilterConfig {
    #[serde(default = "RecognitionFilterConfig::default_enabled")]
    pub enabled: bool,
    /// Characters scoring strictly below this value are dropped.
    #[serde(default = "RecognitionFilterConfig::default_threshold")]
    pub threshold: f32,
}

impl RecognitionFilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    fn default_enabled() -> bool {
        true
    }

    fn default_threshold() -> f32 {
        0.5
    }
}

impl Default for RecognitionFilterConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            threshold: Self::default_threshold(),
        }
    }
}

impl ConfigValidator for RecognitionFilterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_confidence_threshold(self.threshold)
    }
}

/// Removes low-confidence characters from a transcription.
///
/// `scores` must line up 1:1 with `text.chars()`. The text is returned
/// unchanged when the filter is disabled, the text is empty, the scores are
/// misaligned, or every character would be removed.
///
/// ```rust
/// use oar_region_ocr::pipeline::stages::filter_low_confidence;
///
/// assert_eq!(filter_low_confidence("AAB", &[0.9, 0.2, 0.8], true, 0.5), "AB");
/// ```
pub fn filter_low_confidence(text: &str, scores: &[f32], enabled: bool, threshold: f32) -> String {
    if !enabled || text.is_empty() {
        return text.to_string();
    }

    let char_count = text.chars().count();
    if char_count != scores.len() {
        warn!(
            "Skipping confidence filter: {} characters but {} scores",
            char_count,
            scores.len()
        );
        return text.to_string();
    }

    let filtered: String = text
        .chars()
        .zip(scores)
        .filter(|&(_, &score)| score >= threshold)
        .map(|(c, _)| c)
        .collect();

    if filtered.is_empty() {
        debug!(
            "Every character of '{}' is below {}, keeping the raw text",
            text, threshold
        );
        return text.to_string();
    }

    filtered
}

/// Recognizes crops through a pool of recognizer engines.
pub struct RecognitionStage<'a> {
    engines: &'a EnginePool<dyn RecognizerEngine>,
    filter: RecognitionFilterConfig,
}

impl<'a> RecognitionStage<'a> {
    pub fn new(engines: &'a EnginePool<dyn RecognizerEngine>, filter: RecognitionFilterConfig) -> Self {
        Self { engines, filter }
    }

    /// Recognizes an upright crop and applies the post-filter.
    ///
    /// The returned record carries the cleaned text; `char_scores` are kept
    /// as the recognizer reported them.
    pub fn recognize(&self, crop: &RgbImage) -> Result<RecognizedText, OCRError> {
        let raw = self.engines.with_engine(|engine| engine.recognize(crop))?;
        let text = filter_low_confidence(
            &raw.text,
            &raw.char_scores,
            self.filter.enabled,
            self.filter.threshold,
        );
        Ok(RecognizedText { text, ..raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_drops_duplicate_low_confidence_char() {
        assert_eq!(filter_low_confidence("AAB", &[0.9, 0.2, 0.8], true, 0.5), "AB");
    }

    #[test]
    fn test_filter_applies_at_any_position() {
        assert_eq!(filter_low_confidence("xAB", &[0.1, 0.9, 0.8], true, 0.5), "AB");
        assert_eq!(filter_low_confidence("ABx", &[0.9, 0.8, 0.4], true, 0.5), "AB");
        // Score equal to the threshold is kept.
        assert_eq!(filter_low_confidence("AB", &[0.5, 0.5], true, 0.5), "AB");
    }

    #[test]
    fn test_filter_keeps_raw_text_when_all_below() {
        assert_eq!(filter_low_confidence("AB", &[0.1, 0.2], true, 0.5), "AB");
    }

    #[test]
    fn test_filter_disabled_and_empty() {
        assert_eq!(filter_low_confidence("AAB", &[0.9, 0.2, 0.8], false, 0.5), "AAB");
        assert_eq!(filter_low_confidence("", &[], true, 0.5), "");
    }

    #[test]
    fn test_filter_misaligned_scores_pass_through() {
        assert_eq!(filter_low_confidence("AAB", &[0.9, 0.2], true, 0.5), "AAB");
    }

    #[test]
    fn test_filter_uses_chars_not_bytes() {
        assert_eq!(
            filter_low_confidence("日日本", &[0.9, 0.1, 0.95], true, 0.5),
            "日本"
        );
    }

    #[test]
    fn test_stage_filters_recognizer_output() {
        let engine = |_: &RgbImage| -> Result<RecognizedText, OCRError> {
            Ok(RecognizedText::new("AAB", vec![0.9, 0.2, 0.8]).with_score(0.7))
        };
        let boxed: Box<dyn RecognizerEngine> = Box::new(engine);
        let pool = EnginePool::single("recognizer", boxed);

        let stage = RecognitionStage::new(&pool, RecognitionFilterConfig::default());
        let result = stage.recognize(&RgbImage::new(8, 4)).unwrap();
        assert_eq!(result.text, "AB");
        assert_eq!(result.char_scores.len(), 3);
        assert_eq!(result.score, Some(0.7));

        let raw = RecognitionStage::new(&pool, RecognitionFilterConfig::new().with_enabled(false))
            .recognize(&RgbImage::new(8, 4))
            .unwrap();
        assert_eq!(raw.text, "AAB");
    }

    #[test]
    fn test_filter_config() {
        assert!(RecognitionFilterConfig::default().validate().is_ok());
        assert!(RecognitionFilterConfig::new().with_threshold(-0.1).validate().is_err());
        let config: RecognitionFilterConfig = toml::from_str("threshold = 0.3").unwrap();
        assert!(config.enabled);
        assert_eq!(config.threshold, 0.3);
    }
}
