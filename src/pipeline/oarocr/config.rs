//! Configuration types for the region OCR pipeline.

use serde::{Deserialize, Serialize};

use crate::core::config::{ConfigError, ConfigValidator};
use crate::pipeline::stages::{
    CroppingConfig, OrientationConfig, RecognitionFilterConfig, TextDetectionConfig,
};

pub use crate::core::config::{EnginePolicy, ParallelPolicy};

/// Complete pipeline configuration.
///
/// Every section has defaults, so an empty TOML or JSON document is a valid
/// configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionOCRConfig {
    /// How recognizer and classifier instances are shared between workers.
    #[serde(default)]
    pub engine_policy: EnginePolicy,

    /// Detection skip policy.
    #[serde(default)]
    pub detection: TextDetectionConfig,

    /// Region expansion before cropping.
    #[serde(default)]
    pub cropping: CroppingConfig,

    /// Orientation correction policy.
    #[serde(default)]
    pub orientation: OrientationConfig,

    /// Low-confidence character filter.
    #[serde(default)]
    pub recognition_filter: RecognitionFilterConfig,

    /// Centralized parallel processing policy configuration
    #[serde(default)]
    pub parallel_policy: ParallelPolicy,
}

impl RegionOCRConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instances each per-region engine pool should hold.
    pub fn engine_pool_size(&self) -> usize {
        self.engine_policy
            .pool_size(self.parallel_policy.effective_workers())
    }
}

impl ConfigValidator for RegionOCRConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.detection.validate()?;
        self.cropping.validate()?;
        self.orientation.validate()?;
        self.recognition_filter.validate()?;
        self.parallel_policy.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stages::OrientationMode;

    #[test]
    fn test_empty_document_is_default() {
        let config: RegionOCRConfig = toml::from_str("").unwrap();
        assert_eq!(config, RegionOCRConfig::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.cropping.expansion_ratio, 3.0);
        assert_eq!(config.orientation.aspect_ratio_threshold, 1.5);
        assert_eq!(config.recognition_filter.threshold, 0.5);
    }

    #[test]
    fn test_nested_sections() {
        let config: RegionOCRConfig = toml::from_str(
            r#"
engine_policy = "per_worker"

[detection]
min_detection_score = 0.3

[orientation]
mode = "disabled"

[parallel_policy]
max_workers = 4
"#,
        )
        .unwrap();

        assert_eq!(config.engine_policy, EnginePolicy::PerWorker);
        assert_eq!(config.detection.min_detection_score, Some(0.3));
        assert_eq!(config.orientation.mode, OrientationMode::Disabled);
        assert_eq!(config.engine_pool_size(), 4);
    }

    #[test]
    fn test_validation_reaches_every_section() {
        let mut config = RegionOCRConfig::new();
        config.recognition_filter.threshold = 2.0;
        assert!(config.validate().is_err());

        let mut config = RegionOCRConfig::new();
        config.detection.min_detection_score = Some(-0.5);
        assert!(config.validate().is_err());

        let mut config = RegionOCRConfig::new();
        config.cropping.expansion_ratio = 0.0;
        assert!(config.validate().is_err());
    }
}
