//! Orientation normalization stage.
//!
//! Decides whether a crop must be rotated before recognition and produces
//! the upright crop. Three policies are supported: no correction, an
//! aspect-ratio heuristic for vertical text, and a learned classifier.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::traits::OrientationEngine;
use crate::core::{EnginePool, OCRError};
use crate::domain::{OrientationAngle, apply_orientation};

/// Which orientation policy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationMode {
    /// Crops are passed to the recognizer as cropped.
    Disabled,
    /// Tall crops are rotated 90° counter-clockwise.
    #[default]
    Heuristic,
    /// An orientation classifier decides the rotation.
    Classifier,
}

/// What the orientation classifier is run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierScope {
    /// One prediction per crop.
    #[default]
    PerRegion,
    /// One prediction for the whole image, applied to every crop.
    FullImage,
}

/// Configuration for orientation processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationConfig {
    #[serde(default)]
    pub mode: OrientationMode,
    /// Height/width ratio above which the heuristic rotates a crop.
    #[serde(default = "OrientationConfig::default_aspect_ratio_threshold")]
    pub aspect_ratio_threshold: f32,
    #[serde(default)]
    pub classifier_scope: ClassifierScope,
    /// Confidence threshold for accepting orientation predictions
    #[serde(default)]
    pub confidence_threshold: Option<f32>,
}

impl OrientationConfig {
    /// Create a new OrientationConfig
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the orientation mode.
    pub fn with_mode(mut self, mode: OrientationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the heuristic's aspect-ratio threshold.
    pub fn with_aspect_ratio_threshold(mut self, threshold: f32) -> Self {
        self.aspect_ratio_threshold = threshold;
        self
    }

    /// Set the classifier scope.
    pub fn with_classifier_scope(mut self, scope: ClassifierScope) -> Self {
        self.classifier_scope = scope;
        self
    }

    /// Set the classifier confidence threshold.
    pub fn with_confidence_threshold(mut self, threshold: Option<f32>) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    fn default_aspect_ratio_threshold() -> f32 {
        1.5
    }
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            mode: OrientationMode::default(),
            aspect_ratio_threshold: Self::default_aspect_ratio_threshold(),
            classifier_scope: ClassifierScope::default(),
            confidence_threshold: None,
        }
    }
}

impl ConfigValidator for OrientationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_f32_above(self.aspect_ratio_threshold, 0.0, "aspect_ratio_threshold")?;
        if let Some(threshold) = self.confidence_threshold {
            self.validate_confidence_threshold(threshold)?;
        }
        Ok(())
    }
}

/// The resolved orientation policy, holding the classifier when one is used.
#[derive(Clone)]
pub enum OrientationPolicy {
    Disabled,
    Heuristic {
        aspect_ratio_threshold: f32,
    },
    Classifier {
        engines: Arc<EnginePool<dyn OrientationEngine>>,
        scope: ClassifierScope,
        confidence_threshold: Option<f32>,
    },
}

impl std::fmt::Debug for OrientationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Heuristic {
                aspect_ratio_threshold,
            } => f
                .debug_struct("Heuristic")
                .field("aspect_ratio_threshold", aspect_ratio_threshold)
                .finish(),
            Self::Classifier {
                engines,
                scope,
                confidence_threshold,
            } => f
                .debug_struct("Classifier")
                .field("engines", &engines.len())
                .field("scope", scope)
                .field("confidence_threshold", confidence_threshold)
                .finish(),
        }
    }
}

impl OrientationPolicy {
    /// Resolves a policy from configuration.
    ///
    /// # Errors
    ///
    /// Returns `OCRError::ConfigError` when the classifier mode is selected
    /// without an engine.
    pub fn from_config(
        config: &OrientationConfig,
        engines: Option<Arc<EnginePool<dyn OrientationEngine>>>,
    ) -> Result<Self, OCRError> {
        match config.mode {
            OrientationMode::Disabled => Ok(Self::Disabled),
            OrientationMode::Heuristic => Ok(Self::Heuristic {
                aspect_ratio_threshold: config.aspect_ratio_threshold,
            }),
            OrientationMode::Classifier => {
                let engines = engines.ok_or_else(|| {
                    OCRError::config_error(
                        "orientation mode 'classifier' requires an orientation engine",
                    )
                })?;
                Ok(Self::Classifier {
                    engines,
                    scope: config.classifier_scope,
                    confidence_threshold: config.confidence_threshold,
                })
            }
        }
    }
}

/// Returns true when a crop of this size is treated as vertical text.
///
/// The comparison is strict: a ratio exactly at the threshold is left alone.
pub fn is_vertical(width: u32, height: u32, threshold: f32) -> bool {
    width > 0 && height as f32 / width as f32 > threshold
}

/// An upright crop and the correction that produced it.
#[derive(Debug, Clone)]
pub struct NormalizedCrop {
    pub image: RgbImage,
    /// The applied correction. [`OrientationAngle::Deg0`] means unrotated.
    pub angle: OrientationAngle,
}

/// Applies an [`OrientationPolicy`] to crops.
#[derive(Debug, Clone)]
pub struct OrientationNormalizer {
    policy: OrientationPolicy,
}

impl OrientationNormalizer {
    pub fn new(policy: OrientationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &OrientationPolicy {
        &self.policy
    }

    /// Runs the full-image classifier when that scope is configured.
    ///
    /// Returns `None` for every other policy.
    pub fn classify_image(&self, image: &RgbImage) -> Result<Option<OrientationAngle>, OCRError> {
        match &self.policy {
            OrientationPolicy::Classifier {
                engines,
                scope: ClassifierScope::FullImage,
                confidence_threshold,
            } => {
                let prediction = engines.with_engine(|engine| engine.classify(image))?;
                let angle = prediction.accepted_angle(*confidence_threshold);
                debug!(
                    "Full-image orientation: predicted {} ({:?}), applying {}",
                    prediction.angle, prediction.confidence, angle
                );
                Ok(Some(angle))
            }
            _ => Ok(None),
        }
    }

    /// Decides the correction for a crop without rotating it.
    ///
    /// `image_angle` is the result of [`Self::classify_image`]; when present it
    /// takes the place of a per-crop classification.
    pub fn decide(
        &self,
        crop: &RgbImage,
        image_angle: Option<OrientationAngle>,
    ) -> Result<OrientationAngle, OCRError> {
        match &self.policy {
            OrientationPolicy::Disabled => Ok(OrientationAngle::Deg0),
            OrientationPolicy::Heuristic {
                aspect_ratio_threshold,
            } => {
                let (width, height) = crop.dimensions();
                if is_vertical(width, height, *aspect_ratio_threshold) {
                    Ok(OrientationAngle::Deg270)
                } else {
                    Ok(OrientationAngle::Deg0)
                }
            }
            OrientationPolicy::Classifier {
                engines,
                scope,
                confidence_threshold,
            } => match (scope, image_angle) {
                (ClassifierScope::FullImage, Some(angle)) => Ok(angle),
                _ => {
                    let prediction = engines.with_engine(|engine| engine.classify(crop))?;
                    Ok(prediction.accepted_angle(*confidence_threshold))
                }
            },
        }
    }

    /// Produces the upright crop.
    ///
    /// The crop is returned as-is when no rotation applies; otherwise the
    /// rotated pixels are written to a new buffer.
    pub fn normalize(
        &self,
        crop: RgbImage,
        image_angle: Option<OrientationAngle>,
    ) -> Result<NormalizedCrop, OCRError> {
        let angle = self.decide(&crop, image_angle)?;
        Ok(rotate(crop, angle))
    }
}

/// Rotates an owned crop by `angle`.
pub fn rotate(crop: RgbImage, angle: OrientationAngle) -> NormalizedCrop {
    let image = match angle {
        OrientationAngle::Deg0 => crop,
        other => apply_orientation(&crop, other),
    };
    NormalizedCrop { image, angle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrientationPrediction;
    use image::Rgb;

    fn heuristic() -> OrientationNormalizer {
        OrientationNormalizer::new(OrientationPolicy::Heuristic {
            aspect_ratio_threshold: 1.5,
        })
    }

    #[test]
    fn test_heuristic_threshold_is_exclusive() {
        // 1.6
        assert!(is_vertical(10, 16, 1.5));
        // 1.4
        assert!(!is_vertical(10, 14, 1.5));
        // exactly 1.5
        assert!(!is_vertical(10, 15, 1.5));
        assert!(!is_vertical(0, 15, 1.5));
    }

    #[test]
    fn test_heuristic_rotates_counter_clockwise() {
        let mut crop = RgbImage::new(10, 16);
        // Top-right corner of the tall crop.
        crop.put_pixel(9, 0, Rgb([255, 0, 0]));

        let normalized = heuristic().normalize(crop, None).unwrap();
        assert_eq!(normalized.angle, OrientationAngle::Deg270);
        assert_eq!(normalized.image.dimensions(), (16, 10));
        // Counter-clockwise rotation moves the top-right corner to the top-left.
        assert_eq!(normalized.image.get_pixel(0, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_heuristic_leaves_wide_crops_alone() {
        let crop = RgbImage::from_pixel(16, 10, Rgb([1, 2, 3]));
        let normalized = heuristic().normalize(crop.clone(), None).unwrap();
        assert_eq!(normalized.angle, OrientationAngle::Deg0);
        assert_eq!(normalized.image, crop);
    }

    #[test]
    fn test_disabled_never_rotates() {
        let normalizer = OrientationNormalizer::new(OrientationPolicy::Disabled);
        let crop = RgbImage::new(10, 40);
        assert_eq!(normalizer.decide(&crop, None).unwrap(), OrientationAngle::Deg0);
        assert_eq!(normalizer.classify_image(&crop).unwrap(), None);
    }

    fn classifier(
        scope: ClassifierScope,
        prediction: OrientationPrediction,
        threshold: Option<f32>,
    ) -> OrientationNormalizer {
        let engine = move |_: &RgbImage| -> Result<OrientationPrediction, OCRError> { Ok(prediction) };
        let boxed: Box<dyn OrientationEngine> = Box::new(engine);
        OrientationNormalizer::new(OrientationPolicy::Classifier {
            engines: Arc::new(EnginePool::single("orientation", boxed)),
            scope,
            confidence_threshold: threshold,
        })
    }

    #[test]
    fn test_classifier_per_region() {
        let normalizer = classifier(
            ClassifierScope::PerRegion,
            OrientationPrediction::new(OrientationAngle::Deg180, 0.9),
            Some(0.5),
        );
        let crop = RgbImage::new(20, 10);
        assert_eq!(normalizer.classify_image(&crop).unwrap(), None);

        let normalized = normalizer.normalize(crop, None).unwrap();
        assert_eq!(normalized.angle, OrientationAngle::Deg180);
        assert_eq!(normalized.image.dimensions(), (20, 10));
    }

    #[test]
    fn test_classifier_below_threshold_is_upright() {
        let normalizer = classifier(
            ClassifierScope::PerRegion,
            OrientationPrediction::new(OrientationAngle::Deg90, 0.3),
            Some(0.5),
        );
        let angle = normalizer.decide(&RgbImage::new(20, 10), None).unwrap();
        assert_eq!(angle, OrientationAngle::Deg0);
    }

    #[test]
    fn test_classifier_full_image_scope() {
        let normalizer = classifier(
            ClassifierScope::FullImage,
            OrientationPrediction::unscored(OrientationAngle::Deg90),
            None,
        );
        let image_angle = normalizer.classify_image(&RgbImage::new(50, 50)).unwrap();
        assert_eq!(image_angle, Some(OrientationAngle::Deg90));

        let normalized = normalizer.normalize(RgbImage::new(20, 10), image_angle).unwrap();
        assert_eq!(normalized.image.dimensions(), (10, 20));
    }

    #[test]
    fn test_classifier_failure_propagates() {
        let engine = |_: &RgbImage| -> Result<OrientationPrediction, OCRError> {
            Err(OCRError::inference_message("orientation", "model crashed"))
        };
        let boxed: Box<dyn OrientationEngine> = Box::new(engine);
        let normalizer = OrientationNormalizer::new(OrientationPolicy::Classifier {
            engines: Arc::new(EnginePool::single("orientation", boxed)),
            scope: ClassifierScope::PerRegion,
            confidence_threshold: None,
        });

        let result = normalizer.decide(&RgbImage::new(4, 4), None);
        assert!(matches!(result, Err(OCRError::Inference { .. })));
    }

    #[test]
    fn test_policy_from_config() {
        let config = OrientationConfig::new().with_mode(OrientationMode::Classifier);
        assert!(matches!(
            OrientationPolicy::from_config(&config, None),
            Err(OCRError::ConfigError { .. })
        ));

        let policy = OrientationPolicy::from_config(&OrientationConfig::default(), None).unwrap();
        assert!(matches!(
            policy,
            OrientationPolicy::Heuristic {
                aspect_ratio_threshold
            } if aspect_ratio_threshold == 1.5
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(OrientationConfig::default().validate().is_ok());
        assert!(
            OrientationConfig::new()
                .with_aspect_ratio_threshold(0.0)
                .validate()
                .is_err()
        );
        assert!(
            OrientationConfig::new()
                .with_confidence_threshold(Some(1.5))
                .validate()
                .is_err()
        );

        let config: OrientationConfig =
            toml::from_str("mode = \"classifier\"\nclassifier_scope = \"full_image\"").unwrap();
        assert_eq!(config.mode, OrientationMode::Classifier);
        assert_eq!(config.classifier_scope, ClassifierScope::FullImage);
        assert_eq!(config.aspect_ratio_threshold, 1.5);
    }
}
