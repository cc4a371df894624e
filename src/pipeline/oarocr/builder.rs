//! Builder pattern implementation for the region OCR pipeline.

use std::sync::Arc;
use tracing::{debug, warn};

use super::config::RegionOCRConfig;
use super::orchestration::RegionOCR;
use super::stats::StatsManager;
use crate::core::config::{ConfigValidatorExt, EnginePolicy};
use crate::core::traits::{
    DetectorEngine, ErrorReporter, OrientationEngine, RecognizerEngine, TracingErrorReporter,
};
use crate::core::{EnginePool, OCRError};
use crate::pipeline::stages::{
    ClassifierScope, OrientationMode, OrientationNormalizer, OrientationPolicy, RegionExtractor,
};

/// Where a per-region engine pool gets its instances from.
enum EngineSource<E: ?Sized> {
    Single(Box<E>),
    Factory(Box<dyn FnMut() -> Result<Box<E>, OCRError> + Send>),
}

impl<E: ?Sized + Send> EngineSource<E> {
    fn into_pool(
        self,
        name: &str,
        policy: EnginePolicy,
        size: usize,
    ) -> Result<EnginePool<E>, OCRError> {
        match self {
            EngineSource::Single(engine) => {
                if size > 1 {
                    return Err(OCRError::config_error(format!(
                        "engine policy {:?} needs {} {} instances; supply a factory",
                        policy, size, name
                    )));
                }
                Ok(EnginePool::single(name, engine))
            }
            EngineSource::Factory(factory) => EnginePool::from_factory(name, size, factory),
        }
    }
}

/// Builder for creating [`RegionOCR`] instances.
///
/// A detector and a recognizer are required. Every other setting has a
/// default; see [`RegionOCRConfig`].
pub struct RegionOCRBuilder {
    config: RegionOCRConfig,
    detector: Option<Box<dyn DetectorEngine>>,
    recognizer: Option<EngineSource<dyn RecognizerEngine>>,
    orientation: Option<EngineSource<dyn OrientationEngine>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl std::fmt::Debug for RegionOCRBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionOCRBuilder")
            .field("config", &self.config)
            .field("detector", &self.detector.is_some())
            .field("recognizer", &self.recognizer.is_some())
            .field("orientation", &self.orientation.is_some())
            .finish()
    }
}

impl Default for RegionOCRBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionOCRBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self::from_config(RegionOCRConfig::default())
    }

    /// Creates a builder from an existing configuration.
    pub fn from_config(config: RegionOCRConfig) -> Self {
        Self {
            config,
            detector: None,
            recognizer: None,
            orientation: None,
            reporter: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: RegionOCRConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the text detector. Detection runs once per image, so a single
    /// instance is always enough.
    pub fn detector<E: DetectorEngine + 'static>(mut self, engine: E) -> Self {
        let engine: Box<dyn DetectorEngine> = Box::new(engine);
        self.detector = Some(engine);
        self
    }

    /// Sets a single recognizer instance.
    pub fn recognizer<E: RecognizerEngine + 'static>(mut self, engine: E) -> Self {
        let engine: Box<dyn RecognizerEngine> = Box::new(engine);
        self.recognizer = Some(EngineSource::Single(engine));
        self
    }

    /// Sets a factory that creates recognizer instances, one per worker
    /// under [`EnginePolicy::PerWorker`].
    pub fn recognizer_factory<F>(mut self, factory: F) -> Self
    where
        F: FnMut() -> Result<Box<dyn RecognizerEngine>, OCRError> + Send + 'static,
    {
        self.recognizer = Some(EngineSource::Factory(Box::new(factory)));
        self
    }

    /// Sets a single orientation classifier instance.
    pub fn orientation_engine<E: OrientationEngine + 'static>(mut self, engine: E) -> Self {
        let engine: Box<dyn OrientationEngine> = Box::new(engine);
        self.orientation = Some(EngineSource::Single(engine));
        self
    }

    /// Sets a factory that creates orientation classifier instances.
    pub fn orientation_factory<F>(mut self, factory: F) -> Self
    where
        F: FnMut() -> Result<Box<dyn OrientationEngine>, OCRError> + Send + 'static,
    {
        self.orientation = Some(EngineSource::Factory(Box::new(factory)));
        self
    }

    /// Sets the sink for per-region failures. Defaults to
    /// [`TracingErrorReporter`].
    pub fn error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn expansion_ratio(mut self, ratio: f32) -> Self {
        self.config.cropping.expansion_ratio = ratio;
        self
    }

    pub fn pad_long_side(mut self, enabled: bool) -> Self {
        self.config.cropping.pad_long_side = enabled;
        self
    }

    pub fn orientation_mode(mut self, mode: OrientationMode) -> Self {
        self.config.orientation.mode = mode;
        self
    }

    pub fn aspect_ratio_threshold(mut self, threshold: f32) -> Self {
        self.config.orientation.aspect_ratio_threshold = threshold;
        self
    }

    pub fn classifier_scope(mut self, scope: ClassifierScope) -> Self {
        self.config.orientation.classifier_scope = scope;
        self
    }

    pub fn orientation_confidence_threshold(mut self, threshold: f32) -> Self {
        self.config.orientation.confidence_threshold = Some(threshold);
        self
    }

    /// Enables or disables the low-confidence character filter.
    pub fn filter_enabled(mut self, enabled: bool) -> Self {
        self.config.recognition_filter.enabled = enabled;
        self
    }

    pub fn filter_threshold(mut self, threshold: f32) -> Self {
        self.config.recognition_filter.threshold = threshold;
        self
    }

    /// Skips scored detections below `score`.
    pub fn min_detection_score(mut self, score: f32) -> Self {
        self.config.detection.min_detection_score = Some(score);
        self
    }

    /// Caps the region loop at `workers` threads on a dedicated pool.
    pub fn max_workers(mut self, workers: usize) -> Self {
        self.config.parallel_policy.max_workers = Some(workers);
        self
    }

    /// Region count at or below which the loop runs sequentially.
    pub fn region_threshold(mut self, threshold: usize) -> Self {
        self.config.parallel_policy.region_threshold = threshold;
        self
    }

    pub fn engine_policy(mut self, policy: EnginePolicy) -> Self {
        self.config.engine_policy = policy;
        self
    }

    /// Validates the configuration and assembles the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `OCRError::ConfigError` when a threshold is out of range, a
    /// required engine is missing, the classifier mode has no classifier, or
    /// the per-worker policy needs more instances than were supplied.
    pub fn build(self) -> Result<RegionOCR, OCRError> {
        let config = self.config.validate_and_wrap_ocr_error()?;

        let detector = self
            .detector
            .ok_or_else(|| OCRError::config_error("a detector engine is required"))?;
        let recognizer = self
            .recognizer
            .ok_or_else(|| OCRError::config_error("a recognizer engine is required"))?;

        let pool_size = config.engine_pool_size();
        let recognizer = recognizer.into_pool("recognizer", config.engine_policy, pool_size)?;

        let orientation_pool = match (config.orientation.mode, self.orientation) {
            (OrientationMode::Classifier, Some(source)) => Some(Arc::new(source.into_pool(
                "orientation_classifier",
                config.engine_policy,
                pool_size,
            )?)),
            (mode, Some(_)) => {
                warn!(
                    "Orientation engine supplied but orientation mode is {:?}; it will not be used",
                    mode
                );
                None
            }
            (_, None) => None,
        };
        let policy = OrientationPolicy::from_config(&config.orientation, orientation_pool)?;

        let thread_pool = match config.parallel_policy.max_workers {
            Some(workers) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("region-ocr-{i}"))
                    .build()
                    .map_err(|e| {
                        OCRError::config_error(format!("failed to build worker pool: {e}"))
                    })?,
            ),
            None => None,
        };

        debug!(
            "Built region OCR pipeline: {} recognizer instance(s), orientation {:?}, workers {:?}",
            recognizer.len(),
            config.orientation.mode,
            config.parallel_policy.max_workers
        );

        Ok(RegionOCR {
            extractor: RegionExtractor::new(config.cropping.clone()),
            normalizer: OrientationNormalizer::new(policy),
            detector: EnginePool::single("detector", detector),
            recognizer,
            reporter: self
                .reporter
                .unwrap_or_else(|| Arc::new(TracingErrorReporter)),
            thread_pool,
            stats: StatsManager::new(),
            config,
        })
    }
}
