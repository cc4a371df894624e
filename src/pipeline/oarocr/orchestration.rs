//! Per-image orchestration.
//!
//! One run detects regions once, then processes every region independently:
//! crop, orient, recognize, filter. The region loop is parallel above the
//! configured threshold; results are collected by index so the output always
//! follows the detector's order.

use image::RgbImage;
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::cancellation::CancellationToken;
use super::config::RegionOCRConfig;
use super::result::{DetectionEntry, DetectionResult, ErrorMetrics};
use super::stats::{PipelineStats, StatsManager};
use crate::core::traits::{DetectorEngine, ErrorReporter, RecognizerEngine, RegionFailure};
use crate::core::{EnginePool, OCRError, ProcessingStage};
use crate::domain::{DetectedRegion, OrientationAngle, UNSCORED};
use crate::pipeline::stages::orientation::rotate;
use crate::pipeline::stages::{
    OrientationNormalizer, RecognitionStage, RegionExtractor, StageMetrics, StageResult,
    TextDetectionStageProcessor,
};
use crate::utils::{load_image, load_images};

/// What happened to a region that was started.
#[derive(Debug)]
enum RegionOutcome {
    Recognized {
        entry: DetectionEntry,
        orientation_failed: bool,
    },
    Dropped {
        stage: ProcessingStage,
        orientation_failed: bool,
    },
}

/// The region OCR pipeline.
///
/// Built with [`super::RegionOCRBuilder`]. A pipeline is `Sync` and may be
/// shared between threads; engine access is serialized through its pools.
pub struct RegionOCR {
    pub(super) config: RegionOCRConfig,
    pub(super) detector: EnginePool<dyn DetectorEngine>,
    pub(super) recognizer: EnginePool<dyn RecognizerEngine>,
    pub(super) extractor: RegionExtractor,
    pub(super) normalizer: OrientationNormalizer,
    pub(super) reporter: Arc<dyn ErrorReporter>,
    pub(super) thread_pool: Option<rayon::ThreadPool>,
    pub(super) stats: StatsManager,
}

impl std::fmt::Debug for RegionOCR {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionOCR")
            .field("config", &self.config)
            .field("detector", &self.detector)
            .field("recognizer", &self.recognizer)
            .field("normalizer", &self.normalizer)
            .field(
                "threads",
                &self.thread_pool.as_ref().map(|pool| pool.current_num_threads()),
            )
            .finish()
    }
}

impl RegionOCR {
    /// The configuration the pipeline was built with.
    pub fn config(&self) -> &RegionOCRConfig {
        &self.config
    }

    /// Statistics accumulated over every run.
    pub fn stats(&self) -> PipelineStats {
        self.stats.get_stats()
    }

    pub fn reset_stats(&self) {
        self.stats.reset_stats();
    }

    /// Runs the pipeline on one image.
    ///
    /// # Errors
    ///
    /// Detector failures, empty images, and errors that are not local to a
    /// region abort the run. Region-local failures only drop the region.
    pub fn run(&self, image: &RgbImage) -> Result<DetectionResult, OCRError> {
        self.run_with_cancel(image, &CancellationToken::new())
    }

    /// Runs the pipeline, stopping early once `cancel` is triggered.
    ///
    /// Returns `OCRError::Cancelled` when at least one region was not started.
    pub fn run_with_cancel(
        &self,
        image: &RgbImage,
        cancel: &CancellationToken,
    ) -> Result<DetectionResult, OCRError> {
        self.run_with_metrics(image, cancel).map(|result| result.data)
    }

    /// Like [`Self::run_with_cancel`], also returning region-loop metrics.
    pub fn run_with_metrics(
        &self,
        image: &RgbImage,
        cancel: &CancellationToken,
    ) -> Result<StageResult<DetectionResult>, OCRError> {
        let start = Instant::now();
        let outcome = self.process_image(image, cancel);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match &outcome {
            Ok(result) => {
                let metrics = &result.data.error_metrics;
                self.stats.record_success(
                    result.data.entries.len(),
                    metrics.failed_crops + metrics.failed_recognitions,
                    elapsed_ms,
                );
            }
            Err(err) => {
                warn!("Image processing failed: {}", err);
                self.stats.record_failure(elapsed_ms);
            }
        }

        outcome
    }

    /// Loads an image from disk and runs the pipeline on it.
    pub fn run_file(&self, path: &Path) -> Result<DetectionResult, OCRError> {
        let image = load_image(path)?;
        self.run(&image)
    }

    /// Runs the pipeline on several images, one after another.
    ///
    /// Each image gets its own result; one failing image does not affect the
    /// others.
    pub fn run_batch(&self, images: &[RgbImage]) -> Vec<Result<DetectionResult, OCRError>> {
        images.iter().map(|image| self.run(image)).collect()
    }

    /// Loads images from disk and runs the pipeline on each.
    pub fn run_files<P: AsRef<Path> + Send + Sync>(
        &self,
        paths: &[P],
    ) -> Result<Vec<Result<DetectionResult, OCRError>>, OCRError> {
        let images = load_images(paths, self.config.parallel_policy.region_threshold)?;
        Ok(self.run_batch(&images))
    }

    fn process_image(
        &self,
        image: &RgbImage,
        cancel: &CancellationToken,
    ) -> Result<StageResult<DetectionResult>, OCRError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OCRError::invalid_input(format!(
                "image has no pixels ({}x{})",
                width, height
            )));
        }

        let detection =
            TextDetectionStageProcessor::process(image, &self.detector, &self.config.detection)?
                .data;
        let total = detection.regions.len();
        info!(
            "Detected {} regions, {} queued for recognition",
            detection.detected, total
        );

        let mut error_metrics = ErrorMetrics {
            total_regions: detection.detected,
            skipped_low_score: detection.skipped(),
            ..Default::default()
        };

        let image_angle = if total == 0 {
            None
        } else {
            match self.normalizer.classify_image(image) {
                Ok(angle) => angle,
                Err(err) => {
                    if !err.is_region_local() {
                        return Err(err);
                    }
                    warn!("Full-image orientation failed, assuming 0°: {}", err);
                    // Every queued crop is recognized unrotated.
                    let message = err.to_string();
                    for (index, _) in &detection.regions {
                        self.reporter.report(&RegionFailure::new(
                            *index,
                            ProcessingStage::Orientation,
                            message.clone(),
                            false,
                        ));
                    }
                    error_metrics.failed_orientations += total;
                    Some(OrientationAngle::Deg0)
                }
            }
        };

        let parallel = total > self.config.parallel_policy.region_threshold;
        let process_all = || -> Result<Vec<Option<RegionOutcome>>, OCRError> {
            if parallel {
                detection
                    .regions
                    .par_iter()
                    .map(|(index, region)| self.process_region(image, *index, region, image_angle, cancel))
                    .collect()
            } else {
                detection
                    .regions
                    .iter()
                    .map(|(index, region)| self.process_region(image, *index, region, image_angle, cancel))
                    .collect()
            }
        };

        let outcomes = match (&self.thread_pool, parallel) {
            (Some(pool), true) => pool.install(process_all)?,
            _ => process_all()?,
        };

        let processed = outcomes.iter().filter(|outcome| outcome.is_some()).count();
        if processed < total {
            info!("Run cancelled after {} of {} regions", processed, total);
            return Err(OCRError::Cancelled { processed, total });
        }

        let mut entries = Vec::with_capacity(total);
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                RegionOutcome::Recognized {
                    entry,
                    orientation_failed,
                } => {
                    error_metrics.failed_orientations += usize::from(orientation_failed);
                    entries.push(entry);
                }
                RegionOutcome::Dropped {
                    stage,
                    orientation_failed,
                } => {
                    error_metrics.failed_orientations += usize::from(orientation_failed);
                    match stage {
                        ProcessingStage::Cropping => error_metrics.failed_crops += 1,
                        _ => error_metrics.failed_recognitions += 1,
                    }
                }
            }
        }

        let processing_time = start.elapsed();
        debug!(
            "Recognized {} of {} regions in {:?}",
            entries.len(),
            total,
            processing_time
        );

        let metrics = StageMetrics::new(entries.len(), total - entries.len())
            .with_processing_time(processing_time)
            .with_info("detected", detection.detected.to_string())
            .with_info("skipped_low_score", error_metrics.skipped_low_score.to_string())
            .with_info("parallel_processing", parallel.to_string());

        let result = DetectionResult {
            entries,
            image_width: width,
            image_height: height,
            orientation_angle: image_angle,
            error_metrics,
            processing_time,
        };

        Ok(StageResult::new(result, metrics))
    }

    /// Processes one region.
    ///
    /// Returns `None` when the run was cancelled before the region started.
    fn process_region(
        &self,
        image: &RgbImage,
        index: usize,
        region: &DetectedRegion,
        image_angle: Option<OrientationAngle>,
        cancel: &CancellationToken,
    ) -> Result<Option<RegionOutcome>, OCRError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let (width, height) = image.dimensions();
        let cropped = region
            .geometry
            .pixel_rect(width, height)
            .ok_or_else(|| OCRError::invalid_region("polygon has no points"))
            .and_then(|bbox| Ok((bbox, self.extractor.extract(image, &region.geometry)?)));
        let (bbox, crop) = match cropped {
            Ok(cropped) => cropped,
            Err(err) => {
                self.check_region_local(err, index, ProcessingStage::Cropping, true)?;
                return Ok(Some(RegionOutcome::Dropped {
                    stage: ProcessingStage::Cropping,
                    orientation_failed: false,
                }));
            }
        };

        let (angle, orientation_failed) = match self.normalizer.decide(&crop, image_angle) {
            Ok(angle) => (angle, false),
            Err(err) => {
                self.check_region_local(err, index, ProcessingStage::Orientation, false)?;
                (OrientationAngle::Deg0, true)
            }
        };
        let upright = rotate(crop, angle);

        let stage = RecognitionStage::new(&self.recognizer, self.config.recognition_filter);
        let recognized = match stage.recognize(&upright.image) {
            Ok(recognized) => recognized,
            Err(err) => {
                self.check_region_local(err, index, ProcessingStage::Recognition, true)?;
                return Ok(Some(RegionOutcome::Dropped {
                    stage: ProcessingStage::Recognition,
                    orientation_failed,
                }));
            }
        };

        let entry = DetectionEntry {
            region_index: index,
            text: recognized.text,
            score: recognized.score.unwrap_or(UNSCORED),
            detection_score: region.score,
            geometry: region.geometry.clone(),
            bbox,
            label: region.label.clone(),
            orientation: upright.angle,
        };

        Ok(Some(RegionOutcome::Recognized {
            entry,
            orientation_failed,
        }))
    }

    /// Reports a region-local error, or hands back any other error so the
    /// whole run aborts.
    fn check_region_local(
        &self,
        err: OCRError,
        index: usize,
        stage: ProcessingStage,
        skipped: bool,
    ) -> Result<(), OCRError> {
        if !err.is_region_local() {
            return Err(err);
        }
        self.reporter
            .report(&RegionFailure::new(index, stage, err.to_string(), skipped));
        Ok(())
    }
}
