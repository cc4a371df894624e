//! Statistics management for the region OCR pipeline.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// Counters accumulated across pipeline runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// The total number of images processed.
    pub total_processed: usize,
    /// Images that produced a result.
    pub successful_images: usize,
    /// Images whose run returned an error (detector failure, cancellation).
    pub failed_images: usize,
    /// Regions that produced an entry.
    pub regions_recognized: usize,
    /// Regions dropped by a crop or recognition failure.
    pub regions_failed: usize,
    /// The average processing time per image in milliseconds.
    pub average_processing_time_ms: f64,
}

impl PipelineStats {
    /// Fraction of processed images that succeeded, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            (self.successful_images as f64 / self.total_processed as f64) * 100.0
        }
    }
}

/// Statistics management functionality for the pipeline.
#[derive(Debug, Default)]
pub struct StatsManager {
    /// Statistics for the pipeline execution (thread-safe).
    stats: Mutex<PipelineStats>,
}

impl StatsManager {
    /// Creates a new StatsManager instance.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PipelineStats> {
        self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Gets a copy of the current pipeline statistics.
    pub fn get_stats(&self) -> PipelineStats {
        self.lock().clone()
    }

    /// Records a successful image.
    pub fn record_success(&self, regions_recognized: usize, regions_failed: usize, time_ms: f64) {
        let mut stats = self.lock();
        stats.successful_images += 1;
        stats.regions_recognized += regions_recognized;
        stats.regions_failed += regions_failed;
        Self::add_sample(&mut stats, time_ms);
    }

    /// Records an image whose run returned an error.
    pub fn record_failure(&self, time_ms: f64) {
        let mut stats = self.lock();
        stats.failed_images += 1;
        Self::add_sample(&mut stats, time_ms);
    }

    fn add_sample(stats: &mut PipelineStats, time_ms: f64) {
        stats.total_processed += 1;
        // Incremental mean over every processed image.
        let count = stats.total_processed as f64;
        stats.average_processing_time_ms += (time_ms - stats.average_processing_time_ms) / count;
    }

    /// Resets the pipeline statistics.
    pub fn reset_stats(&self) {
        *self.lock() = PipelineStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_update_incremental_average() {
        let stats_manager = StatsManager::new();

        stats_manager.record_success(3, 1, 100.0);
        let stats = stats_manager.get_stats();
        assert_eq!(stats.total_processed, 1);
        assert_eq!(stats.regions_recognized, 3);
        assert_eq!(stats.regions_failed, 1);
        assert_eq!(stats.average_processing_time_ms, 100.0);

        stats_manager.record_success(2, 0, 200.0);
        assert_eq!(stats_manager.get_stats().average_processing_time_ms, 150.0);

        stats_manager.record_failure(300.0);
        let stats = stats_manager.get_stats();
        assert_eq!(stats.total_processed, 3);
        assert_eq!(stats.successful_images, 2);
        assert_eq!(stats.failed_images, 1);
        assert_eq!(stats.average_processing_time_ms, 200.0);
    }

    #[test]
    fn test_stats_reset() {
        let stats_manager = StatsManager::new();
        stats_manager.record_success(5, 0, 50.0);
        assert_eq!(stats_manager.get_stats().total_processed, 1);

        stats_manager.reset_stats();
        assert_eq!(stats_manager.get_stats(), PipelineStats::default());
        assert_eq!(PipelineStats::default().success_rate(), 0.0);
    }
}
