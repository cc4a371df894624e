//! Shared types for pipeline stage processing.

use std::collections::HashMap;
use std::time::Duration;

/// Result wrapper for stage processing operations.
///
/// Carries the processed data together with the metrics gathered while
/// producing it.
#[derive(Debug, Clone)]
pub struct StageResult<T> {
    /// The processed data from the stage
    pub data: T,
    /// Performance and error metrics for the stage
    pub metrics: StageMetrics,
}

impl<T> StageResult<T> {
    /// Create a new stage result with the given data and metrics
    pub fn new(data: T, metrics: StageMetrics) -> Self {
        Self { data, metrics }
    }

    /// Create a stage result with default metrics
    pub fn with_data(data: T) -> Self {
        Self {
            data,
            metrics: StageMetrics::default(),
        }
    }
}

/// Metrics collected during stage processing.
#[derive(Debug, Clone, Default)]
pub struct StageMetrics {
    /// Time taken to process the stage
    pub processing_time: Option<Duration>,
    /// Number of items successfully processed
    pub success_count: usize,
    /// Number of items that failed processing
    pub failure_count: usize,
    /// Additional stage-specific metrics
    pub additional_info: HashMap<String, String>,
}

impl StageMetrics {
    /// Create new metrics with the given counts
    pub fn new(success_count: usize, failure_count: usize) -> Self {
        Self {
            processing_time: None,
            success_count,
            failure_count,
            additional_info: HashMap::new(),
        }
    }

    /// Set the processing time
    pub fn with_processing_time(mut self, duration: Duration) -> Self {
        self.processing_time = Some(duration);
        self
    }

    /// Add additional information to the metrics
    pub fn with_info<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional_info.insert(key.into(), value.into());
        self
    }

    /// Get the total number of items processed
    pub fn total_count(&self) -> usize {
        self.success_count + self.failure_count
    }

    /// Get the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            0.0
        } else {
            (self.success_count as f64 / total as f64) * 100.0
        }
    }
}
