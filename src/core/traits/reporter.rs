//! Sink for non-fatal per-region failures.

use std::sync::Mutex;
use tracing::warn;

use crate::core::ProcessingStage;

/// A region that could not be fully processed.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFailure {
    /// Index of the region in detection order.
    pub region_index: usize,
    /// Stage where the failure happened.
    pub stage: ProcessingStage,
    /// Rendered error message.
    pub message: String,
    /// Whether the region was dropped from the result.
    pub skipped: bool,
}

impl RegionFailure {
    /// Creates a failure record.
    pub fn new(
        region_index: usize,
        stage: ProcessingStage,
        message: impl Into<String>,
        skipped: bool,
    ) -> Self {
        Self {
            region_index,
            stage,
            message: message.into(),
            skipped,
        }
    }
}

/// Receives per-region failures that did not abort the image.
///
/// Called from region workers, possibly concurrently.
pub trait ErrorReporter: Send + Sync {
    /// Records a failure.
    fn report(&self, failure: &RegionFailure);
}

/// Reporter that logs failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, failure: &RegionFailure) {
        warn!(
            region = failure.region_index,
            stage = %failure.stage,
            skipped = failure.skipped,
            "Region {} failed during {}: {}",
            failure.region_index,
            failure.stage,
            failure.message
        );
    }
}

/// Reporter that keeps failures in memory for later inspection.
#[derive(Debug, Default)]
pub struct CollectingErrorReporter {
    failures: Mutex<Vec<RegionFailure>>,
}

impl CollectingErrorReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the failures collected so far, sorted by region index.
    pub fn failures(&self) -> Vec<RegionFailure> {
        let mut failures = self
            .failures
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone());
        failures.sort_by_key(|f| f.region_index);
        failures
    }

    /// Clears collected failures.
    pub fn clear(&self) {
        match self.failures.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl ErrorReporter for CollectingErrorReporter {
    fn report(&self, failure: &RegionFailure) {
        match self.failures.lock() {
            Ok(mut guard) => guard.push(failure.clone()),
            Err(poisoned) => poisoned.into_inner().push(failure.clone()),
        }
    }
}
