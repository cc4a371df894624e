//! Shared parallel processing configuration types.

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigValidator};

/// Configuration for how the per-region loop is parallelized.
///
/// Detection always runs once per image; only the region loop
/// (extract, normalize, recognize, filter) is spread across workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelPolicy {
    /// Maximum number of worker threads for the region loop.
    /// If None, rayon's global pool is used (typically number of CPU cores).
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Number of regions processed sequentially (<= this uses sequential).
    /// Default: 1 (a single region never pays for thread dispatch)
    #[serde(default = "ParallelPolicy::default_region_threshold")]
    pub region_threshold: usize,
}

impl ParallelPolicy {
    /// Create a new ParallelPolicy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of worker threads.
    pub fn with_max_workers(mut self, max_workers: Option<usize>) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set the sequential region threshold.
    pub fn with_region_threshold(mut self, threshold: usize) -> Self {
        self.region_threshold = threshold;
        self
    }

    /// Number of workers the region loop will actually use.
    pub fn effective_workers(&self) -> usize {
        self.max_workers
            .unwrap_or_else(rayon::current_num_threads)
            .max(1)
    }

    fn default_region_threshold() -> usize {
        1
    }
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            max_workers: None,
            region_threshold: Self::default_region_threshold(),
        }
    }
}

impl ConfigValidator for ParallelPolicy {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(workers) = self.max_workers {
            self.validate_thread_count(workers)?;
        }
        Ok(())
    }
}

/// How inference engine instances are shared between region workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePolicy {
    /// A single engine instance behind a mutex; workers queue on it.
    #[default]
    Shared,
    /// One engine instance per worker, created by a factory.
    PerWorker,
}

impl EnginePolicy {
    /// Number of engine handles to create for the given worker count.
    pub fn pool_size(&self, workers: usize) -> usize {
        match self {
            EnginePolicy::Shared => 1,
            EnginePolicy::PerWorker => workers.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_workers_respects_max() {
        let policy = ParallelPolicy::new().with_max_workers(Some(3));
        assert_eq!(policy.effective_workers(), 3);

        let policy = ParallelPolicy::new().with_max_workers(Some(0));
        assert_eq!(policy.effective_workers(), 1);
    }

    #[test]
    fn test_engine_policy_pool_size() {
        assert_eq!(EnginePolicy::Shared.pool_size(8), 1);
        assert_eq!(EnginePolicy::PerWorker.pool_size(8), 8);
        assert_eq!(EnginePolicy::PerWorker.pool_size(0), 1);
    }

    #[test]
    fn test_parallel_policy_defaults_from_empty_json() {
        let policy: ParallelPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, ParallelPolicy::default());
        assert_eq!(policy.region_threshold, 1);
    }

    #[test]
    fn test_parallel_policy_validation() {
        assert!(ParallelPolicy::new().validate().is_ok());
        assert!(
            ParallelPolicy::new()
                .with_max_workers(Some(0))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_engine_policy_serde_names() {
        let json = serde_json::to_string(&EnginePolicy::PerWorker).unwrap();
        assert_eq!(json, "\"per_worker\"");
    }
}
