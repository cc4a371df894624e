//! The region OCR pipeline: configuration, builder, orchestration and results.

mod builder;
mod cancellation;
mod config;
mod orchestration;
mod result;
mod stats;

pub use builder::RegionOCRBuilder;
pub use cancellation::CancellationToken;
pub use config::{EnginePolicy, ParallelPolicy, RegionOCRConfig};
pub use orchestration::RegionOCR;
pub use result::{DetectionEntry, DetectionResult, ErrorMetrics};
pub use stats::{PipelineStats, StatsManager};
