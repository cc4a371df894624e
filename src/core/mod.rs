//! The core module of the OCR pipeline.
//!
//! This module contains the fundamental components of the pipeline:
//! - Configuration validation and parallelism settings
//! - Error handling
//! - Pooled access to inference engines
//! - Traits defining the engine and error-reporting contracts
//!
//! It also provides re-exports of commonly used types and functions for convenience.

pub mod config;
pub mod errors;
pub mod inference;
pub mod traits;

pub use crate::utils::{create_rgb_image, dynamic_to_rgb, load_image};
pub use config::{ConfigError, ConfigValidator, EnginePolicy, ParallelPolicy};
pub use errors::{OCRError, OcrResult, ProcessingStage};
pub use inference::EnginePool;
pub use traits::{
    CollectingErrorReporter, DetectorEngine, ErrorReporter, OrientationEngine, RecognizerEngine,
    RegionFailure, TracingErrorReporter,
};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
