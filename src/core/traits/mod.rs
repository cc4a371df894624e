//! Traits at the seams between the pipeline and its collaborators.
//!
//! - [`engine`] - detector, recognizer and orientation engine contracts
//! - [`reporter`] - sink for non-fatal per-region failures

pub mod engine;
pub mod reporter;

pub use engine::{DetectorEngine, OrientationEngine, RecognizerEngine};
pub use reporter::{CollectingErrorReporter, ErrorReporter, RegionFailure, TracingErrorReporter};
