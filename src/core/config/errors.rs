//! Configuration error types and validation traits.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Error indicating that a resource limit has been exceeded.
    #[error("resource limit exceeded: {message}")]
    ResourceLimitExceeded { message: String },
}

/// A trait for validating configuration parameters.
///
/// Implementors validate their own fields in [`ConfigValidator::validate`]
/// and can lean on the provided range helpers.
pub trait ConfigValidator {
    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Validates a confidence threshold.
    ///
    /// This method checks that the confidence threshold is between 0.0 and 1.0.
    fn validate_confidence_threshold(&self, threshold: f32) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&threshold) {
            Err(ConfigError::InvalidConfig {
                message: format!(
                    "Confidence threshold must be between 0.0 and 1.0, got {}",
                    threshold
                ),
            })
        } else {
            Ok(())
        }
    }

    /// Validates thread count.
    ///
    /// This method checks that the thread count is reasonable.
    fn validate_thread_count(&self, thread_count: usize) -> Result<(), ConfigError> {
        const MAX_REASONABLE_THREADS: usize = 256;

        if thread_count == 0 {
            Err(ConfigError::InvalidConfig {
                message: "Thread count must be greater than 0".to_string(),
            })
        } else if thread_count > MAX_REASONABLE_THREADS {
            Err(ConfigError::ResourceLimitExceeded {
                message: format!(
                    "Thread count {} exceeds reasonable maximum of {}",
                    thread_count, MAX_REASONABLE_THREADS
                ),
            })
        } else {
            Ok(())
        }
    }

    /// Validates a float value is within a specified range (inclusive).
    fn validate_f32_range(
        &self,
        value: f32,
        min: f32,
        max: f32,
        field_name: &str,
    ) -> Result<(), ConfigError> {
        if !value.is_finite() || value < min || value > max {
            Err(ConfigError::InvalidConfig {
                message: format!(
                    "{} must be between {} and {}, got {}",
                    field_name, min, max, value
                ),
            })
        } else {
            Ok(())
        }
    }

    /// Validates a float value is finite and strictly greater than `floor`.
    fn validate_f32_above(&self, value: f32, floor: f32, field_name: &str) -> Result<(), ConfigError> {
        if !value.is_finite() || value <= floor {
            Err(ConfigError::InvalidConfig {
                message: format!("{} must be greater than {}, got {}", field_name, floor, value),
            })
        } else {
            Ok(())
        }
    }
}

/// Extension methods for validating a configuration by value.
pub trait ConfigValidatorExt: ConfigValidator {
    /// Validates and returns the configuration, mapping failures to `OCRError::ConfigError`.
    fn validate_and_wrap_ocr_error(self) -> Result<Self, crate::core::OCRError>
    where
        Self: Sized,
    {
        self.validate()?;
        Ok(self)
    }
}

impl<T: ConfigValidator> ConfigValidatorExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample;

    impl ConfigValidator for Sample {
        fn validate(&self) -> Result<(), ConfigError> {
            Ok(())
        }
    }

    #[test]
    fn test_validate_confidence_threshold() {
        let sample = Sample;
        assert!(sample.validate_confidence_threshold(0.0).is_ok());
        assert!(sample.validate_confidence_threshold(1.0).is_ok());
        assert!(sample.validate_confidence_threshold(-0.1).is_err());
        assert!(sample.validate_confidence_threshold(1.1).is_err());
    }

    #[test]
    fn test_validate_thread_count() {
        let sample = Sample;
        assert!(sample.validate_thread_count(4).is_ok());
        assert!(sample.validate_thread_count(0).is_err());
        assert!(matches!(
            sample.validate_thread_count(1024),
            Err(ConfigError::ResourceLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_validate_f32_above_rejects_nan() {
        let sample = Sample;
        assert!(sample.validate_f32_above(3.0, 1.0, "ratio").is_ok());
        assert!(sample.validate_f32_above(1.0, 1.0, "ratio").is_err());
        assert!(sample.validate_f32_above(f32::NAN, 1.0, "ratio").is_err());
    }

    #[test]
    fn test_config_error_into_ocr_error() {
        let err: crate::core::OCRError = ConfigError::InvalidConfig {
            message: "bad".to_string(),
        }
        .into();
        assert!(matches!(err, crate::core::OCRError::ConfigError { .. }));
    }
}
