//! Configuration file loading utilities for the OCR pipeline.
//!
//! This module provides utilities for loading pipeline configuration from
//! TOML and JSON files.

use crate::core::OCRError;
use crate::core::config::ConfigValidatorExt;
use crate::pipeline::RegionOCRConfig;
use std::path::Path;
use tracing::debug;

/// Configuration file format
#[derive(Debug, Clone, Copy)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration loader for OCR pipeline
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file, auto-detecting the format from the extension
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// A Result containing the loaded RegionOCRConfig or an OCRError
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use oar_region_ocr::pipeline::ConfigLoader;
    /// use std::path::Path;
    ///
    /// let config = ConfigLoader::load_from_file(Path::new("config.toml"))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_from_file(path: &Path) -> Result<RegionOCRConfig, OCRError> {
        let format = ConfigFormat::from_extension(path).ok_or_else(|| OCRError::ConfigError {
            message: format!("Unsupported config file extension: {:?}", path.extension()),
        })?;

        let content = std::fs::read_to_string(path).map_err(|e| OCRError::ConfigError {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        debug!("Loading {:?} configuration from {}", format, path.display());
        Self::load_from_string(&content, format)
    }

    /// Load configuration from a string with specified format
    ///
    /// # Arguments
    ///
    /// * `content` - Configuration content as string
    /// * `format` - Configuration format
    ///
    /// # Returns
    ///
    /// A Result containing the loaded and validated RegionOCRConfig or an OCRError
    pub fn load_from_string(content: &str, format: ConfigFormat) -> Result<RegionOCRConfig, OCRError> {
        let config = match format {
            ConfigFormat::Toml => Self::load_from_toml(content)?,
            ConfigFormat::Json => Self::load_from_json(content)?,
        };
        config.validate_and_wrap_ocr_error()
    }

    /// Load configuration from TOML string
    pub fn load_from_toml(content: &str) -> Result<RegionOCRConfig, OCRError> {
        toml::from_str(content).map_err(|e| OCRError::ConfigError {
            message: format!("Failed to parse TOML config: {e}"),
        })
    }

    /// Load configuration from JSON string
    pub fn load_from_json(content: &str) -> Result<RegionOCRConfig, OCRError> {
        serde_json::from_str(content).map_err(|e| OCRError::ConfigError {
            message: format!("Failed to parse JSON config: {e}"),
        })
    }

    /// Save configuration to a file, auto-detecting the format from the extension
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration to save
    /// * `path` - Path to save the configuration file
    ///
    /// # Returns
    ///
    /// A Result indicating success or an OCRError
    pub fn save_to_file(config: &RegionOCRConfig, path: &Path) -> Result<(), OCRError> {
        let format = ConfigFormat::from_extension(path).ok_or_else(|| OCRError::ConfigError {
            message: format!("Unsupported config file extension: {:?}", path.extension()),
        })?;

        let content = Self::save_to_string(config, format)?;

        std::fs::write(path, content).map_err(|e| OCRError::ConfigError {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })
    }

    /// Save configuration to string with specified format
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration to save
    /// * `format` - Configuration format
    ///
    /// # Returns
    ///
    /// A Result containing the configuration string or an OCRError
    pub fn save_to_string(config: &RegionOCRConfig, format: ConfigFormat) -> Result<String, OCRError> {
        match format {
            ConfigFormat::Toml => Self::save_to_toml(config),
            ConfigFormat::Json => Self::save_to_json(config),
        }
    }

    /// Save configuration to TOML string
    pub fn save_to_toml(config: &RegionOCRConfig) -> Result<String, OCRError> {
        toml::to_string_pretty(config).map_err(|e| OCRError::ConfigError {
            message: format!("Failed to serialize config to TOML: {e}"),
        })
    }

    /// Save configuration to JSON string
    pub fn save_to_json(config: &RegionOCRConfig) -> Result<String, OCRError> {
        serde_json::to_string_pretty(config).map_err(|e| OCRError::ConfigError {
            message: format!("Failed to serialize config to JSON: {e}"),
        })
    }
}
