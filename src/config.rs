//! Detector configuration
//!
//! Built-in defaults, optionally overridden by a JSON file and then by
//! command-line flags. A config file may also declare extra model variants
//! or replace built-in ones by id.
//!
//! ```json
//! {
//!   "model_dir": "/srv/voicecheck/models",
//!   "variant": "tempered-voice",
//!   "encoding": "utf8",
//!   "variants": []
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::audio::DEFAULT_SAMPLE_RATE;
use crate::error::{DetectError, Result};
use crate::neural::{ModelVariantDescriptor, VariantRegistry, DEFAULT_VARIANT};
use crate::report::OutputEncoding;

/// Default directory holding model artifacts
pub const DEFAULT_MODEL_DIR: &str = "model";

/// Runtime configuration for one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Base directory for relative model paths
    pub model_dir: PathBuf,
    /// Selected variant id
    pub variant: String,
    /// Analysis sample rate in Hz
    pub target_sample_rate: u32,
    pub encoding: OutputEncoding,
    /// Variants added to (or replacing) the built-ins
    pub variants: Vec<ModelVariantDescriptor>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            variant: DEFAULT_VARIANT.to_string(),
            target_sample_rate: DEFAULT_SAMPLE_RATE,
            encoding: OutputEncoding::default(),
            variants: Vec::new(),
        }
    }
}

impl DetectorConfig {
    /// Load a config file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DetectError::config(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let config: DetectorConfig = serde_json::from_str(&content).map_err(|e| {
            DetectError::config(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;

        debug!(
            "Loaded config {} ({} extra variant(s))",
            path.display(),
            config.variants.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_sample_rate == 0 {
            return Err(DetectError::config("target_sample_rate must be positive"));
        }
        if self.variant.trim().is_empty() {
            return Err(DetectError::config("variant must not be empty"));
        }
        for variant in &self.variants {
            variant.validate()?;
        }
        Ok(())
    }

    /// Built-in variants merged with the configured ones
    pub fn registry(&self) -> Result<VariantRegistry> {
        let mut registry = VariantRegistry::with_defaults()?;
        for variant in &self.variants {
            registry.register(variant.clone());
        }
        Ok(registry)
    }

    /// The selected variant
    pub fn selected_variant(&self) -> Result<ModelVariantDescriptor> {
        Ok(self.registry()?.get(&self.variant)?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.model_dir, PathBuf::from("model"));
        assert_eq!(config.variant, "deepfake-voice");
        assert_eq!(config.target_sample_rate, 22050);
        assert_eq!(config.encoding, OutputEncoding::Utf8);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"variant": "tempered-voice", "encoding": "ascii_escaped"}"#).unwrap();

        let config = DetectorConfig::load(&path).unwrap();
        assert_eq!(config.variant, "tempered-voice");
        assert_eq!(config.encoding, OutputEncoding::AsciiEscaped);
        assert_eq!(config.target_sample_rate, 22050);
    }

    #[test]
    fn test_config_variants_merge_into_registry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "variant": "lite",
                "variants": [{
                    "id": "lite",
                    "model_path": "lite.json",
                    "input_shape": [1, 13],
                    "recipe": {"layout": "flat", "descriptors": [{"kind": "mfcc", "count": 13}]}
                }]
            }"#,
        )
        .unwrap();

        let config = DetectorConfig::load(&path).unwrap();
        let registry = config.registry().unwrap();
        assert_eq!(registry.variants().len(), 4);
        assert_eq!(config.selected_variant().unwrap().input_shape.len(), 13);
    }

    #[test]
    fn test_unknown_selected_variant() {
        let config = DetectorConfig {
            variant: "missing".to_string(),
            ..DetectorConfig::default()
        };
        assert_eq!(
            config.selected_variant().unwrap_err().error_code(),
            "UNKNOWN_VARIANT"
        );
    }

    #[test]
    fn test_malformed_file_is_invalid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = DetectorConfig::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"target_sample_rate": 0}"#).unwrap();
        assert!(DetectorConfig::load(&path).is_err());
    }
}
