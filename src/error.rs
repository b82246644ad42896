//! Error handling for voicecheck
//!
//! Every pipeline stage returns [`Result`]. The top-level reporter turns any
//! [`DetectError`] into the uniform `{"error": ...}` payload.

use thiserror::Error;

/// Path label for audio that never came from a file
pub const IN_MEMORY: &str = "<in-memory audio>";

/// Result type alias for voicecheck operations
pub type Result<T> = std::result::Result<T, DetectError>;

/// Main error type for the detection pipeline
#[derive(Error, Debug)]
pub enum DetectError {
    // Invocation
    #[error("No file path provided")]
    MissingArgument,

    // File / decode errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to decode audio file {path}: {reason}")]
    AudioDecode {
        path: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Pipeline errors
    #[error("Feature extraction failed: {reason}")]
    FeatureExtraction { reason: String },

    #[error("Shape mismatch: {reason}")]
    ShapeMismatch { reason: String },

    #[error("Failed to load model {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("Prediction failed: {reason}")]
    Prediction { reason: String },

    #[error("Output encoding error: {reason}")]
    Encoding { reason: String },

    // Configuration
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Unknown model variant: {id}")]
    UnknownVariant { id: String },
}

impl DetectError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            DetectError::MissingArgument => "MISSING_ARGUMENT",
            DetectError::FileNotFound { .. } => "FILE_NOT_FOUND",
            DetectError::AudioDecode { .. } => "AUDIO_DECODE_ERROR",
            DetectError::FeatureExtraction { .. } => "FEATURE_EXTRACTION_ERROR",
            DetectError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            DetectError::ModelLoad { .. } => "MODEL_LOAD_ERROR",
            DetectError::Prediction { .. } => "PREDICTION_ERROR",
            DetectError::Encoding { .. } => "ENCODING_ERROR",
            DetectError::InvalidConfig { .. } => "INVALID_CONFIG",
            DetectError::UnknownVariant { .. } => "UNKNOWN_VARIANT",
        }
    }

    pub(crate) fn decode(path: &str, reason: impl Into<String>) -> Self {
        DetectError::AudioDecode {
            path: path.to_string(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Attach the source file to an audio error raised on decoded samples
    pub(crate) fn at_path(self, path: &std::path::Path) -> Self {
        match self {
            DetectError::AudioDecode { reason, source, .. } => DetectError::AudioDecode {
                path: path.display().to_string(),
                reason,
                source,
            },
            other => other,
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        DetectError::InvalidConfig {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for DetectError {
    fn from(e: serde_json::Error) -> Self {
        DetectError::Encoding {
            reason: e.to_string(),
        }
    }
}
