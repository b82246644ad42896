//! Classifier backends and the model variant registry
//!
//! This module provides:
//! - `Classifier` trait implemented by every backend
//! - `DenseClassifier` for JSON-exported dense models
//! - `OnnxClassifier` for ONNX models (feature `onnx`)
//! - `MockClassifier` for tests
//! - `VariantRegistry` of model generations

mod dense;
mod mock;
mod model;
#[cfg(feature = "onnx")]
mod onnx;
mod registry;

use std::path::Path;

use log::info;

pub use dense::{Activation, DenseClassifier, DenseModel};
pub use mock::MockClassifier;
pub use model::{Classifier, RawOutput};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
pub use registry::{ModelVariantDescriptor, VariantRegistry, DEFAULT_VARIANT};

use crate::error::{DetectError, Result};

/// Load a classifier artifact, choosing the backend by file extension
pub fn load_classifier(path: &Path) -> Result<Box<dyn Classifier>> {
    let display = path.display().to_string();
    if !path.is_file() {
        return Err(DetectError::ModelLoad {
            path: display,
            reason: "model file not found".to_string(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let classifier: Box<dyn Classifier> = match extension.as_str() {
        "json" => Box::new(DenseClassifier::load(path)?),
        "onnx" => load_onnx(path)?,
        other => {
            return Err(DetectError::ModelLoad {
                path: display,
                reason: format!("unsupported model format '{}'", other),
            })
        }
    };

    info!("Model loaded: {} ({})", display, classifier.name());
    Ok(classifier)
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path) -> Result<Box<dyn Classifier>> {
    Ok(Box::new(OnnxClassifier::load(path)?))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path) -> Result<Box<dyn Classifier>> {
    Err(DetectError::ModelLoad {
        path: path.display().to_string(),
        reason: "ONNX support is not compiled in (rebuild with --features onnx)".to_string(),
    })
}
