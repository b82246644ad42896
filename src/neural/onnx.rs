//! ONNX Runtime classifier backend
//!
//! Enabled with the `onnx` cargo feature. Keras `.h5` classifiers are
//! expected to be exported to ONNX (e.g. with tf2onnx) before use.

use std::path::Path;

use log::{debug, info};
use ort::session::Session;
use ort::value::{Tensor, ValueType};

use super::model::{Classifier, RawOutput};
use crate::error::{DetectError, Result};
use crate::shape::FeatureVector;

/// A classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    session: Session,
    input_name: String,
    input_shape: Option<Vec<i64>>,
}

impl OnnxClassifier {
    /// Load an ONNX model and read its first input's declared shape
    pub fn load(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        info!("Loading ONNX model from {}", display);

        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| DetectError::ModelLoad {
                path: display.clone(),
                reason: e.to_string(),
            })?;

        let input = session.inputs.first().ok_or_else(|| DetectError::ModelLoad {
            path: display.clone(),
            reason: "model declares no inputs".to_string(),
        })?;
        let input_name = input.name.clone();
        let input_shape = match &input.input_type {
            ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect::<Vec<i64>>()),
            _ => None,
        };

        debug!(
            "ONNX input '{}' declares shape {:?}",
            input_name, input_shape
        );

        Ok(Self {
            session,
            input_name,
            input_shape,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    fn declared_input_shape(&self) -> Option<&[i64]> {
        self.input_shape.as_deref()
    }

    fn predict(&mut self, input: &FeatureVector) -> Result<RawOutput> {
        let prediction_error = |e: ort::Error| DetectError::Prediction {
            reason: e.to_string(),
        };

        let tensor = Tensor::from_array(input.to_array()?).map_err(prediction_error)?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(prediction_error)?;

        let (_, value) = outputs.iter().next().ok_or_else(|| DetectError::Prediction {
            reason: "model produced no output".to_string(),
        })?;
        let (_shape, data) = value.try_extract_tensor::<f32>().map_err(prediction_error)?;

        RawOutput::from_values(data.to_vec())
    }
}
