//! Dense (affine + activation) classifier stored as JSON
//!
//! Covers logistic-regression style exports: one weight row per output,
//! one bias per output, then sigmoid or softmax.
//!
//! ```json
//! {
//!   "input_shape": [1, 20],
//!   "weights": [[0.1, -0.2, ...]],
//!   "bias": [0.0],
//!   "activation": "sigmoid"
//! }
//! ```

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::model::{Classifier, RawOutput};
use crate::error::{DetectError, Result};
use crate::shape::FeatureVector;

/// Output activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Sigmoid,
    Softmax,
    Identity,
}

/// Serialized dense model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseModel {
    #[serde(default)]
    pub input_shape: Option<Vec<i64>>,
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    pub activation: Activation,
}

/// A dense classifier loaded from a JSON artifact
#[derive(Debug, Clone)]
pub struct DenseClassifier {
    model: DenseModel,
}

impl DenseClassifier {
    /// Validate and wrap a model
    pub fn new(model: DenseModel) -> Result<Self> {
        Self::check(&model).map_err(|reason| DetectError::ModelLoad {
            path: "<memory>".to_string(),
            reason,
        })?;
        Ok(Self { model })
    }

    /// Load a model from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| DetectError::ModelLoad {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        let model: DenseModel = serde_json::from_str(&text).map_err(|e| DetectError::ModelLoad {
            path: display.clone(),
            reason: format!("invalid dense model: {}", e),
        })?;
        Self::check(&model).map_err(|reason| DetectError::ModelLoad {
            path: display.clone(),
            reason,
        })?;

        debug!(
            "Loaded dense model {}: {} inputs -> {} outputs ({:?})",
            display,
            model.weights[0].len(),
            model.weights.len(),
            model.activation
        );
        Ok(Self { model })
    }

    fn check(model: &DenseModel) -> std::result::Result<(), String> {
        let inputs = model.weights.first().map(Vec::len).unwrap_or(0);
        if inputs == 0 {
            return Err("weights must be a non-empty matrix".to_string());
        }
        if model.weights.iter().any(|row| row.len() != inputs) {
            return Err("weight rows have different lengths".to_string());
        }
        if model.bias.len() != model.weights.len() {
            return Err(format!(
                "bias has {} entries for {} outputs",
                model.bias.len(),
                model.weights.len()
            ));
        }
        if let Some(shape) = &model.input_shape {
            let known: i64 = shape.iter().filter(|&&d| d > 0).product();
            if shape.iter().all(|&d| d > 0) && known as usize != inputs {
                return Err(format!(
                    "input_shape {:?} holds {} values but weights expect {}",
                    shape, known, inputs
                ));
            }
        }
        Ok(())
    }

    pub fn input_len(&self) -> usize {
        self.model.weights[0].len()
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl Classifier for DenseClassifier {
    fn name(&self) -> &str {
        "dense"
    }

    fn declared_input_shape(&self) -> Option<&[i64]> {
        self.model.input_shape.as_deref()
    }

    fn predict(&mut self, input: &FeatureVector) -> Result<RawOutput> {
        let x = input.values();
        if x.len() != self.input_len() {
            return Err(DetectError::Prediction {
                reason: format!(
                    "dense model expects {} inputs, got {}",
                    self.input_len(),
                    x.len()
                ),
            });
        }

        let logits: Vec<f32> = self
            .model
            .weights
            .iter()
            .zip(&self.model.bias)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f32>() + b)
            .collect();

        let values = match self.model.activation {
            Activation::Sigmoid => logits.into_iter().map(sigmoid).collect(),
            Activation::Softmax => softmax(&logits),
            Activation::Identity => logits,
        };
        RawOutput::from_values(values)
    }
}
