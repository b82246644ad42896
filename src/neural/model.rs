//! Classifier trait and raw output type
//!
//! Defines the interface every model backend implements. The pipeline treats
//! a classifier as opaque beyond its declared input shape and its output.

use crate::error::{DetectError, Result};
use crate::shape::FeatureVector;

/// Raw classifier output before label mapping
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    /// One fake-probability in `[0, 1]`
    Score(f32),
    /// Per-class scores, summing to roughly 1
    Distribution(Vec<f32>),
}

impl RawOutput {
    /// Build an output from a flat tensor: one value is a score, more is a
    /// distribution
    pub fn from_values(values: Vec<f32>) -> Result<Self> {
        let output = match values.as_slice() {
            [] => {
                return Err(DetectError::Prediction {
                    reason: "model produced an empty output".to_string(),
                })
            }
            [score] => RawOutput::Score(*score),
            _ => RawOutput::Distribution(values),
        };
        output.validate()
    }

    /// Reject empty or non-finite outputs
    pub fn validate(self) -> Result<Self> {
        let values: &[f32] = match &self {
            RawOutput::Score(s) => std::slice::from_ref(s),
            RawOutput::Distribution(d) => d,
        };
        if values.is_empty() {
            return Err(DetectError::Prediction {
                reason: "model produced an empty output".to_string(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DetectError::Prediction {
                reason: format!("model produced a non-finite output: {:?}", values),
            });
        }
        Ok(self)
    }
}

/// A loaded classifier
pub trait Classifier {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Input shape declared by the artifact, if it declares one.
    /// `-1` marks a dynamic dimension.
    fn declared_input_shape(&self) -> Option<&[i64]>;

    /// Run the model on one conformed vector
    fn predict(&mut self, input: &FeatureVector) -> Result<RawOutput>;
}
