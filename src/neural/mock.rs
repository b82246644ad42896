//! Mock classifier for testing
//!
//! Returns canned outputs and records what it was asked, so pipeline tests
//! can run without a model artifact.

use super::model::{Classifier, RawOutput};
use crate::error::{DetectError, Result};
use crate::shape::FeatureVector;

/// Classifier returning preset outputs in order (the last one repeats)
#[derive(Debug, Clone)]
pub struct MockClassifier {
    outputs: Vec<RawOutput>,
    declared_shape: Option<Vec<i64>>,
    failure: Option<String>,
    inputs: Vec<Vec<f32>>,
}

impl MockClassifier {
    /// Always return `output`
    pub fn fixed(output: RawOutput) -> Self {
        Self::sequence(vec![output])
    }

    /// Return `outputs` in order, repeating the last
    pub fn sequence(outputs: Vec<RawOutput>) -> Self {
        Self {
            outputs,
            declared_shape: None,
            failure: None,
            inputs: Vec::new(),
        }
    }

    /// Fail every prediction with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::sequence(Vec::new())
        }
    }

    pub fn with_declared_shape(mut self, shape: Vec<i64>) -> Self {
        self.declared_shape = Some(shape);
        self
    }

    /// Number of predictions made so far
    pub fn calls(&self) -> usize {
        self.inputs.len()
    }

    /// Every input vector seen, in call order
    pub fn inputs(&self) -> &[Vec<f32>] {
        &self.inputs
    }
}

impl Classifier for MockClassifier {
    fn name(&self) -> &str {
        "mock"
    }

    fn declared_input_shape(&self) -> Option<&[i64]> {
        self.declared_shape.as_deref()
    }

    fn predict(&mut self, input: &FeatureVector) -> Result<RawOutput> {
        let index = self.inputs.len();
        self.inputs.push(input.values().to_vec());

        if let Some(reason) = &self.failure {
            return Err(DetectError::Prediction {
                reason: reason.clone(),
            });
        }

        let output = self
            .outputs
            .get(index)
            .or_else(|| self.outputs.last())
            .cloned()
            .ok_or_else(|| DetectError::Prediction {
                reason: "mock classifier has no outputs".to_string(),
            })?;
        output.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{InputShape, ShapeAdapter};

    fn input() -> FeatureVector {
        ShapeAdapter::new().adapt(vec![1.0, 2.0], &InputShape::new(vec![1, 2]).unwrap())
    }

    #[test]
    fn test_sequence_repeats_last() {
        let mut mock = MockClassifier::sequence(vec![RawOutput::Score(0.1), RawOutput::Score(0.9)]);
        assert_eq!(mock.predict(&input()).unwrap(), RawOutput::Score(0.1));
        assert_eq!(mock.predict(&input()).unwrap(), RawOutput::Score(0.9));
        assert_eq!(mock.predict(&input()).unwrap(), RawOutput::Score(0.9));
        assert_eq!(mock.calls(), 3);
        assert_eq!(mock.inputs()[0], vec![1.0, 2.0]);
    }

    #[test]
    fn test_failing_mock() {
        let mut mock = MockClassifier::failing("boom");
        let err = mock.predict(&input()).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
