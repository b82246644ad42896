//! Shape adaptation
//!
//! The adapter only knows a raw vector's length and the target shape. It
//! keeps the first `N` values of a long vector, zero-pads a short one on the
//! right, and never reorders anything. Reshaping is row-major.

use std::fmt;

use log::{debug, warn};
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};

/// A classifier input shape, e.g. `[1, 20]` or `[1, 32, 1]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct InputShape(Vec<usize>);

impl InputShape {
    /// Create a shape; empty shapes and zero dimensions are rejected
    pub fn new(dims: Vec<usize>) -> Result<Self> {
        if dims.is_empty() {
            return Err(DetectError::ShapeMismatch {
                reason: "input shape has no dimensions".to_string(),
            });
        }
        if dims.contains(&0) {
            return Err(DetectError::ShapeMismatch {
                reason: format!("input shape {:?} has a zero dimension", dims),
            });
        }
        Ok(Self(dims))
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Number of elements (the target vector length)
    pub fn len(&self) -> usize {
        self.0.iter().product()
    }

    /// Always false; a valid shape has at least one element
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Resolve against the shape a model artifact declares.
    ///
    /// A fully known declaration is the target, whatever its length; the
    /// adapter pads or truncates to it. Dynamic dimensions (`-1`) take the
    /// value at the same position in `self`, so a dynamic declaration must
    /// have the same rank.
    pub fn resolve(&self, declared: Option<&[i64]>) -> Result<InputShape> {
        let Some(declared) = declared else {
            return Ok(self.clone());
        };

        if let Some(&d) = declared.iter().find(|&&d| d != -1 && d <= 0) {
            return Err(DetectError::ShapeMismatch {
                reason: format!("model declares invalid dimension {} in {:?}", d, declared),
            });
        }
        let dynamic = declared.contains(&-1);
        if dynamic && declared.len() != self.rank() {
            return Err(DetectError::ShapeMismatch {
                reason: format!(
                    "model declares dynamic input {:?} of rank {} but variant expects {}",
                    declared,
                    declared.len(),
                    self
                ),
            });
        }

        let dims = declared
            .iter()
            .enumerate()
            .map(|(i, &d)| if d == -1 { self.0[i] } else { d as usize })
            .collect();
        let resolved = InputShape::new(dims)?;

        if resolved.len() != self.len() {
            warn!(
                "Model declares input {} ({} values), overriding variant shape {} ({} values)",
                resolved,
                resolved.len(),
                self,
                self.len()
            );
        } else if resolved != *self {
            debug!("Model declares input shape {}, using it over {}", resolved, self);
        }
        Ok(resolved)
    }
}

impl TryFrom<Vec<usize>> for InputShape {
    type Error = DetectError;

    fn try_from(dims: Vec<usize>) -> Result<Self> {
        InputShape::new(dims)
    }
}

impl From<InputShape> for Vec<usize> {
    fn from(shape: InputShape) -> Self {
        shape.0
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.0.iter().map(|d| d.to_string()).collect();
        write!(f, "({})", dims.join(", "))
    }
}

/// A raw vector conformed to an input shape
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f32>,
    shape: InputShape,
}

impl FeatureVector {
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn shape(&self) -> &InputShape {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row-major n-dimensional view for model backends
    pub fn to_array(&self) -> Result<ArrayD<f32>> {
        ArrayD::from_shape_vec(IxDyn(self.shape.dims()), self.values.clone()).map_err(|e| {
            DetectError::ShapeMismatch {
                reason: e.to_string(),
            }
        })
    }
}

/// Pads, truncates and reshapes raw feature vectors
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeAdapter;

impl ShapeAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Conform `raw` to `shape`
    pub fn adapt(&self, mut raw: Vec<f32>, shape: &InputShape) -> FeatureVector {
        let target = shape.len();
        if raw.len() != target {
            warn!(
                "Feature vector has {} values, model expects {}; {}",
                raw.len(),
                target,
                if raw.len() > target { "truncating" } else { "zero-padding" }
            );
        }
        raw.resize(target, 0.0);

        FeatureVector {
            values: raw,
            shape: shape.clone(),
        }
    }
}
