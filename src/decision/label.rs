//! Label policies
//!
//! Maps raw classifier output to a closed-set label and a confidence
//! percentage. Both policies are pure functions of the output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};
use crate::neural::RawOutput;

/// Default decision threshold for binary classifiers
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Closed set of result labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Real,
    Fake,
    PartialFake,
    Unknown,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Label::Real => "Real",
            Label::Fake => "Fake",
            Label::PartialFake => "PartialFake",
            Label::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_labels() -> Vec<Label> {
    vec![Label::Fake, Label::PartialFake, Label::Real]
}

/// How a variant's raw output is turned into a label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelScheme {
    /// `Fake` when the score is strictly above `threshold`
    Binary {
        #[serde(default = "default_threshold")]
        threshold: f32,
    },
    /// `labels[argmax]`, `Unknown` when the index is out of range
    MultiClass {
        #[serde(default = "default_labels")]
        labels: Vec<Label>,
    },
}

impl Default for LabelScheme {
    fn default() -> Self {
        LabelScheme::Binary {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl LabelScheme {
    /// Three-class scheme `{0: Fake, 1: PartialFake, 2: Real}`
    pub fn three_class() -> Self {
        LabelScheme::MultiClass {
            labels: default_labels(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            LabelScheme::Binary { threshold } => {
                if !(0.0..=1.0).contains(threshold) {
                    return Err(DetectError::config(format!(
                        "binary threshold must be in [0, 1], got {}",
                        threshold
                    )));
                }
            }
            LabelScheme::MultiClass { labels } => {
                if labels.is_empty() {
                    return Err(DetectError::config("multi-class scheme has no labels"));
                }
            }
        }
        Ok(())
    }
}

/// Round to two decimals and clamp into `[0, 100]`
pub fn confidence_percent(probability: f32) -> f64 {
    let pct = (probability as f64 * 100.0 * 100.0).round() / 100.0;
    pct.clamp(0.0, 100.0)
}

/// Index of the first maximum
fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}

/// Applies a [`LabelScheme`] to raw outputs
#[derive(Debug, Clone)]
pub struct LabelMapper {
    scheme: LabelScheme,
}

impl LabelMapper {
    pub fn new(scheme: LabelScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> &LabelScheme {
        &self.scheme
    }

    /// Map one output to `(label, confidence)`; empty or non-finite outputs
    /// are rejected
    pub fn map(&self, output: &RawOutput) -> Result<(Label, f64)> {
        let output = output.clone().validate()?;
        match (&self.scheme, &output) {
            (LabelScheme::Binary { threshold }, RawOutput::Score(score)) => {
                Ok(Self::binary(*score, *threshold))
            }
            // A `[1, 1]` tensor flattened to one value
            (LabelScheme::Binary { threshold }, RawOutput::Distribution(values))
                if values.len() == 1 =>
            {
                Ok(Self::binary(values[0], *threshold))
            }
            (LabelScheme::Binary { .. }, RawOutput::Distribution(values)) => {
                Err(DetectError::Prediction {
                    reason: format!(
                        "binary scheme expects one score, model returned {} values",
                        values.len()
                    ),
                })
            }
            (LabelScheme::MultiClass { labels }, RawOutput::Distribution(scores)) => {
                let index = argmax(scores).ok_or_else(|| DetectError::Prediction {
                    reason: "model returned an empty distribution".to_string(),
                })?;
                let label = labels.get(index).copied().unwrap_or(Label::Unknown);
                Ok((label, confidence_percent(scores[index])))
            }
            (LabelScheme::MultiClass { .. }, RawOutput::Score(_)) => Err(DetectError::Prediction {
                reason: "multi-class scheme expects a distribution, model returned one score"
                    .to_string(),
            }),
        }
    }

    fn binary(score: f32, threshold: f32) -> (Label, f64) {
        let label = if score > threshold {
            Label::Fake
        } else {
            Label::Real
        };
        (label, confidence_percent(score))
    }
}
