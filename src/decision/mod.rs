//! Decision layer: label policies, segments and the prediction result

mod label;
mod segments;

pub use label::{confidence_percent, Label, LabelMapper, LabelScheme, DEFAULT_THRESHOLD};
pub use segments::{Segment, SegmentSpec};

use serde::{Deserialize, Serialize};

/// Final classification of one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    /// Percentage in `[0, 100]`, two decimals
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Segment>>,
}

impl Prediction {
    pub fn new(label: Label, confidence: f64) -> Self {
        Self {
            label,
            confidence,
            segments: None,
        }
    }

    pub fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.segments = Some(segments);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_without_segments_omits_field() {
        let json = serde_json::to_string(&Prediction::new(Label::Real, 80.0)).unwrap();
        assert_eq!(json, r#"{"label":"Real","confidence":80.0}"#);
    }

    #[test]
    fn test_prediction_with_segments() {
        let prediction = Prediction::new(Label::Fake, 91.5).with_segments(vec![Segment {
            start: 0,
            end: 10,
            label: Label::Fake,
        }]);
        let value = serde_json::to_value(&prediction).unwrap();
        assert_eq!(value["segments"][0]["end"], 10);
    }
}
