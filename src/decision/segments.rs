//! Temporal segmentation
//!
//! Splits a waveform into equal windows. Each window is classified on its
//! own by the pipeline.

use serde::{Deserialize, Serialize};

use super::label::Label;
use crate::error::{DetectError, Result};

/// One labelled window, in samples (`end` is exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub label: Label,
}

/// Segment analysis settings for a variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    /// Window length in seconds
    pub window_secs: f64,
}

impl SegmentSpec {
    pub fn new(window_secs: f64) -> Result<Self> {
        let spec = Self { window_secs };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.window_secs.is_finite() && self.window_secs > 0.0) {
            return Err(DetectError::config(format!(
                "segment window must be a positive number of seconds, got {}",
                self.window_secs
            )));
        }
        Ok(())
    }

    /// Window length in samples at `sample_rate` (at least one)
    pub fn window_len(&self, sample_rate: u32) -> usize {
        ((self.window_secs * sample_rate as f64).round() as usize).max(1)
    }

    /// Window bounds over `total` samples.
    ///
    /// Trailing samples that do not fill a window are dropped, except that a
    /// clip shorter than one window becomes a single window.
    pub fn windows(&self, total: usize, sample_rate: u32) -> Vec<(usize, usize)> {
        let window = self.window_len(sample_rate);
        if total == 0 {
            return Vec::new();
        }
        if total < window {
            return vec![(0, total)];
        }
        (0..total / window)
            .map(|i| (i * window, (i + 1) * window))
            .collect()
    }
}
