//! Mono waveform produced by the audio loader

use crate::error::{DetectError, Result, IN_MEMORY};

/// Ordered mono samples plus their sample rate.
///
/// Immutable once built: the pipeline only ever reads from it.
#[derive(Clone, Debug)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Create a waveform, rejecting a zero sample rate
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(DetectError::decode(IN_MEMORY, "sample rate must be positive"));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// All samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Copy out the samples in `start..end` as a new waveform at the same rate
    pub fn slice(&self, start: usize, end: usize) -> Waveform {
        let end = end.min(self.samples.len());
        let start = start.min(end);
        Waveform {
            samples: self.samples[start..end].to_vec(),
            sample_rate: self.sample_rate,
        }
    }
}

/// Generate a mono sine tone, used by tests and fixtures
pub fn generate_test_tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> Waveform {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
    let samples = (0..num_samples)
        .map(|i| (angular_freq * i as f32).sin() * 0.5)
        .collect();

    Waveform {
        samples,
        sample_rate: sample_rate.max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sample_rate_rejected() {
        let err = Waveform::new(vec![0.0; 10], 0).unwrap_err();
        assert_eq!(err.error_code(), "AUDIO_DECODE_ERROR");
    }

    #[test]
    fn test_duration() {
        let wave = Waveform::new(vec![0.0; 22050], 22050).unwrap();
        assert_eq!(wave.len(), 22050);
        assert!((wave.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_slice_clamps_to_bounds() {
        let wave = Waveform::new((0..10).map(|i| i as f32).collect(), 10).unwrap();
        let part = wave.slice(8, 20);
        assert_eq!(part.samples(), &[8.0, 9.0]);
        assert!(wave.slice(12, 15).is_empty());
    }

    #[test]
    fn test_generate_test_tone() {
        let tone = generate_test_tone(440.0, 0.5, 22050);
        assert_eq!(tone.len(), 11025);
        let peak = tone.samples().iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!((peak - 0.5).abs() < 0.01);
    }
}
