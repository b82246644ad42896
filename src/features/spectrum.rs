//! Short-time spectral analysis
//!
//! Centered framing (zero padding of `n_fft / 2` on both sides), periodic
//! Hann window, and a power spectrum per frame via rustfft.

use rustfft::{num_complex::Complex, FftPlanner};

/// Padding applied at both ends when centering frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadMode {
    /// Pad with zeros
    Constant,
    /// Repeat the first/last sample
    Edge,
}

/// Pad `samples` by `pad` on each side
pub fn pad_center(samples: &[f32], pad: usize, mode: PadMode) -> Vec<f32> {
    let (head, tail) = match mode {
        PadMode::Constant => (0.0, 0.0),
        PadMode::Edge => (
            samples.first().copied().unwrap_or(0.0),
            samples.last().copied().unwrap_or(0.0),
        ),
    };

    let mut padded = Vec::with_capacity(samples.len() + 2 * pad);
    padded.resize(pad, head);
    padded.extend_from_slice(samples);
    padded.resize(samples.len() + 2 * pad, tail);
    padded
}

/// Split `signal` into frames of `frame_length` spaced by `hop_length`.
///
/// Only full frames are returned.
pub fn frames(signal: &[f32], frame_length: usize, hop_length: usize) -> Vec<&[f32]> {
    if frame_length == 0 || hop_length == 0 || signal.len() < frame_length {
        return Vec::new();
    }
    let count = 1 + (signal.len() - frame_length) / hop_length;
    (0..count)
        .map(|i| &signal[i * hop_length..i * hop_length + frame_length])
        .collect()
}

/// Periodic Hann window of length `n`
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            (0.5 - 0.5 * phase.cos()) as f32
        })
        .collect()
}

/// Power spectrogram of a mono signal, stored frame-major: `[frame][bin]`
#[derive(Debug, Clone)]
pub struct Spectrogram {
    power: Vec<Vec<f32>>,
    n_fft: usize,
    sample_rate: u32,
}

impl Spectrogram {
    /// Compute the centered STFT power spectrogram
    pub fn compute(samples: &[f32], sample_rate: u32, n_fft: usize, hop_length: usize) -> Self {
        let padded = pad_center(samples, n_fft / 2, PadMode::Constant);
        let window = hann_window(n_fft);

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n_fft);
        let num_bins = n_fft / 2 + 1;

        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
        let power = frames(&padded, n_fft, hop_length)
            .into_iter()
            .map(|frame| {
                for (slot, (&s, &w)) in buffer.iter_mut().zip(frame.iter().zip(window.iter())) {
                    *slot = Complex::new(s * w, 0.0);
                }
                fft.process(&mut buffer);
                buffer[..num_bins].iter().map(|c| c.norm_sqr()).collect()
            })
            .collect();

        Self {
            power,
            n_fft,
            sample_rate,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.power.len()
    }

    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Power spectra, one per frame
    pub fn power(&self) -> &[Vec<f32>] {
        &self.power
    }

    /// Magnitude (sqrt of power) of one frame
    pub fn magnitudes(&self, frame: usize) -> Vec<f32> {
        self.power[frame].iter().map(|p| p.sqrt()).collect()
    }

    /// Center frequency in Hz of every bin
    pub fn bin_frequencies(&self) -> Vec<f32> {
        fft_frequencies(self.sample_rate, self.n_fft)
    }
}

/// Center frequencies of the `n_fft / 2 + 1` real FFT bins
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f32> {
    (0..=n_fft / 2)
        .map(|k| (k as f64 * sample_rate as f64 / n_fft as f64) as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_pad_center_constant() {
        assert_eq!(
            pad_center(&[1.0, 2.0], 2, PadMode::Constant),
            vec![0.0, 0.0, 1.0, 2.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_pad_center_edge() {
        assert_eq!(
            pad_center(&[1.0, 2.0], 1, PadMode::Edge),
            vec![1.0, 1.0, 2.0, 2.0]
        );
    }

    #[test]
    fn test_frames_count() {
        let signal = vec![0.0; 10];
        // 1 + (10 - 4) / 2 = 4
        assert_eq!(frames(&signal, 4, 2).len(), 4);
        assert!(frames(&signal, 11, 2).is_empty());
    }

    #[test]
    fn test_hann_window_is_periodic() {
        let w = hann_window(4);
        assert_abs_diff_eq!(w[0], 0.0, epsilon = 1e-7);
        assert_abs_diff_eq!(w[1], 0.5, epsilon = 1e-7);
        assert_abs_diff_eq!(w[2], 1.0, epsilon = 1e-7);
        assert_abs_diff_eq!(w[3], 0.5, epsilon = 1e-7);
    }

    #[test]
    fn test_centered_frame_count() {
        // 1 + len / hop frames when centered
        let spec = Spectrogram::compute(&vec![0.0; 22050], 22050, 2048, 512);
        assert_eq!(spec.num_frames(), 1 + 22050 / 512);
        assert_eq!(spec.num_bins(), 1025);
    }

    #[test]
    fn test_empty_signal_yields_one_silent_frame() {
        let spec = Spectrogram::compute(&[], 22050, 2048, 512);
        assert_eq!(spec.num_frames(), 1);
        assert!(spec.power()[0].iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        let sr = 22050;
        let n_fft = 2048;
        // Pick a frequency exactly on bin 100
        let freq = 100.0 * sr as f32 / n_fft as f32;
        let samples: Vec<f32> = (0..sr as usize)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect();

        let spec = Spectrogram::compute(&samples, sr, n_fft, 512);
        let middle = &spec.power()[spec.num_frames() / 2];
        let peak_bin = middle
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(peak_bin, 100);
    }

    #[test]
    fn test_bin_frequencies() {
        let freqs = fft_frequencies(22050, 2048);
        assert_eq!(freqs.len(), 1025);
        assert_abs_diff_eq!(freqs[1024], 11025.0, epsilon = 1e-3);
    }
}
