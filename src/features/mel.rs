//! Mel filterbank, log compression and DCT for cepstral coefficients
//!
//! Uses the Slaney mel scale (linear below 1 kHz, logarithmic above) with
//! area-normalised triangular filters, matching the filters the reference
//! models were trained with.

use super::spectrum::fft_frequencies;

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    (6.4f64).ln() / 27.0
}

/// Convert Hz to Slaney mels
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Convert Slaney mels to Hz
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        mel * F_SP
    }
}

/// Triangular mel filterbank, `[n_mels][n_fft / 2 + 1]`
pub fn mel_filterbank(
    sample_rate: u32,
    n_fft: usize,
    n_mels: usize,
    fmin: f64,
    fmax: f64,
) -> Vec<Vec<f32>> {
    let fft_freqs = fft_frequencies(sample_rate, n_fft);

    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);
    let mel_f: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64))
        .collect();

    (0..n_mels)
        .map(|m| {
            let lower_width = mel_f[m + 1] - mel_f[m];
            let upper_width = mel_f[m + 2] - mel_f[m + 1];
            // Slaney-style area normalisation
            let enorm = 2.0 / (mel_f[m + 2] - mel_f[m]);

            fft_freqs
                .iter()
                .map(|&f| {
                    let f = f as f64;
                    let lower = (f - mel_f[m]) / lower_width;
                    let upper = (mel_f[m + 2] - f) / upper_width;
                    (lower.min(upper).max(0.0) * enorm) as f32
                })
                .collect()
        })
        .collect()
}

/// Apply a filterbank to one power spectrum
pub fn apply_filterbank(filterbank: &[Vec<f32>], power: &[f32]) -> Vec<f32> {
    filterbank
        .iter()
        .map(|filter| {
            filter
                .iter()
                .zip(power.iter())
                .map(|(&w, &p)| w as f64 * p as f64)
                .sum::<f64>() as f32
        })
        .collect()
}

/// Convert a power spectrogram to dB in place (ref = 1.0).
///
/// Values below `amin` are floored, then everything is clipped to
/// `max - top_db` across the whole spectrogram.
pub fn power_to_db(frames: &mut [Vec<f32>], amin: f32, top_db: f32) {
    let mut global_max = f32::NEG_INFINITY;
    for frame in frames.iter_mut() {
        for v in frame.iter_mut() {
            *v = 10.0 * v.max(amin).log10();
            global_max = global_max.max(*v);
        }
    }

    if global_max.is_finite() {
        let floor = global_max - top_db;
        for frame in frames.iter_mut() {
            for v in frame.iter_mut() {
                *v = v.max(floor);
            }
        }
    }
}

/// Orthonormal DCT-II of `input`, keeping the first `count` coefficients
pub fn dct_ortho(input: &[f32], count: usize) -> Vec<f32> {
    let n = input.len();
    if n == 0 {
        return vec![0.0; count];
    }
    let n_f = n as f64;

    (0..count)
        .map(|k| {
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    x as f64
                        * (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n_f))
                            .cos()
                })
                .sum();
            let scale = if k == 0 {
                (1.0 / n_f).sqrt()
            } else {
                (2.0 / n_f).sqrt()
            };
            (sum * scale) as f32
        })
        .collect()
}
