//! Time-averaged acoustic descriptors
//!
//! Each function reduces a whole clip to one value (or one value per
//! coefficient) by averaging frame-level measurements. Frames without
//! energy contribute 0 rather than NaN.

use super::mel::{apply_filterbank, dct_ortho, mel_filterbank, power_to_db};
use super::spectrum::{frames, pad_center, PadMode, Spectrogram};

/// Floor applied before taking logs of mel energies
const AMIN: f32 = 1e-10;

/// Reference pitch for chroma mapping (A4)
const TUNING_A4_HZ: f64 = 440.0;

fn mean(values: impl Iterator<Item = f64>) -> f32 {
    let (sum, count) = values.fold((0.0f64, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        (sum / count as f64) as f32
    }
}

/// Mean MFCCs over all frames
pub fn mfcc_means(spec: &Spectrogram, n_mfcc: usize, n_mels: usize, top_db: f32) -> Vec<f32> {
    if spec.num_frames() == 0 || n_mfcc == 0 {
        return vec![0.0; n_mfcc];
    }

    let fmax = spec.sample_rate() as f64 / 2.0;
    let filterbank = mel_filterbank(spec.sample_rate(), spec.n_fft(), n_mels, 0.0, fmax);

    let mut mel_frames: Vec<Vec<f32>> = spec
        .power()
        .iter()
        .map(|power| apply_filterbank(&filterbank, power))
        .collect();
    power_to_db(&mut mel_frames, AMIN, top_db);

    let mut sums = vec![0.0f64; n_mfcc];
    for frame in &mel_frames {
        for (sum, c) in sums.iter_mut().zip(dct_ortho(frame, n_mfcc)) {
            *sum += c as f64;
        }
    }

    let n = mel_frames.len() as f64;
    sums.into_iter().map(|s| (s / n) as f32).collect()
}

/// Mean chroma energy.
///
/// Each bin above DC is assigned to its nearest pitch class, each frame is
/// normalised by its strongest class, and the result is averaged over
/// classes and frames.
pub fn chroma_mean(spec: &Spectrogram) -> f32 {
    let freqs = spec.bin_frequencies();
    let classes: Vec<Option<usize>> = freqs
        .iter()
        .map(|&f| {
            if f <= 0.0 {
                return None;
            }
            // Semitones relative to C
            let pitch = 12.0 * (f as f64 / TUNING_A4_HZ).log2() + 9.0;
            Some((pitch.round() as i64).rem_euclid(12) as usize)
        })
        .collect();

    mean(spec.power().iter().flat_map(|power| {
        let mut chroma = [0.0f64; 12];
        for (class, &p) in classes.iter().zip(power.iter()) {
            if let Some(c) = class {
                chroma[*c] += p as f64;
            }
        }
        let peak = chroma.iter().cloned().fold(0.0f64, f64::max);
        chroma.into_iter().map(move |c| if peak > 0.0 { c / peak } else { 0.0 })
    }))
}

/// Mean frame RMS energy over centered frames
pub fn rms_mean(samples: &[f32], frame_length: usize, hop_length: usize) -> f32 {
    let padded = pad_center(samples, frame_length / 2, PadMode::Constant);
    mean(frames(&padded, frame_length, hop_length).into_iter().map(|frame| {
        let power: f64 =
            frame.iter().map(|&s| s as f64 * s as f64).sum::<f64>() / frame.len() as f64;
        power.sqrt()
    }))
}

/// Mean zero-crossing rate over centered frames (zero counts as positive)
pub fn zero_crossing_rate_mean(samples: &[f32], frame_length: usize, hop_length: usize) -> f32 {
    let padded = pad_center(samples, frame_length / 2, PadMode::Edge);
    mean(frames(&padded, frame_length, hop_length).into_iter().map(|frame| {
        let crossings = frame
            .windows(2)
            .filter(|w| w[0].is_sign_negative() != w[1].is_sign_negative())
            .count();
        crossings as f64 / frame.len() as f64
    }))
}

/// Per-frame spectral centroid, using magnitudes as weights
fn frame_centroid(magnitudes: &[f32], freqs: &[f32]) -> Option<f64> {
    let total: f64 = magnitudes.iter().map(|&m| m as f64).sum();
    if total <= 0.0 {
        return None;
    }
    let weighted: f64 = magnitudes
        .iter()
        .zip(freqs)
        .map(|(&m, &f)| m as f64 * f as f64)
        .sum();
    Some(weighted / total)
}

/// Mean spectral centroid in Hz
pub fn spectral_centroid_mean(spec: &Spectrogram) -> f32 {
    let freqs = spec.bin_frequencies();
    mean((0..spec.num_frames()).map(|t| frame_centroid(&spec.magnitudes(t), &freqs).unwrap_or(0.0)))
}

/// Mean second-order spectral bandwidth in Hz
pub fn spectral_bandwidth_mean(spec: &Spectrogram) -> f32 {
    let freqs = spec.bin_frequencies();
    mean((0..spec.num_frames()).map(|t| {
        let mags = spec.magnitudes(t);
        let Some(centroid) = frame_centroid(&mags, &freqs) else {
            return 0.0;
        };
        let total: f64 = mags.iter().map(|&m| m as f64).sum();
        let spread: f64 = mags
            .iter()
            .zip(&freqs)
            .map(|(&m, &f)| (m as f64 / total) * (f as f64 - centroid).powi(2))
            .sum();
        spread.sqrt()
    }))
}

/// Mean roll-off frequency: lowest bin frequency reaching `roll_percent`
/// of the frame's cumulative magnitude
pub fn spectral_rolloff_mean(spec: &Spectrogram, roll_percent: f32) -> f32 {
    let freqs = spec.bin_frequencies();
    mean((0..spec.num_frames()).map(|t| {
        let mags = spec.magnitudes(t);
        let total: f64 = mags.iter().map(|&m| m as f64).sum();
        let threshold = roll_percent as f64 * total;

        let mut cumulative = 0.0f64;
        for (&m, &f) in mags.iter().zip(&freqs) {
            cumulative += m as f64;
            if cumulative >= threshold {
                return f as f64;
            }
        }
        0.0
    }))
}
