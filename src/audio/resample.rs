//! Channel mixing and sample rate conversion
//!
//! Resampling uses rubato's `SincFixedIn` over the whole clip in a single
//! pass. The clip is zero-padded past the filter length, so even a clip
//! shorter than the filter delay comes out at full length once the delay is
//! trimmed.

use log::debug;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::{DetectError, Result, IN_MEMORY};

const MAX_FLUSHES: usize = 8;

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// A trailing partial frame is ignored.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => samples
            .chunks_exact(n)
            .map(|frame| frame.iter().sum::<f32>() / n as f32)
            .collect(),
    }
}

/// Resample mono `samples` from `source_rate` to `target_rate`.
///
/// Output length is `ceil(len * target_rate / source_rate)`.
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if source_rate == 0 || target_rate == 0 {
        return Err(resample_error(format!(
            "cannot resample {} Hz -> {} Hz",
            source_rate, target_rate
        )));
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let expected_len = (samples.len() as f64 * ratio).ceil() as usize;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    // Zero tail long enough to push every real sample through the filter
    let padding = params.sinc_len * 2;
    let mut padded = Vec::with_capacity(samples.len() + padding);
    padded.extend_from_slice(samples);
    padded.resize(samples.len() + padding, 0.0);

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, padded.len(), 1)
        .map_err(|e| resample_error(e.to_string()))?;

    let delay = resampler.output_delay();
    let needed = delay + expected_len;
    let mut output = resampler
        .process(&[padded.as_slice()], None)
        .map_err(|e| resample_error(e.to_string()))?
        .swap_remove(0);

    let mut flushes = 0;
    while output.len() < needed && flushes < MAX_FLUSHES {
        let tail = resampler
            .process_partial::<Vec<f32>>(None, None)
            .map_err(|e| resample_error(e.to_string()))?
            .swap_remove(0);
        output.extend_from_slice(&tail);
        flushes += 1;
    }

    if output.len() < needed {
        return Err(resample_error(format!(
            "resampler produced {} of {} frames",
            output.len(),
            needed
        )));
    }
    let aligned = output[delay..needed].to_vec();

    debug!(
        "Resampled {} samples ({} Hz) -> {} samples ({} Hz)",
        samples.len(),
        source_rate,
        aligned.len(),
        target_rate
    );

    Ok(aligned)
}

fn resample_error(reason: String) -> DetectError {
    DetectError::decode(IN_MEMORY, format!("resampling failed: {}", reason))
}
