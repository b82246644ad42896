//! Audio file loading
//!
//! WAV files are read with hound. Everything else (mp3, flac, ogg, m4a, ...)
//! goes through symphonia's probe. Either way the result is downmixed to mono
//! and resampled to the analysis rate.

use std::fs::File;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use log::{debug, info, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::resample::{downmix_to_mono, resample};
use super::waveform::Waveform;
use crate::error::{DetectError, Result};

/// Analysis sample rate used by every built-in model variant
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

/// Decoded interleaved PCM before downmixing
struct DecodedAudio {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

/// Decodes audio files into mono waveforms at a fixed target rate
#[derive(Debug, Clone)]
pub struct AudioLoader {
    target_sample_rate: u32,
}

impl Default for AudioLoader {
    fn default() -> Self {
        Self {
            target_sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl AudioLoader {
    /// Create a loader that resamples to `target_sample_rate`
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Load an audio file as a mono waveform at the target rate
    ///
    /// # Errors
    /// * `FileNotFound` - If the path does not exist
    /// * `AudioDecode` - If the container or codec cannot be decoded
    pub fn load(&self, path: &Path) -> Result<Waveform> {
        if !path.exists() {
            return Err(DetectError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let decoded = if is_wav(path) {
            decode_wav(path)?
        } else {
            decode_with_symphonia(path)?
        };

        debug!(
            "Decoded {}: {} interleaved samples, {} channel(s) at {} Hz",
            path.display(),
            decoded.samples.len(),
            decoded.channels,
            decoded.sample_rate
        );

        let mono = downmix_to_mono(&decoded.samples, decoded.channels);
        let samples = resample(&mono, decoded.sample_rate, self.target_sample_rate)
            .map_err(|e| e.at_path(path))?;

        info!(
            "Audio loaded: {} samples at {} Hz",
            samples.len(),
            self.target_sample_rate
        );

        Waveform::new(samples, self.target_sample_rate).map_err(|e| e.at_path(path))
    }
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("wav") || ext.eq_ignore_ascii_case("wave"))
        .unwrap_or(false)
}

fn decode_wav(path: &Path) -> Result<DecodedAudio> {
    let display = path.display().to_string();
    let reader = WavReader::open(path).map_err(|e| DetectError::AudioDecode {
        path: display.clone(),
        reason: format!("failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let samples = read_wav_samples(reader, spec.bits_per_sample, spec.sample_format)
        .map_err(|e| DetectError::AudioDecode {
            path: display.clone(),
            reason: format!("failed to read samples: {}", e),
            source: Some(Box::new(e)),
        })?;

    Ok(DecodedAudio {
        samples,
        channels: spec.channels as usize,
        sample_rate: spec.sample_rate,
    })
}

fn read_wav_samples<R: std::io::Read>(
    reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> std::result::Result<Vec<f32>, hound::Error> {
    match sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect(),
        SampleFormat::Int => {
            let scale = (1u64 << (bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect()
        }
    }
}

fn decode_with_symphonia(path: &Path) -> Result<DecodedAudio> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|e| DetectError::AudioDecode {
        path: display.clone(),
        reason: format!("failed to open file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DetectError::decode(&display, format!("unrecognized format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DetectError::decode(&display, "no audio tracks found"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DetectError::decode(&display, format!("unsupported codec: {}", e)))?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(DetectError::decode(
                    &display,
                    format!("failed to read packet: {}", e),
                ))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count();

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping undecodable packet in {}: {}", display, e);
            }
            Err(e) => {
                return Err(DetectError::decode(
                    &display,
                    format!("failed to decode packet: {}", e),
                ))
            }
        }
    }

    if sample_rate == 0 || channels == 0 {
        return Err(DetectError::decode(
            &display,
            "stream does not declare a sample rate or channel layout",
        ));
    }

    Ok(DecodedAudio {
        samples,
        channels,
        sample_rate,
    })
}
