//! Feature extraction
//!
//! [`FeatureExtractor`] turns a waveform into a [`FeatureSet`] of
//! time-averaged descriptors and then lays the set out as a raw vector in
//! the order its recipe declares.

use log::debug;

use super::descriptors::{
    chroma_mean, mfcc_means, rms_mean, spectral_bandwidth_mean, spectral_centroid_mean,
    spectral_rolloff_mean, zero_crossing_rate_mean,
};
use super::recipe::{mfcc_key, Descriptor, FeatureLayout, FeatureRecipe};
use super::spectrum::Spectrogram;
use crate::audio::Waveform;
use crate::error::{DetectError, Result};

/// Named descriptor values in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    entries: Vec<(String, f32)>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing an existing one in place
    pub fn insert(&mut self, name: impl Into<String>, value: f32) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Values in insertion order
    pub fn to_vec(&self) -> Vec<f32> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    fn require(&self, name: &str) -> Result<f32> {
        self.get(name).ok_or_else(|| DetectError::FeatureExtraction {
            reason: format!("feature '{}' was not computed", name),
        })
    }
}

/// Computes the descriptors a recipe asks for
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    recipe: FeatureRecipe,
}

impl FeatureExtractor {
    pub fn new(recipe: FeatureRecipe) -> Self {
        Self { recipe }
    }

    pub fn recipe(&self) -> &FeatureRecipe {
        &self.recipe
    }

    /// Compute every descriptor the recipe requires.
    ///
    /// An empty waveform yields zeros. Non-finite samples are rejected.
    pub fn extract(&self, waveform: &Waveform) -> Result<FeatureSet> {
        if let Some(pos) = waveform.samples().iter().position(|s| !s.is_finite()) {
            return Err(DetectError::FeatureExtraction {
                reason: format!("waveform contains a non-finite sample at index {}", pos),
            });
        }

        let required = self.recipe.required_descriptors();
        let mut set = FeatureSet::new();

        if waveform.is_empty() {
            debug!("Empty waveform, all descriptors default to 0");
            for descriptor in &required {
                insert_zeros(&mut set, descriptor);
            }
            return Ok(set);
        }

        let config = self.recipe.spectral();
        let samples = waveform.samples();
        let spectrogram = if required.iter().any(Descriptor::is_spectral) {
            Some(Spectrogram::compute(
                samples,
                waveform.sample_rate(),
                config.n_fft,
                config.hop_length,
            ))
        } else {
            None
        };

        for descriptor in &required {
            match (descriptor, spectrogram.as_ref()) {
                (Descriptor::Rms, _) => {
                    set.insert("rms", rms_mean(samples, config.n_fft, config.hop_length))
                }
                (Descriptor::ZeroCrossingRate, _) => set.insert(
                    "zero_crossing_rate",
                    zero_crossing_rate_mean(samples, config.n_fft, config.hop_length),
                ),
                (Descriptor::Mfcc { count }, Some(spec)) => {
                    let coeffs = mfcc_means(spec, *count, config.n_mels, config.top_db);
                    for (i, c) in coeffs.into_iter().enumerate() {
                        set.insert(mfcc_key(i + 1), c);
                    }
                }
                (Descriptor::ChromaStft, Some(spec)) => set.insert("chroma_stft", chroma_mean(spec)),
                (Descriptor::SpectralCentroid, Some(spec)) => {
                    set.insert("spectral_centroid", spectral_centroid_mean(spec))
                }
                (Descriptor::SpectralBandwidth, Some(spec)) => {
                    set.insert("spectral_bandwidth", spectral_bandwidth_mean(spec))
                }
                (Descriptor::Rolloff, Some(spec)) => {
                    set.insert("rolloff", spectral_rolloff_mean(spec, config.rolloff_percent))
                }
                (_, None) => {
                    return Err(DetectError::FeatureExtraction {
                        reason: "spectrogram was not computed".to_string(),
                    })
                }
            }
        }

        if let Some((name, _)) = set.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DetectError::FeatureExtraction {
                reason: format!("descriptor '{}' is not finite", name),
            });
        }

        debug!(
            "Extracted {} feature values from {:.2}s of audio",
            set.len(),
            waveform.duration_secs()
        );
        Ok(set)
    }

    /// Lay a feature set out in recipe order
    pub fn flatten(&self, set: &FeatureSet) -> Result<Vec<f32>> {
        match self.recipe.layout() {
            FeatureLayout::Flat { descriptors } => {
                let mut raw = Vec::with_capacity(self.recipe.raw_len());
                for descriptor in descriptors {
                    match descriptor {
                        Descriptor::Mfcc { count } => {
                            for i in 1..=*count {
                                raw.push(set.require(&mfcc_key(i))?);
                            }
                        }
                        other => raw.push(set.require(other.key().unwrap_or_default())?),
                    }
                }
                Ok(raw)
            }
            FeatureLayout::Named { .. } => self
                .recipe
                .fields()
                .iter()
                .map(|field| set.require(&field.key()))
                .collect(),
        }
    }

    /// Extract and flatten in one step
    pub fn extract_vector(&self, waveform: &Waveform) -> Result<Vec<f32>> {
        let set = self.extract(waveform)?;
        self.flatten(&set)
    }
}

fn insert_zeros(set: &mut FeatureSet, descriptor: &Descriptor) {
    match descriptor {
        Descriptor::Mfcc { count } => {
            for i in 1..=*count {
                set.insert(mfcc_key(i), 0.0);
            }
        }
        other => set.insert(other.key().unwrap_or_default(), 0.0),
    }
}
