//! Feature recipes
//!
//! A recipe names the descriptors a model variant was trained on and the
//! order they are laid out in. Recipes are validated when they are built
//! (including when deserialized), so a bad schema fails at configuration
//! time instead of producing a silently misordered vector.

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};

/// Maximum number of cepstral coefficients a recipe may request
pub const MAX_MFCC: usize = 128;

/// One acoustic descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Descriptor {
    /// First `count` mel-frequency cepstral coefficients
    Mfcc { count: usize },
    ChromaStft,
    Rms,
    SpectralCentroid,
    SpectralBandwidth,
    Rolloff,
    ZeroCrossingRate,
}

impl Descriptor {
    /// Scalar descriptors in their canonical key order
    pub const SCALARS: [Descriptor; 6] = [
        Descriptor::ChromaStft,
        Descriptor::Rms,
        Descriptor::SpectralCentroid,
        Descriptor::SpectralBandwidth,
        Descriptor::Rolloff,
        Descriptor::ZeroCrossingRate,
    ];

    /// Feature key for scalar descriptors; `None` for MFCC groups
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Descriptor::Mfcc { .. } => None,
            Descriptor::ChromaStft => Some("chroma_stft"),
            Descriptor::Rms => Some("rms"),
            Descriptor::SpectralCentroid => Some("spectral_centroid"),
            Descriptor::SpectralBandwidth => Some("spectral_bandwidth"),
            Descriptor::Rolloff => Some("rolloff"),
            Descriptor::ZeroCrossingRate => Some("zero_crossing_rate"),
        }
    }

    /// Number of values this descriptor contributes
    pub fn width(&self) -> usize {
        match self {
            Descriptor::Mfcc { count } => *count,
            _ => 1,
        }
    }

    /// Whether this descriptor needs the STFT
    pub fn is_spectral(&self) -> bool {
        !matches!(self, Descriptor::Rms | Descriptor::ZeroCrossingRate)
    }
}

/// Key of the `index`-th (1-based) cepstral coefficient
pub fn mfcc_key(index: usize) -> String {
    format!("mfcc{}", index)
}

/// A parsed field of a named schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaField {
    /// 1-based MFCC index
    Mfcc(usize),
    /// A scalar (non-MFCC) descriptor
    Scalar(Descriptor),
}

impl SchemaField {
    /// Parse a field key such as `rms` or `mfcc7`
    pub fn parse(key: &str) -> Result<Self> {
        if let Some(scalar) = Descriptor::SCALARS.iter().find(|d| d.key() == Some(key)) {
            return Ok(SchemaField::Scalar(*scalar));
        }

        let index = key
            .strip_prefix("mfcc")
            .and_then(|rest| rest.parse::<usize>().ok())
            .ok_or_else(|| DetectError::config(format!("unknown feature field '{}'", key)))?;

        if index == 0 || index > MAX_MFCC {
            return Err(DetectError::config(format!(
                "feature field '{}' is out of range (mfcc1..mfcc{})",
                key, MAX_MFCC
            )));
        }
        Ok(SchemaField::Mfcc(index))
    }

    /// The feature key this field reads
    pub fn key(&self) -> String {
        match self {
            SchemaField::Mfcc(i) => mfcc_key(*i),
            SchemaField::Scalar(d) => d.key().unwrap_or_default().to_string(),
        }
    }
}

/// How descriptor values are laid out into the raw vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum FeatureLayout {
    /// Descriptor groups concatenated in declaration order
    Flat { descriptors: Vec<Descriptor> },
    /// Values looked up by key in the declared field order
    Named { fields: Vec<String> },
}

/// STFT and descriptor parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    pub n_fft: usize,
    pub hop_length: usize,
    pub n_mels: usize,
    pub rolloff_percent: f32,
    pub top_db: f32,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            rolloff_percent: 0.85,
            top_db: 80.0,
        }
    }
}

impl SpectralConfig {
    fn validate(&self) -> Result<()> {
        if self.n_fft < 16 || self.n_fft % 2 != 0 {
            return Err(DetectError::config(format!(
                "n_fft must be an even number >= 16, got {}",
                self.n_fft
            )));
        }
        if self.hop_length == 0 {
            return Err(DetectError::config("hop_length must be positive"));
        }
        if self.n_mels == 0 {
            return Err(DetectError::config("n_mels must be positive"));
        }
        if !(self.rolloff_percent > 0.0 && self.rolloff_percent < 1.0) {
            return Err(DetectError::config(format!(
                "rolloff_percent must be in (0, 1), got {}",
                self.rolloff_percent
            )));
        }
        if !(self.top_db > 0.0) {
            return Err(DetectError::config("top_db must be positive"));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawRecipe {
    #[serde(flatten)]
    layout: FeatureLayout,
    #[serde(default)]
    spectral: SpectralConfig,
}

/// A validated feature recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecipe")]
pub struct FeatureRecipe {
    #[serde(flatten)]
    layout: FeatureLayout,
    spectral: SpectralConfig,
    #[serde(skip)]
    fields: Vec<SchemaField>,
}

impl TryFrom<RawRecipe> for FeatureRecipe {
    type Error = DetectError;

    fn try_from(raw: RawRecipe) -> Result<Self> {
        FeatureRecipe::new(raw.layout, raw.spectral)
    }
}

impl FeatureRecipe {
    /// Build and validate a recipe
    pub fn new(layout: FeatureLayout, spectral: SpectralConfig) -> Result<Self> {
        spectral.validate()?;

        let fields = match &layout {
            FeatureLayout::Flat { descriptors } => {
                if descriptors.is_empty() {
                    return Err(DetectError::config("flat recipe has no descriptors"));
                }
                for d in descriptors {
                    if let Descriptor::Mfcc { count } = d {
                        if *count == 0 || *count > MAX_MFCC {
                            return Err(DetectError::config(format!(
                                "mfcc count must be in 1..={}, got {}",
                                MAX_MFCC, count
                            )));
                        }
                    }
                }
                let mfcc_groups = descriptors
                    .iter()
                    .filter(|d| matches!(d, Descriptor::Mfcc { .. }))
                    .count();
                if mfcc_groups > 1 {
                    return Err(DetectError::config("flat recipe declares more than one mfcc group"));
                }
                for scalar in Descriptor::SCALARS {
                    if descriptors.iter().filter(|d| **d == scalar).count() > 1 {
                        return Err(DetectError::config(format!(
                            "flat recipe repeats descriptor '{}'",
                            scalar.key().unwrap_or_default()
                        )));
                    }
                }
                Vec::new()
            }
            FeatureLayout::Named { fields } => {
                if fields.is_empty() {
                    return Err(DetectError::config("named schema has no fields"));
                }
                let parsed = fields
                    .iter()
                    .map(|f| SchemaField::parse(f))
                    .collect::<Result<Vec<_>>>()?;
                for (i, field) in parsed.iter().enumerate() {
                    if parsed[..i].contains(field) {
                        return Err(DetectError::config(format!(
                            "named schema repeats field '{}'",
                            field.key()
                        )));
                    }
                }
                parsed
            }
        };

        Ok(Self {
            layout,
            spectral,
            fields,
        })
    }

    /// Flat recipe of `n` MFCCs only
    pub fn mfcc(n: usize) -> Result<Self> {
        Self::new(
            FeatureLayout::Flat {
                descriptors: vec![Descriptor::Mfcc { count: n }],
            },
            SpectralConfig::default(),
        )
    }

    /// Named schema: the six scalar descriptors followed by `mfcc1..mfccN`
    pub fn tabular(n_mfcc: usize) -> Result<Self> {
        let fields = Descriptor::SCALARS
            .iter()
            .filter_map(|d| d.key().map(str::to_string))
            .chain((1..=n_mfcc).map(mfcc_key))
            .collect();
        Self::new(FeatureLayout::Named { fields }, SpectralConfig::default())
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn spectral(&self) -> &SpectralConfig {
        &self.spectral
    }

    /// Parsed schema fields (empty for flat layouts)
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Descriptors that must be computed, in computation order
    pub fn required_descriptors(&self) -> Vec<Descriptor> {
        match &self.layout {
            FeatureLayout::Flat { descriptors } => descriptors.clone(),
            FeatureLayout::Named { .. } => {
                let mut required = Vec::new();
                let n_mfcc = self
                    .fields
                    .iter()
                    .filter_map(|f| match f {
                        SchemaField::Mfcc(i) => Some(*i),
                        SchemaField::Scalar(_) => None,
                    })
                    .max();
                if let Some(count) = n_mfcc {
                    required.push(Descriptor::Mfcc { count });
                }
                required.extend(self.fields.iter().filter_map(|f| match f {
                    SchemaField::Scalar(d) => Some(*d),
                    SchemaField::Mfcc(_) => None,
                }));
                required
            }
        }
    }

    /// Length of the raw vector this recipe produces
    pub fn raw_len(&self) -> usize {
        match &self.layout {
            FeatureLayout::Flat { descriptors } => descriptors.iter().map(|d| d.width()).sum(),
            FeatureLayout::Named { fields } => fields.len(),
        }
    }
}
