//! Acoustic feature extraction

pub mod descriptors;
pub mod extractor;
pub mod mel;
pub mod recipe;
pub mod spectrum;

pub use extractor::{FeatureExtractor, FeatureSet};
pub use recipe::{Descriptor, FeatureLayout, FeatureRecipe, SchemaField, SpectralConfig};
pub use spectrum::Spectrogram;
