//! Model variant registry
//!
//! Each classifier generation is described by one [`ModelVariantDescriptor`]:
//! where its artifact lives, what input shape it expects, which features it
//! was trained on and how its output is labelled. The pipeline is driven
//! entirely by the selected descriptor.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::decision::{LabelScheme, SegmentSpec};
use crate::error::{DetectError, Result};
use crate::features::FeatureRecipe;
use crate::shape::InputShape;

/// Variant used when none is selected
pub const DEFAULT_VARIANT: &str = "deepfake-voice";

#[derive(Deserialize)]
struct RawDescriptor {
    id: String,
    #[serde(default)]
    description: String,
    model_path: PathBuf,
    input_shape: InputShape,
    recipe: FeatureRecipe,
    #[serde(default)]
    scheme: LabelScheme,
    #[serde(default)]
    segments: Option<SegmentSpec>,
}

/// Static configuration of one classifier generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor")]
pub struct ModelVariantDescriptor {
    pub id: String,
    pub description: String,
    pub model_path: PathBuf,
    pub input_shape: InputShape,
    pub recipe: FeatureRecipe,
    pub scheme: LabelScheme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<SegmentSpec>,
}

impl TryFrom<RawDescriptor> for ModelVariantDescriptor {
    type Error = DetectError;

    fn try_from(raw: RawDescriptor) -> Result<Self> {
        let descriptor = ModelVariantDescriptor {
            id: raw.id,
            description: raw.description,
            model_path: raw.model_path,
            input_shape: raw.input_shape,
            recipe: raw.recipe,
            scheme: raw.scheme,
            segments: raw.segments,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }
}

impl ModelVariantDescriptor {
    /// Build and validate a descriptor
    pub fn new(
        id: impl Into<String>,
        model_path: impl Into<PathBuf>,
        input_shape: InputShape,
        recipe: FeatureRecipe,
        scheme: LabelScheme,
    ) -> Result<Self> {
        let descriptor = Self {
            id: id.into(),
            description: String::new(),
            model_path: model_path.into(),
            input_shape,
            recipe,
            scheme,
            segments: None,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_segments(mut self, segments: SegmentSpec) -> Result<Self> {
        segments.validate()?;
        self.segments = Some(segments);
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(DetectError::config("variant id must not be empty"));
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(DetectError::config(format!(
                "variant '{}' has an empty model_path",
                self.id
            )));
        }
        self.scheme.validate()?;
        if let Some(segments) = &self.segments {
            segments.validate()?;
        }
        Ok(())
    }

    /// Artifact path, with relative paths taken from `model_dir`
    pub fn resolve_model_path(&self, model_dir: &Path) -> PathBuf {
        if self.model_path.is_absolute() {
            self.model_path.clone()
        } else {
            model_dir.join(&self.model_path)
        }
    }
}

fn shape(dims: &[usize]) -> Result<InputShape> {
    InputShape::new(dims.to_vec())
}

/// Registry of known variants, in registration order
#[derive(Debug, Clone, Default)]
pub struct VariantRegistry {
    variants: Vec<ModelVariantDescriptor>,
}

impl VariantRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in classifier generations
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();

        registry.register(
            ModelVariantDescriptor::new(
                DEFAULT_VARIANT,
                "deepfake_voice.onnx",
                shape(&[1, 20])?,
                FeatureRecipe::mfcc(20)?,
                LabelScheme::default(),
            )?
            .with_description("Binary classifier over 20 mean MFCCs"),
        );

        registry.register(
            ModelVariantDescriptor::new(
                "tempered-voice",
                "tempered_voice.onnx",
                shape(&[1, 32, 1])?,
                FeatureRecipe::mfcc(32)?,
                LabelScheme::default(),
            )?
            .with_description("Binary classifier over 32 mean MFCCs with 1 s segment labels")
            .with_segments(SegmentSpec::new(1.0)?)?,
        );

        registry.register(
            ModelVariantDescriptor::new(
                "deepfake-voice-multiclass",
                "deepfake_voice_multiclass.onnx",
                shape(&[1, 26])?,
                FeatureRecipe::tabular(20)?,
                LabelScheme::three_class(),
            )?
            .with_description("Fake / PartialFake / Real over the 26-field spectral schema"),
        );

        Ok(registry)
    }

    /// Add a variant, replacing any variant with the same id
    pub fn register(&mut self, descriptor: ModelVariantDescriptor) {
        match self.variants.iter_mut().find(|v| v.id == descriptor.id) {
            Some(existing) => *existing = descriptor,
            None => self.variants.push(descriptor),
        }
    }

    /// Get a variant by id
    pub fn get(&self, id: &str) -> Result<&ModelVariantDescriptor> {
        self.variants
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| DetectError::UnknownVariant { id: id.to_string() })
    }

    pub fn has_variant(&self, id: &str) -> bool {
        self.variants.iter().any(|v| v.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.variants.iter().map(|v| v.id.as_str()).collect()
    }

    pub fn variants(&self) -> &[ModelVariantDescriptor] {
        &self.variants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureLayout;

    #[test]
    fn test_defaults_registered() {
        let registry = VariantRegistry::with_defaults().unwrap();
        assert_eq!(
            registry.ids(),
            vec!["deepfake-voice", "tempered-voice", "deepfake-voice-multiclass"]
        );

        let tempered = registry.get("tempered-voice").unwrap();
        assert_eq!(tempered.input_shape.dims(), &[1, 32, 1]);
        assert_eq!(tempered.recipe.raw_len(), 32);
        assert!(tempered.segments.is_some());

        let multiclass = registry.get("deepfake-voice-multiclass").unwrap();
        assert_eq!(multiclass.input_shape.len(), 26);
        assert!(matches!(multiclass.recipe.layout(), FeatureLayout::Named { .. }));
    }

    #[test]
    fn test_unknown_variant() {
        let registry = VariantRegistry::with_defaults().unwrap();
        match registry.get("nope") {
            Err(DetectError::UnknownVariant { id }) => assert_eq!(id, "nope"),
            other => panic!("Expected UnknownVariant, got: {:?}", other),
        }
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = VariantRegistry::with_defaults().unwrap();
        let replacement = ModelVariantDescriptor::new(
            DEFAULT_VARIANT,
            "/models/custom.json",
            InputShape::new(vec![1, 13]).unwrap(),
            FeatureRecipe::mfcc(13).unwrap(),
            LabelScheme::default(),
        )
        .unwrap();
        registry.register(replacement);

        assert_eq!(registry.variants().len(), 3);
        assert_eq!(registry.get(DEFAULT_VARIANT).unwrap().input_shape.len(), 13);
    }

    #[test]
    fn test_resolve_model_path() {
        let registry = VariantRegistry::with_defaults().unwrap();
        let variant = registry.get(DEFAULT_VARIANT).unwrap();
        assert_eq!(
            variant.resolve_model_path(Path::new("/srv/model")),
            PathBuf::from("/srv/model/deepfake_voice.onnx")
        );
    }

    #[test]
    fn test_descriptor_from_json() {
        let descriptor: ModelVariantDescriptor = serde_json::from_str(
            r#"{
                "id": "small",
                "model_path": "small.json",
                "input_shape": [1, 13],
                "recipe": {"layout": "flat", "descriptors": [{"kind": "mfcc", "count": 13}]},
                "scheme": {"kind": "binary", "threshold": 0.7},
                "segments": {"window_secs": 0.5}
            }"#,
        )
        .unwrap();
        assert_eq!(descriptor.scheme, LabelScheme::Binary { threshold: 0.7 });
        assert_eq!(descriptor.segments.unwrap().window_secs, 0.5);
    }

    #[test]
    fn test_descriptor_json_is_validated() {
        let result = serde_json::from_str::<ModelVariantDescriptor>(
            r#"{
                "id": "",
                "model_path": "x.json",
                "input_shape": [1, 13],
                "recipe": {"layout": "flat", "descriptors": [{"kind": "rms"}]}
            }"#,
        );
        assert!(result.is_err());
    }
}
