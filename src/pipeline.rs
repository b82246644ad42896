//! Detection pipeline
//!
//! path → [`AudioLoader`] → [`FeatureExtractor`] → [`ShapeAdapter`] →
//! [`Classifier`] → [`LabelMapper`] → [`Prediction`]
//!
//! Every stage is parameterised by the selected [`ModelVariantDescriptor`].

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::audio::{AudioLoader, Waveform};
use crate::config::DetectorConfig;
use crate::decision::{Label, LabelMapper, Prediction, Segment, SegmentSpec};
use crate::error::{DetectError, Result};
use crate::features::FeatureExtractor;
use crate::neural::{load_classifier, Classifier, ModelVariantDescriptor};
use crate::shape::{InputShape, ShapeAdapter};

/// One-shot detector for a single model variant
#[derive(Debug, Clone)]
pub struct Detector {
    variant: ModelVariantDescriptor,
    model_dir: PathBuf,
    loader: AudioLoader,
    extractor: FeatureExtractor,
    adapter: ShapeAdapter,
    mapper: LabelMapper,
}

impl Detector {
    /// Build a detector for the variant selected in `config`
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        config.validate()?;
        let variant = config.selected_variant()?;
        Ok(Self::for_variant(
            variant,
            &config.model_dir,
            config.target_sample_rate,
        ))
    }

    /// Build a detector for an explicit variant
    pub fn for_variant(
        variant: ModelVariantDescriptor,
        model_dir: &Path,
        target_sample_rate: u32,
    ) -> Self {
        Self {
            extractor: FeatureExtractor::new(variant.recipe.clone()),
            mapper: LabelMapper::new(variant.scheme.clone()),
            adapter: ShapeAdapter::new(),
            loader: AudioLoader::new(target_sample_rate),
            model_dir: model_dir.to_path_buf(),
            variant,
        }
    }

    pub fn variant(&self) -> &ModelVariantDescriptor {
        &self.variant
    }

    /// Resolved path of the variant's model artifact
    pub fn model_path(&self) -> PathBuf {
        self.variant.resolve_model_path(&self.model_dir)
    }

    /// Classify one audio file
    pub fn analyze(&self, path: &Path) -> Result<Prediction> {
        if !path.exists() {
            return Err(DetectError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        info!(
            "Analyzing {} with variant '{}'",
            path.display(),
            self.variant.id
        );
        let waveform = self.loader.load(path)?;
        let mut classifier = load_classifier(&self.model_path())?;
        self.analyze_waveform(&waveform, classifier.as_mut())
    }

    /// Classify an already decoded waveform with a loaded classifier
    pub fn analyze_waveform(
        &self,
        waveform: &Waveform,
        classifier: &mut dyn Classifier,
    ) -> Result<Prediction> {
        let shape = self
            .variant
            .input_shape
            .resolve(classifier.declared_input_shape())?;
        debug!("Model input shape: {}", shape);

        let (label, confidence) = self.classify(waveform, &shape, classifier)?;
        info!("Prediction: {} ({:.2}%)", label, confidence);
        let prediction = Prediction::new(label, confidence);

        match self.variant.segments {
            Some(spec) => {
                let segments = self.segments(waveform, &spec, &shape, classifier)?;
                debug!("Labelled {} segment(s)", segments.len());
                Ok(prediction.with_segments(segments))
            }
            None => Ok(prediction),
        }
    }

    fn classify(
        &self,
        waveform: &Waveform,
        shape: &InputShape,
        classifier: &mut dyn Classifier,
    ) -> Result<(Label, f64)> {
        let raw = self.extractor.extract_vector(waveform)?;
        let vector = self.adapter.adapt(raw, shape);
        let output = classifier.predict(&vector)?;
        debug!("Raw model output: {:?}", output);
        self.mapper.map(&output)
    }

    /// Classify each window on its own
    fn segments(
        &self,
        waveform: &Waveform,
        spec: &SegmentSpec,
        shape: &InputShape,
        classifier: &mut dyn Classifier,
    ) -> Result<Vec<Segment>> {
        spec.windows(waveform.len(), waveform.sample_rate())
            .into_iter()
            .map(|(start, end)| {
                let window = waveform.slice(start, end);
                let (label, _) = self.classify(&window, shape, classifier)?;
                Ok(Segment { start, end, label })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::generate_test_tone;
    use crate::decision::{Label, LabelScheme};
    use crate::features::FeatureRecipe;
    use crate::neural::{MockClassifier, RawOutput, VariantRegistry};

    fn detector(id: &str) -> Detector {
        let registry = VariantRegistry::with_defaults().unwrap();
        let variant = registry.get(id).unwrap().clone();
        Detector::for_variant(variant, Path::new("model"), 22050)
    }

    #[test]
    fn test_binary_variant_with_mock() {
        let detector = detector("deepfake-voice");
        let mut mock = MockClassifier::fixed(RawOutput::Score(0.93));
        let wave = generate_test_tone(440.0, 1.0, 22050);

        let prediction = detector.analyze_waveform(&wave, &mut mock).unwrap();
        assert_eq!(prediction.label, Label::Fake);
        assert_eq!(prediction.confidence, 93.0);
        assert!(prediction.segments.is_none());
        assert_eq!(mock.inputs()[0].len(), 20);
    }

    #[test]
    fn test_multiclass_variant_with_mock() {
        let detector = detector("deepfake-voice-multiclass");
        let mut mock = MockClassifier::fixed(RawOutput::Distribution(vec![0.1, 0.1, 0.8]));
        let wave = generate_test_tone(440.0, 1.0, 22050);

        let prediction = detector.analyze_waveform(&wave, &mut mock).unwrap();
        assert_eq!(prediction.label, Label::Real);
        assert_eq!(prediction.confidence, 80.0);
        assert_eq!(mock.inputs()[0].len(), 26);
    }

    #[test]
    fn test_segments_invoke_model_per_window() {
        let detector = detector("tempered-voice");
        let mut mock = MockClassifier::sequence(vec![
            RawOutput::Score(0.2),
            RawOutput::Score(0.9),
            RawOutput::Score(0.1),
            RawOutput::Score(0.7),
        ]);
        // 2.5 s: two full windows, remainder dropped
        let wave = generate_test_tone(440.0, 2.5, 22050);

        let prediction = detector.analyze_waveform(&wave, &mut mock).unwrap();
        assert_eq!(prediction.label, Label::Real);

        let segments = prediction.segments.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!((segments[0].start, segments[0].end), (0, 22050));
        assert_eq!(segments[0].label, Label::Fake);
        assert_eq!((segments[1].start, segments[1].end), (22050, 44100));
        assert_eq!(segments[1].label, Label::Real);
        assert_eq!(mock.calls(), 3);
        assert!(mock.inputs().iter().all(|v| v.len() == 32));
    }

    #[test]
    fn test_declared_shape_sets_vector_length() {
        let detector = detector("deepfake-voice");
        let mut mock = MockClassifier::fixed(RawOutput::Score(0.5)).with_declared_shape(vec![1, 26]);
        let wave = generate_test_tone(440.0, 0.5, 22050);

        detector.analyze_waveform(&wave, &mut mock).unwrap();
        let input = &mock.inputs()[0];
        assert_eq!(input.len(), 26);
        assert!(input[20..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_invalid_declared_shape_stops_before_model() {
        let detector = detector("deepfake-voice");
        let mut mock = MockClassifier::fixed(RawOutput::Score(0.5)).with_declared_shape(vec![1, -4]);
        let wave = generate_test_tone(440.0, 0.5, 22050);

        let err = detector.analyze_waveform(&wave, &mut mock).unwrap_err();
        assert_eq!(err.error_code(), "SHAPE_MISMATCH");
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn test_short_recipe_is_padded_to_shape() {
        let variant = ModelVariantDescriptor::new(
            "padded",
            "padded.json",
            InputShape::new(vec![1, 26]).unwrap(),
            FeatureRecipe::mfcc(10).unwrap(),
            LabelScheme::default(),
        )
        .unwrap();
        let detector = Detector::for_variant(variant, Path::new("."), 22050);
        let mut mock = MockClassifier::fixed(RawOutput::Score(0.1));
        let wave = generate_test_tone(300.0, 0.5, 22050);

        detector.analyze_waveform(&wave, &mut mock).unwrap();
        let input = &mock.inputs()[0];
        assert_eq!(input.len(), 26);
        assert!(input[10..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_silent_waveform_completes() {
        let detector = detector("deepfake-voice-multiclass");
        let mut mock = MockClassifier::fixed(RawOutput::Distribution(vec![0.3, 0.3, 0.4]));
        let wave = Waveform::new(vec![0.0; 22050], 22050).unwrap();

        detector.analyze_waveform(&wave, &mut mock).unwrap();
        assert!(mock.inputs()[0].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_prediction_error_propagates() {
        let detector = detector("deepfake-voice");
        let mut mock = MockClassifier::failing("runtime exploded");
        let wave = generate_test_tone(440.0, 0.5, 22050);

        let err = detector.analyze_waveform(&wave, &mut mock).unwrap_err();
        assert_eq!(err.error_code(), "PREDICTION_ERROR");
    }

    #[test]
    fn test_nonexistent_file_checked_first() {
        let err = detector("deepfake-voice")
            .analyze(Path::new("/nonexistent/clip.wav"))
            .unwrap_err();
        assert_eq!(err.to_string(), "File not found: /nonexistent/clip.wav");
    }

    #[test]
    fn test_model_path_resolution() {
        assert_eq!(
            detector("tempered-voice").model_path(),
            PathBuf::from("model/tempered_voice.onnx")
        );
    }
}
