//! Voicecheck - Deepfake Speech Detection
//!
//! Classifies a short recording as genuine or synthetic speech:
//! decode → extract acoustic descriptors → conform to the classifier's input
//! shape → run the classifier → map its output to a label and confidence.
//!
//! # Architecture
//!
//! Every stage is parameterised by a [`neural::ModelVariantDescriptor`], so
//! several incompatible classifier generations run through the same pipeline:
//! - `deepfake-voice`: 20 mean MFCCs, shape `(1, 20)`, binary score
//! - `tempered-voice`: 32 mean MFCCs, shape `(1, 32, 1)`, binary score with
//!   per-second segment labels
//! - `deepfake-voice-multiclass`: 26-field spectral schema, shape `(1, 26)`,
//!   Fake / PartialFake / Real

pub mod audio;
pub mod cli;
pub mod config;
pub mod decision;
pub mod error;
pub mod features;
pub mod neural;
pub mod pipeline;
pub mod report;
pub mod shape;

pub use config::DetectorConfig;
pub use decision::{Label, Prediction, Segment};
pub use error::{DetectError, Result};
pub use pipeline::Detector;
