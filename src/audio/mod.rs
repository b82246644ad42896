//! Audio input
//!
//! Decoding, downmixing and resampling of the file under analysis into a
//! mono [`Waveform`] at the analysis sample rate.

pub mod io;
pub mod resample;
pub mod waveform;

pub use io::{AudioLoader, DEFAULT_SAMPLE_RATE};
pub use resample::{downmix_to_mono, resample};
pub use waveform::{generate_test_tone, Waveform};
