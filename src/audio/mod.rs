//! Audio processing: WAV codec, channel downmix, per-sample cooking, and
//! aggregate metadata.

pub mod cook;
pub mod meta;
pub mod mixer;
pub mod wave;

pub use cook::{cook, CookedSample};
pub use meta::{aggregate, AudioMetadata};
pub use wave::{BitDepth, DecodedSample, WaveFormat, SAMPLE_RATES};
