//! Output format configuration
//!
//! Every format knob can be pinned to a concrete value or left on "auto",
//! in which case it is resolved at render time from the aggregate metadata
//! of the currently assigned samples. The configuration serializes with
//! the archive manifest, preserving "auto" as the literal string the
//! manifest format uses.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::audio::meta::AudioMetadata;
use crate::audio::wave::{BitDepth, SAMPLE_RATES};

/// A knob that is either resolved automatically or pinned to a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Auto<T> {
    #[default]
    Auto,
    Value(T),
}

impl<T> Auto<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Auto::Auto => None,
            Auto::Value(value) => Some(value),
        }
    }
}

impl<T: Serialize> Serialize for Auto<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Auto::Auto => serializer.serialize_str("auto"),
            Auto::Value(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: for<'a> Deserialize<'a>> Deserialize<'de> for Auto<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if raw.as_str() == Some("auto") {
            return Ok(Auto::Auto);
        }
        T::deserialize(raw)
            .map(Auto::Value)
            .map_err(D::Error::custom)
    }
}

/// Output channel mode when pinned explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    Mono,
    Stereo,
}

impl ChannelMode {
    pub fn count(self) -> u16 {
        match self {
            ChannelMode::Mono => 1,
            ChannelMode::Stereo => 2,
        }
    }
}

/// User-facing render configuration, mutated live and snapshotted per task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    pub channels: Auto<ChannelMode>,
    pub bit_depth: Auto<BitDepth>,
    pub sample_rate: Auto<u32>,
    pub stride: Auto<u32>,
    pub normalize: bool,
    pub kit_name: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            channels: Auto::Auto,
            bit_depth: Auto::Auto,
            sample_rate: Auto::Auto,
            stride: Auto::Auto,
            normalize: true,
            kit_name: String::new(),
        }
    }
}

/// Fully resolved configuration a render task actually runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub channels: u16,
    pub bit_depth: BitDepth,
    pub sample_rate: u32,
    pub stride: u32,
    pub normalize: bool,
    pub kit_name: String,
}

impl RenderConfig {
    /// Resolve every "auto" knob against the assigned samples' metadata.
    ///
    /// Auto channels go stereo only when a stereo sample is assigned (wider
    /// layouts get folded either way). Auto bit depth and sample rate snap
    /// the aggregate max up to the nearest allowed value; an empty kit
    /// falls back to mono / 16-bit / 44100 Hz.
    pub fn resolve(&self, meta: &AudioMetadata, layout_total: u32) -> ResolvedConfig {
        let channels = match self.channels {
            Auto::Value(mode) => mode.count(),
            Auto::Auto => {
                if meta.channel.stereo > 0 {
                    2
                } else {
                    1
                }
            }
        };

        let bit_depth = match self.bit_depth {
            Auto::Value(depth) => depth,
            Auto::Auto => snap_bit_depth(meta.bit_depth.max),
        };

        let sample_rate = match self.sample_rate {
            Auto::Value(rate) => rate,
            Auto::Auto => snap_sample_rate(meta.sample_rate.max),
        };

        let stride = match self.stride {
            Auto::Value(stride) => stride,
            Auto::Auto => layout_total,
        };

        ResolvedConfig {
            channels,
            bit_depth,
            sample_rate,
            stride,
            normalize: self.normalize,
            kit_name: if self.kit_name.is_empty() {
                "kit".to_string()
            } else {
                self.kit_name.clone()
            },
        }
    }
}

/// Snap an observed bit depth up to the nearest supported depth.
///
/// Zero (empty kit) falls back to 16-bit.
pub fn snap_bit_depth(bits: u32) -> BitDepth {
    if bits == 0 {
        return BitDepth::B16;
    }
    BitDepth::ALL
        .into_iter()
        .find(|depth| depth.bits() as u32 >= bits)
        .unwrap_or(BitDepth::B32)
}

/// Snap an observed sample rate up to the nearest allowed rate.
///
/// Zero (empty kit) falls back to 44100 Hz.
pub fn snap_sample_rate(rate: u32) -> u32 {
    if rate == 0 {
        return 44100;
    }
    SAMPLE_RATES
        .into_iter()
        .find(|&allowed| allowed >= rate)
        .unwrap_or(SAMPLE_RATES[SAMPLE_RATES.len() - 1])
}

/// Step along the sample-rate ladder from a current value
pub fn step_sample_rate(current: u32, increment: bool) -> u32 {
    let index = SAMPLE_RATES
        .iter()
        .position(|&rate| rate >= current)
        .unwrap_or(SAMPLE_RATES.len() - 1);
    let next = if increment {
        (index + 1).min(SAMPLE_RATES.len() - 1)
    } else {
        index.saturating_sub(1)
    };
    SAMPLE_RATES[next]
}

/// Step along the bit-depth ladder from a current value
pub fn step_bit_depth(current: BitDepth, increment: bool) -> BitDepth {
    let index = BitDepth::ALL
        .iter()
        .position(|&depth| depth == current)
        .unwrap_or(0);
    let next = if increment {
        (index + 1).min(BitDepth::ALL.len() - 1)
    } else {
        index.saturating_sub(1)
    };
    BitDepth::ALL[next]
}

/// Step the stride by one slot from a current value.
///
/// The stride is free-running (any slot count works as a repetition
/// width); decrementing stops at 0, which disables labeling.
pub fn step_stride(current: u32, increment: bool) -> u32 {
    if increment {
        current + 1
    } else {
        current.saturating_sub(1)
    }
}
