//! Aggregate statistics over a set of decoded samples
//!
//! Feeds both the UI-facing summary (CLI `inspect`) and the "auto" output
//! format resolution: auto bit depth and sample rate use the aggregate max,
//! auto channel count goes stereo when any aggregated sample is stereo.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::audio::wave::WaveFormat;

/// Observed minimum and maximum of one format property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MinMax {
    pub min: u32,
    pub max: u32,
}

/// Channel-count histogram: mono and stereo counted directly, anything
/// wider bucketed by channel count
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelHistogram {
    pub mono: u32,
    pub stereo: u32,
    pub other: BTreeMap<u16, u32>,
}

/// Aggregate over a set of sample formats. Empty input yields all zeros.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub sample_rate: MinMax,
    pub bit_depth: MinMax,
    pub channel: ChannelHistogram,
}

/// Summarize a collection of sample formats.
pub fn aggregate<'a>(formats: impl IntoIterator<Item = &'a WaveFormat>) -> AudioMetadata {
    let mut iter = formats.into_iter();
    let first = match iter.next() {
        Some(format) => format,
        None => return AudioMetadata::default(),
    };

    let mut meta = AudioMetadata {
        sample_rate: MinMax {
            min: first.sample_rate,
            max: first.sample_rate,
        },
        bit_depth: MinMax {
            min: first.bits_per_sample as u32,
            max: first.bits_per_sample as u32,
        },
        channel: ChannelHistogram::default(),
    };

    for format in std::iter::once(first).chain(iter) {
        meta.sample_rate.min = meta.sample_rate.min.min(format.sample_rate);
        meta.sample_rate.max = meta.sample_rate.max.max(format.sample_rate);
        meta.bit_depth.min = meta.bit_depth.min.min(format.bits_per_sample as u32);
        meta.bit_depth.max = meta.bit_depth.max.max(format.bits_per_sample as u32);
        match format.num_channels {
            1 => meta.channel.mono += 1,
            2 => meta.channel.stereo += 1,
            n => *meta.channel.other.entry(n).or_insert(0) += 1,
        }
    }

    meta
}
