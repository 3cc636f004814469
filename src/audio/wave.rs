//! WAV codec for kitforge
//!
//! The narrow interface the rest of the pipeline depends on: decode WAV
//! bytes into interleaved float samples, convert bit depth, resample with a
//! windowed-sinc resampler, and encode a finished buffer back to WAV bytes
//! with cue-point markers.
//!
//! Samples are carried as `f64` at the native integer scale of their bit
//! depth (8-bit unsigned 0..255, 16-bit in ±32768, and so on). A 32-bit
//! float source is brought to 32-bit integer scale on decode, so every
//! buffer in flight obeys the same convention.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use serde::{Deserialize, Serialize};

use crate::error::{KitError, Result};

// ============================================================================
// Formats
// ============================================================================

/// Sample rates the kit output format may use, in ascending order
pub const SAMPLE_RATES: [u32; 5] = [8000, 44100, 48000, 96000, 192000];

/// Output bit depth of the rendered kit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BitDepth {
    B8,
    B16,
    B24,
    B32,
}

impl BitDepth {
    /// All supported depths in ascending order
    pub const ALL: [BitDepth; 4] = [BitDepth::B8, BitDepth::B16, BitDepth::B24, BitDepth::B32];

    /// Bits per sample
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::B8 => 8,
            BitDepth::B16 => 16,
            BitDepth::B24 => 24,
            BitDepth::B32 => 32,
        }
    }

    /// Maximum representable value at this depth, as used for peak scaling.
    ///
    /// 8-bit is unsigned PCM, so its full range tops out at 255; the wider
    /// depths use the magnitude of their negative full scale.
    pub fn max_value(self) -> f64 {
        match self {
            BitDepth::B8 => 255.0,
            BitDepth::B16 => 32768.0,
            BitDepth::B24 => 8_388_608.0,
            BitDepth::B32 => 2_147_483_648.0,
        }
    }

    /// Sample value that represents silence at this depth.
    ///
    /// Unsigned 8-bit PCM is centered, so its silence value is non-zero.
    pub fn silence_value(self) -> f64 {
        match self {
            BitDepth::B8 => 64.0,
            _ => 0.0,
        }
    }

    /// Look up the depth for a bits-per-sample count
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(BitDepth::B8),
            16 => Some(BitDepth::B16),
            24 => Some(BitDepth::B24),
            32 => Some(BitDepth::B32),
            _ => None,
        }
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = String;

    fn try_from(bits: u16) -> std::result::Result<Self, Self::Error> {
        BitDepth::from_bits(bits).ok_or_else(|| format!("unsupported bit depth: {}", bits))
    }
}

impl From<BitDepth> for u16 {
    fn from(depth: BitDepth) -> u16 {
        depth.bits()
    }
}

/// Format of one decoded or rendered buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveFormat {
    pub num_channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

/// One decoded audio file: format plus interleaved samples at native scale.
///
/// Immutable once decoded; slots hold shared read-only references to it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSample {
    pub format: WaveFormat,
    pub samples: Vec<f64>,
}

impl DecodedSample {
    /// Number of audio frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.format.num_channels == 0 {
            return 0;
        }
        self.samples.len() / self.format.num_channels as usize
    }

    /// Playback duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.format.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.format.sample_rate as f64
    }
}

/// A one-frame silent sample in the given format.
///
/// Used to fill empty slots up to the last occupied one. 8-bit silence uses
/// the mid-scale value 64.
pub fn silent_sample(num_channels: u16, sample_rate: u32, depth: BitDepth) -> DecodedSample {
    let value = depth.silence_value();
    DecodedSample {
        format: WaveFormat {
            num_channels,
            sample_rate,
            bits_per_sample: depth.bits(),
        },
        samples: vec![value; num_channels as usize],
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a WAV file held in memory
///
/// # Errors
/// * `Decode` - if the bytes are not a parseable WAV container
/// * `UnsupportedFormat` - for integer depths outside {8, 16, 24, 32}
pub fn decode(bytes: &[u8]) -> Result<DecodedSample> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| KitError::decode("failed to open WAV data", e))?;

    let spec = reader.spec();
    let samples = read_samples(reader, spec.bits_per_sample, spec.sample_format)?;

    // Float sources are carried at 32-bit integer scale so every decoded
    // buffer obeys the same native-scale convention.
    let bits_per_sample = match spec.sample_format {
        SampleFormat::Float => 32,
        SampleFormat::Int => spec.bits_per_sample,
    };

    Ok(DecodedSample {
        format: WaveFormat {
            num_channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample,
        },
        samples,
    })
}

/// Read all samples as f64 at the native integer scale of the source depth
fn read_samples<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f64>> {
    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| v as f64 * BitDepth::B32.max_value()))
            .collect::<std::result::Result<Vec<f64>, _>>()
            .map_err(|e| KitError::decode("failed to read float samples", e)),
        SampleFormat::Int => match bits_per_sample {
            // hound exposes 8-bit unsigned PCM as signed i8
            8 => reader
                .samples::<i8>()
                .map(|s| s.map(|v| v as f64 + 128.0))
                .collect::<std::result::Result<Vec<f64>, _>>()
                .map_err(|e| KitError::decode("failed to read 8-bit samples", e)),
            16 => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f64))
                .collect::<std::result::Result<Vec<f64>, _>>()
                .map_err(|e| KitError::decode("failed to read 16-bit samples", e)),
            24 | 32 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64))
                .collect::<std::result::Result<Vec<f64>, _>>()
                .map_err(|e| KitError::decode("failed to read integer samples", e)),
            _ => Err(KitError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits_per_sample),
            }),
        },
    }
}

// ============================================================================
// Bit depth conversion
// ============================================================================

/// Scale a buffer from one bit depth's native range to another's.
///
/// Goes through a normalized [-1, 1] intermediate; 8-bit uses its unsigned
/// 128-centered range on both sides.
pub fn convert_bit_depth(samples: &[f64], from_bits: u16, to: BitDepth) -> Result<Vec<f64>> {
    let from = BitDepth::from_bits(from_bits).ok_or(KitError::UnsupportedFormat {
        format: format!("{}-bit audio", from_bits),
    })?;
    if from == to {
        return Ok(samples.to_vec());
    }

    Ok(samples
        .iter()
        .map(|&v| from_normalized(to_normalized(v, from), to))
        .collect())
}

fn to_normalized(value: f64, depth: BitDepth) -> f64 {
    match depth {
        BitDepth::B8 => (value - 128.0) / 128.0,
        _ => value / depth.max_value(),
    }
}

fn from_normalized(value: f64, depth: BitDepth) -> f64 {
    match depth {
        BitDepth::B8 => value * 128.0 + 128.0,
        _ => value * depth.max_value(),
    }
}

// ============================================================================
// Resampling
// ============================================================================

const RESAMPLE_CHUNK_SIZE: usize = 1024;

/// Resample an interleaved buffer with a windowed-sinc resampler.
///
/// Output length is `round(frames * to_rate / from_rate)` frames; the
/// resampler's group delay is trimmed from the front.
pub fn resample(
    samples: &[f64],
    num_channels: u16,
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<f64>> {
    if from_rate == to_rate || samples.is_empty() || num_channels == 0 {
        return Ok(samples.to_vec());
    }

    let channels = num_channels as usize;
    let planar = deinterleave(samples, channels);
    let in_frames = planar[0].len();
    let ratio = to_rate as f64 / from_rate as f64;
    let expected_frames = (in_frames as f64 * ratio).round() as usize;

    let sinc_params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        oversampling_factor: 128,
        interpolation: SincInterpolationType::Linear,
        window: WindowFunction::BlackmanHarris2,
    };

    let resample_err = |reason: String| KitError::Resample {
        from_rate,
        to_rate,
        reason,
    };

    let mut resampler =
        SincFixedIn::<f64>::new(ratio, 1.0, sinc_params, RESAMPLE_CHUNK_SIZE, channels)
            .map_err(|e| resample_err(e.to_string()))?;
    let delay = resampler.output_delay();

    fn append_block(chunk: Vec<Vec<f64>>, out: &mut [Vec<f64>]) {
        for (ch, data) in chunk.into_iter().enumerate() {
            out[ch].extend(data);
        }
    }

    let mut out_planar: Vec<Vec<f64>> = vec![Vec::with_capacity(expected_frames); channels];

    // Full chunks first, then the partial tail.
    let mut pos = 0;
    loop {
        let needed = resampler.input_frames_next();
        if in_frames - pos < needed {
            break;
        }
        let chunk: Vec<Vec<f64>> = planar.iter().map(|c| c[pos..pos + needed].to_vec()).collect();
        let out = resampler
            .process(&chunk, None)
            .map_err(|e| resample_err(e.to_string()))?;
        append_block(out, &mut out_planar);
        pos += needed;
    }
    if pos < in_frames {
        let tail: Vec<Vec<f64>> = planar.iter().map(|c| c[pos..].to_vec()).collect();
        let out = resampler
            .process_partial(Some(&tail), None)
            .map_err(|e| resample_err(e.to_string()))?;
        append_block(out, &mut out_planar);
    }

    // Flush zero-padded blocks until the delayed tail has drained.
    while out_planar[0].len() < delay + expected_frames {
        let out = resampler
            .process_partial(None::<&[Vec<f64>]>, None)
            .map_err(|e| resample_err(e.to_string()))?;
        if out.is_empty() || out[0].is_empty() {
            break;
        }
        append_block(out, &mut out_planar);
    }

    // Trim the group delay, pad with silence if the flush came up short.
    let mut trimmed: Vec<Vec<f64>> = out_planar
        .into_iter()
        .map(|c| c.into_iter().skip(delay).take(expected_frames).collect::<Vec<f64>>())
        .collect();
    for channel in &mut trimmed {
        channel.resize(expected_frames, 0.0);
    }

    Ok(interleave(&trimmed))
}

/// De-interleave samples from [L,R,L,R,...] to [[L,L,...], [R,R,...]]
pub fn deinterleave(samples: &[f64], channels: usize) -> Vec<Vec<f64>> {
    let frames = samples.len() / channels;
    let mut result = vec![Vec::with_capacity(frames); channels];

    for (i, sample) in samples.iter().enumerate() {
        result[i % channels].push(*sample);
    }

    result
}

/// Interleave channels from [[L,L,...], [R,R,...]] to [L,R,L,R,...]
pub fn interleave(channels: &[Vec<f64>]) -> Vec<f64> {
    if channels.is_empty() {
        return Vec::new();
    }

    let num_channels = channels.len();
    let frames = channels[0].len();
    let mut result = Vec::with_capacity(frames * num_channels);

    for frame in 0..frames {
        for channel in channels {
            result.push(channel[frame]);
        }
    }

    result
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode an interleaved native-scale buffer as PCM WAV bytes.
///
/// `cues_ms` places one open-ended cue point per entry, at the given offset
/// in milliseconds from the start of the file.
pub fn encode(
    samples: &[f64],
    num_channels: u16,
    sample_rate: u32,
    depth: BitDepth,
    cues_ms: &[f64],
) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: num_channels,
        sample_rate,
        bits_per_sample: depth.bits(),
        sample_format: SampleFormat::Int,
    };

    let mut bytes: Vec<u8> = Vec::new();
    {
        let mut cursor = Cursor::new(&mut bytes);
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| KitError::render(format!("failed to create WAV writer: {}", e)))?;

        let write_err = |e: hound::Error| KitError::render(format!("failed to write sample: {}", e));
        match depth {
            BitDepth::B8 => {
                for &sample in samples {
                    let scaled = sample.round().clamp(0.0, 255.0) as i32 - 128;
                    writer.write_sample(scaled as i8).map_err(write_err)?;
                }
            }
            BitDepth::B16 => {
                for &sample in samples {
                    let scaled = sample.round().clamp(-32768.0, 32767.0) as i16;
                    writer.write_sample(scaled).map_err(write_err)?;
                }
            }
            BitDepth::B24 => {
                for &sample in samples {
                    let scaled = sample.round().clamp(-8_388_608.0, 8_388_607.0) as i32;
                    writer.write_sample(scaled).map_err(write_err)?;
                }
            }
            BitDepth::B32 => {
                for &sample in samples {
                    let scaled = sample.round().clamp(-2_147_483_648.0, 2_147_483_647.0) as i32;
                    writer.write_sample(scaled).map_err(write_err)?;
                }
            }
        }

        writer
            .finalize()
            .map_err(|e| KitError::render(format!("failed to finalize WAV: {}", e)))?;
    }

    if !cues_ms.is_empty() {
        append_cue_chunk(&mut bytes, sample_rate, cues_ms);
    }

    Ok(bytes)
}

/// Append a `cue ` chunk with one marker per entry and patch the RIFF size.
///
/// Markers are open-ended: position only, no playlist or length entries.
fn append_cue_chunk(bytes: &mut Vec<u8>, sample_rate: u32, cues_ms: &[f64]) {
    const CUE_POINT_SIZE: usize = 24;
    let body_size = 4 + cues_ms.len() * CUE_POINT_SIZE;

    // Chunks start on word boundaries. An odd-length data chunk (possible
    // for 8-bit and 24-bit output) carries a pad byte that is not counted
    // in its own size.
    if bytes.len() % 2 != 0 {
        bytes.push(0);
    }

    bytes.extend_from_slice(b"cue ");
    bytes.extend_from_slice(&(body_size as u32).to_le_bytes());
    bytes.extend_from_slice(&(cues_ms.len() as u32).to_le_bytes());
    for (i, &ms) in cues_ms.iter().enumerate() {
        let sample_offset = (ms / 1000.0 * sample_rate as f64).round() as u32;
        bytes.extend_from_slice(&(i as u32 + 1).to_le_bytes()); // dwName
        bytes.extend_from_slice(&sample_offset.to_le_bytes()); // dwPosition
        bytes.extend_from_slice(b"data"); // fccChunk
        bytes.extend_from_slice(&0u32.to_le_bytes()); // dwChunkStart
        bytes.extend_from_slice(&0u32.to_le_bytes()); // dwBlockStart
        bytes.extend_from_slice(&sample_offset.to_le_bytes()); // dwSampleOffset
    }

    // RIFF chunk size counts everything after the first 8 bytes.
    let riff_size = (bytes.len() - 8) as u32;
    bytes[4..8].copy_from_slice(&riff_size.to_le_bytes());
}

/// Read cue-point sample offsets back out of a WAV file.
///
/// Scans the RIFF chunk list for a `cue ` chunk; a file without one yields
/// an empty list.
pub fn read_cue_points(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(KitError::Decode {
            reason: "not a RIFF/WAVE file".to_string(),
            source: None,
        });
    }

    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = u32::from_le_bytes([
            bytes[pos + 4],
            bytes[pos + 5],
            bytes[pos + 6],
            bytes[pos + 7],
        ]) as usize;
        let body = pos + 8;

        if id == b"cue " && body + 4 <= bytes.len() {
            let count = u32::from_le_bytes([
                bytes[body],
                bytes[body + 1],
                bytes[body + 2],
                bytes[body + 3],
            ]) as usize;
            let mut offsets = Vec::with_capacity(count);
            for i in 0..count {
                let entry = body + 4 + i * 24;
                if entry + 24 > bytes.len() {
                    return Err(KitError::Decode {
                        reason: "truncated cue chunk".to_string(),
                        source: None,
                    });
                }
                offsets.push(u32::from_le_bytes([
                    bytes[entry + 20],
                    bytes[entry + 21],
                    bytes[entry + 22],
                    bytes[entry + 23],
                ]));
            }
            return Ok(offsets);
        }

        // Chunks are word-aligned.
        pos = body + size + (size & 1);
    }

    Ok(Vec::new())
}

// ============================================================================
// Tests
// ============================================================================
