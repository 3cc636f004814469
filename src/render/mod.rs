//! Kit rendering
//!
//! Turns the 128-slot assignment plus a render configuration into one
//! multi-cue WAV file. The pipeline walks a fixed phase sequence
//! (resolve, cook, concatenate, finalize) and reports fractional progress
//! 0..100 through a caller-supplied callback; the cooking phase spans
//! 1-90, concatenation 90-99.
//!
//! Trailing empty slots are never rendered. Empty slots at or before the
//! last occupied one are filled with a single silent frame in the target
//! format, so downstream cue-point consumers still see one slice per slot.

use tracing::debug;

use crate::audio::cook::{self, CookedSample};
use crate::audio::meta;
use crate::audio::wave::{self, DecodedSample};
use crate::error::Result;
use crate::kit::config::{RenderConfig, ResolvedConfig};

/// Phase of one render task, in execution order.
///
/// Failure carries no phase of its own; the error simply propagates out
/// of whichever phase raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Resolving,
    Cooking,
    Concatenating,
    Finalizing,
    Done,
}

/// The finished kit: encoded WAV bytes plus the cue layout that went into
/// them, one cue per rendered slot at its start offset in milliseconds.
#[derive(Debug, Clone)]
pub struct RenderedKit {
    pub wav_bytes: Vec<u8>,
    pub cues_ms: Vec<f64>,
    pub config: ResolvedConfig,
}

/// Render a kit from per-slot raw WAV bytes.
///
/// `slots` is the task's immutable input snapshot: one optional byte
/// buffer per slot. `layout_total` backs the "auto" stride default.
/// Progress values passed to `on_progress` are non-decreasing and end at
/// 100 on success. Any decode or encode failure aborts this render only.
pub fn render_kit(
    slots: &[Option<Vec<u8>>],
    config: &RenderConfig,
    layout_total: u32,
    mut on_progress: impl FnMut(f32),
) -> Result<RenderedKit> {
    on_progress(0.0);
    debug!(phase = ?RenderPhase::Resolving, "render started");

    // Resolve: decode everything up front so the aggregate covers exactly
    // the samples being rendered.
    let mut decoded: Vec<Option<DecodedSample>> = Vec::with_capacity(slots.len());
    for bytes in slots {
        decoded.push(match bytes {
            Some(bytes) => Some(wave::decode(bytes)?),
            None => None,
        });
    }

    let aggregate = meta::aggregate(decoded.iter().flatten().map(|sample| &sample.format));
    let resolved = config.resolve(&aggregate, layout_total);
    debug!(
        channels = resolved.channels,
        bits = resolved.bit_depth.bits(),
        sample_rate = resolved.sample_rate,
        "resolved output format"
    );

    let last_occupied = decoded.iter().rposition(|slot| slot.is_some());
    on_progress(1.0);

    // Cook: slots past the last occupied one are excluded entirely; gaps
    // before it become one silent frame each. The silence fill is already
    // in the target format, so it bypasses peak scaling (a non-zero 8-bit
    // silence value must stay at mid-scale).
    debug!(phase = ?RenderPhase::Cooking, "cooking slots");
    let silence = wave::silent_sample(resolved.channels, resolved.sample_rate, resolved.bit_depth);
    let silence_cooked = cook::cook(
        &silence,
        resolved.channels,
        resolved.bit_depth,
        resolved.sample_rate,
        true,
    )?;

    let included = match last_occupied {
        Some(last) => last + 1,
        None => 0,
    };
    let mut cooked: Vec<CookedSample> = Vec::with_capacity(included);
    for (index, slot) in decoded.iter().take(included).enumerate() {
        let sample = match slot {
            Some(sample) => cook::cook(
                sample,
                resolved.channels,
                resolved.bit_depth,
                resolved.sample_rate,
                resolved.normalize,
            )?,
            None => silence_cooked.clone(),
        };
        cooked.push(sample);
        on_progress(1.0 + 89.0 * (index + 1) as f32 / included as f32);
    }

    // Concatenate into one buffer, accumulating cue offsets as we go.
    debug!(phase = ?RenderPhase::Concatenating, segments = cooked.len(), "concatenating");
    let total_len: usize = cooked.iter().map(|sample| sample.samples.len()).sum();
    let mut audio = Vec::with_capacity(total_len);
    let mut cues_ms = Vec::with_capacity(cooked.len());
    let mut cursor_ms = 0.0;
    for (index, sample) in cooked.iter().enumerate() {
        audio.extend_from_slice(&sample.samples);
        cues_ms.push(cursor_ms);
        cursor_ms += sample.duration_secs * 1000.0;
        on_progress(90.0 + 9.0 * (index + 1) as f32 / cooked.len() as f32);
    }

    debug!(phase = ?RenderPhase::Finalizing, "encoding output");
    let wav_bytes = wave::encode(
        &audio,
        resolved.channels,
        resolved.sample_rate,
        resolved.bit_depth,
        &cues_ms,
    )?;

    on_progress(100.0);
    debug!(phase = ?RenderPhase::Done, bytes = wav_bytes.len(), "render finished");

    Ok(RenderedKit {
        wav_bytes,
        cues_ms,
        config: resolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wave::BitDepth;
    use crate::kit::config::{Auto, ChannelMode};
    use approx::assert_relative_eq;

    fn tone_wav(frames: usize, sample_rate: u32) -> Vec<u8> {
        let samples: Vec<f64> = (0..frames)
            .map(|i| {
                20000.0
                    * (2.0 * std::f64::consts::PI * 440.0 * i as f64 / sample_rate as f64).sin()
            })
            .collect();
        wave::encode(&samples, 1, sample_rate, BitDepth::B16, &[]).unwrap()
    }

    fn pinned_config() -> RenderConfig {
        RenderConfig {
            channels: Auto::Value(ChannelMode::Mono),
            bit_depth: Auto::Value(BitDepth::B16),
            sample_rate: Auto::Value(44100),
            stride: Auto::Auto,
            normalize: true,
            kit_name: String::new(),
        }
    }

    #[test]
    fn test_trailing_slots_excluded() {
        // [A, empty, B, empty, empty]: exactly 3 segments, 3 cues.
        let slots = vec![
            Some(tone_wav(4410, 44100)),
            None,
            Some(tone_wav(2205, 44100)),
            None,
            None,
        ];

        let kit = render_kit(&slots, &pinned_config(), 0, |_| {}).unwrap();
        assert_eq!(kit.cues_ms.len(), 3);

        // Second cue sits at A's duration; third one silent frame later.
        assert_relative_eq!(kit.cues_ms[0], 0.0);
        assert_relative_eq!(kit.cues_ms[1], 100.0, epsilon = 1e-6);
        assert_relative_eq!(kit.cues_ms[2], 100.0 + 1000.0 / 44100.0, epsilon = 1e-6);

        let offsets = wave::read_cue_points(&kit.wav_bytes).unwrap();
        assert_eq!(offsets, vec![0, 4410, 4411]);
    }

    #[test]
    fn test_empty_kit_renders_nothing() {
        let slots: Vec<Option<Vec<u8>>> = vec![None; 8];
        let kit = render_kit(&slots, &pinned_config(), 0, |_| {}).unwrap();

        assert!(kit.cues_ms.is_empty());
        let decoded = wave::decode(&kit.wav_bytes).unwrap();
        assert_eq!(decoded.frames(), 0);
    }

    #[test]
    fn test_progress_monotonic_and_complete() {
        let slots = vec![Some(tone_wav(441, 44100)), Some(tone_wav(441, 44100))];
        let mut reported: Vec<f32> = Vec::new();

        render_kit(&slots, &pinned_config(), 0, |p| reported.push(p)).unwrap();

        assert!(reported.windows(2).all(|w| w[0] <= w[1]), "{:?}", reported);
        assert_eq!(reported.first(), Some(&0.0));
        assert_eq!(reported.last(), Some(&100.0));
        assert!(reported.iter().all(|&p| (0.0..=100.0).contains(&p)));
    }

    #[test]
    fn test_single_slot_kit() {
        let slots = vec![Some(tone_wav(441, 44100))];
        let kit = render_kit(&slots, &pinned_config(), 0, |_| {}).unwrap();

        assert_eq!(kit.cues_ms, vec![0.0]);
        let decoded = wave::decode(&kit.wav_bytes).unwrap();
        assert_eq!(decoded.frames(), 441);
    }

    #[test]
    fn test_auto_resolution_from_slots() {
        let stereo_samples = vec![1000.0; 2 * 64];
        let stereo = wave::encode(&stereo_samples, 2, 48000, BitDepth::B24, &[]).unwrap();
        let slots = vec![Some(tone_wav(64, 44100)), Some(stereo)];

        let kit = render_kit(&slots, &RenderConfig::default(), 4, |_| {}).unwrap();

        assert_eq!(kit.config.channels, 2);
        assert_eq!(kit.config.bit_depth, BitDepth::B24);
        assert_eq!(kit.config.sample_rate, 48000);
        assert_eq!(kit.config.stride, 4);

        let decoded = wave::decode(&kit.wav_bytes).unwrap();
        assert_eq!(decoded.format.num_channels, 2);
        assert_eq!(decoded.format.sample_rate, 48000);
        assert_eq!(decoded.format.bits_per_sample, 24);
    }

    #[test]
    fn test_silence_fill_is_one_frame_at_midscale_for_8bit() {
        let config = RenderConfig {
            bit_depth: Auto::Value(BitDepth::B8),
            normalize: false,
            ..pinned_config()
        };
        let eight_bit = wave::encode(&[200.0, 100.0], 1, 44100, BitDepth::B8, &[]).unwrap();
        let slots = vec![None, Some(eight_bit)];

        let kit = render_kit(&slots, &config, 0, |_| {}).unwrap();
        let decoded = wave::decode(&kit.wav_bytes).unwrap();

        // Slot 0 is one silent frame at the 8-bit mid-scale value.
        assert_eq!(decoded.frames(), 3);
        assert_eq!(decoded.samples[0], 64.0);
    }

    #[test]
    fn test_decode_failure_fails_render() {
        let slots = vec![Some(vec![0xde, 0xad])];
        let result = render_kit(&slots, &pinned_config(), 0, |_| {});
        assert!(result.is_err());
    }
}
