//! Per-sample cooking
//!
//! Converts one decoded sample to the kit's resolved output format: bit
//! depth first, then a sinc resample, then a per-frame channel fold, then a
//! single scale factor over the whole buffer.

use crate::audio::mixer;
use crate::audio::wave::{self, BitDepth, DecodedSample};
use crate::error::{KitError, Result};

/// One cooked sample: flat interleaved buffer in the target format, plus
/// playback duration for cue-point placement.
#[derive(Debug, Clone, PartialEq)]
pub struct CookedSample {
    pub samples: Vec<f64>,
    pub duration_secs: f64,
}

/// Cook one sample to the target format.
///
/// The scale factor is 1.0 when `normalize` is set; otherwise the sample is
/// peak-scaled to full scale (`max_value / peak`). The flag's polarity is
/// inverted from the common meaning of "normalize" and is preserved as the
/// reference behavior; see DESIGN.md. A zero peak scales by 1.0 rather than
/// dividing by zero.
pub fn cook(
    sample: &DecodedSample,
    target_channels: u16,
    target_depth: BitDepth,
    target_rate: u32,
    normalize: bool,
) -> Result<CookedSample> {
    debug_assert!(target_channels == 1 || target_channels == 2);

    let num_channels = sample.format.num_channels as usize;
    if num_channels == 0 || sample.samples.is_empty() {
        return Ok(CookedSample {
            samples: Vec::new(),
            duration_secs: 0.0,
        });
    }

    let mut samples = if sample.format.bits_per_sample != target_depth.bits() {
        wave::convert_bit_depth(&sample.samples, sample.format.bits_per_sample, target_depth)?
    } else {
        sample.samples.clone()
    };
    if sample.format.sample_rate != target_rate {
        samples = wave::resample(
            &samples,
            sample.format.num_channels,
            sample.format.sample_rate,
            target_rate,
        )?;
    }

    let peak = samples.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
    let factor = if normalize || peak <= 0.0 {
        1.0
    } else {
        target_depth.max_value() / peak
    };

    let frames = samples.len() / num_channels;
    let mut cooked = Vec::with_capacity(frames * target_channels as usize);
    for frame in samples.chunks_exact(num_channels) {
        match target_channels {
            1 => cooked.push(mixer::mix_to_mono(frame) * factor),
            2 => {
                let (left, right) = mixer::mix_to_stereo(frame);
                cooked.push(left * factor);
                cooked.push(right * factor);
            }
            n => {
                return Err(KitError::render(format!(
                    "unsupported target channel count: {}",
                    n
                )))
            }
        }
    }

    Ok(CookedSample {
        samples: cooked,
        duration_secs: frames as f64 / target_rate as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wave::WaveFormat;
    use approx::assert_relative_eq;

    fn mono_sample(samples: Vec<f64>, sample_rate: u32, bits: u16) -> DecodedSample {
        DecodedSample {
            format: WaveFormat {
                num_channels: 1,
                sample_rate,
                bits_per_sample: bits,
            },
            samples,
        }
    }

    #[test]
    fn test_normalize_true_keeps_scale() {
        let sample = mono_sample(vec![100.0, -200.0, 50.0], 44100, 16);
        let cooked = cook(&sample, 1, BitDepth::B16, 44100, true).unwrap();

        assert_eq!(cooked.samples, vec![100.0, -200.0, 50.0]);
    }

    #[test]
    fn test_normalize_false_peak_scales_to_full_scale() {
        let sample = mono_sample(vec![100.0, -200.0, 50.0], 44100, 16);
        let cooked = cook(&sample, 1, BitDepth::B16, 44100, false).unwrap();

        // Peak 200 scaled by 32768/200.
        let factor = 32768.0 / 200.0;
        assert_relative_eq!(cooked.samples[0], 100.0 * factor);
        assert_relative_eq!(cooked.samples[1], -32768.0);
        assert_relative_eq!(cooked.samples[2], 50.0 * factor);
    }

    #[test]
    fn test_zero_peak_scales_by_one() {
        let sample = mono_sample(vec![0.0, 0.0, 0.0], 44100, 16);
        let cooked = cook(&sample, 1, BitDepth::B16, 44100, false).unwrap();
        assert_eq!(cooked.samples, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_duration_uses_target_rate() {
        let sample = mono_sample(vec![0.0; 44100], 44100, 16);
        let cooked = cook(&sample, 1, BitDepth::B16, 44100, true).unwrap();
        assert_relative_eq!(cooked.duration_secs, 1.0);

        let resampled = cook(&sample, 1, BitDepth::B16, 48000, true).unwrap();
        assert_relative_eq!(resampled.duration_secs, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_mono_to_stereo_duplicates_frames() {
        let sample = mono_sample(vec![10.0, -20.0], 44100, 16);
        let cooked = cook(&sample, 2, BitDepth::B16, 44100, true).unwrap();
        assert_eq!(cooked.samples, vec![10.0, 10.0, -20.0, -20.0]);
    }

    #[test]
    fn test_stereo_to_mono_folds() {
        let sample = DecodedSample {
            format: WaveFormat {
                num_channels: 2,
                sample_rate: 44100,
                bits_per_sample: 16,
            },
            samples: vec![100.0, 100.0],
        };
        let cooked = cook(&sample, 1, BitDepth::B16, 44100, true).unwrap();
        assert_relative_eq!(cooked.samples[0], 200.0 * std::f64::consts::FRAC_1_SQRT_2);
    }

    #[test]
    fn test_bit_depth_conversion_applied_before_scaling() {
        // 16-bit full-scale converted to 24-bit, then peak-scaled: already at
        // full scale, so the factor lands it exactly on 24-bit max.
        let sample = mono_sample(vec![-32768.0, 16384.0], 44100, 16);
        let cooked = cook(&sample, 1, BitDepth::B24, 44100, false).unwrap();

        assert_relative_eq!(cooked.samples[0], -8_388_608.0);
        assert_relative_eq!(cooked.samples[1], 4_194_304.0);
    }

    #[test]
    fn test_degenerate_sample_yields_empty() {
        let sample = DecodedSample {
            format: WaveFormat {
                num_channels: 0,
                sample_rate: 44100,
                bits_per_sample: 16,
            },
            samples: Vec::new(),
        };
        let cooked = cook(&sample, 1, BitDepth::B16, 44100, false).unwrap();
        assert!(cooked.samples.is_empty());
        assert_eq!(cooked.duration_secs, 0.0);
    }
}
