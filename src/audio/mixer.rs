//! Channel downmixing
//!
//! Folds one interleaved audio frame down to mono or stereo using fixed
//! per-speaker-position gains. The channel order is fixed:
//!
//! ```text
//!  0 front-left     1 front-right    2 center
//!  3 side-left      4 side-right     5 back-left      6 back-right
//!  7 top-center     8 high-front-left  9 high-front-center
//! 10 high-front-right  11 high-back-left  12 high-back-right
//! ```
//!
//! Mixing is staged: each stage contributes only when its complete channel
//! group is present, and the mix stops at the first gap. Layouts must
//! therefore supply channels in-order for the later stages to apply.
//! Both functions are pure; no state, no side effects.

use std::f64::consts::FRAC_1_SQRT_2;

/// 1 / (2 * sqrt(2)), the high-back gain of the mono fold
const INV_2_SQRT_2: f64 = FRAC_1_SQRT_2 / 2.0;

/// Fold one frame down to a single mono sample.
///
/// An empty frame mixes to silence; a one-channel frame passes through.
pub fn mix_to_mono(frame: &[f64]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    if frame.len() < 2 {
        return frame[0];
    }
    let mut value = frame[0] * FRAC_1_SQRT_2 + frame[1] * FRAC_1_SQRT_2;
    if frame.len() < 3 {
        return value;
    }
    value += frame[2];
    if frame.len() < 5 {
        return value;
    }
    value += frame[3] * 0.5 + frame[4] * 0.5;
    if frame.len() < 7 {
        return value;
    }
    value += frame[5] * 0.5 + frame[6] * 0.5;
    if frame.len() < 8 {
        return value;
    }
    value += frame[7];
    if frame.len() < 11 {
        return value;
    }
    value += frame[8] * 0.5 + frame[9] + frame[10] * 0.5;
    if frame.len() < 13 {
        return value;
    }
    value + frame[11] * INV_2_SQRT_2 + frame[12] * INV_2_SQRT_2
}

/// Fold one frame down to a stereo (left, right) pair.
///
/// A mono frame is duplicated onto both sides; an empty frame is silence.
pub fn mix_to_stereo(frame: &[f64]) -> (f64, f64) {
    if frame.is_empty() {
        return (0.0, 0.0);
    }
    if frame.len() < 2 {
        return (frame[0], frame[0]);
    }
    if frame.len() < 3 {
        return (frame[0], frame[1]);
    }
    let mut left = frame[0] + frame[2] * FRAC_1_SQRT_2;
    let mut right = frame[1] + frame[2] * FRAC_1_SQRT_2;
    if frame.len() < 5 {
        return (left, right);
    }
    left += frame[3] * FRAC_1_SQRT_2;
    right += frame[4] * FRAC_1_SQRT_2;
    if frame.len() < 7 {
        return (left, right);
    }
    left += frame[5] * FRAC_1_SQRT_2;
    right += frame[6] * FRAC_1_SQRT_2;
    if frame.len() < 8 {
        return (left, right);
    }
    left += frame[7] * FRAC_1_SQRT_2;
    right += frame[7] * FRAC_1_SQRT_2;
    if frame.len() < 11 {
        return (left, right);
    }
    left += frame[8] * FRAC_1_SQRT_2 + frame[9] * 0.5;
    right += frame[10] * FRAC_1_SQRT_2 + frame[9] * 0.5;
    if frame.len() < 13 {
        return (left, right);
    }
    (left + frame[11] * 0.5, right + frame[12] * 0.5)
}
