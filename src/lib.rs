//! Kitforge - drum kit sample bank assembler
//!
//! Kitforge builds single-WAV drum kits out of individual samples:
//! 1. Samples are imported into a 128-slot grid and labeled by a kit layout
//! 2. Each occupied slot is cooked to one shared output format (bit depth,
//!    sample rate, channel count), with automatic resolution when the
//!    config leaves a field open
//! 3. The cooked slots are concatenated into one WAV with cue points
//!    marking slot boundaries
//!
//! Projects round-trip through a compressed `.ynadk` archive. Long-running
//! operations (render, export, import) run as background tasks that stream
//! progress over a channel.

pub mod archive;
pub mod audio;
pub mod cli;
pub mod error;
pub mod kit;
pub mod render;
pub mod task;

pub use error::{KitError, Result};
