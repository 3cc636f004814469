//! Command-line interface
//!
//! The CLI is the input adapter around the core: it collects WAV bytes
//! from the filesystem, feeds them through the project and task layers,
//! and writes rendered kits and archives back out.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::audio::wave::BitDepth;
use crate::kit::config::{Auto, ChannelMode, RenderConfig};

/// Kitforge - drum kit sample bank assembler
#[derive(Parser, Debug)]
#[command(name = "kitforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render WAV files or a project archive into one kit WAV
    #[command(name = "render")]
    Render {
        /// WAV files and/or directories, assigned to slots in name order
        inputs: Vec<PathBuf>,

        /// Render from a project archive instead of loose files
        #[arg(short, long, conflicts_with = "inputs")]
        archive: Option<PathBuf>,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Bundle WAV files into a project archive
    #[command(name = "export")]
    Export {
        /// WAV files and/or directories, assigned to slots in name order
        inputs: Vec<PathBuf>,

        /// Output archive path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Read a project archive and print its contents
    #[command(name = "import")]
    Import {
        /// Archive to read
        archive: PathBuf,

        /// Also extract the contained WAV files into this directory
        #[arg(long)]
        extract_to: Option<PathBuf>,
    },

    /// Print aggregate metadata for WAV files as JSON
    #[command(name = "inspect")]
    Inspect {
        /// WAV files and/or directories
        inputs: Vec<PathBuf>,
    },
}

/// Render configuration flags shared by `render` and `export`
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Output channel mode; omit to derive from the inputs
    #[arg(long)]
    pub channels: Option<ChannelArg>,

    /// Output bit depth (8, 16, 24 or 32); omit to derive from the inputs
    #[arg(long)]
    pub bit_depth: Option<u16>,

    /// Output sample rate in Hz; omit to derive from the inputs
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Slots per layout repetition; omit to use the layout total
    #[arg(long)]
    pub stride: Option<u32>,

    /// Scale samples to full range instead of keeping their stored level
    #[arg(long)]
    pub peak_scale: bool,

    /// Kit name stored in the output
    #[arg(long)]
    pub kit_name: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ChannelArg {
    Mono,
    Stereo,
}

impl ConfigArgs {
    /// Build a render config; unset flags stay on automatic resolution.
    ///
    /// The stored `normalize` flag means "keep levels as-is", so the
    /// `--peak-scale` flag clears it.
    pub fn to_config(&self) -> crate::error::Result<RenderConfig> {
        let bit_depth = match self.bit_depth {
            None => Auto::Auto,
            Some(bits) => Auto::Value(BitDepth::from_bits(bits).ok_or_else(|| {
                crate::error::KitError::UnsupportedFormat {
                    format: format!("{bits}-bit output"),
                }
            })?),
        };

        Ok(RenderConfig {
            channels: match self.channels {
                None => Auto::Auto,
                Some(ChannelArg::Mono) => Auto::Value(ChannelMode::Mono),
                Some(ChannelArg::Stereo) => Auto::Value(ChannelMode::Stereo),
            },
            bit_depth,
            sample_rate: self.sample_rate.map_or(Auto::Auto, Auto::Value),
            stride: self.stride.map_or(Auto::Auto, Auto::Value),
            normalize: !self.peak_scale,
            kit_name: self.kit_name.clone().unwrap_or_default(),
        })
    }
}
