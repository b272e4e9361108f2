//! CLI Module
//!
//! Command-line front end: renders the ambience and the effects offline to
//! WAV files.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::sfx::SfxKind;

/// Nebula - procedural ambience and UI sound effects
#[derive(Parser, Debug)]
#[command(name = "nebula")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// WAV bit depth (16, 24 or 32)
    #[arg(long, global = true, default_value_t = 16)]
    pub bit_depth: u16,

    /// Write two identical channels instead of one
    #[arg(long, global = true)]
    pub stereo: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the ambient soundscape
    #[command(name = "ambient")]
    Ambient {
        /// Length of the render in seconds
        #[arg(short, long, default_value_t = 10.0)]
        seconds: f64,

        /// Volume in [0, 1] (defaults to the configured initial volume)
        #[arg(long)]
        volume: Option<f32>,

        /// Start muted (renders silence)
        #[arg(long)]
        muted: bool,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render a single interaction sound effect
    #[command(name = "effect")]
    Effect {
        /// Which effect to render
        #[arg(value_enum)]
        kind: EffectArg,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render the ambience with a scripted series of hovers and clicks
    #[command(name = "demo")]
    Demo {
        /// Length of the render in seconds
        #[arg(short, long, default_value_t = 3.0)]
        seconds: f64,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the effective configuration as JSON
    #[command(name = "config")]
    Config,
}

/// Effect selector on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EffectArg {
    Hover,
    Click,
}

impl From<EffectArg> for SfxKind {
    fn from(arg: EffectArg) -> Self {
        match arg {
            EffectArg::Hover => SfxKind::Hover,
            EffectArg::Click => SfxKind::Click,
        }
    }
}
