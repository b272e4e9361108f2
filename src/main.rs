//! Nebula CLI - Offline Ambience Renderer
//!
//! Command-line interface for rendering the Nebula soundscape and effects.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nebula::cli::commands::{self, RenderOptions, RenderSummary};
use nebula::cli::{Cli, Commands};
use nebula::config::EngineConfig;
use nebula::engine::{ChannelLayout, WavFormat};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Nebula Audio v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let options = RenderOptions {
        format: WavFormat::new(cli.bit_depth),
        layout: if cli.stereo {
            ChannelLayout::Stereo
        } else {
            ChannelLayout::Mono
        },
    };

    match cli.command {
        Some(cmd) => handle_command(cmd, &config, options),
        None => {
            println!("Nebula Audio v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, config: &EngineConfig, options: RenderOptions) -> Result<()> {
    let summary = match cmd {
        Commands::Ambient {
            seconds,
            volume,
            muted,
            output,
        } => commands::render_ambient(config, seconds, volume, muted, &output, options)
            .with_context(|| format!("failed to render ambience to {}", output.display()))?,
        Commands::Effect { kind, output } => {
            commands::render_effect(config, kind.into(), &output, options)
                .with_context(|| format!("failed to render effect to {}", output.display()))?
        }
        Commands::Demo { seconds, output } => {
            commands::render_demo(config, seconds, &output, options)
                .with_context(|| format!("failed to render demo to {}", output.display()))?
        }
        Commands::Config => {
            commands::print_config(config)?;
            return Ok(());
        }
    };
    report(&summary);
    Ok(())
}

fn report(summary: &RenderSummary) {
    println!(
        "Rendered {} frames ({:.2}s), peak {:.1} dBFS",
        summary.frames, summary.duration_secs, summary.peak_db
    );
}
