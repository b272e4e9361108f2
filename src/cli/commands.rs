//! CLI Command Implementations

use std::path::Path;

use tracing::info;

use crate::ambient::AmbientSoundscape;
use crate::config::EngineConfig;
use crate::engine::{export_wav, AudioBuffer, ChannelLayout, WavFormat};
use crate::error::{NebulaError, Result};
use crate::sfx::{EffectTrigger, EffectsConfig, HookSlot, SfxKind, SoundEffects};

/// Silence rendered after an effect so the file does not end mid-decay
const EFFECT_TAIL_SECS: f64 = 0.02;

/// Interactions played during `demo`: (seconds from start, effect)
const DEMO_SCRIPT: [(f64, SfxKind); 4] = [
    (0.5, SfxKind::Hover),
    (1.0, SfxKind::Click),
    (1.5, SfxKind::Hover),
    (2.0, SfxKind::Click),
];

/// Output options shared by all render commands
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub format: WavFormat,
    pub layout: ChannelLayout,
}

/// What a render command wrote
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub frames: usize,
    pub duration_secs: f64,
    pub peak_db: f32,
}

impl RenderSummary {
    fn of(buffer: &AudioBuffer) -> Self {
        Self {
            frames: buffer.num_samples(),
            duration_secs: buffer.duration_secs(),
            peak_db: buffer.peak_db(),
        }
    }
}

fn frames_for(seconds: f64, sample_rate: u32) -> Result<usize> {
    if !seconds.is_finite() || seconds <= 0.0 || seconds > 3600.0 {
        return Err(NebulaError::InvalidParameter {
            param: "seconds".to_string(),
            value: seconds,
            min: 0.0,
            max: 3600.0,
        });
    }
    Ok((seconds * sample_rate as f64).round() as usize)
}

fn write(buffer: &AudioBuffer, output: &Path, options: RenderOptions) -> Result<RenderSummary> {
    let buffer = buffer.to_layout(options.layout);
    export_wav(&buffer, output, options.format)?;
    info!(path = %output.display(), frames = buffer.num_samples(), "render written");
    Ok(RenderSummary::of(&buffer))
}

/// Render the playing ambience to a WAV file
pub fn render_ambient(
    config: &EngineConfig,
    seconds: f64,
    volume: Option<f32>,
    muted: bool,
    output: &Path,
    options: RenderOptions,
) -> Result<RenderSummary> {
    let frames = frames_for(seconds, config.sample_rate)?;
    let platform = config.platform();
    let mut ambient = AmbientSoundscape::mount(&platform, config.ambient.clone());
    if !ambient.is_available() {
        return Err(NebulaError::NothingToRender {
            reason: "ambient audio is unavailable".to_string(),
        });
    }

    if let Some(volume) = volume {
        ambient.set_volume(volume);
    }
    ambient.toggle_play();
    if muted {
        ambient.toggle_mute();
    }

    let buffer = ambient.render(frames).ok_or_else(|| NebulaError::NothingToRender {
        reason: "ambient render failed".to_string(),
    })?;
    ambient.unmount();
    write(&buffer, output, options)
}

/// Render one effect burst to a WAV file
pub fn render_effect(
    config: &EngineConfig,
    kind: SfxKind,
    output: &Path,
    options: RenderOptions,
) -> Result<RenderSummary> {
    let platform = config.platform();
    let slot = HookSlot::new();
    let effects_config = EffectsConfig {
        enabled: true,
        ..config.effects
    };
    let effects = SoundEffects::mount(&platform, effects_config, slot.clone());
    if !slot.is_available() {
        return Err(NebulaError::NothingToRender {
            reason: "sound effects are unavailable".to_string(),
        });
    }

    let burst = match kind {
        SfxKind::Hover => effects_config.hover,
        SfxKind::Click => effects_config.click,
    };
    slot.play(kind);

    let frames = frames_for(burst.duration_secs + EFFECT_TAIL_SECS, config.sample_rate)?;
    let buffer = effects
        .render(frames)
        .ok_or_else(|| NebulaError::NothingToRender {
            reason: "effect render failed".to_string(),
        })?;
    effects.unmount();
    write(&buffer, output, options)
}

/// Render the ambience with scripted interactions on top
///
/// Interactions go through the hook slot only, the way UI elements reach
/// the emitter. With effects disabled the script is silently skipped.
pub fn render_demo(
    config: &EngineConfig,
    seconds: f64,
    output: &Path,
    options: RenderOptions,
) -> Result<RenderSummary> {
    let total = frames_for(seconds, config.sample_rate)?;
    let platform = config.platform();
    let slot = HookSlot::new();

    let mut ambient = AmbientSoundscape::mount(&platform, config.ambient.clone());
    let effects = SoundEffects::mount(&platform, config.effects, slot.clone());
    if !ambient.is_available() && !effects.is_available() {
        return Err(NebulaError::NothingToRender {
            reason: "no audio component is available".to_string(),
        });
    }
    ambient.toggle_play();

    let mut mix = AudioBuffer::from_mono(Vec::new(), config.sample_rate);
    let mut rendered = 0;
    let cues = DEMO_SCRIPT
        .iter()
        .map(|&(at, kind)| ((at * config.sample_rate as f64) as usize, Some(kind)))
        .filter(|&(frame, _)| frame < total)
        .chain(std::iter::once((total, None)));

    for (cue_frame, kind) in cues {
        let chunk = cue_frame - rendered;
        if chunk > 0 {
            let mut block = ambient
                .render(chunk)
                .unwrap_or_else(|| AudioBuffer::new(chunk, ChannelLayout::Mono, config.sample_rate));
            if let Some(fx) = effects.render(chunk) {
                block.mix_from(&fx, 0)?;
            }
            mix.append(&block)?;
            rendered = cue_frame;
        }
        if let Some(kind) = kind {
            slot.play(kind);
        }
    }

    ambient.unmount();
    effects.unmount();
    write(&mix, output, options)
}

/// Print the effective configuration
pub fn print_config(config: &EngineConfig) -> Result<()> {
    println!("{}", config.to_json_pretty()?);
    Ok(())
}
