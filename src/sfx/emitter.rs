//! Interaction Sound-Effect Emitter
//!
//! Synthesizes hover and click tones on demand. Every call allocates a fresh
//! one-shot generator with its stop already scheduled; the context reclaims
//! it once the burst has played out, so nothing here tracks live tones.

use crate::engine::buffer::AudioBuffer;
use crate::engine::context::{ContextState, Output, SourceId};
use crate::engine::platform::{AudioPlatform, Availability};
use crate::engine::session::AudioSession;
use crate::error::Result;
use crate::sfx::hooks::{HookSlot, SoundHooks};
use crate::sfx::tone::{SfxKind, ToneBurst};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Host-supplied emitter settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub enabled: bool,
    pub hover: ToneBurst,
    pub click: ToneBurst,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hover: ToneBurst::HOVER,
            click: ToneBurst::CLICK,
        }
    }
}

impl EffectsConfig {
    pub fn validate(&self) -> Result<()> {
        self.hover.validate()?;
        self.click.validate()
    }
}

/// State shared between the emitter and its published hooks
#[derive(Debug)]
pub(crate) struct EmitterCore {
    session: Availability<AudioSession>,
    enabled: bool,
    /// Burst settings passed validation at mount
    playable: bool,
    hover: ToneBurst,
    click: ToneBurst,
    emitted: u64,
}

impl EmitterCore {
    fn new(config: &EffectsConfig) -> Self {
        Self {
            session: Availability::Unavailable,
            enabled: false,
            playable: config.validate().is_ok(),
            hover: config.hover,
            click: config.click,
            emitted: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn disabled_for_tests() -> Self {
        Self::new(&EffectsConfig::default())
    }

    /// Fire-and-forget; failures are logged and swallowed
    ///
    /// The burst becomes a one-shot source that the context reclaims while
    /// rendering past its stop time. A host that never renders keeps them.
    pub(crate) fn play(&mut self, kind: SfxKind) {
        if !self.enabled {
            return;
        }
        let burst = match kind {
            SfxKind::Hover => self.hover,
            SfxKind::Click => self.click,
        };
        let Some(session) = self.session.available_mut() else {
            return;
        };
        match emit(session, &burst) {
            Ok(id) => {
                self.emitted += 1;
                debug!(?kind, source = id.index(), "sound effect scheduled");
            }
            Err(err) => warn!(?kind, code = err.error_code(), error = %err, "error playing sound effect"),
        }
    }
}

/// Schedule one self-terminating burst starting now
fn emit(session: &mut AudioSession, burst: &ToneBurst) -> Result<SourceId> {
    // Effects fire from user gestures, which is when suspension may lift
    if session.state() == ContextState::Suspended {
        session.resume()?;
    }
    let now = session.current_time();
    let voice = burst.build_voice(now)?;
    let id = session.add_one_shot(Box::new(voice), Output::Destination)?;
    let scheduled = session
        .start_source(id, now)
        .and_then(|_| session.stop_source(id, now + burst.duration_secs));
    if let Err(err) = scheduled {
        // Never leave an unscheduled generator behind
        let _ = session.remove_source(id);
        return Err(err);
    }
    Ok(id)
}

/// Owner of the effects audio context and publisher of its hooks
#[derive(Debug)]
pub struct SoundEffects {
    id: Uuid,
    core: Arc<Mutex<EmitterCore>>,
    slot: HookSlot,
}

impl SoundEffects {
    /// Mount with the host's enable flag
    ///
    /// When disabled, no context is acquired and nothing is published.
    pub fn mount(platform: &dyn AudioPlatform, config: EffectsConfig, slot: HookSlot) -> Self {
        let mut effects = Self {
            id: Uuid::new_v4(),
            core: Arc::new(Mutex::new(EmitterCore::new(&config))),
            slot,
        };
        if let Err(err) = config.validate() {
            warn!(code = err.error_code(), error = %err, "invalid sound effect settings");
            return effects;
        }
        if config.enabled {
            effects.enable(platform);
        }
        effects
    }

    fn lock(&self) -> Option<MutexGuard<'_, EmitterCore>> {
        match self.core.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!(emitter = %self.id, "sound effect state poisoned");
                None
            }
        }
    }

    /// Follow a change of the host's enable flag
    pub fn set_enabled(&mut self, platform: &dyn AudioPlatform, enabled: bool) {
        if enabled == self.is_enabled() {
            return;
        }
        if enabled {
            self.enable(platform);
        } else {
            self.disable();
        }
    }

    fn enable(&mut self, platform: &dyn AudioPlatform) {
        let Some(mut core) = self.lock() else {
            return;
        };
        core.enabled = true;
        if !core.playable {
            core.session = Availability::Unavailable;
            warn!(emitter = %self.id, "invalid sound effect settings; not acquiring audio");
            return;
        }
        match AudioSession::open(platform) {
            Ok(session) => {
                core.session = Availability::Available(session);
                drop(core);
                self.slot.publish(SoundHooks::new(self.id, &self.core));
                info!(emitter = %self.id, "sound effects enabled");
            }
            Err(err) => {
                core.session = Availability::Unavailable;
                warn!(code = err.error_code(), error = %err, "audio context not supported");
            }
        }
    }

    fn disable(&mut self) {
        self.slot.clear_if_owner(self.id);
        let Some(mut core) = self.lock() else {
            return;
        };
        core.enabled = false;
        if let Some(session) = core.session.take() {
            session.release();
            info!(emitter = %self.id, "sound effects disabled");
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().is_some_and(|core| core.enabled)
    }

    /// Enabled and holding a live audio context
    pub fn is_available(&self) -> bool {
        self.lock()
            .is_some_and(|core| core.enabled && core.session.is_available())
    }

    /// The hooks this emitter has published, if any
    pub fn hooks(&self) -> Option<SoundHooks> {
        self.slot.hooks().filter(|h| h.owner() == self.id)
    }

    /// Schedule one burst
    ///
    /// Finished bursts are reclaimed by `render`; without rendering, every
    /// call leaves a source behind in the context.
    pub fn play(&self, kind: SfxKind) {
        if let Some(mut core) = self.lock() {
            core.play(kind);
        }
    }

    pub fn play_hover_sound(&self) {
        self.play(SfxKind::Hover);
    }

    pub fn play_click_sound(&self) {
        self.play(SfxKind::Click);
    }

    /// Bursts scheduled since mount
    pub fn emitted(&self) -> u64 {
        self.lock().map_or(0, |core| core.emitted)
    }

    /// Bursts currently sounding
    pub fn active_sources(&self) -> usize {
        self.lock().map_or(0, |core| {
            core.session
                .available()
                .map_or(0, |s| s.active_source_count())
        })
    }

    /// Render the next `frames` samples of effect output
    pub fn render(&self, frames: usize) -> Option<AudioBuffer> {
        let mut core = self.lock()?;
        let session = core.session.available_mut()?;
        match session.render(frames) {
            Ok(buffer) => Some(buffer),
            Err(err) => {
                warn!(code = err.error_code(), error = %err, "effect render failed");
                None
            }
        }
    }

    /// Withdraw the hooks and release the audio context
    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for SoundEffects {
    fn drop(&mut self) {
        self.disable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::platform::{AutoplayPolicy, OfflinePlatform, UnavailablePlatform};
    use crate::sfx::hooks::EffectTrigger;

    fn platform() -> OfflinePlatform {
        OfflinePlatform::new(48000, AutoplayPolicy::RequiresGesture)
    }

    #[test]
    fn test_enabled_mount_publishes_hooks() {
        let platform = platform();
        let slot = HookSlot::new();
        let fx = SoundEffects::mount(&platform, EffectsConfig::default(), slot.clone());
        assert!(fx.is_enabled());
        assert!(fx.is_available());
        assert!(slot.is_available());
        assert_eq!(fx.hooks().unwrap().owner(), fx.id());
        assert_eq!(platform.open_contexts(), 1);
    }

    #[test]
    fn test_disabled_mount_acquires_nothing() {
        let platform = platform();
        let slot = HookSlot::new();
        let config = EffectsConfig {
            enabled: false,
            ..EffectsConfig::default()
        };
        let fx = SoundEffects::mount(&platform, config, slot.clone());
        assert!(!fx.is_enabled());
        assert!(!slot.is_available());
        assert_eq!(platform.open_contexts(), 0);
        slot.play_hover();
        fx.play_click_sound();
        assert_eq!(fx.emitted(), 0);
    }

    #[test]
    fn test_each_call_allocates_a_fresh_generator() {
        let platform = platform();
        let fx = SoundEffects::mount(&platform, EffectsConfig::default(), HookSlot::new());
        fx.play_hover_sound();
        fx.play_hover_sound();
        fx.play_click_sound();
        assert_eq!(fx.emitted(), 3);
        assert_eq!(fx.active_sources(), 3);
    }

    #[test]
    fn test_bursts_self_terminate() {
        let platform = platform();
        let fx = SoundEffects::mount(&platform, EffectsConfig::default(), HookSlot::new());
        fx.play_click_sound();
        let buffer = fx.render(4800).unwrap();
        assert!(!buffer.is_silent());
        assert_eq!(fx.active_sources(), 0);
        assert!(fx.render(480).unwrap().is_silent());
    }

    #[test]
    fn test_toggle_enabled_publishes_and_clears() {
        let platform = platform();
        let slot = HookSlot::new();
        let mut fx = SoundEffects::mount(&platform, EffectsConfig::default(), slot.clone());
        fx.set_enabled(&platform, false);
        assert!(!slot.is_available());
        assert_eq!(platform.open_contexts(), 0);

        fx.set_enabled(&platform, true);
        assert!(slot.is_available());
        assert_eq!(platform.open_contexts(), 1);
    }

    #[test]
    fn test_unavailable_platform_publishes_nothing() {
        let platform = UnavailablePlatform::new("not supported");
        let slot = HookSlot::new();
        let fx = SoundEffects::mount(&platform, EffectsConfig::default(), slot.clone());
        assert!(fx.is_enabled());
        assert!(!fx.is_available());
        assert!(!slot.is_available());
        fx.play_hover_sound();
        assert_eq!(fx.emitted(), 0);
    }

    #[test]
    fn test_invalid_burst_settings_disable_effects() {
        let platform = platform();
        let config = EffectsConfig {
            click: ToneBurst {
                end_hz: -5.0,
                ..ToneBurst::CLICK
            },
            ..EffectsConfig::default()
        };
        let fx = SoundEffects::mount(&platform, config, HookSlot::new());
        assert!(!fx.is_available());
        assert_eq!(platform.open_contexts(), 0);
    }

    #[test]
    fn test_enabling_invalid_settings_acquires_nothing() {
        let platform = platform();
        let slot = HookSlot::new();
        let config = EffectsConfig {
            enabled: false,
            click: ToneBurst {
                end_hz: -5.0,
                ..ToneBurst::CLICK
            },
            ..EffectsConfig::default()
        };
        let mut fx = SoundEffects::mount(&platform, config, slot.clone());
        fx.set_enabled(&platform, true);
        assert!(!fx.is_available());
        assert!(!slot.is_available());
        assert_eq!(platform.open_contexts(), 0);
        fx.play_hover_sound();
        assert_eq!(fx.emitted(), 0);
    }

    #[test]
    fn test_unreclaimed_bursts_wait_for_render() {
        let platform = platform();
        let fx = SoundEffects::mount(&platform, EffectsConfig::default(), HookSlot::new());
        for _ in 0..4 {
            fx.play_click_sound();
        }
        let core = fx.core.lock().unwrap();
        let session = core.session.available().unwrap();
        assert_eq!(session.source_count(), 4);
        drop(core);
        fx.render(4800);
        let core = fx.core.lock().unwrap();
        assert_eq!(core.session.available().unwrap().source_count(), 0);
    }

    #[test]
    fn test_unmount_clears_slot_and_releases_context() {
        let platform = platform();
        let slot = HookSlot::new();
        let fx = SoundEffects::mount(&platform, EffectsConfig::default(), slot.clone());
        let hooks = fx.hooks().unwrap();
        fx.play_hover_sound();
        fx.unmount();
        assert!(!slot.is_available());
        assert!(!hooks.is_live());
        assert_eq!(platform.open_contexts(), 0);
        hooks.play_click();
    }

    #[test]
    fn test_second_emitter_survives_first_teardown() {
        let platform = platform();
        let slot = HookSlot::new();
        let first = SoundEffects::mount(&platform, EffectsConfig::default(), slot.clone());
        let second = SoundEffects::mount(&platform, EffectsConfig::default(), slot.clone());
        first.unmount();
        assert!(slot.is_available());
        assert_eq!(slot.hooks().unwrap().owner(), second.id());
    }
}
