//! Ambient Soundscape Generator
//!
//! Four slowly drifting tone layers plus a bed of low-passed noise, all
//! routed through one master gain. Construction only wires the graph;
//! nothing sounds until the first `toggle_play`.
//!
//! Audio failures never escape this type. Each control catches its error,
//! logs it and leaves the observable state as it was.

use crate::ambient::layer::{check_range, NoiseLayer, ToneLayer};
use crate::ambient::state::{PlaybackState, Transport};
use crate::engine::buffer::AudioBuffer;
use crate::engine::context::{BusId, ContextState, Output, SourceId};
use crate::engine::platform::{AudioPlatform, Availability};
use crate::engine::session::AudioSession;
use crate::error::{NebulaError, Result};
use serde::{Deserialize, Serialize};
use std::iter;
use tracing::{debug, info, warn};

// ============================================================================
// Configuration
// ============================================================================

/// Shape of the soundscape and its initial controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    pub layers: Vec<ToneLayer>,
    pub noise: NoiseLayer,
    /// Volume before the user touches the slider
    pub initial_volume: f32,
    /// Slider granularity
    pub volume_step: f32,
    /// Length of master gain ramps; 0 applies changes immediately
    pub ramp_secs: f64,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            layers: ToneLayer::space_ambience(),
            noise: NoiseLayer::default(),
            initial_volume: 0.3,
            volume_step: 0.1,
            ramp_secs: 0.0,
        }
    }
}

impl AmbientConfig {
    pub fn validate(&self, sample_rate: u32) -> Result<()> {
        for layer in &self.layers {
            layer.validate(sample_rate)?;
        }
        self.noise.validate(sample_rate)?;
        check_range("ambient.initial_volume", self.initial_volume as f64, 0.0, 1.0)?;
        check_range("ambient.volume_step", self.volume_step as f64, 0.01, 1.0)?;
        check_range("ambient.ramp_secs", self.ramp_secs, 0.0, 1.0)
    }
}

/// What the control panel shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientControls {
    pub transport: Transport,
    pub muted: bool,
    pub volume: f32,
    pub volume_step: f32,
}

// ============================================================================
// Audio graph
// ============================================================================

/// The wired graph: master bus, one source per tone layer, one noise source
#[derive(Debug)]
struct AmbientGraph {
    session: AudioSession,
    master: BusId,
    layers: Vec<SourceId>,
    noise: SourceId,
}

impl AmbientGraph {
    fn build(platform: &dyn AudioPlatform, config: &AmbientConfig, volume: f32) -> Result<Self> {
        let mut session = AudioSession::open(platform)?;
        let sample_rate = session.sample_rate();
        config.validate(sample_rate)?;

        let master = session.create_bus(volume)?;
        let layers = config
            .layers
            .iter()
            .map(|layer| session.add_source(Box::new(layer.build_voice()), Output::Bus(master)))
            .collect::<Result<Vec<_>>>()?;
        let noise = session.add_source(
            Box::new(config.noise.build_voice(sample_rate)),
            Output::Bus(master),
        )?;

        Ok(Self {
            session,
            master,
            layers,
            noise,
        })
    }

    fn sources(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.layers.iter().copied().chain(iter::once(self.noise))
    }

    fn toggle(&mut self, current: Transport) -> Result<Transport> {
        if self.session.state() == ContextState::Suspended {
            self.session.resume()?;
        }
        match current {
            Transport::Stopped => {
                self.start_all()?;
                Ok(Transport::Playing)
            }
            Transport::Playing => {
                self.stop_all()?;
                Ok(Transport::Stopped)
            }
        }
    }

    /// Start every source, or none of them
    fn start_all(&mut self) -> Result<()> {
        let now = self.session.current_time();
        let ids: Vec<SourceId> = self.sources().collect();
        let mut started = Vec::with_capacity(ids.len());

        for id in ids {
            if let Err(err) = self.session.start_source(id, now) {
                for done in started {
                    // Roll back so no partial layer set is left sounding
                    let _ = self.session.stop_source(done, now);
                }
                return Err(err);
            }
            started.push(id);
        }
        Ok(())
    }

    /// Stop every source; already-silent sources are fine
    fn stop_all(&mut self) -> Result<()> {
        let now = self.session.current_time();
        let ids: Vec<SourceId> = self.sources().collect();
        for id in ids {
            match self.session.stop_source(id, now) {
                Ok(()) => {}
                Err(NebulaError::SourceAlreadyStopped { index }) => {
                    debug!(source = index, "source already stopped");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn set_master(&mut self, gain: f32, ramp_secs: f64) -> Result<()> {
        let now = self.session.current_time();
        self.session
            .bus_gain_mut(self.master)?
            .ramp_to(gain, now, ramp_secs);
        Ok(())
    }
}

// ============================================================================
// AmbientSoundscape
// ============================================================================

/// The background ambience and its transport controls
#[derive(Debug)]
pub struct AmbientSoundscape {
    graph: Availability<AmbientGraph>,
    state: PlaybackState,
    config: AmbientConfig,
}

impl AmbientSoundscape {
    /// Wire the graph on `platform`
    ///
    /// Never fails: if the platform has no audio, or the graph cannot be
    /// built, the soundscape is simply unavailable and exposes no controls.
    pub fn mount(platform: &dyn AudioPlatform, config: AmbientConfig) -> Self {
        let state = PlaybackState::new(config.initial_volume);
        let graph = match AmbientGraph::build(platform, &config, state.volume) {
            Ok(graph) => {
                info!(
                    layers = graph.layers.len(),
                    volume = state.volume,
                    "ambient soundscape mounted"
                );
                Availability::Available(graph)
            }
            Err(err) => {
                warn!(
                    platform = platform.name(),
                    code = err.error_code(),
                    error = %err,
                    "ambient audio not supported or blocked"
                );
                Availability::Unavailable
            }
        };
        Self {
            graph,
            state,
            config,
        }
    }

    pub fn is_available(&self) -> bool {
        self.graph.is_available()
    }

    /// Control panel contents, or `None` when audio is unavailable
    pub fn controls(&self) -> Option<AmbientControls> {
        self.graph.available().map(|_| AmbientControls {
            transport: self.state.transport,
            muted: self.state.muted,
            volume: self.state.volume,
            volume_step: self.config.volume_step,
        })
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn config(&self) -> &AmbientConfig {
        &self.config
    }

    /// Start or stop the whole layer set
    ///
    /// Resumes a platform-suspended context first. Returns the transport
    /// state after the call, which is unchanged if anything failed.
    pub fn toggle_play(&mut self) -> Transport {
        let Some(graph) = self.graph.available_mut() else {
            return self.state.transport;
        };
        match graph.toggle(self.state.transport) {
            Ok(next) => {
                debug!(from = %self.state.transport, to = %next, "ambient transport toggled");
                self.state.transport = next;
            }
            Err(err) => {
                warn!(code = err.error_code(), error = %err, "error controlling ambient audio");
            }
        }
        self.state.transport
    }

    /// Silence the master gain, or restore it to the stored volume
    pub fn toggle_mute(&mut self) -> bool {
        let Some(graph) = self.graph.available_mut() else {
            return self.state.muted;
        };
        let next = PlaybackState {
            muted: !self.state.muted,
            ..self.state
        };
        match graph.set_master(next.master_gain(), self.config.ramp_secs) {
            Ok(()) => {
                self.state = next;
                debug!(muted = next.muted, "ambient mute toggled");
            }
            Err(err) => warn!(code = err.error_code(), error = %err, "error toggling mute"),
        }
        self.state.muted
    }

    /// Store a new volume and apply it unless muted
    ///
    /// Values are clamped to [0, 1]; non-finite input is ignored.
    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            warn!(volume, "ignoring non-finite volume");
            return;
        }
        let Some(graph) = self.graph.available_mut() else {
            return;
        };
        let volume = volume.clamp(0.0, 1.0);
        if !self.state.muted {
            if let Err(err) = graph.set_master(volume, self.config.ramp_secs) {
                warn!(code = err.error_code(), error = %err, "error applying volume");
                return;
            }
        }
        self.state.volume = volume;
    }

    /// Current master gain, or `None` when audio is unavailable
    pub fn master_gain(&self) -> Option<f32> {
        let graph = self.graph.available()?;
        let now = graph.session.current_time();
        graph
            .session
            .bus_gain(graph.master)
            .ok()
            .map(|gain| gain.value_at(now))
    }

    /// Sources currently sounding (tone layers plus noise)
    pub fn active_sources(&self) -> usize {
        self.graph
            .available()
            .map_or(0, |g| g.session.active_source_count())
    }

    /// Render the next `frames` samples of the ambience
    pub fn render(&mut self, frames: usize) -> Option<AudioBuffer> {
        let graph = self.graph.available_mut()?;
        match graph.session.render(frames) {
            Ok(buffer) => Some(buffer),
            Err(err) => {
                warn!(code = err.error_code(), error = %err, "ambient render failed");
                None
            }
        }
    }

    /// Stop everything and release the audio context
    pub fn unmount(self) {
        drop(self);
    }

    fn teardown(&mut self) {
        if let Some(mut graph) = self.graph.take() {
            if let Err(err) = graph.stop_all() {
                debug!(error = %err, "stop during teardown failed");
            }
            graph.session.release();
            self.state.transport = Transport::Stopped;
            info!("ambient soundscape unmounted");
        }
    }
}

impl Drop for AmbientSoundscape {
    fn drop(&mut self) {
        self.teardown();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::platform::{AutoplayPolicy, OfflinePlatform, UnavailablePlatform};
    use approx::assert_relative_eq;

    fn seeded_config() -> AmbientConfig {
        AmbientConfig {
            noise: NoiseLayer {
                seed: Some(1),
                ..NoiseLayer::default()
            },
            ..AmbientConfig::default()
        }
    }

    fn mounted() -> (OfflinePlatform, AmbientSoundscape) {
        let platform = OfflinePlatform::new(8000, AutoplayPolicy::RequiresGesture);
        let ambient = AmbientSoundscape::mount(&platform, seeded_config());
        (platform, ambient)
    }

    #[test]
    fn test_mount_wires_without_playing() {
        let (_platform, mut ambient) = mounted();
        assert!(ambient.is_available());
        assert_eq!(ambient.state().transport, Transport::Stopped);
        assert_eq!(ambient.active_sources(), 0);
        assert_relative_eq!(ambient.master_gain().unwrap(), 0.3);
        assert!(ambient.render(800).unwrap().is_silent());
    }

    #[test]
    fn test_toggle_play_resumes_suspended_context() {
        let (_platform, mut ambient) = mounted();
        assert_eq!(ambient.toggle_play(), Transport::Playing);
        assert_eq!(ambient.active_sources(), 5);
        let buffer = ambient.render(8000).unwrap();
        assert!(!buffer.is_silent());
        assert!(buffer.is_valid());
    }

    #[test]
    fn test_toggle_play_twice_stops_everything() {
        let (_platform, mut ambient) = mounted();
        ambient.toggle_play();
        ambient.render(400);
        assert_eq!(ambient.toggle_play(), Transport::Stopped);
        assert_eq!(ambient.active_sources(), 0);
        assert!(ambient.render(400).unwrap().is_silent());
    }

    #[test]
    fn test_restart_after_stop() {
        let (_platform, mut ambient) = mounted();
        ambient.toggle_play();
        ambient.toggle_play();
        assert_eq!(ambient.toggle_play(), Transport::Playing);
        assert_eq!(ambient.active_sources(), 5);
    }

    #[test]
    fn test_failed_start_leaves_no_partial_layer_set() {
        let (_platform, mut ambient) = mounted();
        {
            // Noise already running makes the last start in the set fail
            let graph = ambient.graph.available_mut().unwrap();
            graph.session.resume().unwrap();
            let now = graph.session.current_time();
            graph.session.start_source(graph.noise, now).unwrap();
        }

        assert_eq!(ambient.toggle_play(), Transport::Stopped);
        assert_eq!(ambient.state().transport, Transport::Stopped);
        let graph = ambient.graph.available().unwrap();
        for &layer in &graph.layers {
            assert!(!graph.session.source_state(layer).unwrap().is_active());
        }
        assert_eq!(ambient.active_sources(), 1);
    }

    #[test]
    fn test_mute_keeps_transport_and_volume() {
        let (_platform, mut ambient) = mounted();
        ambient.toggle_play();
        assert!(ambient.toggle_mute());
        assert_relative_eq!(ambient.master_gain().unwrap(), 0.0);
        assert_eq!(ambient.state().transport, Transport::Playing);
        assert!(ambient.render(800).unwrap().is_silent());

        assert!(!ambient.toggle_mute());
        assert_relative_eq!(ambient.master_gain().unwrap(), 0.3);
    }

    #[test]
    fn test_volume_while_muted_applies_on_unmute() {
        let (_platform, mut ambient) = mounted();
        ambient.toggle_mute();
        ambient.set_volume(0.8);
        assert_relative_eq!(ambient.master_gain().unwrap(), 0.0);
        assert_relative_eq!(ambient.state().volume, 0.8);
        ambient.toggle_mute();
        assert_relative_eq!(ambient.master_gain().unwrap(), 0.8);
    }

    #[test]
    fn test_set_volume_clamps_and_ignores_nan() {
        let (_platform, mut ambient) = mounted();
        ambient.set_volume(1.7);
        assert_relative_eq!(ambient.master_gain().unwrap(), 1.0);
        ambient.set_volume(-0.2);
        assert_relative_eq!(ambient.master_gain().unwrap(), 0.0);
        ambient.set_volume(f32::NAN);
        assert_relative_eq!(ambient.state().volume, 0.0);
    }

    #[test]
    fn test_ramped_volume_reaches_target() {
        let platform = OfflinePlatform::new(8000, AutoplayPolicy::Allowed);
        let config = AmbientConfig {
            ramp_secs: 0.05,
            ..seeded_config()
        };
        let mut ambient = AmbientSoundscape::mount(&platform, config);
        ambient.set_volume(0.9);
        assert_relative_eq!(ambient.master_gain().unwrap(), 0.3);
        ambient.render(800);
        assert_relative_eq!(ambient.master_gain().unwrap(), 0.9);
    }

    #[test]
    fn test_unavailable_platform_exposes_no_controls() {
        let platform = UnavailablePlatform::new("autoplay blocked");
        let mut ambient = AmbientSoundscape::mount(&platform, AmbientConfig::default());
        assert!(!ambient.is_available());
        assert!(ambient.controls().is_none());
        assert_eq!(ambient.toggle_play(), Transport::Stopped);
        assert!(!ambient.toggle_mute());
        ambient.set_volume(0.5);
        assert!(ambient.master_gain().is_none());
        assert!(ambient.render(100).is_none());
    }

    #[test]
    fn test_invalid_config_degrades_to_unavailable() {
        let platform = OfflinePlatform::default();
        let config = AmbientConfig {
            initial_volume: 3.0,
            ..AmbientConfig::default()
        };
        let ambient = AmbientSoundscape::mount(&platform, config);
        assert!(!ambient.is_available());
        assert_eq!(platform.open_contexts(), 0);
    }

    #[test]
    fn test_controls_reflect_state() {
        let (_platform, mut ambient) = mounted();
        ambient.toggle_play();
        ambient.set_volume(0.6);
        let controls = ambient.controls().unwrap();
        assert_eq!(controls.transport, Transport::Playing);
        assert!(!controls.muted);
        assert_relative_eq!(controls.volume, 0.6);
        assert_relative_eq!(controls.volume_step, 0.1);
    }

    #[test]
    fn test_unmount_while_playing_releases_context() {
        let (platform, mut ambient) = mounted();
        ambient.toggle_play();
        assert_eq!(platform.open_contexts(), 1);
        ambient.unmount();
        assert_eq!(platform.open_contexts(), 0);
    }
}
