//! Sound sources
//!
//! A voice is anything the context can schedule: it produces one sample per
//! frame while playing. Voices never route or mix themselves; the context
//! decides where their output goes.

use crate::engine::filter::BiquadFilter;
use crate::engine::noise::LoopingBuffer;
use crate::engine::oscillator::{Oscillator, Waveform};
use crate::engine::param::AudioParam;
use serde::{Deserialize, Serialize};

/// Base trait for all sound sources
pub trait Voice: Send {
    /// Produce the sample for `time` (seconds) and advance internal state
    fn next_sample(&mut self, time: f64, sample_rate: f64) -> f32;

    /// Return to the initial state before a (re)start
    fn reset(&mut self);

    /// Short type identifier, used in logs
    fn kind(&self) -> &'static str;
}

/// Slow pitch drift applied to a tone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modulation {
    /// Modulator frequency in Hz
    pub rate_hz: f32,
    /// Peak pitch deviation in Hz
    pub depth_hz: f32,
}

impl Default for Modulation {
    fn default() -> Self {
        Self {
            rate_hz: 0.1,
            depth_hz: 2.0,
        }
    }
}

// ============================================================================
// ToneVoice
// ============================================================================

/// Oscillator through a gain stage, with an optional pitch modulator
///
/// The modulator lives inside the voice, so a tone and its drift always
/// start and stop together.
#[derive(Debug, Clone)]
pub struct ToneVoice {
    carrier: Oscillator,
    gain: AudioParam,
    lfo: Option<(Oscillator, f32)>,
}

impl ToneVoice {
    pub fn new(waveform: Waveform, frequency_hz: f32, gain: f32) -> Self {
        Self {
            carrier: Oscillator::new(waveform, frequency_hz),
            gain: AudioParam::new(gain),
            lfo: None,
        }
    }

    /// Attach a sine modulator to the carrier frequency
    pub fn with_modulation(mut self, modulation: Modulation) -> Self {
        self.lfo = Some((
            Oscillator::new(Waveform::Sine, modulation.rate_hz),
            modulation.depth_hz,
        ));
        self
    }

    pub fn carrier(&self) -> &Oscillator {
        &self.carrier
    }

    pub fn frequency_mut(&mut self) -> &mut AudioParam {
        self.carrier.frequency_mut()
    }

    pub fn gain(&self) -> &AudioParam {
        &self.gain
    }

    pub fn gain_mut(&mut self) -> &mut AudioParam {
        &mut self.gain
    }

    pub fn is_modulated(&self) -> bool {
        self.lfo.is_some()
    }
}

impl Voice for ToneVoice {
    fn next_sample(&mut self, time: f64, sample_rate: f64) -> f32 {
        let offset = match self.lfo.as_mut() {
            Some((lfo, depth)) => lfo.next_sample(time, sample_rate, 0.0) * *depth,
            None => 0.0,
        };
        self.carrier.next_sample(time, sample_rate, offset) * self.gain.value_at(time)
    }

    fn reset(&mut self) {
        self.carrier.reset();
        if let Some((lfo, _)) = self.lfo.as_mut() {
            lfo.reset();
        }
    }

    fn kind(&self) -> &'static str {
        "tone"
    }
}

// ============================================================================
// NoiseVoice
// ============================================================================

/// Looping noise buffer through a filter and a gain stage
#[derive(Debug, Clone)]
pub struct NoiseVoice {
    source: LoopingBuffer,
    filter: BiquadFilter,
    gain: AudioParam,
}

impl NoiseVoice {
    pub fn new(source: LoopingBuffer, filter: BiquadFilter, gain: f32) -> Self {
        Self {
            source,
            filter,
            gain: AudioParam::new(gain),
        }
    }

    pub fn filter(&self) -> &BiquadFilter {
        &self.filter
    }

    pub fn buffer_len(&self) -> usize {
        self.source.len()
    }
}

impl Voice for NoiseVoice {
    fn next_sample(&mut self, time: f64, _sample_rate: f64) -> f32 {
        let raw = self.source.next_sample();
        self.filter.process(raw) * self.gain.value_at(time)
    }

    fn reset(&mut self) {
        self.source.reset();
        self.filter.reset();
    }

    fn kind(&self) -> &'static str {
        "noise"
    }
}
