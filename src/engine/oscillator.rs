//! Periodic tone generators

use crate::engine::param::AudioParam;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Oscillator waveform shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Sample the waveform at `phase` (cycles, wrapped to [0, 1))
    ///
    /// Every shape except square starts at a rising zero crossing.
    pub fn sample(self, phase: f64) -> f32 {
        let p = phase - phase.floor();
        let value = match self {
            Waveform::Sine => (TAU * p).sin(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * (p + 0.5).fract() - 1.0,
            Waveform::Triangle => {
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
        };
        value as f32
    }
}

/// A phase-accumulating oscillator with an automatable frequency
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: AudioParam,
    phase: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency_hz: f32) -> Self {
        Self {
            waveform,
            frequency: AudioParam::new(frequency_hz),
            phase: 0.0,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn frequency(&self) -> &AudioParam {
        &self.frequency
    }

    pub fn frequency_mut(&mut self) -> &mut AudioParam {
        &mut self.frequency
    }

    /// Restart from phase zero
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Produce one sample and advance the phase
    ///
    /// `offset_hz` is added to the scheduled frequency, which is how a
    /// low-frequency modulator bends the pitch.
    pub fn next_sample(&mut self, time: f64, sample_rate: f64, offset_hz: f32) -> f32 {
        let out = self.waveform.sample(self.phase);
        let freq = (self.frequency.value_at(time) + offset_hz) as f64;
        self.phase += freq / sample_rate;
        self.phase -= self.phase.floor();
        out
    }
}
