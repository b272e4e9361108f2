//! Short swept tone bursts
//!
//! A burst is a pitch sweep under an attack/decay envelope. The whole shape
//! is scheduled as parameter automation when the voice is built, so a burst
//! needs no attention after it starts.

use crate::engine::oscillator::Waveform;
use crate::engine::param::AudioParam;
use crate::engine::voice::ToneVoice;
use crate::error::{NebulaError, Result};
use serde::{Deserialize, Serialize};

/// Which feedback tone to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SfxKind {
    Hover,
    Click,
}

/// Parameters of one swept tone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneBurst {
    /// Frequency at the start of the sweep (Hz)
    pub start_hz: f32,
    /// Frequency reached at the end of the burst (Hz)
    pub end_hz: f32,
    /// Total length; the generator stops here
    pub duration_secs: f64,
    /// Envelope peak
    pub peak_gain: f32,
    /// Linear rise from silence to the peak
    pub attack_secs: f64,
    /// Level the exponential decay reaches at the end
    #[serde(default = "default_floor_gain")]
    pub floor_gain: f32,
    #[serde(default)]
    pub waveform: Waveform,
}

fn default_floor_gain() -> f32 {
    0.001
}

impl ToneBurst {
    /// Rising chirp for pointer hover
    pub const HOVER: ToneBurst = ToneBurst {
        start_hz: 800.0,
        end_hz: 1200.0,
        duration_secs: 0.1,
        peak_gain: 0.05,
        attack_secs: 0.01,
        floor_gain: 0.001,
        waveform: Waveform::Sine,
    };

    /// Falling blip for clicks
    pub const CLICK: ToneBurst = ToneBurst {
        start_hz: 1000.0,
        end_hz: 500.0,
        duration_secs: 0.05,
        peak_gain: 0.08,
        attack_secs: 0.01,
        floor_gain: 0.001,
        waveform: Waveform::Sine,
    };

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("start_hz", self.start_hz as f64),
            ("end_hz", self.end_hz as f64),
            ("duration_secs", self.duration_secs),
            ("peak_gain", self.peak_gain as f64),
            ("floor_gain", self.floor_gain as f64),
        ];
        for (param, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(NebulaError::InvalidParameter {
                    param: format!("burst.{}", param),
                    value,
                    min: 0.0,
                    max: f64::MAX,
                });
            }
        }
        if !(self.attack_secs >= 0.0 && self.attack_secs < self.duration_secs) {
            return Err(NebulaError::InvalidParameter {
                param: "burst.attack_secs".to_string(),
                value: self.attack_secs,
                min: 0.0,
                max: self.duration_secs,
            });
        }
        Ok(())
    }

    /// Frequency and gain automation for a burst starting at `at`
    pub fn envelope(&self, at: f64) -> Result<BurstEnvelope> {
        self.validate()?;
        let end = at + self.duration_secs;

        let mut frequency = AudioParam::new(self.start_hz);
        frequency.set_value_at_time(self.start_hz, at);
        frequency.exponential_ramp_to_value_at_time(self.end_hz, end)?;

        let mut gain = AudioParam::new(0.0);
        gain.set_value_at_time(0.0, at)
            .linear_ramp_to_value_at_time(self.peak_gain, at + self.attack_secs);
        gain.exponential_ramp_to_value_at_time(self.floor_gain, end)?;

        Ok(BurstEnvelope {
            start: at,
            end,
            frequency,
            gain,
        })
    }

    /// A fresh tone generator for a burst starting at `at`
    pub fn build_voice(&self, at: f64) -> Result<ToneVoice> {
        let envelope = self.envelope(at)?;
        let mut voice = ToneVoice::new(self.waveform, self.start_hz, 0.0);
        *voice.frequency_mut() = envelope.frequency;
        *voice.gain_mut() = envelope.gain;
        Ok(voice)
    }
}

/// Scheduled automation of one burst
#[derive(Debug, Clone, PartialEq)]
pub struct BurstEnvelope {
    pub start: f64,
    pub end: f64,
    pub frequency: AudioParam,
    pub gain: AudioParam,
}

impl BurstEnvelope {
    pub fn frequency_at(&self, time: f64) -> f32 {
        self.frequency.value_at(time)
    }

    pub fn gain_at(&self, time: f64) -> f32 {
        self.gain.value_at(time)
    }
}
