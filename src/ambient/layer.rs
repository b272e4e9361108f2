//! Ambient layer descriptions
//!
//! Plain data: what each layer of the soundscape sounds like. Building
//! voices from them happens in `soundscape`.

use crate::engine::filter::BiquadFilter;
use crate::engine::noise::{noise_rng, white_noise, LoopingBuffer};
use crate::engine::oscillator::Waveform;
use crate::engine::voice::{Modulation, NoiseVoice, ToneVoice};
use crate::error::{NebulaError, Result};
use serde::{Deserialize, Serialize};

/// One continuous tone with slow pitch drift
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneLayer {
    /// Base frequency in Hz
    pub frequency_hz: f32,
    pub waveform: Waveform,
    /// Layer gain before the master stage
    pub gain: f32,
    #[serde(default)]
    pub modulation: Modulation,
}

impl ToneLayer {
    pub const fn new(frequency_hz: f32, waveform: Waveform, gain: f32) -> Self {
        Self {
            frequency_hz,
            waveform,
            gain,
            modulation: Modulation {
                rate_hz: 0.1,
                depth_hz: 2.0,
            },
        }
    }

    /// The four layers of the space ambience
    ///
    /// Deep rumble, mid-range body, upper harmonic and a warm triangle
    /// undertone.
    pub fn space_ambience() -> Vec<ToneLayer> {
        vec![
            ToneLayer::new(60.0, Waveform::Sine, 0.10),
            ToneLayer::new(120.0, Waveform::Sine, 0.08),
            ToneLayer::new(240.0, Waveform::Sine, 0.06),
            ToneLayer::new(80.0, Waveform::Triangle, 0.05),
        ]
    }

    pub fn validate(&self, sample_rate: u32) -> Result<()> {
        let nyquist = sample_rate as f64 / 2.0;
        check_range("layer.frequency_hz", self.frequency_hz as f64, 1.0, nyquist)?;
        check_range("layer.gain", self.gain as f64, 0.0, 1.0)?;
        check_range("layer.modulation.rate_hz", self.modulation.rate_hz as f64, 0.0, 20.0)?;
        check_range(
            "layer.modulation.depth_hz",
            self.modulation.depth_hz as f64,
            0.0,
            self.frequency_hz as f64,
        )
    }

    pub fn build_voice(&self) -> ToneVoice {
        ToneVoice::new(self.waveform, self.frequency_hz, self.gain).with_modulation(self.modulation)
    }
}

/// Filtered white noise, looped
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseLayer {
    /// Length of the looped noise buffer
    pub duration_secs: f32,
    /// Peak amplitude of the raw noise
    pub amplitude: f32,
    /// Low-pass cutoff in Hz
    pub cutoff_hz: f32,
    /// Gain after filtering
    pub gain: f32,
    /// Fixed seed for reproducible renders
    pub seed: Option<u64>,
}

impl Default for NoiseLayer {
    fn default() -> Self {
        Self {
            duration_secs: 2.0,
            amplitude: 0.02,
            cutoff_hz: 200.0,
            gain: 0.03,
            seed: None,
        }
    }
}

impl NoiseLayer {
    pub fn validate(&self, sample_rate: u32) -> Result<()> {
        check_range("noise.duration_secs", self.duration_secs as f64, 0.01, 60.0)?;
        check_range("noise.amplitude", self.amplitude as f64, 0.0, 1.0)?;
        check_range(
            "noise.cutoff_hz",
            self.cutoff_hz as f64,
            10.0,
            sample_rate as f64 / 2.0,
        )?;
        check_range("noise.gain", self.gain as f64, 0.0, 1.0)
    }

    pub fn build_voice(&self, sample_rate: u32) -> NoiseVoice {
        let frames = (sample_rate as f32 * self.duration_secs) as usize;
        let mut rng = noise_rng(self.seed);
        let data = white_noise(frames, self.amplitude, &mut rng);
        NoiseVoice::new(
            LoopingBuffer::new(data, true),
            BiquadFilter::low_pass(self.cutoff_hz as f64, sample_rate as f64),
            self.gain,
        )
    }
}

pub(crate) fn check_range(param: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(NebulaError::InvalidParameter {
            param: param.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_space_ambience_layers() {
        let layers = ToneLayer::space_ambience();
        let freqs: Vec<f32> = layers.iter().map(|l| l.frequency_hz).collect();
        assert_eq!(freqs, vec![60.0, 120.0, 240.0, 80.0]);
        let shapes: Vec<Waveform> = layers.iter().map(|l| l.waveform).collect();
        assert_eq!(
            shapes,
            vec![Waveform::Sine, Waveform::Sine, Waveform::Sine, Waveform::Triangle]
        );
        let gains: Vec<f32> = layers.iter().map(|l| l.gain).collect();
        assert_eq!(gains, vec![0.10, 0.08, 0.06, 0.05]);
        for layer in &layers {
            assert_relative_eq!(layer.modulation.rate_hz, 0.1);
            assert_relative_eq!(layer.modulation.depth_hz, 2.0);
        }
    }

    #[test]
    fn test_noise_defaults() {
        let noise = NoiseLayer::default();
        assert_relative_eq!(noise.duration_secs, 2.0);
        assert_relative_eq!(noise.amplitude, 0.02);
        assert_relative_eq!(noise.cutoff_hz, 200.0);
    }

    #[test]
    fn test_noise_voice_buffer_length() {
        let voice = NoiseLayer::default().build_voice(48000);
        assert_eq!(voice.buffer_len(), 96_000);
        assert_relative_eq!(voice.filter().cutoff_hz(), 200.0);
    }

    #[test]
    fn test_layer_validation() {
        assert!(ToneLayer::new(60.0, Waveform::Sine, 0.1).validate(48000).is_ok());
        assert!(ToneLayer::new(30_000.0, Waveform::Sine, 0.1)
            .validate(48000)
            .is_err());
        assert!(ToneLayer::new(60.0, Waveform::Sine, 1.5).validate(48000).is_err());
        assert!(ToneLayer::new(f32::NAN, Waveform::Sine, 0.1)
            .validate(48000)
            .is_err());
    }

    #[test]
    fn test_tone_layer_deserializes_without_modulation() {
        let layer: ToneLayer =
            serde_json::from_str(r#"{"frequency_hz": 60.0, "waveform": "sine", "gain": 0.1}"#)
                .unwrap();
        assert_eq!(layer.modulation, Modulation::default());
    }
}
