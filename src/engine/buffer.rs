//! Audio Buffer Management
//!
//! Rendered output lands in an `AudioBuffer`: one `Vec<f32>` per channel
//! plus the sample rate it was rendered at.

use crate::error::{NebulaError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default render sample rate (48kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Output channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelLayout {
    #[default]
    Mono,
    Stereo,
}

impl ChannelLayout {
    pub fn channel_count(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }
}

// ============================================================================
// AudioBuffer
// ============================================================================

/// Deinterleaved sample storage
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer
    pub fn new(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0; num_samples]; layout.channel_count()],
            sample_rate,
        }
    }

    /// Wrap a single channel of samples
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: vec![samples],
            sample_rate,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    pub fn num_samples(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_secs(&self) -> f64 {
        self.num_samples() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.samples[channel]
    }

    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        &mut self.samples[channel]
    }

    pub fn get_sample(&self, channel: usize, index: usize) -> Option<f32> {
        self.samples.get(channel)?.get(index).copied()
    }

    pub fn set_sample(&mut self, channel: usize, index: usize, value: f32) {
        if let Some(slot) = self.samples.get_mut(channel).and_then(|c| c.get_mut(index)) {
            *slot = value;
        }
    }

    /// Copy the buffer into `layout`, duplicating or averaging channels
    pub fn to_layout(&self, layout: ChannelLayout) -> AudioBuffer {
        let frames = self.num_samples();
        let target = layout.channel_count();
        if target == self.num_channels() {
            return self.clone();
        }
        let mono: Vec<f32> = (0..frames)
            .map(|i| {
                let sum: f32 = self.samples.iter().map(|c| c[i]).sum();
                sum / self.num_channels().max(1) as f32
            })
            .collect();
        AudioBuffer {
            samples: vec![mono; target],
            sample_rate: self.sample_rate,
        }
    }

    /// Sum `other` into this buffer starting at frame `offset`
    ///
    /// Samples past the end of this buffer are dropped.
    pub fn mix_from(&mut self, other: &AudioBuffer, offset: usize) -> Result<()> {
        if other.sample_rate != self.sample_rate {
            return Err(NebulaError::InvalidParameter {
                param: "sample_rate".to_string(),
                value: other.sample_rate as f64,
                min: self.sample_rate as f64,
                max: self.sample_rate as f64,
            });
        }
        let frames = self.num_samples();
        let src_channels = other.num_channels();
        if src_channels == 0 {
            return Ok(());
        }
        for (ch, dest) in self.samples.iter_mut().enumerate() {
            let src = &other.samples[ch.min(src_channels - 1)];
            for (i, &s) in src.iter().enumerate() {
                let at = offset + i;
                if at >= frames {
                    break;
                }
                dest[at] += s;
            }
        }
        Ok(())
    }

    /// Extend this buffer with the frames of `other`
    pub fn append(&mut self, other: &AudioBuffer) -> Result<()> {
        if other.sample_rate != self.sample_rate || other.num_channels() != self.num_channels() {
            return Err(NebulaError::InvalidParameter {
                param: "append.layout".to_string(),
                value: other.num_channels() as f64,
                min: self.num_channels() as f64,
                max: self.num_channels() as f64,
            });
        }
        for (dest, src) in self.samples.iter_mut().zip(&other.samples) {
            dest.extend_from_slice(src);
        }
        Ok(())
    }

    /// RMS level of one channel in dB
    pub fn rms_db(&self, channel: usize) -> f32 {
        let Some(samples) = self.samples.get(channel) else {
            return f32::NEG_INFINITY;
        };
        if samples.is_empty() {
            return f32::NEG_INFINITY;
        }
        let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        linear_to_db((sum_squares / samples.len() as f64).sqrt() as f32)
    }

    /// Peak level across all channels in dB
    pub fn peak_db(&self) -> f32 {
        linear_to_db(self.peak())
    }

    /// Peak absolute sample value across all channels
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0_f32, |m, s| m.max(s.abs()))
    }

    /// True when every sample is finite
    pub fn is_valid(&self) -> bool {
        self.samples.iter().flat_map(|c| c.iter()).all(|s| s.is_finite())
    }

    /// True when no sample rises above -80 dBFS
    pub fn is_silent(&self) -> bool {
        self.peak() < db_to_linear(-80.0)
    }

    /// Interleave channels frame by frame
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.num_samples();
        let channels = self.num_channels();
        let mut out = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            for c in &self.samples {
                out.push(c[i]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_buffer() {
        let buf = AudioBuffer::new(1000, ChannelLayout::Stereo, 44100);
        assert_eq!(buf.num_channels(), 2);
        assert_eq!(buf.num_samples(), 1000);
        assert_eq!(buf.sample_rate(), 44100);
        assert!(buf.is_silent());
    }

    #[test]
    fn test_get_set() {
        let mut buf = AudioBuffer::new(100, ChannelLayout::Mono, 48000);
        buf.set_sample(0, 0, 0.5);
        buf.set_sample(0, 1, -0.5);
        buf.set_sample(3, 1, 1.0);
        assert_eq!(buf.get_sample(0, 0), Some(0.5));
        assert_eq!(buf.get_sample(0, 1), Some(-0.5));
        assert_eq!(buf.get_sample(3, 1), None);
    }

    #[test]
    fn test_rms_db_of_sine() {
        let samples: Vec<f32> = (0..48000)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48000.0).sin())
            .collect();
        let buf = AudioBuffer::from_mono(samples, 48000);
        // RMS of a unit sine is 1/sqrt(2) = -3.01 dB
        assert!((buf.rms_db(0) - (-3.01)).abs() < 0.1);
    }

    #[test]
    fn test_db_conversions() {
        assert_relative_eq!(db_to_linear(0.0), 1.0);
        assert_relative_eq!(linear_to_db(1.0), 0.0);
        assert_eq!(linear_to_db(0.0), f32::NEG_INFINITY);
    }

    #[test]
    fn test_is_valid() {
        let mut buf = AudioBuffer::new(100, ChannelLayout::Mono, 48000);
        assert!(buf.is_valid());
        buf.set_sample(0, 50, f32::NAN);
        assert!(!buf.is_valid());
    }

    #[test]
    fn test_mix_from_with_offset() {
        let mut base = AudioBuffer::from_mono(vec![0.1; 4], 48000);
        let add = AudioBuffer::from_mono(vec![0.5, 0.5, 0.5], 48000);
        base.mix_from(&add, 2).unwrap();
        assert_eq!(base.channel(0), &[0.1, 0.1, 0.6, 0.6]);
    }

    #[test]
    fn test_mix_from_rejects_rate_mismatch() {
        let mut base = AudioBuffer::from_mono(vec![0.0; 4], 48000);
        let add = AudioBuffer::from_mono(vec![0.5; 4], 44100);
        assert!(base.mix_from(&add, 0).is_err());
    }

    #[test]
    fn test_append() {
        let mut a = AudioBuffer::from_mono(vec![0.1, 0.2], 48000);
        let b = AudioBuffer::from_mono(vec![0.3], 48000);
        a.append(&b).unwrap();
        assert_eq!(a.channel(0), &[0.1, 0.2, 0.3]);
        let stereo = AudioBuffer::new(2, ChannelLayout::Stereo, 48000);
        assert!(a.append(&stereo).is_err());
    }

    #[test]
    fn test_to_layout_and_interleave() {
        let mono = AudioBuffer::from_mono(vec![0.25, -0.25], 48000);
        let stereo = mono.to_layout(ChannelLayout::Stereo);
        assert_eq!(stereo.num_channels(), 2);
        assert_eq!(stereo.interleaved(), vec![0.25, 0.25, -0.25, -0.25]);
        let back = stereo.to_layout(ChannelLayout::Mono);
        assert_eq!(back.channel(0), &[0.25, -0.25]);
    }
}
