//! Noise buffers and looping buffer playback

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Fill a buffer with uniform white noise in `±amplitude`
pub fn white_noise<R: Rng + ?Sized>(frames: usize, amplitude: f32, rng: &mut R) -> Vec<f32> {
    (0..frames)
        .map(|_| (rng.random::<f32>() * 2.0 - 1.0) * amplitude)
        .collect()
}

/// Build a noise generator, reproducible when a seed is given
pub fn noise_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Plays a shared sample buffer, optionally wrapping at the end
#[derive(Debug, Clone)]
pub struct LoopingBuffer {
    data: Arc<[f32]>,
    position: usize,
    looping: bool,
}

impl LoopingBuffer {
    pub fn new(data: Vec<f32>, looping: bool) -> Self {
        Self {
            data: data.into(),
            position: 0,
            looping,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Rewind to the first sample
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Next sample, or silence once a one-shot buffer runs out
    pub fn next_sample(&mut self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        if self.position >= self.data.len() {
            if !self.looping {
                return 0.0;
            }
            self.position = 0;
        }
        let sample = self.data[self.position];
        self.position += 1;
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_noise_respects_amplitude() {
        let mut rng = noise_rng(Some(7));
        let noise = white_noise(96_000, 0.02, &mut rng);
        assert_eq!(noise.len(), 96_000);
        assert!(noise.iter().all(|s| s.abs() <= 0.02));
        // Uniform noise should use most of the range
        let peak = noise.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.019);
    }

    #[test]
    fn test_white_noise_is_roughly_zero_mean() {
        let mut rng = noise_rng(Some(11));
        let noise = white_noise(48_000, 1.0, &mut rng);
        let mean: f64 = noise.iter().map(|&s| s as f64).sum::<f64>() / noise.len() as f64;
        assert!(mean.abs() < 0.02, "mean {}", mean);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let a = white_noise(64, 0.5, &mut noise_rng(Some(42)));
        let b = white_noise(64, 0.5, &mut noise_rng(Some(42)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_looping_buffer_wraps() {
        let mut buf = LoopingBuffer::new(vec![1.0, 2.0, 3.0], true);
        let out: Vec<f32> = (0..7).map(|_| buf.next_sample()).collect();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_one_shot_buffer_goes_silent() {
        let mut buf = LoopingBuffer::new(vec![0.5, 0.25], false);
        let out: Vec<f32> = (0..4).map(|_| buf.next_sample()).collect();
        assert_eq!(out, vec![0.5, 0.25, 0.0, 0.0]);
        buf.reset();
        assert_eq!(buf.next_sample(), 0.5);
    }

    #[test]
    fn test_empty_buffer_is_silent() {
        let mut buf = LoopingBuffer::new(Vec::new(), true);
        assert!(buf.is_empty());
        assert_eq!(buf.next_sample(), 0.0);
    }
}
