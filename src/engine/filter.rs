//! Biquad filters
//!
//! Second-order low-pass and high-pass sections. The ambient noise layer
//! runs through a low-pass to take the hiss out of the white noise.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Butterworth Q, the flattest passband for a second-order section
pub const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Filter response shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Remove above cutoff
    #[default]
    LowPass,
    /// Remove below cutoff
    HighPass,
}

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (a0 + a1*z^-1 + a2*z^-2)
/// Normalized: all coefficients divided by a0
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    /// Audio EQ Cookbook formulas
    fn calculate(kind: FilterKind, sample_rate: f64, cutoff_hz: f64, q: f64) -> Self {
        // Keep the cutoff below Nyquist
        let freq = cutoff_hz.clamp(10.0, sample_rate / 2.0 - 1.0);
        let q = q.clamp(0.1, 10.0);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2, a0, a1, a2) = match kind {
            FilterKind::LowPass => (
                (1.0 - cos_w0) / 2.0,
                1.0 - cos_w0,
                (1.0 - cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterKind::HighPass => (
                (1.0 + cos_w0) / 2.0,
                -(1.0 + cos_w0),
                (1.0 + cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
        };

        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Direct Form I biquad with its own history
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    kind: FilterKind,
    cutoff_hz: f64,
    q: f64,
    coeffs: BiquadCoeffs,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadFilter {
    pub fn new(kind: FilterKind, cutoff_hz: f64, q: f64, sample_rate: f64) -> Self {
        Self {
            kind,
            cutoff_hz,
            q,
            coeffs: BiquadCoeffs::calculate(kind, sample_rate, cutoff_hz, q),
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn low_pass(cutoff_hz: f64, sample_rate: f64) -> Self {
        Self::new(FilterKind::LowPass, cutoff_hz, BUTTERWORTH_Q, sample_rate)
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_hz
    }

    /// Recompute coefficients for a new sample rate
    pub fn prepare(&mut self, sample_rate: f64) {
        self.coeffs = BiquadCoeffs::calculate(self.kind, sample_rate, self.cutoff_hz, self.q);
        self.reset();
    }

    /// Clear filter history
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let x0 = input as f64;
        let y0 = c.b0 * x0 + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x0;
        self.y2 = self.y1;
        self.y1 = y0;

        y0 as f32
    }
}
