//! Second-order IIR sections.
//!
//! Coefficients follow the RBJ Audio EQ Cookbook. Shelves take a Q rather
//! than a shelf slope so all three band shapes share one control set.
//!
//! ```text
//! y[n] = b0·x[n] + b1·x[n-1] + b2·x[n-2] - a1·y[n-1] - a2·y[n-2]
//! ```
//!
//! Coefficients are normalised by a0 when computed, so processing is five
//! multiplies per sample in transposed direct form II.

use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::db_to_gain;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiquadShape {
    LowShelf,
    Peak,
    HighShelf,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self::passthrough()
    }
}

impl BiquadCoeffs {
    pub fn passthrough() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    /// Compute coefficients for `shape`. The frequency is kept below Nyquist.
    pub fn design(shape: BiquadShape, freq: f32, gain_db: f32, q: f32, sample_rate: f32) -> Self {
        let freq = freq.clamp(1.0, sample_rate * 0.49);
        let a = db_to_gain(gain_db).sqrt();
        let w0 = TAU * freq / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q.max(1e-3));
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

        let (b0, b1, b2, a0, a1, a2) = match shape {
            BiquadShape::LowShelf => (
                a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
            ),
            BiquadShape::Peak => (
                1.0 + alpha * a,
                -2.0 * cos_w0,
                1.0 - alpha * a,
                1.0 + alpha / a,
                -2.0 * cos_w0,
                1.0 - alpha / a,
            ),
            BiquadShape::HighShelf => (
                a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
            ),
        };

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Magnitude response at `freq`, for tests and metering.
    pub fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f32 {
        let w = TAU * freq / sample_rate;
        let (s1, c1) = w.sin_cos();
        let (s2, c2) = (2.0 * w).sin_cos();
        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);
        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }
}

/// Per-channel filter memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct BiquadState {
    z1: f32,
    z2: f32,
}

impl BiquadState {
    #[inline]
    pub fn process(&mut self, input: f32, c: &BiquadCoeffs) -> f32 {
        let output = c.b0 * input + self.z1;
        self.z1 = c.b1 * input - c.a1 * output + self.z2;
        self.z2 = c.b2 * input - c.a2 * output;
        output
    }

    pub fn render(&mut self, buffer: &mut [f32], c: &BiquadCoeffs) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample, c);
        }
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    #[test]
    fn test_zero_gain_is_flat() {
        for shape in [BiquadShape::LowShelf, BiquadShape::Peak, BiquadShape::HighShelf] {
            let c = BiquadCoeffs::design(shape, 1000.0, 0.0, 1.0, SR);
            for freq in [50.0, 1000.0, 10_000.0] {
                assert!((c.magnitude_at(freq, SR) - 1.0).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_peak_boosts_centre() {
        let c = BiquadCoeffs::design(BiquadShape::Peak, 1000.0, 12.0, 1.0, SR);
        let centre = c.magnitude_at(1000.0, SR);
        assert!((centre - db_to_gain(12.0)).abs() < 0.05);
        assert!(c.magnitude_at(50.0, SR) < 1.1);
    }

    #[test]
    fn test_shelves_affect_their_side() {
        let low = BiquadCoeffs::design(BiquadShape::LowShelf, 200.0, -12.0, 0.707, SR);
        assert!(low.magnitude_at(20.0, SR) < 0.3);
        assert!((low.magnitude_at(15_000.0, SR) - 1.0).abs() < 0.05);

        let high = BiquadCoeffs::design(BiquadShape::HighShelf, 4000.0, 12.0, 0.707, SR);
        assert!(high.magnitude_at(20_000.0, SR) > 3.5);
        assert!((high.magnitude_at(50.0, SR) - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_state_is_stable() {
        let c = BiquadCoeffs::design(BiquadShape::Peak, 100.0, 24.0, 10.0, SR);
        let mut state = BiquadState::default();
        for i in 0..48_000 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            assert!(state.process(x, &c).is_finite());
        }
    }
}
