//! Nyquist taper for upward shifts.
//!
//! Shifting up moves energy towards Nyquist, where the mirrored half of the
//! spectrum starts. Above `TAPER_START` of Nyquist the shifted magnitudes are
//! rolled off with a raised cosine, and the Nyquist bin itself is zeroed.
//! Downward shifts (ratio ≤ 1) cannot alias and are left untouched.

use std::f32::consts::PI;

/// Fraction of Nyquist where the roll-off begins.
pub const TAPER_START: f32 = 0.9;

/// Apply the taper to a half spectrum of `N/2 + 1` magnitudes.
pub fn suppress_aliasing(magnitude: &mut [f32], ratio: f64) {
    if ratio <= 1.0 || magnitude.len() < 2 {
        return;
    }

    let nyquist = magnitude.len() - 1;
    let start = (nyquist as f32 * TAPER_START).round() as usize;
    let span = (nyquist - start).max(1) as f32;

    for (k, m) in magnitude.iter_mut().enumerate().skip(start) {
        let t = (k - start) as f32 / span;
        *m *= 0.5 * (1.0 + (PI * t).cos());
    }
    magnitude[nyquist] = 0.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downward_shift_untouched() {
        let mut magnitude = vec![1.0; 101];
        suppress_aliasing(&mut magnitude, 0.5);
        suppress_aliasing(&mut magnitude, 1.0);
        assert!(magnitude.iter().all(|&m| m == 1.0));
    }

    #[test]
    fn test_upward_shift_tapers_top_and_zeroes_nyquist() {
        let mut magnitude = vec![1.0; 101];
        suppress_aliasing(&mut magnitude, 2.0);

        assert!(magnitude[..90].iter().all(|&m| m == 1.0));
        assert_eq!(magnitude[90], 1.0);
        assert!(magnitude[95] < 1.0 && magnitude[95] > 0.0);
        assert_eq!(magnitude[100], 0.0);

        // Monotone roll-off
        for k in 90..100 {
            assert!(magnitude[k + 1] <= magnitude[k]);
        }
    }
}
