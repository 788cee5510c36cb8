//! Spectral envelope estimation for formant preservation.
//!
//! The envelope is a moving average of the analysis magnitude over
//! `±ENVELOPE_RADIUS` bins, floored so silent regions never divide by zero.
//! Dividing by it flattens the spectrum before the bins are moved; multiplying
//! the moved spectrum by the same (unmoved) envelope puts the resonances back
//! where they were.

/// Half-width of the smoothing window, in bins.
pub const ENVELOPE_RADIUS: usize = 5;
/// Smallest envelope value used as a divisor.
pub const ENVELOPE_FLOOR: f32 = 1e-9;

/// Write the smoothed envelope of `magnitude` into `envelope` (same length).
///
/// Runs as a sliding sum, so the cost is linear in the bin count.
pub fn spectral_envelope(magnitude: &[f32], envelope: &mut [f32]) {
    debug_assert_eq!(magnitude.len(), envelope.len());
    let len = magnitude.len();
    if len == 0 {
        return;
    }

    let mut sum: f32 = magnitude[..=ENVELOPE_RADIUS.min(len - 1)].iter().sum();
    for j in 0..len {
        let lo = j.saturating_sub(ENVELOPE_RADIUS);
        let hi = (j + ENVELOPE_RADIUS).min(len - 1);
        envelope[j] = (sum / (hi - lo + 1) as f32).max(ENVELOPE_FLOOR);

        // Slide: add the bin entering at hi+1, drop the one leaving at lo
        if j + ENVELOPE_RADIUS + 1 < len {
            sum += magnitude[j + ENVELOPE_RADIUS + 1];
        }
        if j >= ENVELOPE_RADIUS {
            sum -= magnitude[j - ENVELOPE_RADIUS];
        }
    }
}

/// Divide `magnitude` by `envelope` in place.
pub fn flatten(magnitude: &mut [f32], envelope: &[f32]) {
    for (m, &e) in magnitude.iter_mut().zip(envelope) {
        *m /= e;
    }
}

/// Multiply `magnitude` by `envelope` in place.
pub fn restore(magnitude: &mut [f32], envelope: &[f32]) {
    for (m, &e) in magnitude.iter_mut().zip(envelope) {
        *m *= e;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(magnitude: &[f32]) -> Vec<f32> {
        let len = magnitude.len();
        (0..len)
            .map(|j| {
                let lo = j.saturating_sub(ENVELOPE_RADIUS);
                let hi = (j + ENVELOPE_RADIUS).min(len - 1);
                let avg = magnitude[lo..=hi].iter().sum::<f32>() / (hi - lo + 1) as f32;
                avg.max(ENVELOPE_FLOOR)
            })
            .collect()
    }

    #[test]
    fn test_sliding_sum_matches_direct_average() {
        let magnitude: Vec<f32> = (0..64).map(|i| ((i * 7) % 13) as f32 * 0.1).collect();
        let mut envelope = vec![0.0; 64];
        spectral_envelope(&magnitude, &mut envelope);

        for (a, b) in envelope.iter().zip(brute_force(&magnitude)) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_short_spectrum() {
        let magnitude = [1.0, 3.0];
        let mut envelope = [0.0; 2];
        spectral_envelope(&magnitude, &mut envelope);
        assert_eq!(envelope, [2.0, 2.0]);
    }

    #[test]
    fn test_silence_is_floored() {
        let magnitude = [0.0; 16];
        let mut envelope = [0.0; 16];
        spectral_envelope(&magnitude, &mut envelope);
        assert!(envelope.iter().all(|&e| e == ENVELOPE_FLOOR));
    }

    #[test]
    fn test_flatten_then_restore_is_identity() {
        let original: Vec<f32> = (0..32).map(|i| 1.0 + i as f32).collect();
        let mut envelope = vec![0.0; 32];
        spectral_envelope(&original, &mut envelope);

        let mut magnitude = original.clone();
        flatten(&mut magnitude, &envelope);
        restore(&mut magnitude, &envelope);
        for (a, b) in magnitude.iter().zip(&original) {
            assert!((a - b).abs() < 1e-4);
        }
    }
}
