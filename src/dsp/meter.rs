//! Level metering.
//!
//! Peak: instant attack, exponential release.
//! RMS: one-pole smoothed mean-square, square-rooted on read.
//!
//! Both coefficients are derived from the sample rate in `prepare`; the
//! per-sample update is two multiplies and a compare.

use super::time_constant;

/// Peak release time-constant in ms.
pub const PEAK_RELEASE_MS: f32 = 300.0;
/// RMS averaging time-constant in ms.
pub const RMS_WINDOW_MS: f32 = 100.0;

#[derive(Debug, Clone, Copy)]
pub struct LevelMeter {
    peak: f32,
    mean_square: f32,
    release_coeff: f32,
    rms_coeff: f32,
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new(crate::DEFAULT_SAMPLE_RATE)
    }
}

impl LevelMeter {
    pub fn new(sample_rate: f32) -> Self {
        let mut meter = Self {
            peak: 0.0,
            mean_square: 0.0,
            release_coeff: 0.0,
            rms_coeff: 0.0,
        };
        meter.prepare(sample_rate);
        meter
    }

    pub fn prepare(&mut self, sample_rate: f32) {
        self.release_coeff = time_constant(PEAK_RELEASE_MS, sample_rate);
        self.rms_coeff = time_constant(RMS_WINDOW_MS, sample_rate);
        self.reset();
    }

    #[inline]
    pub fn push(&mut self, sample: f32) {
        let level = sample.abs();
        self.peak = if level > self.peak {
            level
        } else {
            self.peak * self.release_coeff
        };
        self.mean_square =
            self.rms_coeff * self.mean_square + (1.0 - self.rms_coeff) * sample * sample;
    }

    pub fn process(&mut self, samples: &[f32]) {
        for &s in samples {
            self.push(s);
        }
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn rms(&self) -> f32 {
        self.mean_square.sqrt()
    }

    pub fn reset(&mut self) {
        self.peak = 0.0;
        self.mean_square = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    #[test]
    fn test_peak_attack_is_instant() {
        let mut meter = LevelMeter::new(SR);
        meter.push(-0.8);
        assert_eq!(meter.peak(), 0.8);
    }

    #[test]
    fn test_peak_releases_over_time() {
        let mut meter = LevelMeter::new(SR);
        meter.push(1.0);
        meter.process(&vec![0.0; (SR * 0.3) as usize]);
        // One time-constant later: ~1/e
        assert!((meter.peak() - (-1.0f32).exp()).abs() < 0.01);
    }

    #[test]
    fn test_rms_of_full_scale_sine_converges() {
        let mut meter = LevelMeter::new(SR);
        let sine: Vec<f32> = (0..SR as usize)
            .map(|i| (std::f32::consts::TAU * 1000.0 * i as f32 / SR).sin())
            .collect();
        meter.process(&sine);
        assert!((meter.rms() - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.02);
    }

    #[test]
    fn test_reset_zeroes() {
        let mut meter = LevelMeter::new(SR);
        meter.process(&[1.0; 64]);
        meter.reset();
        assert_eq!(meter.peak(), 0.0);
        assert_eq!(meter.rms(), 0.0);
    }
}
