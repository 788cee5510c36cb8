//! Low-level DSP primitives used by the effects, tracks and mixer.
//!
//! Everything here is allocation-free once prepared. Buffers whose length
//! depends on the sample rate are sized by an explicit `prepare`/`new` call on
//! the control thread, never while rendering.

/// Biquad filter sections (RBJ cookbook shelves and peak).
pub mod biquad;
/// Circular delay line with a clamped read offset.
pub mod delay;
/// Envelope follower and gain computer for dynamics processing.
pub mod dynamics;
/// Peak and RMS level meters.
pub mod meter;
/// Summing, wet/dry blending and panning helpers.
pub mod mix;
/// Phase-accumulating sine oscillator.
pub mod oscillator;
/// Schroeder comb/allpass reverb network.
pub mod reverb;

/// Convert decibels to a linear amplitude factor.
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Convert a linear amplitude factor to decibels, floored at -120 dB.
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.max(1e-6).log10()
}

/// Clamp a parameter into `[min, max]`, keeping `current` when `value` is NaN.
#[inline]
pub fn clamp_param(value: f32, min: f32, max: f32, current: f32) -> f32 {
    if value.is_nan() {
        current
    } else {
        value.clamp(min, max)
    }
}

/// One-pole smoothing coefficient reaching ~63% of a step in `time_ms`.
#[inline]
pub fn time_constant(time_ms: f32, sample_rate: f32) -> f32 {
    let samples = (time_ms * 0.001 * sample_rate).max(1.0);
    (-1.0 / samples).exp()
}
