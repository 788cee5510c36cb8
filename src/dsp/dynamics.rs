/*
Dynamics
========

A feed-forward compressor has two parts:

  detector      An envelope follower on the (linked) input level. Attack and
                release are separate one-pole coefficients: the envelope moves
                towards a louder input with the attack coefficient and towards
                a quieter one with the release coefficient.

  gain computer Maps the detected level (dB) to a gain change (dB):

                  level ≤ threshold:  0
                  level > threshold:  (threshold - level) × (1 - 1/ratio)

    Output (dB)
        │            ╱  ratio 1:1
        │          ╱
        │        ╱ ___---  ratio 4:1
        │      ╱---
        │    ╱
        │  ╱
        └───────┼────────── Input (dB)
             threshold

Makeup gain is added after the gain computer.
*/

use super::{db_to_gain, gain_to_db, time_constant};

/// Attack/release envelope follower on absolute level.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeFollower {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

impl EnvelopeFollower {
    pub fn new(attack_ms: f32, release_ms: f32, sample_rate: f32) -> Self {
        Self {
            envelope: 0.0,
            attack_coeff: time_constant(attack_ms, sample_rate),
            release_coeff: time_constant(release_ms, sample_rate),
        }
    }

    pub fn set_times(&mut self, attack_ms: f32, release_ms: f32, sample_rate: f32) {
        self.attack_coeff = time_constant(attack_ms, sample_rate);
        self.release_coeff = time_constant(release_ms, sample_rate);
    }

    #[inline]
    pub fn process(&mut self, level: f32) -> f32 {
        let coeff = if level > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * level;
        self.envelope
    }

    pub fn value(&self) -> f32 {
        self.envelope
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}

/// Static gain reduction in dB (≤ 0) for a detected level.
#[inline]
pub fn gain_reduction_db(level_db: f32, threshold_db: f32, ratio: f32) -> f32 {
    if level_db <= threshold_db {
        0.0
    } else {
        (threshold_db - level_db) * (1.0 - 1.0 / ratio.max(1.0))
    }
}

/// Linear gain to apply for an envelope level, including makeup.
#[inline]
pub fn compressor_gain(envelope: f32, threshold_db: f32, ratio: f32, makeup_db: f32) -> f32 {
    let reduction = gain_reduction_db(gain_to_db(envelope), threshold_db, ratio);
    db_to_gain(reduction + makeup_db)
}
