//! Stereo-linked feed-forward compressor.
//!
//! The detector follows the louder of the two channels so the stereo image
//! does not shift under gain reduction.

use crate::buffer::StereoBlock;
use crate::dsp::dynamics::{compressor_gain, gain_reduction_db, EnvelopeFollower};
use crate::dsp::{clamp_param, gain_to_db};
use crate::DEFAULT_SAMPLE_RATE;

use super::Parameterized;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressorParam {
    /// Threshold in dB (-60 - 0)
    Threshold,
    /// Compression ratio (1 - 20)
    Ratio,
    /// Attack time in ms (0.1 - 200)
    Attack,
    /// Release time in ms (5 - 2000)
    Release,
    /// Makeup gain in dB (0 - 24)
    Makeup,
}

#[derive(Debug, Clone)]
pub struct CompressorEffect {
    follower: EnvelopeFollower,
    sample_rate: f32,
    threshold_db: f32,
    ratio: f32,
    attack_ms: f32,
    release_ms: f32,
    makeup_db: f32,
    /// Gain reduction at the end of the last block, in dB (≤ 0)
    last_reduction_db: f32,
}

impl Default for CompressorEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressorEffect {
    pub fn new() -> Self {
        let (attack_ms, release_ms) = (10.0, 100.0);
        Self {
            follower: EnvelopeFollower::new(attack_ms, release_ms, DEFAULT_SAMPLE_RATE),
            sample_rate: DEFAULT_SAMPLE_RATE,
            threshold_db: -18.0,
            ratio: 4.0,
            attack_ms,
            release_ms,
            makeup_db: 0.0,
            last_reduction_db: 0.0,
        }
    }

    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_times();
        self.reset();
    }

    fn update_times(&mut self) {
        self.follower
            .set_times(self.attack_ms, self.release_ms, self.sample_rate);
    }

    pub fn set_threshold(&mut self, db: f32) {
        self.threshold_db = clamp_param(db, -60.0, 0.0, self.threshold_db);
    }

    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = clamp_param(ratio, 1.0, 20.0, self.ratio);
    }

    pub fn set_attack(&mut self, ms: f32) {
        self.attack_ms = clamp_param(ms, 0.1, 200.0, self.attack_ms);
        self.update_times();
    }

    pub fn set_release(&mut self, ms: f32) {
        self.release_ms = clamp_param(ms, 5.0, 2000.0, self.release_ms);
        self.update_times();
    }

    pub fn set_makeup(&mut self, db: f32) {
        self.makeup_db = clamp_param(db, 0.0, 24.0, self.makeup_db);
    }

    /// Current gain reduction in dB (0 when idle, negative when compressing).
    pub fn gain_reduction_db(&self) -> f32 {
        self.last_reduction_db
    }

    pub fn process(&mut self, block: &mut StereoBlock) {
        let (left, right) = block.split_mut();
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let level = l.abs().max(r.abs());
            let envelope = self.follower.process(level);
            let gain = compressor_gain(envelope, self.threshold_db, self.ratio, self.makeup_db);
            *l *= gain;
            *r *= gain;
        }
        self.last_reduction_db = gain_reduction_db(
            gain_to_db(self.follower.value()),
            self.threshold_db,
            self.ratio,
        );
    }

    pub fn reset(&mut self) {
        self.follower.reset();
        self.last_reduction_db = 0.0;
    }
}

impl Parameterized for CompressorEffect {
    type Param = CompressorParam;

    fn params() -> &'static [CompressorParam] {
        &[
            CompressorParam::Threshold,
            CompressorParam::Ratio,
            CompressorParam::Attack,
            CompressorParam::Release,
            CompressorParam::Makeup,
        ]
    }

    fn get_param(&self, param: CompressorParam) -> f32 {
        match param {
            CompressorParam::Threshold => self.threshold_db,
            CompressorParam::Ratio => self.ratio,
            CompressorParam::Attack => self.attack_ms,
            CompressorParam::Release => self.release_ms,
            CompressorParam::Makeup => self.makeup_db,
        }
    }

    fn set_param(&mut self, param: CompressorParam, value: f32) {
        match param {
            CompressorParam::Threshold => self.set_threshold(value),
            CompressorParam::Ratio => self.set_ratio(value),
            CompressorParam::Attack => self.set_attack(value),
            CompressorParam::Release => self.set_release(value),
            CompressorParam::Makeup => self.set_makeup(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_signal_untouched() {
        let mut comp = CompressorEffect::new();
        comp.prepare(48_000.0);
        let mut block = StereoBlock::from_channels(vec![0.01; 512], vec![0.01; 512]);
        comp.process(&mut block);
        assert!(block.channel(0).iter().all(|&s| (s - 0.01).abs() < 1e-6));
        assert_eq!(comp.gain_reduction_db(), 0.0);
    }

    #[test]
    fn test_loud_signal_is_reduced() {
        let mut comp = CompressorEffect::new();
        comp.prepare(48_000.0);
        comp.set_threshold(-20.0);
        comp.set_ratio(4.0);
        comp.set_attack(1.0);

        let mut block = StereoBlock::from_channels(vec![1.0; 4800], vec![1.0; 4800]);
        comp.process(&mut block);

        // Settled: 20 dB over at 4:1 → -15 dB
        let settled = block.channel(0)[4799];
        assert!((gain_to_db(settled) + 15.0).abs() < 0.5, "{settled}");
        assert!((comp.gain_reduction_db() + 15.0).abs() < 0.5);
    }

    #[test]
    fn test_stereo_link_keeps_balance() {
        let mut comp = CompressorEffect::new();
        comp.prepare(48_000.0);
        comp.set_threshold(-30.0);

        let mut block = StereoBlock::from_channels(vec![1.0; 2048], vec![0.5; 2048]);
        comp.process(&mut block);
        for (l, r) in block.channel(0).iter().zip(block.channel(1)) {
            assert!((l / r - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_parameters_clamp() {
        let mut comp = CompressorEffect::new();
        comp.set_param(CompressorParam::Ratio, 100.0);
        comp.set_param(CompressorParam::Threshold, 6.0);
        comp.set_param(CompressorParam::Attack, 0.0);
        assert_eq!(comp.get_param(CompressorParam::Ratio), 20.0);
        assert_eq!(comp.get_param(CompressorParam::Threshold), 0.0);
        assert_eq!(comp.get_param(CompressorParam::Attack), 0.1);

        comp.set_param(CompressorParam::Ratio, f32::NAN);
        comp.set_param(CompressorParam::Release, f32::NAN);
        assert_eq!(comp.get_param(CompressorParam::Ratio), 20.0);
        assert!(comp.get_param(CompressorParam::Release).is_finite());
    }
}
