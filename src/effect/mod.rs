//! Effects and ordered effect chains.
//!
//! An [`Effect`] wraps one concrete processor from a closed set
//! ([`EffectKind`]) together with the controls every effect shares: an
//! enabled flag and a wet/dry mix. Dispatch is a `match`, so the render path
//! never goes through a vtable.
//!
//! ```text
//!            ┌──────────────── dry copy ──────────────┐
//!   block ───┤                                        ├─→ (1-mix)·dry + mix·wet
//!            └──→ [ Delay | EQ | Reverb | ... ] ──────┘
//! ```
//!
//! Parameters are addressed by typed keys. Each concrete effect has its own
//! key enum and implements [`Parameterized`]; [`EffectParam`] wraps them so a
//! control surface can address any effect through one type.

pub mod chain;
pub mod compressor;
pub mod delay;
pub mod eq;
pub mod pitch_shift;
pub mod reverb;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::buffer::StereoBlock;
use crate::config::validate_spec;
use crate::dsp::clamp_param;
use crate::dsp::delay::DelayLine;
use crate::dsp::mix::apply_dry_wet;
use crate::error::ConfigResult;
use crate::NUM_CHANNELS;

pub use chain::{EffectChain, MAX_EFFECTS_PER_CHAIN};
pub use compressor::{CompressorEffect, CompressorParam};
pub use delay::{DelayEffect, DelayParam};
pub use eq::{EqBand, EqEffect, EqParam};
pub use pitch_shift::{PitchParam, PitchShiftEffect};
pub use reverb::{ReverbEffect, ReverbParam};

/// Typed parameter access, one key enum per effect.
pub trait Parameterized: Send {
    type Param: Copy + Send + 'static;

    /// Every key this effect understands, in display order.
    fn params() -> &'static [Self::Param];

    fn get_param(&self, param: Self::Param) -> f32;

    /// Set a parameter, clamping to its range.
    fn set_param(&mut self, param: Self::Param, value: f32);
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectType {
    Delay,
    Eq,
    Reverb,
    Compressor,
    PitchShift,
}

impl EffectType {
    pub fn name(self) -> &'static str {
        match self {
            EffectType::Delay => "Delay",
            EffectType::Eq => "EQ",
            EffectType::Reverb => "Reverb",
            EffectType::Compressor => "Compressor",
            EffectType::PitchShift => "Pitch Shift",
        }
    }
}

/// Any parameter of any effect, including the shared controls.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectParam {
    /// 1.0 = processing, 0.0 = bypassed
    Enabled,
    /// Wet/dry blend (0.0 = dry, 1.0 = wet)
    Mix,
    Delay(DelayParam),
    Eq(EqParam),
    Reverb(ReverbParam),
    Compressor(CompressorParam),
    PitchShift(PitchParam),
}

pub enum EffectKind {
    Delay(DelayEffect),
    Eq(EqEffect),
    Reverb(ReverbEffect),
    Compressor(CompressorEffect),
    PitchShift(PitchShiftEffect),
}

impl EffectKind {
    pub fn effect_type(&self) -> EffectType {
        match self {
            EffectKind::Delay(_) => EffectType::Delay,
            EffectKind::Eq(_) => EffectType::Eq,
            EffectKind::Reverb(_) => EffectType::Reverb,
            EffectKind::Compressor(_) => EffectType::Compressor,
            EffectKind::PitchShift(_) => EffectType::PitchShift,
        }
    }

    fn prepare(&mut self, sample_rate: f32, block_size: usize) -> ConfigResult<()> {
        match self {
            EffectKind::Delay(fx) => fx.prepare(sample_rate),
            EffectKind::Eq(fx) => fx.prepare(sample_rate),
            EffectKind::Reverb(fx) => fx.prepare(sample_rate),
            EffectKind::Compressor(fx) => fx.prepare(sample_rate),
            EffectKind::PitchShift(fx) => fx.prepare(sample_rate, block_size)?,
        }
        Ok(())
    }

    fn process(&mut self, block: &mut StereoBlock) {
        match self {
            EffectKind::Delay(fx) => fx.process(block),
            EffectKind::Eq(fx) => fx.process(block),
            EffectKind::Reverb(fx) => fx.process(block),
            EffectKind::Compressor(fx) => fx.process(block),
            EffectKind::PitchShift(fx) => fx.process(block),
        }
    }

    fn reset(&mut self) {
        match self {
            EffectKind::Delay(fx) => fx.reset(),
            EffectKind::Eq(fx) => fx.reset(),
            EffectKind::Reverb(fx) => fx.reset(),
            EffectKind::Compressor(fx) => fx.reset(),
            EffectKind::PitchShift(fx) => fx.reset(),
        }
    }

    fn latency_samples(&self) -> usize {
        match self {
            EffectKind::PitchShift(fx) => fx.latency_samples(),
            _ => 0,
        }
    }

    fn max_latency_samples(&self) -> usize {
        match self {
            EffectKind::PitchShift(fx) => fx.max_latency_samples(),
            _ => 0,
        }
    }

    /// Route a typed key to the matching effect; `None` if it belongs elsewhere.
    fn get_param(&self, param: EffectParam) -> Option<f32> {
        match (self, param) {
            (EffectKind::Delay(fx), EffectParam::Delay(p)) => Some(fx.get_param(p)),
            (EffectKind::Eq(fx), EffectParam::Eq(p)) => Some(fx.get_param(p)),
            (EffectKind::Reverb(fx), EffectParam::Reverb(p)) => Some(fx.get_param(p)),
            (EffectKind::Compressor(fx), EffectParam::Compressor(p)) => Some(fx.get_param(p)),
            (EffectKind::PitchShift(fx), EffectParam::PitchShift(p)) => Some(fx.get_param(p)),
            _ => None,
        }
    }

    fn set_param(&mut self, param: EffectParam, value: f32) -> bool {
        match (self, param) {
            (EffectKind::Delay(fx), EffectParam::Delay(p)) => fx.set_param(p, value),
            (EffectKind::Eq(fx), EffectParam::Eq(p)) => fx.set_param(p, value),
            (EffectKind::Reverb(fx), EffectParam::Reverb(p)) => fx.set_param(p, value),
            (EffectKind::Compressor(fx), EffectParam::Compressor(p)) => fx.set_param(p, value),
            (EffectKind::PitchShift(fx), EffectParam::PitchShift(p)) => fx.set_param(p, value),
            _ => return false,
        }
        true
    }

    fn params(&self) -> Vec<EffectParam> {
        fn wrap<P: Copy>(keys: &[P], f: fn(P) -> EffectParam) -> Vec<EffectParam> {
            keys.iter().copied().map(f).collect()
        }
        match self {
            EffectKind::Delay(_) => wrap(DelayEffect::params(), EffectParam::Delay),
            EffectKind::Eq(_) => wrap(EqEffect::params(), EffectParam::Eq),
            EffectKind::Reverb(_) => wrap(ReverbEffect::params(), EffectParam::Reverb),
            EffectKind::Compressor(_) => {
                wrap(CompressorEffect::params(), EffectParam::Compressor)
            }
            EffectKind::PitchShift(_) => {
                wrap(PitchShiftEffect::params(), EffectParam::PitchShift)
            }
        }
    }
}

/// Persistable view of one effect.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EffectSnapshot {
    pub effect_type: EffectType,
    pub enabled: bool,
    pub mix: f32,
    pub latency_samples: usize,
    pub params: Vec<(EffectParam, f32)>,
}

pub struct Effect {
    kind: EffectKind,
    enabled: bool,
    mix: f32,
    /// Unprocessed copy for wet/dry blending, sized at prepare
    dry: StereoBlock,
    /// Holds the dry copy back by the effect's latency; empty for zero-latency effects
    dry_delay: [DelayLine; NUM_CHANNELS],
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("kind", &self.kind.effect_type())
            .field("enabled", &self.enabled)
            .field("mix", &self.mix)
            .finish_non_exhaustive()
    }
}

impl Effect {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            enabled: true,
            mix: 1.0,
            dry: StereoBlock::default(),
            dry_delay: Default::default(),
        }
    }

    pub fn delay() -> Self {
        Self::new(EffectKind::Delay(DelayEffect::new()))
    }

    pub fn eq() -> Self {
        Self::new(EffectKind::Eq(EqEffect::new()))
    }

    pub fn reverb() -> Self {
        Self::new(EffectKind::Reverb(ReverbEffect::new()))
    }

    pub fn compressor() -> Self {
        Self::new(EffectKind::Compressor(CompressorEffect::new()))
    }

    pub fn pitch_shift(semitones: f32) -> Self {
        Self::new(EffectKind::PitchShift(PitchShiftEffect::with_semitones(
            semitones,
        )))
    }

    /// Default-configured effect of the given type.
    pub fn of_type(effect_type: EffectType) -> Self {
        match effect_type {
            EffectType::Delay => Self::delay(),
            EffectType::Eq => Self::eq(),
            EffectType::Reverb => Self::reverb(),
            EffectType::Compressor => Self::compressor(),
            EffectType::PitchShift => Self::pitch_shift(0.0),
        }
    }

    pub fn prepare(&mut self, sample_rate: f32, block_size: usize) -> ConfigResult<()> {
        validate_spec(sample_rate, block_size)?;
        self.kind.prepare(sample_rate, block_size)?;
        self.dry.allocate(block_size);

        let max_latency = self.kind.max_latency_samples();
        for line in &mut self.dry_delay {
            if max_latency > 0 {
                line.allocate(max_latency + 1);
            } else {
                *line = DelayLine::default();
            }
        }
        Ok(())
    }

    /// Process in place. Disabled effects leave the block untouched.
    ///
    /// The dry path of a latent effect is delayed by `latency_samples()` so a
    /// partial mix lines up with the wet signal.
    pub fn process_block(&mut self, block: &mut StereoBlock) {
        if !self.enabled {
            return;
        }

        let fits = block.len() <= self.dry.capacity();
        let blend = self.mix < 1.0 && fits;
        let latency = self.kind.latency_samples();
        // Fed at every mix setting, not only while blending
        let compensate = fits && latency > 0 && !self.dry_delay[0].is_empty();
        if blend || compensate {
            self.dry.copy_from(block);
        }

        self.kind.process(block);

        if compensate {
            for (ch, line) in self.dry_delay.iter_mut().enumerate() {
                line.set_delay(latency);
                for sample in self.dry.channel_mut(ch) {
                    *sample = line.next_sample(*sample);
                }
            }
        }

        if blend {
            for ch in 0..NUM_CHANNELS {
                apply_dry_wet(self.dry.channel(ch), block.channel_mut(ch), self.mix);
            }
        }
    }

    pub fn reset(&mut self) {
        self.kind.reset();
        for line in &mut self.dry_delay {
            line.reset();
        }
    }

    pub fn effect_type(&self) -> EffectType {
        self.kind.effect_type()
    }

    pub fn name(&self) -> &'static str {
        self.effect_type().name()
    }

    pub fn kind(&self) -> &EffectKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut EffectKind {
        &mut self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = clamp_param(mix, 0.0, 1.0, self.mix);
    }

    pub fn latency_samples(&self) -> usize {
        self.kind.latency_samples()
    }

    pub fn get_param(&self, param: EffectParam) -> Option<f32> {
        match param {
            EffectParam::Enabled => Some(self.enabled as u8 as f32),
            EffectParam::Mix => Some(self.mix),
            other => self.kind.get_param(other),
        }
    }

    /// Returns `false` if `param` belongs to a different effect type.
    pub fn set_param(&mut self, param: EffectParam, value: f32) -> bool {
        match param {
            EffectParam::Enabled => {
                self.set_enabled(value >= 0.5);
                true
            }
            EffectParam::Mix => {
                self.set_mix(value);
                true
            }
            other => self.kind.set_param(other, value),
        }
    }

    pub fn snapshot(&self) -> EffectSnapshot {
        let params = self
            .kind
            .params()
            .into_iter()
            .filter_map(|p| self.kind.get_param(p).map(|v| (p, v)))
            .collect();
        EffectSnapshot {
            effect_type: self.effect_type(),
            enabled: self.enabled,
            mix: self.mix,
            latency_samples: self.latency_samples(),
            params,
        }
    }

    /// Rebuild an effect from a snapshot. The result still needs `prepare`.
    pub fn from_snapshot(snapshot: &EffectSnapshot) -> Self {
        let mut effect = Self::of_type(snapshot.effect_type);
        effect.set_enabled(snapshot.enabled);
        effect.set_mix(snapshot.mix);
        for &(param, value) in &snapshot.params {
            effect.set_param(param, value);
        }
        effect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> StereoBlock {
        let samples: Vec<f32> = (0..len).map(|i| i as f32 / len as f32).collect();
        StereoBlock::from_channels(samples.clone(), samples)
    }

    fn prepared(mut effect: Effect) -> Effect {
        effect.prepare(48_000.0, 64).unwrap();
        effect
    }

    #[test]
    fn test_disabled_effect_is_strict_passthrough() {
        let mut effect = prepared(Effect::reverb());
        effect.set_enabled(false);

        let mut block = ramp(64);
        let original = block.clone();
        effect.process_block(&mut block);
        assert_eq!(block.channel(0), original.channel(0));
        assert_eq!(block.channel(1), original.channel(1));
    }

    #[test]
    fn test_zero_mix_is_dry() {
        let mut effect = prepared(Effect::compressor());
        effect.set_param(EffectParam::Compressor(CompressorParam::Makeup), 24.0);
        effect.set_mix(0.0);

        let mut block = ramp(64);
        let original = block.clone();
        effect.process_block(&mut block);
        assert_eq!(block.channel(0), original.channel(0));
    }

    #[test]
    fn test_half_mix_blends() {
        let mut effect = prepared(Effect::eq());
        effect.set_param(EffectParam::Eq(EqParam::Gain(EqBand::Mid)), 0.0);
        effect.set_mix(0.5);

        // A flat EQ is (almost) identity, so a half blend stays the same
        let mut block = ramp(64);
        let original = block.clone();
        effect.process_block(&mut block);
        for (a, b) in block.channel(0).iter().zip(original.channel(0)) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_params_route_by_type() {
        let mut effect = Effect::delay();
        assert!(effect.set_param(EffectParam::Delay(DelayParam::Feedback), 0.7));
        assert!(!effect.set_param(EffectParam::Reverb(ReverbParam::Width), 0.2));
        assert_eq!(
            effect.get_param(EffectParam::Delay(DelayParam::Feedback)),
            Some(0.7)
        );
        assert_eq!(effect.get_param(EffectParam::Reverb(ReverbParam::Width)), None);

        assert!(effect.set_param(EffectParam::Mix, 3.0));
        assert_eq!(effect.mix(), 1.0);
    }

    #[test]
    fn test_snapshot_roundtrip_restores_parameters() {
        let mut effect = Effect::reverb();
        effect.set_param(EffectParam::Reverb(ReverbParam::RoomSize), 0.9);
        effect.set_param(EffectParam::Reverb(ReverbParam::Width), 0.25);
        effect.set_mix(0.4);
        effect.set_enabled(false);

        let snapshot = effect.snapshot();
        assert_eq!(snapshot.effect_type, EffectType::Reverb);
        assert_eq!(snapshot.params.len(), ReverbEffect::params().len());

        let restored = Effect::from_snapshot(&snapshot);
        assert_eq!(restored.snapshot(), snapshot);
    }

    #[test]
    fn test_prepare_rejects_invalid_settings() {
        let mut effect = Effect::delay();
        assert!(effect.prepare(-1.0, 64).is_err());
        assert!(effect.prepare(48_000.0, 0).is_err());
    }

    #[test]
    fn test_dry_path_is_delayed_by_latency() {
        let mut effect = Effect::pitch_shift(7.0);
        effect.prepare(48_000.0, 64).unwrap();
        let latency = effect.latency_samples();
        assert_eq!(latency, 2048);
        effect.set_mix(0.0);

        let mut rendered = Vec::new();
        for i in 0..(latency / 64 + 2) {
            let mut block = StereoBlock::new(64);
            if i == 0 {
                block.channel_mut(0)[0] = 1.0;
                block.channel_mut(1)[0] = 1.0;
            }
            effect.process_block(&mut block);
            rendered.extend_from_slice(block.channel(0));
        }

        assert_eq!(rendered[latency], 1.0);
        assert_eq!(rendered.iter().filter(|&&s| s != 0.0).count(), 1);
    }

    #[test]
    fn test_nan_parameters_are_ignored() {
        let mut effect = Effect::eq();
        effect.set_mix(0.5);
        effect.set_mix(f32::NAN);
        assert_eq!(effect.mix(), 0.5);

        effect.prepare(48_000.0, 64).unwrap();
        effect.set_param(EffectParam::Eq(EqParam::Frequency(EqBand::Mid)), f32::NAN);
        effect.set_param(EffectParam::Eq(EqParam::Gain(EqBand::Mid)), f32::NAN);
        let mut block = ramp(64);
        effect.process_block(&mut block);
        assert!(block.channel(0).iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_pitch_shift_reports_latency() {
        let mut effect = Effect::pitch_shift(5.0);
        effect.prepare(48_000.0, 512).unwrap();
        assert_eq!(effect.latency_samples(), 2048);
        assert_eq!(Effect::delay().latency_samples(), 0);
    }
}
