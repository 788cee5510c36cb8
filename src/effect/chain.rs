//! Ordered series of effects.
//!
//! Order matters: a reverb before a compressor sounds different from a
//! compressor before a reverb. Structural edits (insert, remove, move) only
//! happen between blocks; the engine applies them when it drains commands.

use crate::buffer::StereoBlock;
use crate::error::ConfigResult;

use super::{Effect, EffectSnapshot};

/// Slots reserved per chain so pushes from the command ring never allocate.
pub const MAX_EFFECTS_PER_CHAIN: usize = 16;

pub struct EffectChain {
    effects: Vec<Box<Effect>>,
    enabled: bool,
}

impl Default for EffectChain {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectChain {
    pub fn new() -> Self {
        Self {
            effects: Vec::with_capacity(MAX_EFFECTS_PER_CHAIN),
            enabled: true,
        }
    }

    pub fn prepare(&mut self, sample_rate: f32, block_size: usize) -> ConfigResult<()> {
        for effect in &mut self.effects {
            effect.prepare(sample_rate, block_size)?;
        }
        Ok(())
    }

    /// Run every enabled effect in order. A disabled chain is a strict bypass.
    pub fn process_block(&mut self, block: &mut StereoBlock) {
        if !self.enabled {
            return;
        }
        for effect in &mut self.effects {
            effect.process_block(block);
        }
    }

    pub fn reset(&mut self) {
        for effect in &mut self.effects {
            effect.reset();
        }
    }

    /// Append an effect. Returns it back if the chain is full.
    pub fn add_effect(&mut self, effect: Effect) -> Result<(), Effect> {
        self.push_boxed(Box::new(effect)).map_err(|boxed| *boxed)
    }

    /// Append an already boxed effect without reallocating anything.
    pub fn push_boxed(&mut self, effect: Box<Effect>) -> Result<(), Box<Effect>> {
        if self.effects.len() >= MAX_EFFECTS_PER_CHAIN {
            return Err(effect);
        }
        self.effects.push(effect);
        Ok(())
    }

    /// Insert at `index` (clamped to the end). Returns the effect if the chain is full.
    pub fn insert_effect(&mut self, index: usize, effect: Effect) -> Result<(), Effect> {
        self.insert_boxed(index, Box::new(effect))
            .map_err(|boxed| *boxed)
    }

    pub fn insert_boxed(&mut self, index: usize, effect: Box<Effect>) -> Result<(), Box<Effect>> {
        if self.effects.len() >= MAX_EFFECTS_PER_CHAIN {
            return Err(effect);
        }
        let index = index.min(self.effects.len());
        self.effects.insert(index, effect);
        Ok(())
    }

    pub fn remove_effect(&mut self, index: usize) -> Option<Box<Effect>> {
        (index < self.effects.len()).then(|| self.effects.remove(index))
    }

    /// Move the effect at `from` so it ends up at `to`. Out-of-range `from` is ignored.
    pub fn move_effect(&mut self, from: usize, to: usize) -> bool {
        if from >= self.effects.len() {
            return false;
        }
        let to = to.min(self.effects.len() - 1);
        if from < to {
            self.effects[from..=to].rotate_left(1);
        } else {
            self.effects[to..=from].rotate_right(1);
        }
        true
    }

    pub fn effect(&self, index: usize) -> Option<&Effect> {
        self.effects.get(index).map(|e| e.as_ref())
    }

    pub fn effect_mut(&mut self, index: usize) -> Option<&mut Effect> {
        self.effects.get_mut(index).map(|e| e.as_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter().map(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Total latency of the enabled effects, in samples.
    pub fn latency_samples(&self) -> usize {
        if !self.enabled {
            return 0;
        }
        self.effects
            .iter()
            .filter(|e| e.is_enabled())
            .map(|e| e.latency_samples())
            .sum()
    }

    pub fn snapshot(&self) -> Vec<EffectSnapshot> {
        self.iter().map(Effect::snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{EffectParam, EffectType, PitchParam};

    fn types(chain: &EffectChain) -> Vec<EffectType> {
        chain.iter().map(Effect::effect_type).collect()
    }

    fn three_effects() -> EffectChain {
        let mut chain = EffectChain::new();
        chain.add_effect(Effect::delay()).unwrap();
        chain.add_effect(Effect::eq()).unwrap();
        chain.add_effect(Effect::reverb()).unwrap();
        chain
    }

    #[test]
    fn test_move_effect_forward_and_back() {
        let mut chain = three_effects();
        assert!(chain.move_effect(0, 2));
        assert_eq!(
            types(&chain),
            [EffectType::Eq, EffectType::Reverb, EffectType::Delay]
        );

        assert!(chain.move_effect(2, 0));
        assert_eq!(
            types(&chain),
            [EffectType::Delay, EffectType::Eq, EffectType::Reverb]
        );

        assert!(!chain.move_effect(7, 0));
    }

    #[test]
    fn test_insert_and_remove() {
        let mut chain = three_effects();
        chain.insert_effect(1, Effect::compressor()).unwrap();
        assert_eq!(chain.effect(1).map(Effect::effect_type), Some(EffectType::Compressor));

        let removed = chain.remove_effect(0).unwrap();
        assert_eq!(removed.effect_type(), EffectType::Delay);
        assert_eq!(chain.len(), 3);
        assert!(chain.remove_effect(3).is_none());
    }

    #[test]
    fn test_chain_is_bounded() {
        let mut chain = EffectChain::new();
        for _ in 0..MAX_EFFECTS_PER_CHAIN {
            chain.add_effect(Effect::eq()).unwrap();
        }
        assert!(chain.add_effect(Effect::delay()).is_err());
        assert_eq!(chain.len(), MAX_EFFECTS_PER_CHAIN);
    }

    #[test]
    fn test_disabled_chain_is_bypass() {
        let mut chain = EffectChain::new();
        let mut fx = Effect::compressor();
        fx.set_param(
            EffectParam::Compressor(crate::effect::CompressorParam::Makeup),
            12.0,
        );
        chain.add_effect(fx).unwrap();
        chain.prepare(48_000.0, 32).unwrap();
        chain.set_enabled(false);

        let mut block = StereoBlock::from_channels(vec![0.1; 32], vec![0.1; 32]);
        chain.process_block(&mut block);
        assert!(block.channel(0).iter().all(|&s| s == 0.1));
    }

    #[test]
    fn test_latency_sums_enabled_effects() {
        let mut chain = EffectChain::new();
        chain.add_effect(Effect::pitch_shift(3.0)).unwrap();
        chain.add_effect(Effect::delay()).unwrap();
        chain.add_effect(Effect::pitch_shift(-3.0)).unwrap();
        chain.prepare(48_000.0, 512).unwrap();
        assert_eq!(chain.latency_samples(), 4096);

        chain.effect_mut(2).unwrap().set_enabled(false);
        assert_eq!(chain.latency_samples(), 2048);

        // Fast mode has no look-ahead
        chain
            .effect_mut(0)
            .unwrap()
            .set_param(EffectParam::PitchShift(PitchParam::Quality), 0.0);
        assert_eq!(chain.latency_samples(), 0);
    }
}
