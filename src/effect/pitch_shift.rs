//! Pitch shifter as a chain effect.

use crate::buffer::StereoBlock;
use crate::error::ConfigResult;
use crate::pitch::{PitchShiftProcessor, QualityMode};
use crate::NUM_CHANNELS;

use super::Parameterized;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PitchParam {
    /// Shift in semitones (-24 - 24)
    Semitones,
    /// 0 = Fast, 1 = Balanced, 2 = High
    Quality,
    /// 1.0 = preserve formants
    Formant,
}

impl QualityMode {
    pub fn from_index(index: f32) -> Self {
        match index.round() as i32 {
            i32::MIN..=0 => QualityMode::Fast,
            1 => QualityMode::Balanced,
            _ => QualityMode::High,
        }
    }

    pub fn index(self) -> f32 {
        match self {
            QualityMode::Fast => 0.0,
            QualityMode::Balanced => 1.0,
            QualityMode::High => 2.0,
        }
    }
}

pub struct PitchShiftEffect {
    processor: PitchShiftProcessor,
    /// Copy of the block being shifted, sized at prepare
    scratch: Vec<f32>,
}

impl Default for PitchShiftEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchShiftEffect {
    pub fn new() -> Self {
        Self {
            processor: PitchShiftProcessor::new(),
            scratch: Vec::new(),
        }
    }

    pub fn with_semitones(semitones: f32) -> Self {
        let mut effect = Self::new();
        effect.processor.set_pitch_shift(semitones);
        effect
    }

    pub fn prepare(&mut self, sample_rate: f32, block_size: usize) -> ConfigResult<()> {
        self.processor.configure(sample_rate, block_size)?;
        self.scratch.clear();
        self.scratch.resize(block_size, 0.0);
        Ok(())
    }

    pub fn processor(&self) -> &PitchShiftProcessor {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut PitchShiftProcessor {
        &mut self.processor
    }

    pub fn latency_samples(&self) -> usize {
        self.processor.latency_samples()
    }

    /// Latency of the spectral modes, whichever mode is active.
    pub fn max_latency_samples(&self) -> usize {
        self.processor.fft_size()
    }

    /// Unprepared: passes audio through unchanged.
    pub fn process(&mut self, block: &mut StereoBlock) {
        let capacity = self.scratch.len();
        if capacity == 0 {
            return;
        }
        for ch in 0..NUM_CHANNELS {
            for chunk in block.channel_mut(ch).chunks_mut(capacity) {
                let scratch = &mut self.scratch[..chunk.len()];
                scratch.copy_from_slice(chunk);
                self.processor.process_channel(ch, scratch, chunk);
            }
        }
    }

    pub fn reset(&mut self) {
        self.processor.reset();
    }
}

impl Parameterized for PitchShiftEffect {
    type Param = PitchParam;

    fn params() -> &'static [PitchParam] {
        &[PitchParam::Semitones, PitchParam::Quality, PitchParam::Formant]
    }

    fn get_param(&self, param: PitchParam) -> f32 {
        match param {
            PitchParam::Semitones => self.processor.pitch_shift(),
            PitchParam::Quality => self.processor.quality_mode().index(),
            PitchParam::Formant => self.processor.formant_preservation() as u8 as f32,
        }
    }

    fn set_param(&mut self, param: PitchParam, value: f32) {
        match param {
            PitchParam::Semitones => self.processor.set_pitch_shift(value),
            PitchParam::Quality => self
                .processor
                .set_quality_mode(QualityMode::from_index(value)),
            PitchParam::Formant => self.processor.set_formant_preservation(value >= 0.5),
        }
    }
}
