use crate::buffer::StereoBlock;
use crate::dsp::clamp_param;
use crate::dsp::delay::DelayLine;
use crate::{DEFAULT_SAMPLE_RATE, NUM_CHANNELS};

use super::Parameterized;

/*
Delay Effect
============

Echo with feedback. One delay line per channel, each two seconds long at the
prepared sample rate.

    x ──┬───────────────── × dry ───────────┐
        │                                   ▼
        └──→ (+) ──→ [ delay line ] ──┬──→ × wet × mix ──→ (+) ──→ y
              ▲                       │
              └──── × feedback ───────┘

Per sample:

    delayed = line[read]
    y       = dry · x + wet · mix · delayed
    line[write] = x + feedback · delayed

Feedback tops out at 0.99 so the loop always decays.
*/

/// Longest delay the buffer is sized for.
pub const MAX_DELAY_MS: f32 = 2000.0;
pub const MIN_DELAY_MS: f32 = 1.0;
pub const MAX_FEEDBACK: f32 = 0.99;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelayParam {
    /// Delay time in ms (1 - 2000)
    Time,
    /// Feedback amount (0.0 - 0.99)
    Feedback,
    /// Echo blend (0.0 - 1.0)
    Mix,
    /// Level of the delayed signal (0.0 - 1.0)
    WetLevel,
    /// Level of the direct signal (0.0 - 1.0)
    DryLevel,
}

#[derive(Debug, Clone)]
pub struct DelayEffect {
    lines: [DelayLine; NUM_CHANNELS],
    sample_rate: f32,
    delay_ms: f32,
    feedback: f32,
    mix: f32,
    wet_level: f32,
    dry_level: f32,
}

impl Default for DelayEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayEffect {
    /// 500 ms, 0.3 feedback, half-mixed echoes over a full-level dry signal.
    pub fn new() -> Self {
        let mut delay = Self {
            lines: Default::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            delay_ms: 500.0,
            feedback: 0.3,
            mix: 0.5,
            wet_level: 0.5,
            dry_level: 1.0,
        };
        delay.allocate(DEFAULT_SAMPLE_RATE);
        delay
    }

    pub fn prepare(&mut self, sample_rate: f32) {
        self.allocate(sample_rate);
    }

    fn allocate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        let len = buffer_len(sample_rate);
        for line in &mut self.lines {
            line.allocate(len);
        }
        self.update_delay();
    }

    fn update_delay(&mut self) {
        let samples = (self.delay_ms * self.sample_rate / 1000.0).ceil() as usize;
        for line in &mut self.lines {
            line.set_delay(samples);
        }
    }

    pub fn set_delay_time(&mut self, ms: f32) {
        self.delay_ms = clamp_param(ms, MIN_DELAY_MS, MAX_DELAY_MS, self.delay_ms);
        self.update_delay();
    }

    pub fn delay_time(&self) -> f32 {
        self.delay_ms
    }

    /// Delay in samples after clamping to the buffer.
    pub fn delay_samples(&self) -> usize {
        self.lines[0].delay_samples()
    }

    pub fn buffer_len(&self) -> usize {
        self.lines[0].len()
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = clamp_param(feedback, 0.0, MAX_FEEDBACK, self.feedback);
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = clamp_param(mix, 0.0, 1.0, self.mix);
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    pub fn set_wet_level(&mut self, level: f32) {
        self.wet_level = clamp_param(level, 0.0, 1.0, self.wet_level);
    }

    pub fn wet_level(&self) -> f32 {
        self.wet_level
    }

    pub fn set_dry_level(&mut self, level: f32) {
        self.dry_level = clamp_param(level, 0.0, 1.0, self.dry_level);
    }

    pub fn dry_level(&self) -> f32 {
        self.dry_level
    }

    pub fn process(&mut self, block: &mut StereoBlock) {
        let wet = self.wet_level * self.mix;
        for (ch, line) in self.lines.iter_mut().enumerate() {
            for sample in block.channel_mut(ch) {
                let x = *sample;
                let delayed = line.read();
                *sample = self.dry_level * x + wet * delayed;
                line.write_and_advance(x + self.feedback * delayed);
            }
        }
    }

    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
    }

    /// Read index of a channel's line, for inspection.
    pub fn read_index(&self, channel: usize) -> usize {
        self.lines[channel].read_pos()
    }

    pub fn write_index(&self, channel: usize) -> usize {
        self.lines[channel].write_pos()
    }
}

/// Two seconds of samples, rounded up.
fn buffer_len(sample_rate: f32) -> usize {
    (sample_rate * 2.0).ceil() as usize
}

impl Parameterized for DelayEffect {
    type Param = DelayParam;

    fn params() -> &'static [DelayParam] {
        &[
            DelayParam::Time,
            DelayParam::Feedback,
            DelayParam::Mix,
            DelayParam::WetLevel,
            DelayParam::DryLevel,
        ]
    }

    fn get_param(&self, param: DelayParam) -> f32 {
        match param {
            DelayParam::Time => self.delay_ms,
            DelayParam::Feedback => self.feedback,
            DelayParam::Mix => self.mix,
            DelayParam::WetLevel => self.wet_level,
            DelayParam::DryLevel => self.dry_level,
        }
    }

    fn set_param(&mut self, param: DelayParam, value: f32) {
        match param {
            DelayParam::Time => self.set_delay_time(value),
            DelayParam::Feedback => self.set_feedback(value),
            DelayParam::Mix => self.set_mix(value),
            DelayParam::WetLevel => self.set_wet_level(value),
            DelayParam::DryLevel => self.set_dry_level(value),
        }
    }
}
