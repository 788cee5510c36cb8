use crate::buffer::StereoBlock;
use crate::dsp::clamp_param;
use crate::dsp::reverb::{ReverbSettings, StereoReverb};
use crate::DEFAULT_SAMPLE_RATE;

use super::Parameterized;

/*
Reverb Effect
=============

Simulates the acoustic reflections of a physical space. Reverb adds depth,
dimension, and "glue" to sounds, making them feel like they exist in a room.

Parameters
----------

Room Size (0.0 - 1.0):
  How large the virtual space feels.
  0.0 = small room, 1.0 = large hall

Damping (0.0 - 1.0):
  High-frequency absorption. Higher values = darker, more natural decay.
  0.0 = bright, metallic    1.0 = dark, muffled

Wet / Dry (0.0 - 1.0):
  Independent levels for the tail and the direct signal.

Width (0.0 - 1.0):
  Stereo spread of the tail. 0.0 = mono, 1.0 = fully decorrelated.

Parameters are pushed into the network at the top of every block, so a
change lands at the next block boundary.
*/

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReverbParam {
    /// Room size (0.0 = small, 1.0 = large)
    RoomSize,
    /// High-frequency damping (0.0 = bright, 1.0 = dark)
    Damping,
    /// Tail level (0.0 - 1.0)
    WetLevel,
    /// Direct signal level (0.0 - 1.0)
    DryLevel,
    /// Stereo width (0.0 = mono, 1.0 = wide)
    Width,
}

#[derive(Debug, Clone)]
pub struct ReverbEffect {
    reverb: StereoReverb,
    settings: ReverbSettings,
    sample_rate: f32,
}

impl Default for ReverbEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl ReverbEffect {
    pub fn new() -> Self {
        Self {
            reverb: StereoReverb::new(DEFAULT_SAMPLE_RATE),
            settings: ReverbSettings::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Create with explicit room size, damping and wet level.
    pub fn with_room(room_size: f32, damping: f32, wet: f32) -> Self {
        let mut reverb = Self::new();
        reverb.set_room_size(room_size);
        reverb.set_damping(damping);
        reverb.set_wet_level(wet);
        reverb
    }

    /// Create a small room reverb (short, tight)
    pub fn room(wet: f32) -> Self {
        Self::with_room(0.3, 0.5, wet)
    }

    /// Create a medium hall reverb (balanced)
    pub fn hall(wet: f32) -> Self {
        Self::with_room(0.6, 0.4, wet)
    }

    /// Create a large plate reverb (long, smooth)
    pub fn plate(wet: f32) -> Self {
        Self::with_room(0.85, 0.3, wet)
    }

    /// Rebuild the delay network when the sample rate changes.
    pub fn prepare(&mut self, sample_rate: f32) {
        if sample_rate != self.sample_rate {
            self.reverb = StereoReverb::new(sample_rate);
            self.sample_rate = sample_rate;
        }
        self.reverb.reset();
    }

    pub fn settings(&self) -> ReverbSettings {
        self.settings
    }

    pub fn set_room_size(&mut self, size: f32) {
        self.settings.room_size = clamp_param(size, 0.0, 1.0, self.settings.room_size);
    }

    pub fn set_damping(&mut self, damping: f32) {
        self.settings.damping = clamp_param(damping, 0.0, 1.0, self.settings.damping);
    }

    pub fn set_wet_level(&mut self, wet: f32) {
        self.settings.wet = clamp_param(wet, 0.0, 1.0, self.settings.wet);
    }

    pub fn set_dry_level(&mut self, dry: f32) {
        self.settings.dry = clamp_param(dry, 0.0, 1.0, self.settings.dry);
    }

    pub fn set_width(&mut self, width: f32) {
        self.settings.width = clamp_param(width, 0.0, 1.0, self.settings.width);
    }

    pub fn process(&mut self, block: &mut StereoBlock) {
        self.reverb.apply(&self.settings);
        let (left, right) = block.split_mut();
        self.reverb.process(left, right);
    }

    pub fn reset(&mut self) {
        self.reverb.reset();
    }
}

impl Parameterized for ReverbEffect {
    type Param = ReverbParam;

    fn params() -> &'static [ReverbParam] {
        &[
            ReverbParam::RoomSize,
            ReverbParam::Damping,
            ReverbParam::WetLevel,
            ReverbParam::DryLevel,
            ReverbParam::Width,
        ]
    }

    fn get_param(&self, param: ReverbParam) -> f32 {
        match param {
            ReverbParam::RoomSize => self.settings.room_size,
            ReverbParam::Damping => self.settings.damping,
            ReverbParam::WetLevel => self.settings.wet,
            ReverbParam::DryLevel => self.settings.dry,
            ReverbParam::Width => self.settings.width,
        }
    }

    fn set_param(&mut self, param: ReverbParam, value: f32) {
        match param {
            ReverbParam::RoomSize => self.set_room_size(value),
            ReverbParam::Damping => self.set_damping(value),
            ReverbParam::WetLevel => self.set_wet_level(value),
            ReverbParam::DryLevel => self.set_dry_level(value),
            ReverbParam::Width => self.set_width(value),
        }
    }
}
