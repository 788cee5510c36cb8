//! Master bus: final gain, pan and metering.

use crate::buffer::StereoBlock;
use crate::dsp::clamp_param;
use crate::dsp::meter::LevelMeter;
use crate::track::MAX_VOLUME;
use crate::{DEFAULT_SAMPLE_RATE, NUM_CHANNELS};

#[derive(Debug, Clone)]
pub struct MasterBus {
    volume: f32,
    pan: f32,
    meters: [LevelMeter; NUM_CHANNELS],
}

impl Default for MasterBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MasterBus {
    pub fn new() -> Self {
        Self {
            volume: 1.0,
            pan: 0.0,
            meters: [LevelMeter::new(DEFAULT_SAMPLE_RATE); NUM_CHANNELS],
        }
    }

    pub fn prepare(&mut self, sample_rate: f32) {
        for meter in &mut self.meters {
            meter.prepare(sample_rate);
        }
    }

    /// Gain, pan, then meter what actually leaves the bus.
    pub fn process(&mut self, block: &mut StereoBlock) {
        block.apply_gain(self.volume);
        block.apply_pan(self.pan);
        for (ch, meter) in self.meters.iter_mut().enumerate() {
            meter.process(block.channel(ch));
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_param(volume, 0.0, MAX_VOLUME, self.volume);
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan = clamp_param(pan, -1.0, 1.0, self.pan);
    }

    pub fn peak(&self, channel: usize) -> f32 {
        self.meters[channel].peak()
    }

    pub fn rms(&self, channel: usize) -> f32 {
        self.meters[channel].rms()
    }

    pub fn reset(&mut self) {
        for meter in &mut self.meters {
            meter.reset();
        }
    }
}
