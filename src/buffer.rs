//! Fixed-capacity stereo sample block.
//!
//! Storage is allocated by [`StereoBlock::allocate`] during prepare and never
//! again. The active length can shrink per call (devices may hand us short
//! callbacks) without touching the allocation.

use crate::dsp::mix::{equal_gain_pan, sum_in_place};
use crate::NUM_CHANNELS;

#[derive(Debug, Clone, Default)]
pub struct StereoBlock {
    channels: [Vec<f32>; NUM_CHANNELS],
    len: usize,
}

impl StereoBlock {
    /// Allocate a zeroed block with `capacity` frames, all active.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: [vec![0.0; capacity], vec![0.0; capacity]],
            len: capacity,
        }
    }

    /// Build a block from two channels of equal length.
    pub fn from_channels(left: Vec<f32>, right: Vec<f32>) -> Self {
        assert_eq!(left.len(), right.len(), "channel lengths differ");
        let len = left.len();
        Self {
            channels: [left, right],
            len,
        }
    }

    /// Reallocate to a new capacity. Only call from prepare.
    pub fn allocate(&mut self, capacity: usize) {
        for channel in &mut self.channels {
            channel.clear();
            channel.resize(capacity, 0.0);
        }
        self.len = capacity;
    }

    pub fn capacity(&self) -> usize {
        self.channels[0].len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Change the active length. Clamped to capacity, never allocates.
    pub fn set_len(&mut self, len: usize) {
        self.len = len.min(self.capacity());
    }

    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.channels[channel][..self.len]
    }

    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        &mut self.channels[channel][..self.len]
    }

    /// Both channels mutably at once.
    pub fn split_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        let len = self.len;
        let [left, right] = &mut self.channels;
        (&mut left[..len], &mut right[..len])
    }

    pub fn clear(&mut self) {
        for ch in 0..NUM_CHANNELS {
            self.channel_mut(ch).fill(0.0);
        }
    }

    /// Copy `other` into this block, adopting its length.
    pub fn copy_from(&mut self, other: &StereoBlock) {
        self.set_len(other.len());
        let len = self.len;
        for ch in 0..NUM_CHANNELS {
            self.channels[ch][..len].copy_from_slice(&other.channel(ch)[..len]);
        }
    }

    /// Sum `other` into this block over the shared length.
    pub fn add_from(&mut self, other: &StereoBlock) {
        let len = self.len.min(other.len());
        for ch in 0..NUM_CHANNELS {
            sum_in_place(&mut self.channels[ch][..len], &other.channel(ch)[..len]);
        }
    }

    pub fn apply_gain(&mut self, gain: f32) {
        if gain == 1.0 {
            return;
        }
        for ch in 0..NUM_CHANNELS {
            for sample in self.channel_mut(ch) {
                *sample *= gain;
            }
        }
    }

    /// Equal-gain pan: the side being panned away from is attenuated linearly.
    pub fn apply_pan(&mut self, pan: f32) {
        if pan == 0.0 {
            return;
        }
        let (left_gain, right_gain) = equal_gain_pan(pan);
        let (left, right) = self.split_mut();
        left.iter_mut().for_each(|s| *s *= left_gain);
        right.iter_mut().for_each(|s| *s *= right_gain);
    }

    pub fn is_silent(&self) -> bool {
        (0..NUM_CHANNELS).all(|ch| self.channel(ch).iter().all(|&s| s == 0.0))
    }

    /// Largest absolute sample across both channels.
    pub fn peak(&self) -> f32 {
        (0..NUM_CHANNELS)
            .flat_map(|ch| self.channel(ch).iter())
            .fold(0.0f32, |acc, &s| acc.max(s.abs()))
    }

    /// De-interleave stereo frames into this block. Missing input reads as silence.
    pub fn read_interleaved(&mut self, interleaved: &[f32]) {
        let len = self.len;
        let [left, right] = &mut self.channels;
        for i in 0..len {
            left[i] = interleaved.get(i * 2).copied().unwrap_or(0.0);
            right[i] = interleaved.get(i * 2 + 1).copied().unwrap_or(0.0);
        }
    }

    /// Interleave the active frames into `out` (`out.len() >= 2 * len`).
    pub fn write_interleaved(&self, out: &mut [f32]) {
        let (left, right) = (self.channel(0), self.channel(1));
        for (frame, (&l, &r)) in out.chunks_exact_mut(2).zip(left.iter().zip(right)) {
            frame[0] = l;
            frame[1] = r;
        }
    }
}
