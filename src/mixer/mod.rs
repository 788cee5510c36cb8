//! Mixer - channel strips summed into a master bus
//!
//! ```text
//!   strip 0: track ─► fader ─┐
//!   strip 1: track ─► fader ─┼─► Σ ─► master gain/pan ─► meters ─► out
//!   strip n: track ─► fader ─┘
//! ```
//!
//! Solo and mute are resolved whenever a button or the channel list changes,
//! never while rendering. If anything is soloed exactly the soloed strips play,
//! whatever their own mute says; otherwise each strip follows its mute.

pub mod master;
pub mod strip;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::buffer::StereoBlock;
use crate::config::validate_spec;
use crate::error::ConfigResult;
use crate::io::midi::MidiSlice;
use crate::track::{Track, TrackId, TrackSnapshot};
use crate::DEFAULT_SAMPLE_RATE;

pub use master::MasterBus;
pub use strip::ChannelStrip;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StripSnapshot {
    pub track: TrackSnapshot,
    pub volume: f32,
    pub pan: f32,
    pub mute: bool,
    pub solo: bool,
    pub effective_mute: bool,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MixerSnapshot {
    pub master_volume: f32,
    pub master_pan: f32,
    pub strips: Vec<StripSnapshot>,
}

pub struct Mixer {
    strips: Vec<ChannelStrip>,
    max_channels: usize,
    /// Per-strip render target, reused for every strip
    scratch: StereoBlock,
    master: MasterBus,
    sample_rate: f32,
}

impl Mixer {
    pub fn new(max_channels: usize) -> Self {
        Self {
            strips: Vec::with_capacity(max_channels),
            max_channels,
            scratch: StereoBlock::default(),
            master: MasterBus::new(),
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Prepare every track and size the scratch block.
    pub fn prepare(&mut self, sample_rate: f32, block_size: usize) -> ConfigResult<()> {
        validate_spec(sample_rate, block_size)?;
        for strip in &mut self.strips {
            strip.track_mut().prepare(sample_rate, block_size)?;
        }
        self.scratch.allocate(block_size);
        self.master.prepare(sample_rate);
        self.sample_rate = sample_rate;
        Ok(())
    }

    pub fn reset(&mut self) {
        for strip in &mut self.strips {
            strip.track_mut().reset();
        }
        self.master.reset();
    }

    /// Render every audible strip and sum into `out`, then run the master bus.
    ///
    /// `out.len()` sets the frame count and must not exceed the prepared
    /// block size. `midi` offsets are relative to the start of `out`.
    pub fn render(&mut self, input: &StereoBlock, midi: MidiSlice<'_>, out: &mut StereoBlock) {
        out.clear();
        let frames = out.len().min(self.scratch.capacity());
        self.scratch.set_len(frames);

        for strip in self.strips.iter_mut().filter(|s| !s.is_effectively_muted()) {
            strip.render(input, &mut self.scratch, midi);
            out.add_from(&self.scratch);
        }

        self.master.process(out);
    }

    /// Add a channel. Hands the track back if the mixer is full or the id is taken.
    pub fn add_channel(&mut self, track: Box<Track>) -> Result<(), Box<Track>> {
        if self.strips.len() >= self.max_channels || self.index_of(track.id()).is_some() {
            return Err(track);
        }
        self.strips.push(ChannelStrip::new(track));
        self.resolve_solo_mute();
        Ok(())
    }

    pub fn remove_channel(&mut self, id: TrackId) -> Option<Box<Track>> {
        let index = self.index_of(id)?;
        let strip = self.strips.remove(index);
        self.resolve_solo_mute();
        Some(strip.into_track())
    }

    pub fn set_mute(&mut self, id: TrackId, mute: bool) -> bool {
        let Some(strip) = self.strip_mut(id) else {
            return false;
        };
        strip.set_mute_flag(mute);
        self.resolve_solo_mute();
        true
    }

    pub fn set_solo(&mut self, id: TrackId, solo: bool) -> bool {
        let Some(strip) = self.strip_mut(id) else {
            return false;
        };
        strip.set_solo_flag(solo);
        self.resolve_solo_mute();
        true
    }

    fn resolve_solo_mute(&mut self) {
        let any_solo = self.strips.iter().any(ChannelStrip::is_soloed);
        for strip in &mut self.strips {
            strip.resolve(any_solo);
        }
    }

    fn index_of(&self, id: TrackId) -> Option<usize> {
        self.strips.iter().position(|s| s.id() == id)
    }

    pub fn strip(&self, id: TrackId) -> Option<&ChannelStrip> {
        self.strips.iter().find(|s| s.id() == id)
    }

    /// Fader access. Use [`Mixer::set_mute`]/[`Mixer::set_solo`] for the buttons.
    pub fn strip_mut(&mut self, id: TrackId) -> Option<&mut ChannelStrip> {
        self.strips.iter_mut().find(|s| s.id() == id)
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.strip(id).map(ChannelStrip::track)
    }

    pub fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.strip_mut(id).map(ChannelStrip::track_mut)
    }

    pub fn strips(&self) -> &[ChannelStrip] {
        &self.strips
    }

    pub fn len(&self) -> usize {
        self.strips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strips.is_empty()
    }

    pub fn max_channels(&self) -> usize {
        self.max_channels
    }

    pub fn master(&self) -> &MasterBus {
        &self.master
    }

    pub fn master_mut(&mut self) -> &mut MasterBus {
        &mut self.master
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn snapshot(&self) -> MixerSnapshot {
        MixerSnapshot {
            master_volume: self.master.volume(),
            master_pan: self.master.pan(),
            strips: self
                .strips
                .iter()
                .map(|s| StripSnapshot {
                    track: s.track().snapshot(),
                    volume: s.volume(),
                    pan: s.pan(),
                    mute: s.is_muted(),
                    solo: s.is_soloed(),
                    effective_mute: s.is_effectively_muted(),
                })
                .collect(),
        }
    }
}
