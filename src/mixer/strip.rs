use crate::buffer::StereoBlock;
use crate::dsp::clamp_param;
use crate::io::midi::MidiSlice;
use crate::track::{Track, TrackId, MAX_VOLUME};

/// One mixer channel: a track plus its fader and buttons.
///
/// The fader sits after the track's own volume/pan, so a track can be
/// balanced inside its chain and then ridden on the desk independently.
pub struct ChannelStrip {
    track: Box<Track>,
    volume: f32,
    pan: f32,
    mute: bool,
    solo: bool,
    /// Resolved by the mixer whenever a button changes
    effective_mute: bool,
}

impl ChannelStrip {
    pub fn new(track: Box<Track>) -> Self {
        Self {
            track,
            volume: 1.0,
            pan: 0.0,
            mute: false,
            solo: false,
            effective_mute: false,
        }
    }

    /// Render the track and apply the fader into `scratch`.
    pub(crate) fn render(
        &mut self,
        input: &StereoBlock,
        scratch: &mut StereoBlock,
        midi: MidiSlice<'_>,
    ) {
        self.track.process_block(input, scratch, midi);
        scratch.apply_gain(self.volume);
        scratch.apply_pan(self.pan);
    }

    pub fn id(&self) -> TrackId {
        self.track.id()
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn track_mut(&mut self) -> &mut Track {
        &mut self.track
    }

    pub(crate) fn into_track(self) -> Box<Track> {
        self.track
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

    pub fn is_muted(&self) -> bool {
        self.mute
    }

    pub fn is_soloed(&self) -> bool {
        self.solo
    }

    pub fn is_effectively_muted(&self) -> bool {
        self.effective_mute
    }

    pub(crate) fn set_mute_flag(&mut self, mute: bool) {
        self.mute = mute;
    }

    pub(crate) fn set_solo_flag(&mut self, solo: bool) {
        self.solo = solo;
        self.track.set_soloed(solo);
    }

    pub(crate) fn resolve(&mut self, any_solo: bool) {
        self.effective_mute = if any_solo { !self.solo } else { self.mute };
    }
}
