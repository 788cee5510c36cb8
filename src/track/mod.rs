//! Track - one source, one effect chain, one optional recorder
//!
//! Per block:
//!
//! ```text
//!   source ──► effect chain ──► volume ──► pan ──► output
//!                                                    └──► recorder (while recording)
//! ```
//!
//! A muted track does no work at all: the output is cleared and nothing
//! upstream runs, so effect tails freeze rather than ring out while muted.

pub mod recorder;
pub mod source;

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::buffer::StereoBlock;
use crate::config::validate_spec;
use crate::dsp::clamp_param;
use crate::effect::{EffectChain, EffectSnapshot};
use crate::error::ConfigResult;
use crate::io::midi::MidiSlice;
use crate::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE};

pub use recorder::{start_recorder, BlockWriter, MemoryWriter, RecorderSink, RecordingHandle};
pub use source::{MidiVoice, ToneSource, TrackSource};

pub const MAX_VOLUME: f32 = 2.0;

/// Stable identity of a track within one engine.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackType {
    #[default]
    Audio,
    Midi,
}

/// Persistable view of a track.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSnapshot {
    pub id: TrackId,
    pub name: String,
    pub track_type: TrackType,
    pub volume: f32,
    pub pan: f32,
    pub muted: bool,
    pub soloed: bool,
    pub armed: bool,
    pub chain_enabled: bool,
    pub latency_samples: usize,
    pub effects: Vec<EffectSnapshot>,
}

pub struct Track {
    id: TrackId,
    name: String,
    track_type: TrackType,
    volume: f32,
    pan: f32,
    muted: bool,
    soloed: bool,
    armed: bool,
    source: TrackSource,
    chain: EffectChain,
    recorder: Option<Box<RecorderSink>>,
    sample_rate: f32,
    block_size: usize,
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("track_type", &self.track_type)
            .finish_non_exhaustive()
    }
}

impl Track {
    /// Audio tracks default to passing the engine input through; MIDI tracks
    /// get a sine voice.
    pub fn new(id: TrackId, name: impl Into<String>, track_type: TrackType) -> Self {
        let source = match track_type {
            TrackType::Audio => TrackSource::Input,
            TrackType::Midi => TrackSource::midi(),
        };
        Self::with_source(id, name, track_type, source)
    }

    pub fn with_source(
        id: TrackId,
        name: impl Into<String>,
        track_type: TrackType,
        source: TrackSource,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            track_type,
            volume: 1.0,
            pan: 0.0,
            muted: false,
            soloed: false,
            armed: false,
            source,
            chain: EffectChain::new(),
            recorder: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn prepare(&mut self, sample_rate: f32, block_size: usize) -> ConfigResult<()> {
        validate_spec(sample_rate, block_size)?;
        self.chain.prepare(sample_rate, block_size)?;
        self.sample_rate = sample_rate;
        self.block_size = block_size;
        self.reset();
        Ok(())
    }

    pub fn reset(&mut self) {
        self.source.reset();
        self.chain.reset();
    }

    /// Render one block into `output` (its active length decides the frame count).
    pub fn process_block(
        &mut self,
        input: &StereoBlock,
        output: &mut StereoBlock,
        midi: MidiSlice<'_>,
    ) {
        if self.muted {
            output.clear();
            return;
        }

        self.source.render(input, output, midi, self.sample_rate);
        self.chain.process_block(output);
        output.apply_gain(self.volume);
        output.apply_pan(self.pan);

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.push(output);
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn track_type(&self) -> TrackType {
        self.track_type
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
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_soloed(&self) -> bool {
        self.soloed
    }

    pub fn set_soloed(&mut self, soloed: bool) {
        self.soloed = soloed;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn set_armed(&mut self, armed: bool) {
        self.armed = armed;
    }

    pub fn source(&self) -> &TrackSource {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut TrackSource {
        &mut self.source
    }

    /// Swap the source, returning the old one.
    pub fn replace_source(&mut self, source: TrackSource) -> TrackSource {
        std::mem::replace(&mut self.source, source)
    }

    pub fn chain(&self) -> &EffectChain {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut EffectChain {
        &mut self.chain
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn latency_samples(&self) -> usize {
        self.chain.latency_samples()
    }

    pub fn latency_seconds(&self) -> f32 {
        self.latency_samples() as f32 / self.sample_rate
    }

    /// Attach a recorder sink, returning any previous one.
    pub fn start_recording(&mut self, sink: Box<RecorderSink>) -> Option<Box<RecorderSink>> {
        self.recorder.replace(sink)
    }

    /// Detach the recorder. Dropping the returned sink ends the recording.
    pub fn stop_recording(&mut self) -> Option<Box<RecorderSink>> {
        self.recorder.take()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            id: self.id,
            name: self.name.clone(),
            track_type: self.track_type,
            volume: self.volume,
            pan: self.pan,
            muted: self.muted,
            soloed: self.soloed,
            armed: self.armed,
            chain_enabled: self.chain.is_enabled(),
            latency_samples: self.latency_samples(),
            effects: self.chain.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Effect;

    fn tone_track() -> Track {
        let mut track = Track::with_source(
            TrackId(1),
            "tone",
            TrackType::Audio,
            TrackSource::tone(440.0, 0.5),
        );
        track.prepare(48_000.0, 256).unwrap();
        track
    }

    fn render(track: &mut Track) -> StereoBlock {
        let input = StereoBlock::new(256);
        let mut output = StereoBlock::new(256);
        track.process_block(&input, &mut output, MidiSlice::empty());
        output
    }

    #[test]
    fn test_muted_track_is_silent_whatever_the_chain() {
        let mut track = tone_track();
        track.chain_mut().add_effect(Effect::reverb()).unwrap();
        track.chain_mut().add_effect(Effect::delay()).unwrap();
        track.prepare(48_000.0, 256).unwrap();

        // Fill the tails first
        render(&mut track);
        track.set_muted(true);

        let input = StereoBlock::from_channels(vec![1.0; 256], vec![1.0; 256]);
        let mut output = StereoBlock::from_channels(vec![0.7; 256], vec![0.7; 256]);
        track.process_block(&input, &mut output, MidiSlice::empty());
        assert!(output.is_silent());
    }

    #[test]
    fn test_volume_then_pan() {
        let mut track = tone_track();
        let reference = render(&mut tone_track());

        track.set_volume(0.5);
        track.set_pan(0.5);
        let out = render(&mut track);
        for i in 0..256 {
            assert!((out.channel(0)[i] - reference.channel(0)[i] * 0.25).abs() < 1e-6);
            assert!((out.channel(1)[i] - reference.channel(1)[i] * 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_setters_clamp() {
        let mut track = Track::new(TrackId(7), "vox", TrackType::Audio);
        track.set_volume(5.0);
        track.set_pan(-3.0);
        assert_eq!(track.volume(), MAX_VOLUME);
        assert_eq!(track.pan(), -1.0);
    }

    #[test]
    fn test_nan_volume_and_pan_are_ignored() {
        let mut track = tone_track();
        track.set_volume(0.5);
        track.set_volume(f32::NAN);
        track.set_pan(f32::NAN);
        assert_eq!(track.volume(), 0.5);
        assert_eq!(track.pan(), 0.0);

        let out = render(&mut track);
        assert!(out.channel(0).iter().chain(out.channel(1)).all(|s| s.is_finite()));
        assert!(out.channel(0).iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn test_recorder_receives_final_block() {
        let mut track = tone_track();
        track.set_volume(0.5);
        let (sink, handle) = start_recorder(MemoryWriter::default(), 4096).unwrap();
        assert!(track.start_recording(Box::new(sink)).is_none());
        assert!(track.is_recording());

        let out = render(&mut track);
        drop(track.stop_recording());

        let writer = handle.join().unwrap();
        assert_eq!(writer.left, out.channel(0));
        assert_eq!(writer.right, out.channel(1));
    }

    #[test]
    fn test_latency_follows_chain() {
        let mut track = tone_track();
        track.chain_mut().add_effect(Effect::pitch_shift(7.0)).unwrap();
        track.prepare(48_000.0, 256).unwrap();
        assert_eq!(track.latency_samples(), 2048);
        assert!((track.latency_seconds() - 2048.0 / 48_000.0).abs() < 1e-7);
    }

    #[test]
    fn test_snapshot_captures_fields() {
        let mut track = tone_track();
        track.set_armed(true);
        track.set_soloed(true);
        track.chain_mut().add_effect(Effect::eq()).unwrap();

        let snapshot = track.snapshot();
        assert_eq!(snapshot.id, TrackId(1));
        assert_eq!(snapshot.name, "tone");
        assert!(snapshot.armed && snapshot.soloed);
        assert_eq!(snapshot.effects.len(), 1);
        assert_eq!(TrackId(3).to_string(), "#3");
    }
}
