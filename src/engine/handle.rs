//! Control-thread side of the engine.

use std::sync::Arc;

use rtrb::{Consumer, Producer};

use crate::config::EngineConfig;
use crate::effect::{Effect, EffectParam, MAX_EFFECTS_PER_CHAIN};
use crate::error::{EngineError, EngineResult};
use crate::io::midi::TimedMidiEvent;
use crate::track::{
    start_recorder, BlockWriter, RecordingHandle, Track, TrackId, TrackSource, TrackType,
};

use super::command::{EngineCommand, Garbage, MeterSnapshot};
use super::EngineShared;

/// Seconds of audio a recording may buffer before blocks are dropped.
const RECORDER_BUFFER_SECONDS: f32 = 2.0;

/// What the handle knows about a track it has created.
#[derive(Debug, Clone)]
struct TrackEntry {
    id: TrackId,
    effects: usize,
    recording: bool,
}

/// Sends commands to an [`AudioEngine`](super::AudioEngine) and collects what
/// it hands back.
///
/// Every method validates against the handle's own mirror first, so a bad id
/// is an error here instead of a silent no-op on the audio thread. Heavy
/// objects are built and prepared here before they are sent.
pub struct EngineHandle {
    commands: Producer<EngineCommand>,
    garbage: Consumer<Garbage>,
    meters: Consumer<MeterSnapshot>,
    midi: Producer<TimedMidiEvent>,
    shared: Arc<EngineShared>,
    tracks: Vec<TrackEntry>,
    next_id: u32,
    max_tracks: usize,
    latest_meters: Option<MeterSnapshot>,
}

impl EngineHandle {
    pub(super) fn new(
        commands: Producer<EngineCommand>,
        garbage: Consumer<Garbage>,
        meters: Consumer<MeterSnapshot>,
        midi: Producer<TimedMidiEvent>,
        shared: Arc<EngineShared>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            commands,
            garbage,
            meters,
            midi,
            shared,
            tracks: Vec::with_capacity(config.max_tracks),
            next_id: 1,
            max_tracks: config.max_tracks,
            latest_meters: None,
        }
    }

    fn send(&mut self, command: EngineCommand) -> EngineResult<()> {
        self.commands
            .push(command)
            .map_err(|_| EngineError::QueueFull)
    }

    fn entry(&self, id: TrackId) -> EngineResult<&TrackEntry> {
        self.tracks
            .iter()
            .find(|t| t.id == id)
            .ok_or(EngineError::UnknownTrack(id))
    }

    fn entry_mut(&mut self, id: TrackId) -> EngineResult<&mut TrackEntry> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(EngineError::UnknownTrack(id))
    }

    fn check_effect(&self, track: TrackId, index: usize) -> EngineResult<()> {
        if index < self.entry(track)?.effects {
            Ok(())
        } else {
            Err(EngineError::UnknownEffect { track, index })
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.shared.sample_rate()
    }

    pub fn block_size(&self) -> usize {
        self.shared.block_size()
    }

    pub fn is_prepared(&self) -> bool {
        self.shared.is_prepared()
    }

    pub fn track_ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks.iter().map(|t| t.id)
    }

    pub fn has_track(&self, id: TrackId) -> bool {
        self.entry(id).is_ok()
    }

    pub fn effect_count(&self, id: TrackId) -> EngineResult<usize> {
        Ok(self.entry(id)?.effects)
    }

    // ─────────────────────────────────────────────────────────────
    // Tracks
    // ─────────────────────────────────────────────────────────────

    /// Create, prepare and send a new track. It joins the mix at the next block.
    pub fn add_track(
        &mut self,
        name: impl Into<String>,
        track_type: TrackType,
        source: TrackSource,
    ) -> EngineResult<TrackId> {
        if self.tracks.len() >= self.max_tracks {
            return Err(EngineError::TooManyTracks(self.max_tracks));
        }

        let id = TrackId(self.next_id);
        let mut track = Track::with_source(id, name, track_type, source);
        track.prepare(self.sample_rate(), self.block_size())?;
        let name = track.name().to_owned();

        self.send(EngineCommand::AddTrack(Box::new(track)))?;
        self.next_id += 1;
        self.tracks.push(TrackEntry {
            id,
            effects: 0,
            recording: false,
        });
        log::info!("Added track {} '{}'", id, name);
        Ok(id)
    }

    pub fn remove_track(&mut self, id: TrackId) -> EngineResult<()> {
        self.entry(id)?;
        self.send(EngineCommand::RemoveTrack(id))?;
        self.tracks.retain(|t| t.id != id);
        log::info!("Removed track {}", id);
        Ok(())
    }

    pub fn set_source(&mut self, track: TrackId, source: TrackSource) -> EngineResult<()> {
        self.entry(track)?;
        self.send(EngineCommand::SetSource {
            track,
            source: Box::new(source),
        })
    }

    pub fn set_track_volume(&mut self, track: TrackId, volume: f32) -> EngineResult<()> {
        self.entry(track)?;
        self.send(EngineCommand::SetTrackVolume { track, volume })
    }

    pub fn set_track_pan(&mut self, track: TrackId, pan: f32) -> EngineResult<()> {
        self.entry(track)?;
        self.send(EngineCommand::SetTrackPan { track, pan })
    }

    pub fn set_track_muted(&mut self, track: TrackId, muted: bool) -> EngineResult<()> {
        self.entry(track)?;
        self.send(EngineCommand::SetTrackMuted { track, muted })
    }

    pub fn set_track_armed(&mut self, track: TrackId, armed: bool) -> EngineResult<()> {
        self.entry(track)?;
        self.send(EngineCommand::SetTrackArmed { track, armed })
    }

    // ─────────────────────────────────────────────────────────────
    // Effects
    // ─────────────────────────────────────────────────────────────

    /// Prepare `effect` for the current device settings and append it.
    /// Returns its index in the chain.
    pub fn add_effect(&mut self, track: TrackId, effect: Effect) -> EngineResult<usize> {
        let index = self.entry(track)?.effects;
        self.send_effect(track, None, effect)?;
        Ok(index)
    }

    /// Prepare `effect` and insert it at `index` (clamped to the chain end).
    pub fn insert_effect(
        &mut self,
        track: TrackId,
        index: usize,
        effect: Effect,
    ) -> EngineResult<usize> {
        let index = index.min(self.entry(track)?.effects);
        self.send_effect(track, Some(index), effect)?;
        Ok(index)
    }

    fn send_effect(
        &mut self,
        track: TrackId,
        index: Option<usize>,
        mut effect: Effect,
    ) -> EngineResult<()> {
        if self.entry(track)?.effects >= MAX_EFFECTS_PER_CHAIN {
            return Err(EngineError::ChainFull(track));
        }
        effect.prepare(self.sample_rate(), self.block_size())?;
        let name = effect.name();
        let effect = Box::new(effect);

        self.send(match index {
            Some(index) => EngineCommand::InsertEffect {
                track,
                index,
                effect,
            },
            None => EngineCommand::AddEffect { track, effect },
        })?;
        self.entry_mut(track)?.effects += 1;
        log::debug!("Added {} to track {}", name, track);
        Ok(())
    }

    pub fn remove_effect(&mut self, track: TrackId, index: usize) -> EngineResult<()> {
        self.check_effect(track, index)?;
        self.send(EngineCommand::RemoveEffect { track, index })?;
        self.entry_mut(track)?.effects -= 1;
        Ok(())
    }

    pub fn move_effect(&mut self, track: TrackId, from: usize, to: usize) -> EngineResult<()> {
        self.check_effect(track, from)?;
        self.send(EngineCommand::MoveEffect { track, from, to })
    }

    pub fn set_effect_param(
        &mut self,
        track: TrackId,
        index: usize,
        param: EffectParam,
        value: f32,
    ) -> EngineResult<()> {
        self.check_effect(track, index)?;
        self.send(EngineCommand::SetEffectParam {
            track,
            index,
            param,
            value,
        })
    }

    pub fn set_effect_enabled(
        &mut self,
        track: TrackId,
        index: usize,
        enabled: bool,
    ) -> EngineResult<()> {
        let value = if enabled { 1.0 } else { 0.0 };
        self.set_effect_param(track, index, EffectParam::Enabled, value)
    }

    pub fn set_effect_mix(&mut self, track: TrackId, index: usize, mix: f32) -> EngineResult<()> {
        self.set_effect_param(track, index, EffectParam::Mix, mix)
    }

    pub fn set_chain_enabled(&mut self, track: TrackId, enabled: bool) -> EngineResult<()> {
        self.entry(track)?;
        self.send(EngineCommand::SetChainEnabled { track, enabled })
    }

    // ─────────────────────────────────────────────────────────────
    // Mixer
    // ─────────────────────────────────────────────────────────────

    pub fn set_strip_volume(&mut self, track: TrackId, volume: f32) -> EngineResult<()> {
        self.entry(track)?;
        self.send(EngineCommand::SetStripVolume { track, volume })
    }

    pub fn set_strip_pan(&mut self, track: TrackId, pan: f32) -> EngineResult<()> {
        self.entry(track)?;
        self.send(EngineCommand::SetStripPan { track, pan })
    }

    pub fn set_mute(&mut self, track: TrackId, mute: bool) -> EngineResult<()> {
        self.entry(track)?;
        self.send(EngineCommand::SetMute { track, mute })
    }

    pub fn set_solo(&mut self, track: TrackId, solo: bool) -> EngineResult<()> {
        self.entry(track)?;
        self.send(EngineCommand::SetSolo { track, solo })
    }

    pub fn set_master_volume(&mut self, volume: f32) -> EngineResult<()> {
        self.send(EngineCommand::SetMasterVolume(volume))
    }

    pub fn set_master_pan(&mut self, pan: f32) -> EngineResult<()> {
        self.send(EngineCommand::SetMasterPan(pan))
    }

    // ─────────────────────────────────────────────────────────────
    // Recording
    // ─────────────────────────────────────────────────────────────

    /// Start capturing `track`'s output into `writer` on a background thread.
    ///
    /// Call [`EngineHandle::stop_recording`] and then
    /// [`RecordingHandle::join`] to finish and get the writer back.
    pub fn start_recording<W: BlockWriter>(
        &mut self,
        track: TrackId,
        writer: W,
    ) -> EngineResult<RecordingHandle<W>> {
        self.entry(track)?;
        let capacity = ((self.sample_rate() * RECORDER_BUFFER_SECONDS) as usize)
            .max(self.block_size() * 4);
        let (sink, recording) = start_recorder(writer, capacity)?;

        self.send(EngineCommand::StartRecording {
            track,
            sink: Box::new(sink),
        })?;
        self.entry_mut(track)?.recording = true;
        log::info!("Recording started on track {}", track);
        Ok(recording)
    }

    pub fn stop_recording(&mut self, track: TrackId) -> EngineResult<()> {
        self.entry(track)?;
        self.send(EngineCommand::StopRecording(track))?;
        self.entry_mut(track)?.recording = false;
        log::info!("Recording stopped on track {}", track);
        Ok(())
    }

    pub fn is_recording(&self, track: TrackId) -> EngineResult<bool> {
        Ok(self.entry(track)?.recording)
    }

    // ─────────────────────────────────────────────────────────────
    // Transport and I/O
    // ─────────────────────────────────────────────────────────────

    pub fn play(&mut self) -> EngineResult<()> {
        self.send(EngineCommand::Play)
    }

    pub fn stop(&mut self) -> EngineResult<()> {
        self.send(EngineCommand::Stop)
    }

    pub fn locate(&mut self, position_samples: u64) -> EngineResult<()> {
        self.send(EngineCommand::Locate(position_samples))
    }

    pub fn reset_state(&mut self) -> EngineResult<()> {
        self.send(EngineCommand::ResetState)
    }

    /// Queue a live MIDI event for the next block; `offset` is frames into it.
    pub fn send_midi(&mut self, event: TimedMidiEvent) -> EngineResult<()> {
        self.midi.push(event).map_err(|_| EngineError::QueueFull)
    }

    /// Drain published meters and return the newest, or the last one seen if
    /// nothing new arrived.
    pub fn poll_meters(&mut self) -> Option<MeterSnapshot> {
        while let Ok(snapshot) = self.meters.pop() {
            self.latest_meters = Some(snapshot);
        }
        self.latest_meters
    }

    /// Drop everything the engine has handed back. Returns how many objects
    /// were freed.
    pub fn collect_garbage(&mut self) -> usize {
        let mut count = 0;
        while let Ok(garbage) = self.garbage.pop() {
            if let Garbage::Track(track) = &garbage {
                log::debug!("Dropping track {} '{}'", track.id(), track.name());
            }
            drop(garbage);
            count += 1;
        }
        count
    }
}
