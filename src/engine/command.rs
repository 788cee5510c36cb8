//! Messages between the control thread and the audio thread
//!
//! Three SPSC rings connect the two sides:
//!
//! ```text
//!   EngineHandle ──EngineCommand──► AudioEngine     (drained once per block)
//!   EngineHandle ◄─────Garbage───── AudioEngine     (dropped by collect_garbage)
//!   EngineHandle ◄──MeterSnapshot── AudioEngine     (one per block, polled)
//! ```
//!
//! Anything that owns heap memory travels boxed, so the command enum stays
//! small and nothing is allocated or freed on the audio thread. Objects the
//! engine replaces or removes are sent back as [`Garbage`].

use crate::effect::{Effect, EffectParam};
use crate::track::{RecorderSink, Track, TrackId, TrackSource};

use super::transport::TransportState;

/// Commands sent from the control thread to the audio thread
///
/// Each variant is applied atomically at the start of the next block.
pub enum EngineCommand {
    // ─────────────────────────────────────────────────────────────
    // Tracks
    // ─────────────────────────────────────────────────────────────
    /// Add a prepared track as a new mixer channel
    AddTrack(Box<Track>),
    RemoveTrack(TrackId),
    /// Swap the track's source; the old one comes back inside the same box
    SetSource {
        track: TrackId,
        source: Box<TrackSource>,
    },
    SetTrackVolume { track: TrackId, volume: f32 },
    SetTrackPan { track: TrackId, pan: f32 },
    /// Track-level mute: authoritative silence, no processing
    SetTrackMuted { track: TrackId, muted: bool },
    SetTrackArmed { track: TrackId, armed: bool },

    // ─────────────────────────────────────────────────────────────
    // Effect chains
    // ─────────────────────────────────────────────────────────────
    /// Append a prepared effect
    AddEffect { track: TrackId, effect: Box<Effect> },
    InsertEffect {
        track: TrackId,
        index: usize,
        effect: Box<Effect>,
    },
    RemoveEffect { track: TrackId, index: usize },
    MoveEffect {
        track: TrackId,
        from: usize,
        to: usize,
    },
    SetEffectParam {
        track: TrackId,
        index: usize,
        param: EffectParam,
        value: f32,
    },
    SetChainEnabled { track: TrackId, enabled: bool },

    // ─────────────────────────────────────────────────────────────
    // Mixer
    // ─────────────────────────────────────────────────────────────
    SetStripVolume { track: TrackId, volume: f32 },
    SetStripPan { track: TrackId, pan: f32 },
    /// Strip mute button (takes part in solo resolution)
    SetMute { track: TrackId, mute: bool },
    SetSolo { track: TrackId, solo: bool },
    SetMasterVolume(f32),
    SetMasterPan(f32),

    // ─────────────────────────────────────────────────────────────
    // Recording
    // ─────────────────────────────────────────────────────────────
    StartRecording {
        track: TrackId,
        sink: Box<RecorderSink>,
    },
    StopRecording(TrackId),

    // ─────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────
    Play,
    Stop,
    Locate(u64),
    /// Clear all DSP state (delay lines, reverb tails, vocoder history)
    ResetState,
}

/// Objects returned from the audio thread to be dropped elsewhere.
pub enum Garbage {
    Track(Box<Track>),
    Effect(Box<Effect>),
    Source(Box<TrackSource>),
    Recorder(Box<RecorderSink>),
}

/// Master levels and transport, published once per rendered block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterSnapshot {
    pub peak: [f32; 2],
    pub rms: [f32; 2],
    pub transport: TransportState,
}
