//! Block-relative MIDI.
//!
//! Device I/O lives outside the core. Whatever reads the hardware hands the
//! engine raw [`MidiEvent`]s tagged with a frame offset; the engine collects
//! them into a [`MidiBlock`] per hardware block and gives every track the
//! [`MidiSlice`] covering the sub-block it is rendering.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

impl MidiEvent {
    /// A NoteOn with velocity 0 is a NoteOff by convention.
    pub fn is_note_off(&self) -> bool {
        matches!(
            self,
            MidiEvent::NoteOff { .. } | MidiEvent::NoteOn { velocity: 0, .. }
        )
    }
}

/// An event at a frame offset from the start of its block.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedMidiEvent {
    pub offset: usize,
    pub event: MidiEvent,
}

impl TimedMidiEvent {
    pub fn new(offset: usize, event: MidiEvent) -> Self {
        Self { offset, event }
    }
}

/// Time-sorted events for one hardware block, with fixed capacity.
#[derive(Debug, Clone, Default)]
pub struct MidiBlock {
    events: Vec<TimedMidiEvent>,
    capacity: usize,
}

impl MidiBlock {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert keeping offset order; events with equal offsets keep arrival
    /// order. Returns `false` (and drops the event) when full.
    pub fn push(&mut self, event: TimedMidiEvent) -> bool {
        if self.events.len() >= self.capacity {
            return false;
        }
        let index = self.events.partition_point(|e| e.offset <= event.offset);
        self.events.insert(index, event);
        true
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[TimedMidiEvent] {
        &self.events
    }

    /// All events in the block.
    pub fn as_slice(&self) -> MidiSlice<'_> {
        MidiSlice {
            events: &self.events,
            start: 0,
        }
    }

    /// Events in `[start, start + len)`, rebased so offsets start at zero.
    pub fn slice(&self, start: usize, len: usize) -> MidiSlice<'_> {
        let lo = self.events.partition_point(|e| e.offset < start);
        let hi = self.events.partition_point(|e| e.offset < start + len);
        MidiSlice {
            events: &self.events[lo..hi],
            start,
        }
    }
}

/// A borrowed, rebased window into a [`MidiBlock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MidiSlice<'a> {
    events: &'a [TimedMidiEvent],
    start: usize,
}

impl<'a> MidiSlice<'a> {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events with offsets relative to the slice start.
    pub fn iter(&self) -> impl Iterator<Item = TimedMidiEvent> + 'a {
        let start = self.start;
        self.events
            .iter()
            .map(move |e| TimedMidiEvent::new(e.offset - start, e.event))
    }
}

pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}
