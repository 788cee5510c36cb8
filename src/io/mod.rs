// Purpose - external interfaces the render core consumes

pub mod midi;

pub use midi::{midi_note_to_freq, MidiBlock, MidiEvent, MidiSlice, TimedMidiEvent};
