//! What a track plays before its effect chain.

use crate::buffer::StereoBlock;
use crate::dsp::clamp_param;
use crate::dsp::oscillator::SineOscillator;
use crate::io::midi::{midi_note_to_freq, MidiEvent, MidiSlice};
use crate::NUM_CHANNELS;

/// Fixed-frequency sine generator.
#[derive(Debug, Clone)]
pub struct ToneSource {
    frequency: f32,
    amplitude: f32,
    osc: SineOscillator,
}

impl ToneSource {
    pub fn new(frequency: f32, amplitude: f32) -> Self {
        Self {
            frequency: frequency.max(0.0),
            amplitude: clamp_param(amplitude, 0.0, 1.0, 0.0),
            osc: SineOscillator::new(),
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    fn render(&mut self, out: &mut [f32], sample_rate: f32) {
        self.osc.render(out, self.frequency, self.amplitude, sample_rate);
    }

    fn reset(&mut self) {
        self.osc.reset();
    }
}

/// Monophonic sine voice driven by note events.
///
/// Last note wins. A NoteOff only releases the note that is sounding, so
/// overlapping legato lines don't cut out early. Velocity sets the level.
#[derive(Debug, Clone, Default)]
pub struct MidiVoice {
    osc: SineOscillator,
    note: Option<u8>,
    gain: f32,
    /// Only respond to this channel, or all when `None`
    channel: Option<u8>,
}

impl MidiVoice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_channel(channel: u8) -> Self {
        Self {
            channel: Some(channel),
            ..Self::default()
        }
    }

    pub fn current_note(&self) -> Option<u8> {
        self.note
    }

    fn accepts(&self, channel: u8) -> bool {
        self.channel.is_none_or(|c| c == channel)
    }

    fn handle(&mut self, event: MidiEvent) {
        match event {
            MidiEvent::NoteOn {
                channel,
                key,
                velocity,
            } if velocity > 0 && self.accepts(channel) => {
                if self.note.is_none() {
                    self.osc.reset();
                }
                self.note = Some(key);
                self.gain = velocity as f32 / 127.0;
            }
            MidiEvent::NoteOn { channel, key, .. } | MidiEvent::NoteOff { channel, key, .. }
                if self.accepts(channel) && self.note == Some(key) =>
            {
                self.note = None;
            }
            _ => {}
        }
    }

    fn render_span(&mut self, out: &mut [f32], sample_rate: f32) {
        match self.note {
            Some(note) => {
                self.osc
                    .render(out, midi_note_to_freq(note), self.gain, sample_rate)
            }
            None => out.fill(0.0),
        }
    }

    /// Render `out`, applying each event at its frame offset.
    fn render(&mut self, out: &mut [f32], midi: MidiSlice<'_>, sample_rate: f32) {
        let mut cursor = 0;
        for timed in midi.iter() {
            let at = timed.offset.min(out.len());
            self.render_span(&mut out[cursor..at], sample_rate);
            cursor = at;
            self.handle(timed.event);
        }
        self.render_span(&mut out[cursor..], sample_rate);
    }

    fn reset(&mut self) {
        self.osc.reset();
        self.note = None;
    }
}

pub enum TrackSource {
    /// Render nothing; the chain still runs (reverb tails keep ringing).
    Silence,
    /// Pass the engine's input block through.
    Input,
    Tone(ToneSource),
    Midi(MidiVoice),
}

impl TrackSource {
    pub fn tone(frequency: f32, amplitude: f32) -> Self {
        TrackSource::Tone(ToneSource::new(frequency, amplitude))
    }

    pub fn midi() -> Self {
        TrackSource::Midi(MidiVoice::new())
    }

    /// Fill `out` for its active length.
    pub fn render(
        &mut self,
        input: &StereoBlock,
        out: &mut StereoBlock,
        midi: MidiSlice<'_>,
        sample_rate: f32,
    ) {
        match self {
            TrackSource::Silence => out.clear(),
            TrackSource::Input => {
                let shared = input.len().min(out.len());
                for ch in 0..NUM_CHANNELS {
                    let dst = out.channel_mut(ch);
                    dst[..shared].copy_from_slice(&input.channel(ch)[..shared]);
                    dst[shared..].fill(0.0);
                }
            }
            TrackSource::Tone(tone) => {
                let (left, right) = out.split_mut();
                tone.render(left, sample_rate);
                right.copy_from_slice(left);
            }
            TrackSource::Midi(voice) => {
                let (left, right) = out.split_mut();
                voice.render(left, midi, sample_rate);
                right.copy_from_slice(left);
            }
        }
    }

    pub fn reset(&mut self) {
        match self {
            TrackSource::Tone(tone) => tone.reset(),
            TrackSource::Midi(voice) => voice.reset(),
            TrackSource::Silence | TrackSource::Input => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::midi::{MidiBlock, TimedMidiEvent};

    const SR: f32 = 48_000.0;

    fn note_on(key: u8) -> MidiEvent {
        MidiEvent::NoteOn {
            channel: 0,
            key,
            velocity: 127,
        }
    }

    fn note_off(key: u8) -> MidiEvent {
        MidiEvent::NoteOff {
            channel: 0,
            key,
            velocity: 0,
        }
    }

    #[test]
    fn test_input_source_copies_and_pads() {
        let input = StereoBlock::from_channels(vec![0.5; 4], vec![-0.5; 4]);
        let mut out = StereoBlock::new(6);
        TrackSource::Input.render(&input, &mut out, MidiSlice::empty(), SR);
        assert_eq!(out.channel(0), &[0.5, 0.5, 0.5, 0.5, 0.0, 0.0]);
        assert_eq!(out.channel(1)[3], -0.5);
    }

    #[test]
    fn test_tone_is_mono_on_both_channels() {
        let input = StereoBlock::default();
        let mut out = StereoBlock::new(128);
        let mut source = TrackSource::tone(440.0, 0.5);
        source.render(&input, &mut out, MidiSlice::empty(), SR);
        assert_eq!(out.channel(0), out.channel(1));
        assert!(out.peak() <= 0.5 + 1e-6);
        assert!(out.peak() > 0.4);
    }

    #[test]
    fn test_nan_tone_settings_are_silent() {
        let tone = ToneSource::new(f32::NAN, f32::NAN);
        assert_eq!(tone.frequency(), 0.0);
        assert_eq!(tone.amplitude(), 0.0);
    }

    #[test]
    fn test_midi_voice_starts_at_event_offset() {
        let mut midi = MidiBlock::with_capacity(4);
        midi.push(TimedMidiEvent::new(32, note_on(69)));
        midi.push(TimedMidiEvent::new(96, note_off(69)));

        let input = StereoBlock::default();
        let mut out = StereoBlock::new(128);
        let mut source = TrackSource::midi();
        source.render(&input, &mut out, midi.as_slice(), SR);

        let left = out.channel(0);
        assert!(left[..32].iter().all(|&s| s == 0.0));
        assert!(left[32..96].iter().any(|&s| s.abs() > 0.1));
        assert!(left[96..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_note_off_for_other_key_is_ignored() {
        let mut voice = MidiVoice::new();
        voice.handle(note_on(60));
        voice.handle(note_on(64));
        voice.handle(note_off(60));
        assert_eq!(voice.current_note(), Some(64));
        voice.handle(note_off(64));
        assert_eq!(voice.current_note(), None);
    }

    #[test]
    fn test_channel_filter() {
        let mut voice = MidiVoice::on_channel(3);
        voice.handle(note_on(60));
        assert_eq!(voice.current_note(), None);
        voice.handle(MidiEvent::NoteOn {
            channel: 3,
            key: 60,
            velocity: 90,
        });
        assert_eq!(voice.current_note(), Some(60));
    }
}
