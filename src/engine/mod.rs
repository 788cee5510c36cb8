//! The device-callback entry point
//!
//! [`AudioEngine`] lives on the audio thread and owns the whole render graph.
//! [`EngineHandle`] lives on the control thread and owns nothing but ring
//! ends and a mirror of what it has asked for.
//!
//! ```text
//!   control thread                          audio thread
//!   ──────────────                          ────────────
//!   EngineHandle ──── commands ────────►  AudioEngine::render_block
//!        ▲                                   1. drain commands
//!        │                                   2. collect MIDI
//!        ├──────── garbage ◄─────────────    3. per sub-block: mixer.render
//!        └──────── meters  ◄─────────────    4. advance transport, publish meters
//! ```
//!
//! Everything the render path touches is allocated in `prepare_to_play`.
//! Blocks longer than the prepared size are rendered in sub-blocks.

pub mod command;
pub mod handle;
pub mod transport;

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, Producer, RingBuffer};

use crate::buffer::StereoBlock;
use crate::config::{validate_spec, EngineConfig};
use crate::error::{ConfigResult, EngineResult};
use crate::io::midi::{MidiBlock, TimedMidiEvent};
use crate::mixer::{Mixer, MixerSnapshot};
use crate::NUM_CHANNELS;

pub use command::{EngineCommand, Garbage, MeterSnapshot};
pub use handle::EngineHandle;
pub use transport::{Transport, TransportState};

/// Configuration both threads can read without locking.
#[derive(Debug)]
pub struct EngineShared {
    sample_rate_bits: AtomicU32,
    block_size: AtomicUsize,
    prepared: AtomicBool,
}

impl EngineShared {
    fn new(sample_rate: f32, block_size: usize) -> Self {
        Self {
            sample_rate_bits: AtomicU32::new(sample_rate.to_bits()),
            block_size: AtomicUsize::new(block_size),
            prepared: AtomicBool::new(false),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        f32::from_bits(self.sample_rate_bits.load(Ordering::Relaxed))
    }

    pub fn block_size(&self) -> usize {
        self.block_size.load(Ordering::Relaxed)
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared.load(Ordering::Acquire)
    }

    fn store(&self, sample_rate: f32, block_size: usize) {
        self.sample_rate_bits
            .store(sample_rate.to_bits(), Ordering::Relaxed);
        self.block_size.store(block_size, Ordering::Relaxed);
    }
}

pub struct AudioEngine {
    mixer: Mixer,
    transport: Transport,
    commands: Consumer<EngineCommand>,
    garbage: Producer<Garbage>,
    meters: Producer<MeterSnapshot>,
    midi_in: Consumer<TimedMidiEvent>,
    midi: MidiBlock,
    midi_capacity: usize,
    input: StereoBlock,
    output: StereoBlock,
    shared: Arc<EngineShared>,
    sample_rate: f32,
    block_size: usize,
    prepared: bool,
}

impl AudioEngine {
    /// Build a prepared engine and its control handle.
    pub fn new(config: EngineConfig) -> EngineResult<(AudioEngine, EngineHandle)> {
        config.validate()?;

        let (command_tx, command_rx) = RingBuffer::new(config.command_capacity);
        // Every command can hand back at most one object
        let (garbage_tx, garbage_rx) = RingBuffer::new(config.command_capacity);
        let (meter_tx, meter_rx) = RingBuffer::new(config.meter_capacity);
        let (midi_tx, midi_rx) = RingBuffer::new(config.midi_capacity);
        let shared = Arc::new(EngineShared::new(config.sample_rate, config.block_size));

        let mut engine = AudioEngine {
            mixer: Mixer::new(config.max_tracks),
            transport: Transport::new(),
            commands: command_rx,
            garbage: garbage_tx,
            meters: meter_tx,
            midi_in: midi_rx,
            midi: MidiBlock::default(),
            midi_capacity: config.midi_capacity,
            input: StereoBlock::default(),
            output: StereoBlock::default(),
            shared: Arc::clone(&shared),
            sample_rate: config.sample_rate,
            block_size: config.block_size,
            prepared: false,
        };
        engine.prepare_to_play(config.sample_rate, config.block_size)?;

        let handle = EngineHandle::new(command_tx, garbage_rx, meter_rx, midi_tx, shared, &config);
        Ok((engine, handle))
    }

    /// (Re)allocate everything for a new device configuration.
    ///
    /// Call from the audio thread before the first callback or whenever the
    /// device changes; it allocates, so never from inside a callback.
    pub fn prepare_to_play(&mut self, sample_rate: f32, block_size: usize) -> ConfigResult<()> {
        validate_spec(sample_rate, block_size)?;
        // Tracks still queued get the new settings too
        self.drain_commands();

        self.mixer.prepare(sample_rate, block_size)?;
        self.input.allocate(block_size);
        self.output.allocate(block_size);
        self.midi = MidiBlock::with_capacity(self.midi_capacity);

        self.sample_rate = sample_rate;
        self.block_size = block_size;
        self.shared.store(sample_rate, block_size);
        self.shared.prepared.store(true, Ordering::Release);
        self.prepared = true;

        log::info!(
            "Engine prepared: {} Hz, {} frames per block, {} tracks",
            sample_rate,
            block_size,
            self.mixer.len()
        );
        Ok(())
    }

    /// Stop rendering. `render_block` outputs silence until the next prepare.
    pub fn release_resources(&mut self) {
        self.prepared = false;
        self.shared.prepared.store(false, Ordering::Release);
        self.mixer.reset();
        log::info!("Engine resources released");
    }

    /// Render interleaved stereo output with no audio input.
    pub fn render_block(&mut self, output: &mut [f32]) {
        self.process_interleaved(&[], output);
    }

    /// Full-duplex render: `input` and `output` are interleaved stereo. Input
    /// shorter than the output reads as silence.
    pub fn process_interleaved(&mut self, input: &[f32], output: &mut [f32]) {
        self.drain_commands();
        self.collect_midi();

        let frames = output.len() / NUM_CHANNELS;
        if !self.prepared || !self.transport.is_playing() {
            output.fill(0.0);
            self.midi.clear();
            self.publish_meters();
            return;
        }

        let mut start = 0;
        while start < frames {
            let len = (frames - start).min(self.block_size);
            let window = start * NUM_CHANNELS..(start + len) * NUM_CHANNELS;

            self.input.set_len(len);
            self.input
                .read_interleaved(input.get(window.start..).unwrap_or(&[]));
            self.output.set_len(len);
            self.mixer
                .render(&self.input, self.midi.slice(start, len), &mut self.output);
            self.output.write_interleaved(&mut output[window]);

            start += len;
        }
        // A trailing half frame can't be rendered
        output[frames * NUM_CHANNELS..].fill(0.0);

        self.transport.advance(frames as u64);
        self.midi.clear();
        self.publish_meters();
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            self.apply(command);
        }
    }

    fn collect_midi(&mut self) {
        while let Ok(event) = self.midi_in.pop() {
            // Full block: later events are lost rather than delayed
            self.midi.push(event);
        }
    }

    fn publish_meters(&mut self) {
        let master = self.mixer.master();
        let snapshot = MeterSnapshot {
            peak: [master.peak(0), master.peak(1)],
            rms: [master.rms(0), master.rms(1)],
            transport: self.transport.state(),
        };
        // Nobody polling: drop it
        let _ = self.meters.push(snapshot);
    }

    /// Hand an object back for the control thread to drop.
    fn retire(&mut self, garbage: Garbage) {
        // Ring full means the handle never collects; freeing here is the only option
        let _ = self.garbage.push(garbage);
    }

    fn apply(&mut self, command: EngineCommand) {
        use EngineCommand::*;

        match command {
            AddTrack(track) => {
                if let Err(track) = self.mixer.add_channel(track) {
                    self.retire(Garbage::Track(track));
                }
            }
            RemoveTrack(id) => {
                if let Some(track) = self.mixer.remove_channel(id) {
                    self.retire(Garbage::Track(track));
                }
            }
            SetSource { track, mut source } => {
                if let Some(t) = self.mixer.track_mut(track) {
                    std::mem::swap(t.source_mut(), &mut *source);
                }
                self.retire(Garbage::Source(source));
            }
            SetTrackVolume { track, volume } => {
                if let Some(t) = self.mixer.track_mut(track) {
                    t.set_volume(volume);
                }
            }
            SetTrackPan { track, pan } => {
                if let Some(t) = self.mixer.track_mut(track) {
                    t.set_pan(pan);
                }
            }
            SetTrackMuted { track, muted } => {
                if let Some(t) = self.mixer.track_mut(track) {
                    t.set_muted(muted);
                }
            }
            SetTrackArmed { track, armed } => {
                if let Some(t) = self.mixer.track_mut(track) {
                    t.set_armed(armed);
                }
            }

            AddEffect { track, effect } => {
                let rejected = match self.mixer.track_mut(track) {
                    Some(t) => t.chain_mut().push_boxed(effect).err(),
                    None => Some(effect),
                };
                if let Some(effect) = rejected {
                    self.retire(Garbage::Effect(effect));
                }
            }
            InsertEffect {
                track,
                index,
                effect,
            } => {
                let rejected = match self.mixer.track_mut(track) {
                    Some(t) => t.chain_mut().insert_boxed(index, effect).err(),
                    None => Some(effect),
                };
                if let Some(effect) = rejected {
                    self.retire(Garbage::Effect(effect));
                }
            }
            RemoveEffect { track, index } => {
                let removed = self
                    .mixer
                    .track_mut(track)
                    .and_then(|t| t.chain_mut().remove_effect(index));
                if let Some(effect) = removed {
                    self.retire(Garbage::Effect(effect));
                }
            }
            MoveEffect { track, from, to } => {
                if let Some(t) = self.mixer.track_mut(track) {
                    t.chain_mut().move_effect(from, to);
                }
            }
            SetEffectParam {
                track,
                index,
                param,
                value,
            } => {
                if let Some(effect) = self
                    .mixer
                    .track_mut(track)
                    .and_then(|t| t.chain_mut().effect_mut(index))
                {
                    effect.set_param(param, value);
                }
            }
            SetChainEnabled { track, enabled } => {
                if let Some(t) = self.mixer.track_mut(track) {
                    t.chain_mut().set_enabled(enabled);
                }
            }

            SetStripVolume { track, volume } => {
                if let Some(strip) = self.mixer.strip_mut(track) {
                    strip.set_volume(volume);
                }
            }
            SetStripPan { track, pan } => {
                if let Some(strip) = self.mixer.strip_mut(track) {
                    strip.set_pan(pan);
                }
            }
            SetMute { track, mute } => {
                self.mixer.set_mute(track, mute);
            }
            SetSolo { track, solo } => {
                self.mixer.set_solo(track, solo);
            }
            SetMasterVolume(volume) => self.mixer.master_mut().set_volume(volume),
            SetMasterPan(pan) => self.mixer.master_mut().set_pan(pan),

            StartRecording { track, sink } => {
                let displaced = match self.mixer.track_mut(track) {
                    Some(t) => t.start_recording(sink),
                    None => Some(sink),
                };
                if let Some(sink) = displaced {
                    self.retire(Garbage::Recorder(sink));
                }
            }
            StopRecording(track) => {
                if let Some(sink) = self
                    .mixer
                    .track_mut(track)
                    .and_then(|t| t.stop_recording())
                {
                    self.retire(Garbage::Recorder(sink));
                }
            }

            Play => self.transport.play(),
            Stop => self.transport.stop(),
            Locate(position) => self.transport.locate(position),
            ResetState => self.mixer.reset(),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn transport(&self) -> TransportState {
        self.transport.state()
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    /// Allocates; call from the control side only (e.g. before handing the
    /// engine to the device, or in offline renders).
    pub fn snapshot(&self) -> MixerSnapshot {
        self.mixer.snapshot()
    }
}
