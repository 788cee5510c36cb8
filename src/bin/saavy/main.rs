//! saavy - plays a short demo mix through the default output device
//!
//! Run with: cargo run
//! Set RUST_LOG=debug for more detail.

use std::thread;
use std::time::{Duration, Instant};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use saavy_mix::effect::{EffectKind, EqBand, EqParam, PitchParam, ReverbEffect};
use saavy_mix::io::midi::{MidiEvent, TimedMidiEvent};
use saavy_mix::track::MemoryWriter;
use saavy_mix::{
    AudioEngine, Effect, EffectParam, EngineConfig, QualityMode, TrackSource,
    TrackType, DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE, NUM_CHANNELS,
};

const DEMO_LENGTH: Duration = Duration::from_secs(8);
const METER_INTERVAL: Duration = Duration::from_millis(500);
const NOTE_LENGTH: Duration = Duration::from_millis(250);
const ARPEGGIO: [u8; 4] = [57, 60, 64, 69];

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let supported = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = supported.sample_rate().0 as f32;
    let channels = supported.channels() as usize;
    log::info!(
        "Output: {} ({} Hz, {} channels)",
        device.name().unwrap_or_else(|_| "unknown".into()),
        sample_rate,
        channels
    );

    let (mut engine, mut handle) =
        AudioEngine::new(EngineConfig::new(sample_rate, DEFAULT_BLOCK_SIZE))
            .wrap_err("failed to create engine")?;

    // Root: plain tone, slightly left
    let root = handle.add_track("root", TrackType::Audio, TrackSource::tone(220.0, 0.2))?;
    handle.set_track_pan(root, -0.3)?;

    // Fifth: the same tone shifted up seven semitones, into a hall
    let fifth = handle.add_track("fifth", TrackType::Audio, TrackSource::tone(220.0, 0.2))?;
    let mut shifter = Effect::pitch_shift(7.0);
    shifter.set_param(
        EffectParam::PitchShift(PitchParam::Quality),
        QualityMode::High.index(),
    );
    handle.add_effect(fifth, shifter)?;
    handle.add_effect(fifth, Effect::new(EffectKind::Reverb(ReverbEffect::hall(0.4))))?;
    handle.set_track_pan(fifth, 0.3)?;

    // Lead: MIDI voice through a delay and a bright EQ
    let lead = handle.add_track("lead", TrackType::Midi, TrackSource::midi())?;
    let mut eq = Effect::eq();
    eq.set_param(EffectParam::Eq(EqParam::Gain(EqBand::High)), 4.0);
    handle.add_effect(lead, eq)?;
    let delay = handle.add_effect(lead, Effect::delay())?;
    handle.set_effect_mix(lead, delay, 0.6)?;
    handle.set_strip_volume(lead, 0.7)?;

    let recording = handle.start_recording(root, MemoryWriter::default())?;

    let mut scratch = vec![0.0f32; MAX_BLOCK_SIZE * NUM_CHANNELS];
    let stream = device.build_output_stream(
        &supported.into(),
        move |data: &mut [f32], _| {
            let frames_per_pass = scratch.len() / NUM_CHANNELS;
            for out in data.chunks_mut(frames_per_pass * channels) {
                let frames = out.len() / channels;
                let stereo = &mut scratch[..frames * NUM_CHANNELS];
                engine.render_block(stereo);

                for (frame, pair) in out.chunks_mut(channels).zip(stereo.chunks(NUM_CHANNELS)) {
                    for (ch, sample) in frame.iter_mut().enumerate() {
                        *sample = match ch {
                            0 | 1 if channels > 1 => pair[ch],
                            0 => (pair[0] + pair[1]) * 0.5,
                            _ => 0.0,
                        };
                    }
                }
            }
        },
        |err| log::error!("Audio stream error: {}", err),
        None,
    )?;

    stream.play()?;
    handle.play()?;
    log::info!("Playing for {:?}", DEMO_LENGTH);

    let started = Instant::now();
    let mut last_meter = started;
    let mut last_note = started;
    let mut step = 0usize;
    let mut sounding: Option<u8> = None;

    while started.elapsed() < DEMO_LENGTH {
        if last_note.elapsed() >= NOTE_LENGTH {
            if let Some(key) = sounding.take() {
                handle.send_midi(TimedMidiEvent::new(
                    0,
                    MidiEvent::NoteOff {
                        channel: 0,
                        key,
                        velocity: 0,
                    },
                ))?;
            }
            let key = ARPEGGIO[step % ARPEGGIO.len()];
            handle.send_midi(TimedMidiEvent::new(
                0,
                MidiEvent::NoteOn {
                    channel: 0,
                    key,
                    velocity: 96,
                },
            ))?;
            sounding = Some(key);
            step += 1;
            last_note = Instant::now();
        }

        // Drain every tick so the meter ring never fills up
        let meters = handle.poll_meters();
        if last_meter.elapsed() >= METER_INTERVAL {
            if let Some(meters) = meters {
                log::info!(
                    "pos {:>8}  peak L {:.3} R {:.3}  rms L {:.3} R {:.3}",
                    meters.transport.position_samples,
                    meters.peak[0],
                    meters.peak[1],
                    meters.rms[0],
                    meters.rms[1]
                );
            }
            handle.collect_garbage();
            last_meter = Instant::now();
        }

        thread::sleep(Duration::from_millis(10));
    }

    handle.stop()?;
    handle.stop_recording(root)?;
    // Give the callback a few blocks to pick the commands up
    thread::sleep(Duration::from_millis(200));
    handle.collect_garbage();

    let captured = recording.join().wrap_err("recorder failed")?;
    log::info!(
        "Captured {:.2} s from the root track",
        captured.left.len() as f32 / sample_rate
    );

    drop(stream);
    Ok(())
}
