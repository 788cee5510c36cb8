//! Benchmarks for multi-track mixing scenarios.
//!
//! These render whole sessions the way a device callback would, from a few
//! dry tracks up to a dense mix with pitch shifting on several channels.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_mix::io::midi::MidiSlice;
use saavy_mix::{
    AudioEngine, Effect, EngineConfig, Mixer, StereoBlock, Track, TrackId, TrackSource, TrackType,
    NUM_CHANNELS,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

/// Build a mixer of `count` tone tracks, each carrying `effects()`.
fn session(count: u32, size: usize, effects: fn(u32) -> Vec<Effect>) -> Mixer {
    let mut mixer = Mixer::new(count as usize);
    for i in 0..count {
        let mut track = Track::with_source(
            TrackId(i + 1),
            format!("track {i}"),
            TrackType::Audio,
            TrackSource::tone(110.0 * (i + 1) as f32, 0.2),
        );
        track.set_pan(if i % 2 == 0 { -0.4 } else { 0.4 });
        for effect in effects(i) {
            let _ = track.chain_mut().add_effect(effect);
        }
        let _ = mixer.add_channel(Box::new(track));
    }
    mixer
        .prepare(SAMPLE_RATE, size)
        .expect("bench settings are valid");
    mixer
}

fn dry(_: u32) -> Vec<Effect> {
    Vec::new()
}

/// EQ and compressor on every track, reverb on every other one
fn typical(i: u32) -> Vec<Effect> {
    let mut chain = vec![Effect::eq(), Effect::compressor()];
    if i % 2 == 0 {
        chain.push(Effect::reverb());
    }
    chain
}

/// Everything, including a pitch shifter per track
fn heavy(i: u32) -> Vec<Effect> {
    let mut chain = typical(i);
    chain.insert(0, Effect::pitch_shift(if i % 2 == 0 { 7.0 } else { -5.0 }));
    chain.push(Effect::delay());
    chain
}

pub fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/mix");

    for &size in BLOCK_SIZES {
        let input = StereoBlock::new(size);
        let mut out = StereoBlock::new(size);

        let scenarios: [(&str, u32, fn(u32) -> Vec<Effect>); 4] = [
            ("2_track_dry", 2, dry),
            ("4_track_typical", 4, typical),
            ("8_track_typical", 8, typical),
            ("8_track_heavy", 8, heavy),
        ];

        for (name, count, effects) in scenarios {
            let mut mixer = session(count, size, effects);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    mixer.render(
                        black_box(&input),
                        MidiSlice::empty(),
                        black_box(&mut out),
                    );
                })
            });
        }

        // The same typical session behind the engine callback (command drain,
        // interleaving, meter publishing)
        let (mut engine, mut handle) = AudioEngine::new(EngineConfig::new(SAMPLE_RATE, size))
            .expect("bench settings are valid");
        for i in 0..8u32 {
            let id = handle
                .add_track(
                    format!("track {i}"),
                    TrackType::Audio,
                    TrackSource::tone(110.0 * (i + 1) as f32, 0.2),
                )
                .expect("track fits");
            for effect in typical(i) {
                handle.add_effect(id, effect).expect("effect fits");
            }
        }
        handle.play().expect("queue has room");
        let mut interleaved = vec![0.0f32; size * NUM_CHANNELS];
        group.bench_with_input(BenchmarkId::new("engine_8_track", size), &size, |b, _| {
            b.iter(|| {
                engine.render_block(black_box(&mut interleaved));
                // Keep the meter ring from filling up
                handle.poll_meters()
            })
        });
    }

    group.finish();
}
