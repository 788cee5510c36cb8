//! Benchmarks for the delay line and the feedback delay effect.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_mix::dsp::delay::DelayLine;
use saavy_mix::effect::DelayParam;
use saavy_mix::{Effect, EffectParam, StereoBlock};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Delay times in samples
    let delay_times: &[usize] = &[
        480,   // 10ms at 48kHz
        4800,  // 100ms at 48kHz
        48000, // 1 second at 48kHz
    ];

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        for &delay_samples in delay_times {
            let delay_ms = delay_samples as f32 / 48.0;

            let mut line = DelayLine::new(delay_samples + 1);
            line.set_delay(delay_samples);
            let mut buffer = input.clone();
            group.bench_with_input(
                BenchmarkId::new(format!("line_{}ms", delay_ms as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        for sample in buffer.iter_mut() {
                            *sample = line.next_sample(black_box(*sample));
                        }
                    })
                },
            );
        }

        // Stereo feedback delay with a half-wet mix
        let mut effect = Effect::delay();
        effect
            .prepare(SAMPLE_RATE, size)
            .expect("bench settings are valid");
        effect.set_param(EffectParam::Delay(DelayParam::Feedback), 0.6);
        effect.set_mix(0.5);
        let mut block = StereoBlock::from_channels(input.clone(), input.clone());
        group.bench_with_input(BenchmarkId::new("effect_feedback", size), &size, |b, _| {
            b.iter(|| {
                effect.process_block(black_box(&mut block));
            })
        });
    }

    group.finish();
}
