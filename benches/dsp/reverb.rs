//! Benchmarks for reverb processing.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_mix::dsp::reverb::{ReverbSettings, SchroederReverb, StereoReverb};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    for &size in BLOCK_SIZES {
        // Impulse followed by a quiet tail
        let input: Vec<f32> = (0..size)
            .map(|i| {
                if i < 10 {
                    1.0 - (i as f32 / 10.0)
                } else {
                    (i as f32 * 0.05).sin() * 0.1
                }
            })
            .collect();

        // Single mono network
        let mut reverb = SchroederReverb::new(SAMPLE_RATE, 0);
        reverb.set_room_size(0.3);
        reverb.set_damping(0.5);
        group.bench_with_input(BenchmarkId::new("mono_small_room", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &sample in &input {
                    sum += reverb.process(black_box(sample));
                }
                sum
            })
        });

        // Stereo pair, long tail
        let mut stereo = StereoReverb::new(SAMPLE_RATE);
        stereo.apply(&ReverbSettings {
            room_size: 0.9,
            damping: 0.3,
            ..ReverbSettings::default()
        });
        let mut left = input.clone();
        let mut right = input.clone();
        group.bench_with_input(BenchmarkId::new("stereo_hall", size), &size, |b, _| {
            b.iter(|| {
                left.copy_from_slice(&input);
                right.copy_from_slice(&input);
                stereo.process(black_box(&mut left), black_box(&mut right));
            })
        });
    }

    group.finish();
}
