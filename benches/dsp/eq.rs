//! Benchmarks for the three-band EQ.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_mix::effect::{EqBand, EqEffect};
use saavy_mix::StereoBlock;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_eq(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/eq");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.07).sin() * 0.5).collect();
        let mut block = StereoBlock::from_channels(input.clone(), input.clone());

        // Flat: every band at 0 dB
        let mut flat = EqEffect::new();
        flat.prepare(SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("flat", size), &size, |b, _| {
            b.iter(|| flat.process(black_box(&mut block)))
        });

        // All three bands doing something
        let mut shaped = EqEffect::new();
        shaped.prepare(SAMPLE_RATE);
        shaped.set_gain(EqBand::Low, 4.0);
        shaped.set_gain(EqBand::Mid, -3.0);
        shaped.set_gain(EqBand::High, 6.0);
        group.bench_with_input(BenchmarkId::new("three_band", size), &size, |b, _| {
            b.iter(|| shaped.process(black_box(&mut block)))
        });
    }

    group.finish();
}
