//! Benchmarks for the STFT pitch shifter in each quality mode.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_mix::{PitchShiftProcessor, QualityMode, StereoBlock};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_pitch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/pitch");

    let modes = [
        ("fast", QualityMode::Fast),
        ("balanced", QualityMode::Balanced),
        ("high", QualityMode::High),
    ];

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        let source = StereoBlock::from_channels(input.clone(), input);
        let mut output = StereoBlock::new(size);

        for (name, mode) in modes {
            let mut shifter = PitchShiftProcessor::new();
            shifter
                .configure(SAMPLE_RATE, size)
                .expect("bench settings are valid");
            shifter.set_quality_mode(mode);
            shifter.set_pitch_shift(7.0);

            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| shifter.process(black_box(&source), black_box(&mut output)))
            });
        }

        // Formant preservation adds an envelope pass per frame
        let mut shifter = PitchShiftProcessor::new();
        shifter
            .configure(SAMPLE_RATE, size)
            .expect("bench settings are valid");
        shifter.set_pitch_shift(-5.0);
        shifter.set_formant_preservation(true);
        group.bench_with_input(BenchmarkId::new("balanced_formants", size), &size, |b, _| {
            b.iter(|| shifter.process(black_box(&source), black_box(&mut output)))
        });
    }

    group.finish();
}
