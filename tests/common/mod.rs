//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::f32::consts::TAU;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// A sine at `freq`, `amplitude` peak.
pub fn sine(freq: f32, sample_rate: f32, len: usize, amplitude: f32) -> Vec<f32> {
    (0..len)
        .map(|i| (TAU * freq * i as f32 / sample_rate).sin() * amplitude)
        .collect()
}

/// Magnitudes of the Hann-windowed FFT of the whole slice, DC to just below Nyquist.
pub fn magnitude_spectrum(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    let mut spectrum: Vec<Complex<f32>> = signal
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let w = 0.5 - 0.5 * (TAU * i as f32 / n as f32).cos();
            Complex::new(x * w, 0.0)
        })
        .collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut spectrum);
    spectrum[..n / 2].iter().map(|c| c.norm()).collect()
}

/// Frequency of the strongest spectral peak in `signal`.
///
/// Hann-windowed FFT over the whole slice (its length should be a power of
/// two), then parabolic interpolation on the log magnitudes around the peak.
pub fn dominant_frequency(signal: &[f32], sample_rate: f32) -> f32 {
    let n = signal.len();
    assert!(n >= 4, "signal too short to analyse");

    let magnitudes = magnitude_spectrum(signal);
    // Skip DC and the first bin, which the window leaks into
    let (peak, _) = magnitudes
        .iter()
        .enumerate()
        .skip(2)
        .fold((2, 0.0f32), |best, (i, &m)| if m > best.1 { (i, m) } else { best });

    let offset = if peak + 1 < magnitudes.len() {
        let a = (magnitudes[peak - 1] + 1e-12).ln();
        let b = (magnitudes[peak] + 1e-12).ln();
        let c = (magnitudes[peak + 1] + 1e-12).ln();
        let denom = a - 2.0 * b + c;
        if denom.abs() > 1e-12 {
            0.5 * (a - c) / denom
        } else {
            0.0
        }
    } else {
        0.0
    };

    (peak as f32 + offset) * sample_rate / n as f32
}

/// Magnitude-weighted mean frequency of `signal` between `lo` and `hi` Hz.
pub fn spectral_centroid(signal: &[f32], sample_rate: f32, lo: f32, hi: f32) -> f32 {
    let bin_hz = sample_rate / signal.len() as f32;
    let (weighted, total) = magnitude_spectrum(signal)
        .iter()
        .enumerate()
        .map(|(i, &m)| (i as f32 * bin_hz, m))
        .filter(|&(f, _)| f >= lo && f <= hi)
        .fold((0.0, 0.0), |(w, t), (f, m)| (w + f * m, t + m));
    weighted / total.max(1e-12)
}

/// RMS of a slice.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|x| x * x).sum::<f32>() / signal.len() as f32).sqrt()
}

/// Split an interleaved stereo buffer into its two channels.
pub fn deinterleave(interleaved: &[f32]) -> (Vec<f32>, Vec<f32>) {
    interleaved
        .chunks_exact(2)
        .map(|frame| (frame[0], frame[1]))
        .unzip()
}
