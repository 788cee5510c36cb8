//! Streaming STFT analysis/resynthesis.
//!
//! Each channel keeps a sliding FFT-size input window and an overlap-add
//! accumulator. Samples go in one at a time; every `hop` samples a frame is
//! analysed, its bins are moved, and the resynthesised frame is added to the
//! accumulator. The oldest `hop` finished samples are then handed out over
//! the next `hop` calls.
//!
//! ```text
//! input_fifo:   [ ............ N samples, newest at the end ............ ]
//!                                                      └ hop new samples ┘
//! accumulator:  [ done: hop | partial ............................. | 0 ]
//!                 └→ output_queue
//! ```
//!
//! A sample entering at time `t` leaves the output queue at `t + N`, so the
//! latency is exactly one FFT frame and does not depend on the block size.

use std::f32::consts::TAU;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::{anti_alias, formant, phase_lock, wrap_phase, QualityMode};

/// Sum of the squared periodic Hann window over overlapping frames is
/// `HANN_SQUARED_MEAN * N / hop`.
const HANN_SQUARED_MEAN: f32 = 0.375;

/// Per-frame settings snapshot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameSettings {
    pub ratio: f64,
    pub hop: usize,
    pub mode: QualityMode,
    pub preserve_formants: bool,
}

/// FFT plans and scratch shared by every channel of one processor.
pub(crate) struct SpectralWorkspace {
    fft_size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitude: Vec<f32>,
    phase: Vec<f32>,
    envelope: Vec<f32>,
    shifted_magnitude: Vec<f32>,
    shifted_phase: Vec<f32>,
    /// Weight of the contributor that set `shifted_phase[k]`
    contribution: Vec<f32>,
    peaks: Vec<usize>,
}

impl SpectralWorkspace {
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        // Periodic Hann: overlap-adds to a constant at hop N/4 and N/8
        let window = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (TAU * i as f32 / fft_size as f32).cos()))
            .collect();

        let bins = fft_size / 2 + 1;
        Self {
            fft_size,
            forward,
            inverse,
            window,
            spectrum: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            magnitude: vec![0.0; bins],
            phase: vec![0.0; bins],
            envelope: vec![1.0; bins],
            shifted_magnitude: vec![0.0; bins],
            shifted_phase: vec![0.0; bins],
            contribution: vec![0.0; bins],
            peaks: Vec::with_capacity(bins),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    fn clear_shifted(&mut self) {
        self.shifted_magnitude.fill(0.0);
        self.shifted_phase.fill(0.0);
        self.contribution.fill(0.0);
    }

    /// Add `weight` to bin `k`, taking `phase` if this is its largest contributor.
    #[inline]
    fn deposit(&mut self, k: usize, weight: f32, phase: f64) {
        self.shifted_magnitude[k] += weight;
        if weight > self.contribution[k] {
            self.contribution[k] = weight;
            self.shifted_phase[k] = phase as f32;
        }
    }
}

/// Streaming state for one channel.
#[derive(Debug, Clone)]
pub(crate) struct ChannelStream {
    input_fifo: Vec<f32>,
    output_queue: Vec<f32>,
    accumulator: Vec<f32>,
    fill: usize,
    prev_phase: Vec<f32>,
    /// Accumulated synthesis phase (High) or per-region shift rotation (Balanced)
    synth_phase: Vec<f64>,
    /// Unwrapped phase advance of each analysis bin over the last hop
    advance: Vec<f64>,
}

impl ChannelStream {
    /// Allocate for `fft_size`. The output queue is sized for the largest hop (N/4).
    pub fn new(fft_size: usize) -> Self {
        let bins = fft_size / 2 + 1;
        Self {
            input_fifo: vec![0.0; fft_size],
            output_queue: vec![0.0; fft_size / 4],
            accumulator: vec![0.0; fft_size],
            fill: 0,
            prev_phase: vec![0.0; bins],
            synth_phase: vec![0.0; bins],
            advance: vec![0.0; bins],
        }
    }

    pub fn reset(&mut self) {
        self.input_fifo.fill(0.0);
        self.output_queue.fill(0.0);
        self.accumulator.fill(0.0);
        self.fill = 0;
        self.prev_phase.fill(0.0);
        self.synth_phase.fill(0.0);
        self.advance.fill(0.0);
    }

    pub fn process(
        &mut self,
        ws: &mut SpectralWorkspace,
        settings: &FrameSettings,
        input: &[f32],
        output: &mut [f32],
    ) {
        let n = ws.fft_size;
        let hop = settings.hop;
        debug_assert!(hop <= self.output_queue.len());

        for (&x, y) in input.iter().zip(output.iter_mut()) {
            *y = self.output_queue[self.fill];
            self.input_fifo[n - hop + self.fill] = x;
            self.fill += 1;

            if self.fill == hop {
                self.process_frame(ws, settings);
                self.fill = 0;
            }
        }
    }

    fn process_frame(&mut self, ws: &mut SpectralWorkspace, settings: &FrameSettings) {
        let n = ws.fft_size;
        let half = n / 2;
        let hop = settings.hop;
        let ratio = settings.ratio;

        // Analysis
        for ((bin, &x), &w) in ws.spectrum.iter_mut().zip(&self.input_fifo).zip(&ws.window) {
            *bin = Complex::new(x * w, 0.0);
        }
        ws.forward.process_with_scratch(&mut ws.spectrum, &mut ws.scratch);

        let expected_step = std::f64::consts::TAU * hop as f64 / n as f64;
        for j in 0..=half {
            let bin = ws.spectrum[j];
            let phase = bin.arg();
            ws.magnitude[j] = bin.norm();
            ws.phase[j] = phase;

            let expected = expected_step * j as f64;
            let deviation = (phase - self.prev_phase[j]) as f64 - expected;
            self.advance[j] = expected + wrap_phase(deviation);
            self.prev_phase[j] = phase;
        }

        if settings.preserve_formants {
            formant::spectral_envelope(&ws.magnitude, &mut ws.envelope);
            formant::flatten(&mut ws.magnitude, &ws.envelope);
        }

        ws.clear_shifted();
        match settings.mode {
            QualityMode::High => self.shift_fractional(ws, ratio),
            _ => self.shift_peaks(ws, ratio, hop),
        }

        if settings.preserve_formants {
            formant::restore(&mut ws.shifted_magnitude, &ws.envelope);
        }

        // Hermitian rebuild: DC and Nyquist real, upper half mirrored by conjugation
        for k in 0..=half {
            ws.spectrum[k] = Complex::from_polar(ws.shifted_magnitude[k], ws.shifted_phase[k]);
        }
        ws.spectrum[0].im = 0.0;
        ws.spectrum[half].im = 0.0;
        for k in 1..half {
            ws.spectrum[n - k] = ws.spectrum[k].conj();
        }

        ws.inverse.process_with_scratch(&mut ws.spectrum, &mut ws.scratch);

        // Unnormalised inverse (×N) and squared-window overlap gain
        let scale = 1.0 / (n as f32 * HANN_SQUARED_MEAN * n as f32 / hop as f32);
        for ((acc, bin), &w) in self.accumulator.iter_mut().zip(&ws.spectrum).zip(&ws.window) {
            *acc += bin.re * w * scale;
        }

        self.output_queue[..hop].copy_from_slice(&self.accumulator[..hop]);
        self.accumulator.copy_within(hop.., 0);
        self.accumulator[n - hop..].fill(0.0);
        self.input_fifo.copy_within(hop.., 0);
    }

    /// Peak-rigid remap. The bins owned by each spectral peak move together by
    /// `round((r - 1)·f)` bins, `f` being the peak's measured frequency in bins.
    /// For on-bin content that is `j → round(j·r)`.
    ///
    /// Each bin keeps its analysis phase plus a rotation accumulated at its
    /// peak, so a tone's main lobe stays coherent and centred on `r·f`.
    /// `synth_phase` holds that rotation here, copied across the whole region
    /// so it carries over when the peak moves to a neighbouring bin.
    fn shift_peaks(&mut self, ws: &mut SpectralWorkspace, ratio: f64, hop: usize) {
        let half = ws.fft_size / 2;
        let to_bins = ws.fft_size as f64 / (std::f64::consts::TAU * hop as f64);
        let stretch = ratio - 1.0;

        phase_lock::find_peaks(&ws.magnitude, &mut ws.peaks);
        if ws.peaks.is_empty() {
            // Monotonic spectrum: the loudest bin owns everything
            let (loudest, level) = ws
                .magnitude
                .iter()
                .enumerate()
                .fold((0, 0.0f32), |best, (j, &m)| if m > best.1 { (j, m) } else { best });
            if level == 0.0 {
                return;
            }
            ws.peaks.push(loudest);
        }

        let mut start = 0;
        for i in 0..ws.peaks.len() {
            let peak = ws.peaks[i];
            let end = phase_lock::region_end(&ws.peaks, i, half + 1);
            let rotation = wrap_phase(self.synth_phase[peak] + stretch * self.advance[peak]);
            let displacement = (stretch * self.advance[peak] * to_bins).round() as isize;

            for j in start..=end {
                self.synth_phase[j] = rotation;
                let k = j as isize + displacement;
                if k < 0 || k > half as isize {
                    continue;
                }
                let magnitude = ws.magnitude[j];
                let phase = ws.phase[j] as f64 + rotation;
                ws.deposit(k as usize, magnitude, phase);
            }
            start = end + 1;
        }
    }

    /// Peak-locked fractional remap with Nyquist taper.
    fn shift_fractional(&mut self, ws: &mut SpectralWorkspace, ratio: f64) {
        let half = ws.fft_size / 2;
        for j in 0..=half {
            self.synth_phase[j] = wrap_phase(self.synth_phase[j] + ratio * self.advance[j]);
        }

        phase_lock::find_peaks(&ws.magnitude, &mut ws.peaks);
        phase_lock::lock_to_peaks(&ws.peaks, &ws.phase, &mut self.synth_phase);

        for j in 0..=half {
            let position = j as f64 * ratio;
            let k = position.floor() as usize;
            if k > half {
                break;
            }
            let magnitude = ws.magnitude[j];
            let phase = self.synth_phase[j];
            if k == half {
                ws.deposit(k, magnitude, phase);
                continue;
            }
            let frac = (position - k as f64) as f32;
            ws.deposit(k, magnitude * (1.0 - frac), phase);
            ws.deposit(k + 1, magnitude * frac, phase);
        }

        anti_alias::suppress_aliasing(&mut ws.shifted_magnitude, ratio);
    }
}
