//! Pitch shifting.
//!
//! [`PitchShiftProcessor`] shifts pitch without changing duration, at one of
//! three quality/latency tradeoffs:
//!
//! | mode       | method                                   | latency  |
//! | ---------- | ---------------------------------------- | -------- |
//! | `Fast`     | linear-interpolated read inside a block  | none     |
//! | `Balanced` | phase vocoder, rigid bin remap, hop N/4  | N        |
//! | `High`     | phase vocoder, peak-locked fractional    | N        |
//! |            | remap and Nyquist taper, hop N/8         |          |
//!
//! N is the FFT size chosen by [`PitchShiftProcessor::configure`]: the
//! smallest power of two that is at least [`MIN_FFT_SIZE`] and at least four
//! blocks long.
//!
//! Everything is allocated in `configure`. `process` never allocates, locks
//! or fails; an unconfigured processor copies input to output.

pub mod anti_alias;
pub mod formant;
pub mod phase_lock;
mod stft;

use std::f64::consts::{PI, TAU};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::buffer::StereoBlock;
use crate::config::validate_spec;
use crate::error::ConfigResult;
use crate::NUM_CHANNELS;

use stft::{ChannelStream, FrameSettings, SpectralWorkspace};

/// Smallest FFT the processor will use.
pub const MIN_FFT_SIZE: usize = 2048;
/// Semitone range accepted by [`PitchShiftProcessor::set_pitch_shift`].
pub const MAX_SEMITONES: f32 = 24.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityMode {
    Fast,
    #[default]
    Balanced,
    High,
}

impl QualityMode {
    /// Analysis hop for an FFT of `fft_size`.
    pub fn hop(self, fft_size: usize) -> usize {
        match self {
            QualityMode::Fast | QualityMode::Balanced => fft_size / 4,
            QualityMode::High => fft_size / 8,
        }
    }

    pub fn is_spectral(self) -> bool {
        !matches!(self, QualityMode::Fast)
    }
}

/// FFT size for a given maximum block size.
pub fn fft_size_for(max_block_size: usize) -> usize {
    max_block_size
        .saturating_mul(4)
        .max(MIN_FFT_SIZE)
        .next_power_of_two()
}

/// Frequency ratio for a semitone shift.
pub fn semitones_to_ratio(semitones: f32) -> f64 {
    2f64.powf(semitones as f64 / 12.0)
}

/// Wrap a phase into [-π, π).
#[inline]
pub fn wrap_phase(phase: f64) -> f64 {
    phase - TAU * ((phase + PI) / TAU).floor()
}

pub struct PitchShiftProcessor {
    sample_rate: f32,
    max_block_size: usize,
    semitones: f32,
    ratio: f64,
    preserve_formants: bool,
    mode: QualityMode,
    /// Mode the streaming state was built for; a mismatch resets it
    active_mode: QualityMode,
    workspace: Option<SpectralWorkspace>,
    channels: Vec<ChannelStream>,
}

impl Default for PitchShiftProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchShiftProcessor {
    /// Create an unconfigured processor (passes audio through until configured).
    pub fn new() -> Self {
        Self {
            sample_rate: 0.0,
            max_block_size: 0,
            semitones: 0.0,
            ratio: 1.0,
            preserve_formants: false,
            mode: QualityMode::default(),
            active_mode: QualityMode::default(),
            workspace: None,
            channels: Vec::new(),
        }
    }

    /// Validate, pick the FFT size, plan the transforms and allocate all state.
    pub fn configure(&mut self, sample_rate: f32, max_block_size: usize) -> ConfigResult<()> {
        validate_spec(sample_rate, max_block_size)?;

        let fft_size = fft_size_for(max_block_size);
        let reuse = self
            .workspace
            .as_ref()
            .is_some_and(|ws| ws.fft_size() == fft_size);
        if !reuse {
            self.workspace = Some(SpectralWorkspace::new(fft_size));
            self.channels = (0..NUM_CHANNELS)
                .map(|_| ChannelStream::new(fft_size))
                .collect();
        }

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.reset();

        log::debug!(
            "pitch shifter configured: {} Hz, block {}, fft {}",
            sample_rate,
            max_block_size,
            fft_size
        );
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.workspace.is_some()
    }

    /// Zero all history without reallocating.
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
        self.active_mode = self.mode;
    }

    pub fn set_pitch_shift(&mut self, semitones: f32) {
        let semitones = if semitones.is_nan() { 0.0 } else { semitones };
        self.semitones = semitones.clamp(-MAX_SEMITONES, MAX_SEMITONES);
        self.ratio = semitones_to_ratio(self.semitones);
    }

    pub fn pitch_shift(&self) -> f32 {
        self.semitones
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn set_formant_preservation(&mut self, enabled: bool) {
        self.preserve_formants = enabled;
    }

    pub fn formant_preservation(&self) -> bool {
        self.preserve_formants
    }

    /// Takes effect on the next process call; switching between modes with
    /// different hops restarts the streaming state.
    pub fn set_quality_mode(&mut self, mode: QualityMode) {
        self.mode = mode;
    }

    pub fn quality_mode(&self) -> QualityMode {
        self.mode
    }

    pub fn fft_size(&self) -> usize {
        self.workspace.as_ref().map_or(0, |ws| ws.fft_size())
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Output delay in samples for the current mode.
    pub fn latency_samples(&self) -> usize {
        if self.mode.is_spectral() {
            self.fft_size()
        } else {
            0
        }
    }

    pub fn latency_seconds(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.latency_samples() as f64 / self.sample_rate as f64
        } else {
            0.0
        }
    }

    /// Process every channel of `input` into `output`, which adopts its length.
    pub fn process(&mut self, input: &StereoBlock, output: &mut StereoBlock) {
        output.set_len(input.len());
        self.sync_mode();
        for ch in 0..NUM_CHANNELS {
            self.process_channel(ch, input.channel(ch), output.channel_mut(ch));
        }
    }

    /// Process one channel with its own streaming state.
    pub fn process_channel(&mut self, channel: usize, input: &[f32], output: &mut [f32]) {
        let len = input.len().min(output.len());
        let (input, output) = (&input[..len], &mut output[..len]);

        self.sync_mode();

        let Some(workspace) = self.workspace.as_mut() else {
            output.copy_from_slice(input);
            return;
        };
        let Some(stream) = self.channels.get_mut(channel) else {
            output.copy_from_slice(input);
            return;
        };

        match self.mode {
            QualityMode::Fast => resample_block(input, output, self.ratio),
            mode => {
                let settings = FrameSettings {
                    ratio: self.ratio,
                    hop: mode.hop(workspace.fft_size()),
                    mode,
                    preserve_formants: self.preserve_formants,
                };
                stream.process(workspace, &settings, input, output);
            }
        }
    }

    /// Hop changed: history from the old cadence is meaningless.
    fn sync_mode(&mut self) {
        if self.active_mode != self.mode {
            for stream in &mut self.channels {
                stream.reset();
            }
            self.active_mode = self.mode;
        }
    }
}

/// Linear-interpolated read at `ratio`, wrapping inside the block.
fn resample_block(input: &[f32], output: &mut [f32], ratio: f64) {
    let n = input.len();
    if n == 0 {
        return;
    }
    for (i, out) in output.iter_mut().enumerate() {
        let position = (i as f64 * ratio) % n as f64;
        let index = position as usize;
        let frac = (position - index as f64) as f32;
        let current = input[index];
        let next = input[(index + 1) % n];
        *out = current + (next - current) * frac;
    }
}
