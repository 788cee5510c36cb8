//! Engine configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE, MAX_BLOCK_SIZE};

/// Maximum number of tracks a mixer reserves room for.
pub const MAX_TRACKS: usize = 64;

/// Everything the engine needs to know before audio starts.
///
/// Ring capacities are fixed here because the rings are allocated once and
/// never grow on the audio thread.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Largest block the device will ask for; longer callbacks are split.
    pub block_size: usize,
    /// Control → audio command ring capacity.
    pub command_capacity: usize,
    /// Live MIDI events buffered per block.
    pub midi_capacity: usize,
    /// Audio → control meter ring capacity.
    pub meter_capacity: usize,
    pub max_tracks: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            command_capacity: 256,
            midi_capacity: 256,
            meter_capacity: 64,
            max_tracks: MAX_TRACKS,
        }
    }
}

impl EngineConfig {
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        Self {
            sample_rate,
            block_size,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        validate_spec(self.sample_rate, self.block_size)?;

        for (name, value) in [
            ("command", self.command_capacity),
            ("midi", self.midi_capacity),
            ("meter", self.meter_capacity),
            ("track", self.max_tracks),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidCapacity { name, value });
            }
        }

        Ok(())
    }
}

/// Shared check used by every `prepare`: reject before allocating.
pub fn validate_spec(sample_rate: f32, block_size: usize) -> ConfigResult<()> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(ConfigError::InvalidSampleRate(sample_rate));
    }
    if block_size == 0 || block_size > MAX_BLOCK_SIZE {
        return Err(ConfigError::InvalidBlockSize {
            size: block_size,
            max: MAX_BLOCK_SIZE,
        });
    }
    Ok(())
}
