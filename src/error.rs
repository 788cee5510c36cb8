//! Error types for the control side of the render core.
//!
//! Nothing in here is ever produced on the audio thread. Configuration is
//! checked before anything is allocated, out-of-range parameters are clamped
//! rather than rejected, and the render path has no failure modes at all.

use thiserror::Error;

use crate::track::TrackId;

/// Invalid processing configuration, rejected at prepare time
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid sample rate: {0} Hz (must be finite and positive)")]
    InvalidSampleRate(f32),

    #[error("invalid block size: {size} (must be between 1 and {max})")]
    InvalidBlockSize { size: usize, max: usize },

    #[error("invalid {name} capacity: {value}")]
    InvalidCapacity { name: &'static str, value: usize },
}

/// Errors returned by [`crate::EngineHandle`] operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// The audio thread has not drained the command ring yet
    #[error("engine command queue is full")]
    QueueFull,

    #[error("unknown track: {0}")]
    UnknownTrack(TrackId),

    #[error("track {track} has no effect at index {index}")]
    UnknownEffect { track: TrackId, index: usize },

    #[error("effect chain on track {0} is full")]
    ChainFull(TrackId),

    #[error("track limit reached ({0} tracks)")]
    TooManyTracks(usize),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Recorder(#[from] RecorderError),
}

/// Errors from the background recording writer
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("recorder I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("recorder writer thread panicked")]
    WriterPanicked,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type EngineResult<T> = Result<T, EngineError>;
pub type RecorderResult<T> = Result<T, RecorderError>;
