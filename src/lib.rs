pub mod buffer; // Fixed-capacity stereo sample blocks
pub mod config;
pub mod dsp;
pub mod effect; // Effects and ordered effect chains
pub mod engine; // Device-callback entry point and control handle
pub mod error;
pub mod io;
pub mod mixer; // Channel strips, solo/mute resolution and the master bus
pub mod pitch; // STFT phase-vocoder pitch shifter
pub mod track;

pub use buffer::StereoBlock;
pub use config::EngineConfig;
pub use effect::{Effect, EffectChain, EffectParam, EffectType};
pub use engine::{AudioEngine, EngineHandle, MeterSnapshot, TransportState};
pub use error::{ConfigError, EngineError, RecorderError};
pub use mixer::Mixer;
pub use pitch::{PitchShiftProcessor, QualityMode};
pub use track::{Track, TrackId, TrackSource, TrackType};

/// The render graph is stereo end to end.
pub const NUM_CHANNELS: usize = 2;
/// Largest block the engine will prepare for.
pub const MAX_BLOCK_SIZE: usize = 8192;
pub const DEFAULT_BLOCK_SIZE: usize = 512;
pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;
