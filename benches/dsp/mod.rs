//! Benchmarks for DSP primitives and single effects.

mod delay;
mod eq;
mod pitch;
mod reverb;

pub use delay::bench_delay;
pub use eq::bench_eq;
pub use pitch::bench_pitch;
pub use reverb::bench_reverb;
