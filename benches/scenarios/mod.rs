//! Real-world scenario benchmarks.
//!
//! These model full sessions: several tracks with effect chains summed by
//! the mixer, and the same session driven through the engine callback.

mod mix;

pub use mix::bench_mix;
