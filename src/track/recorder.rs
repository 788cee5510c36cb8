//! Capturing a track's output without blocking the render path.
//!
//! ```text
//!   audio thread                      writer thread
//!   ────────────                      ─────────────
//!   Track::process_block              loop {
//!     └─ RecorderSink::push ──rtrb──►   drain whole frames
//!        (full? count + drop)             BlockWriter::write_block(l, r)
//!                                     } until sink dropped or stop
//! ```
//!
//! The ring carries interleaved frames so one `write_chunk` per block keeps
//! left and right together. The sink is the only producer; dropping it (the
//! engine hands it back through the garbage ring when recording stops) tells
//! the writer to drain what is left and finish.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rtrb::{Consumer, Producer, RingBuffer};

use crate::buffer::StereoBlock;
use crate::error::{RecorderError, RecorderResult};

/// How long the writer sleeps when the ring is empty.
const IDLE_WAIT: Duration = Duration::from_millis(5);

/// Destination for captured audio. Runs on the writer thread, so it may block.
pub trait BlockWriter: Send + 'static {
    fn write_block(&mut self, left: &[f32], right: &[f32]) -> io::Result<()>;

    /// Called once after the last block.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Collects everything in memory. Handy for tests and bouncing short clips.
#[derive(Debug, Default, Clone)]
pub struct MemoryWriter {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub finished: bool,
}

impl BlockWriter for MemoryWriter {
    fn write_block(&mut self, left: &[f32], right: &[f32]) -> io::Result<()> {
        self.left.extend_from_slice(left);
        self.right.extend_from_slice(right);
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Audio-thread end of a recording.
pub struct RecorderSink {
    producer: Producer<f32>,
    dropped_blocks: Arc<AtomicU64>,
}

impl RecorderSink {
    /// Push one block. Never waits: a block that doesn't fit is dropped whole
    /// and counted.
    pub fn push(&mut self, block: &StereoBlock) {
        let frames = block.len();
        let Ok(mut chunk) = self.producer.write_chunk(frames * 2) else {
            self.dropped_blocks.fetch_add(1, Ordering::Relaxed);
            return;
        };

        let (first, second) = chunk.as_mut_slices();
        let (left, right) = (block.channel(0), block.channel(1));
        let frames_iter = left.iter().zip(right).flat_map(|(&l, &r)| [l, r]);
        for (slot, sample) in first.iter_mut().chain(second.iter_mut()).zip(frames_iter) {
            *slot = sample;
        }
        chunk.commit_all();
    }

    pub fn dropped_blocks(&self) -> u64 {
        self.dropped_blocks.load(Ordering::Relaxed)
    }
}

/// Control-side end of a recording: stop it and get the writer back.
pub struct RecordingHandle<W: BlockWriter> {
    stop: Arc<AtomicBool>,
    dropped_blocks: Arc<AtomicU64>,
    thread: Option<JoinHandle<io::Result<W>>>,
}

impl<W: BlockWriter> RecordingHandle<W> {
    /// Blocks lost because the writer fell behind.
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped_blocks.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Ask the writer to drain and finish, then wait for it.
    ///
    /// Anything the sink pushes after this is lost; stop recording on the
    /// track first for a clean tail.
    pub fn join(mut self) -> RecorderResult<W> {
        self.stop.store(true, Ordering::Release);
        let thread = self.thread.take().ok_or(RecorderError::WriterPanicked)?;
        let writer = thread.join().map_err(|_| RecorderError::WriterPanicked)??;

        let dropped = self.dropped_blocks();
        if dropped > 0 {
            log::warn!("Recording finished with {} dropped blocks", dropped);
        }
        Ok(writer)
    }
}

impl<W: BlockWriter> Drop for RecordingHandle<W> {
    fn drop(&mut self) {
        // Detached: let the thread wind down on its own
        self.stop.store(true, Ordering::Release);
    }
}

/// Spawn a writer thread and return both ends.
///
/// `capacity_frames` is how much audio may be in flight before the render
/// path starts dropping blocks.
pub fn start_recorder<W: BlockWriter>(
    writer: W,
    capacity_frames: usize,
) -> RecorderResult<(RecorderSink, RecordingHandle<W>)> {
    let (producer, consumer) = RingBuffer::<f32>::new(capacity_frames.max(1) * 2);
    let stop = Arc::new(AtomicBool::new(false));
    let dropped_blocks = Arc::new(AtomicU64::new(0));

    let thread_stop = Arc::clone(&stop);
    let thread = thread::Builder::new()
        .name("saavy-recorder".into())
        .spawn(move || writer_loop(writer, consumer, thread_stop))?;

    log::info!("Recorder started ({} frames buffered)", capacity_frames);

    Ok((
        RecorderSink {
            producer,
            dropped_blocks: Arc::clone(&dropped_blocks),
        },
        RecordingHandle {
            stop,
            dropped_blocks,
            thread: Some(thread),
        },
    ))
}

fn writer_loop<W: BlockWriter>(
    mut writer: W,
    mut consumer: Consumer<f32>,
    stop: Arc<AtomicBool>,
) -> io::Result<W> {
    let mut left = Vec::new();
    let mut right = Vec::new();

    loop {
        // Read the flags before draining so nothing pushed earlier is missed
        let done = stop.load(Ordering::Acquire) || consumer.is_abandoned();

        let available = consumer.slots() & !1;
        if available > 0 {
            if let Ok(chunk) = consumer.read_chunk(available) {
                let (first, second) = chunk.as_slices();
                left.clear();
                right.clear();
                let mut samples = first.iter().chain(second);
                while let (Some(&l), Some(&r)) = (samples.next(), samples.next()) {
                    left.push(l);
                    right.push(r);
                }
                chunk.commit_all();
                writer.write_block(&left, &right)?;
            }
            continue;
        }

        if done {
            break;
        }
        thread::sleep(IDLE_WAIT);
    }

    writer.finish()?;
    log::info!("Recorder writer finished");
    Ok(writer)
}
