/*
Delay Line
==========

A circular buffer with a write index and a read index that trails it by the
delay length:

    buffer:  [ . . . . R . . . . . . W . . . ]
                       └── delay ──┘

Every sample reads at R, writes at W, then both advance by one and wrap.

The read index is derived from the write index whenever the delay changes:

    read = (write + len - delay) % len

A delay equal to the buffer length would put R on top of W, so the offset is
clamped to len - 1. The buffer is sized once in `prepare`; changing the delay
afterwards is just index arithmetic.
*/

#[derive(Debug, Clone, Default)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
    read_pos: usize,
    delay_samples: usize,
}

impl DelayLine {
    /// Create a delay line holding up to `len - 1` samples of delay.
    pub fn new(len: usize) -> Self {
        let mut line = Self::default();
        line.allocate(len);
        line
    }

    /// Resize the buffer. Clears history and keeps the current delay (clamped).
    pub fn allocate(&mut self, len: usize) {
        self.buffer.clear();
        self.buffer.resize(len.max(2), 0.0);
        self.write_pos = 0;
        self.set_delay(self.delay_samples);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    /// Set the delay and re-derive the read index from the write index.
    pub fn set_delay(&mut self, delay_samples: usize) {
        let len = self.buffer.len();
        if len == 0 {
            self.delay_samples = delay_samples;
            return;
        }
        self.delay_samples = delay_samples.min(len - 1);
        self.read_pos = (self.write_pos + len - self.delay_samples) % len;
    }

    #[inline]
    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    #[inline]
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Sample currently under the read index.
    #[inline]
    pub fn read(&self) -> f32 {
        self.buffer[self.read_pos]
    }

    /// Write at the write index and advance both indices.
    #[inline]
    pub fn write_and_advance(&mut self, sample: f32) {
        let len = self.buffer.len();
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % len;
        self.read_pos = (self.read_pos + 1) % len;
    }

    /// Plain delay: returns the sample from `delay_samples` ago.
    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> f32 {
        let delayed = self.read();
        self.write_and_advance(sample);
        delayed
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.set_delay(self.delay_samples);
    }
}
