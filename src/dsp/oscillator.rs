use std::f32::consts::TAU;

/// Phase-accumulating sine oscillator.
///
/// Phase is kept in [0, 1) so long renders don't lose precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct SineOscillator {
    phase: f32,
}

impl SineOscillator {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    #[inline]
    pub fn next_sample(&mut self, freq_hz: f32, sample_rate: f32) -> f32 {
        let sample = (self.phase * TAU).sin();
        self.phase += freq_hz / sample_rate;
        self.phase -= self.phase.floor();
        sample
    }

    /// Fill `out` with `amplitude`-scaled sine at `freq_hz`.
    pub fn render(&mut self, out: &mut [f32], freq_hz: f32, amplitude: f32, sample_rate: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(freq_hz, sample_rate) * amplitude;
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
