//! Three-band parametric EQ: low shelf, peak, high shelf.
//!
//! Coefficients are recomputed when a band parameter changes or the sample
//! rate changes, never per block.

use crate::buffer::StereoBlock;
use crate::dsp::biquad::{BiquadCoeffs, BiquadShape, BiquadState};
use crate::dsp::clamp_param;
use crate::{DEFAULT_SAMPLE_RATE, NUM_CHANNELS};

use super::Parameterized;

pub const MIN_GAIN_DB: f32 = -24.0;
pub const MAX_GAIN_DB: f32 = 24.0;
pub const MIN_FREQ: f32 = 20.0;
pub const MAX_FREQ: f32 = 20_000.0;
pub const MIN_Q: f32 = 0.1;
pub const MAX_Q: f32 = 10.0;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EqBand {
    Low,
    Mid,
    High,
}

impl EqBand {
    pub const ALL: [EqBand; 3] = [EqBand::Low, EqBand::Mid, EqBand::High];

    fn index(self) -> usize {
        match self {
            EqBand::Low => 0,
            EqBand::Mid => 1,
            EqBand::High => 2,
        }
    }

    fn shape(self) -> BiquadShape {
        match self {
            EqBand::Low => BiquadShape::LowShelf,
            EqBand::Mid => BiquadShape::Peak,
            EqBand::High => BiquadShape::HighShelf,
        }
    }

    fn default_frequency(self) -> f32 {
        match self {
            EqBand::Low => 100.0,
            EqBand::Mid => 1000.0,
            EqBand::High => 8000.0,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EqParam {
    /// Band gain in dB (-24 - 24)
    Gain(EqBand),
    /// Band frequency in Hz (20 - 20000)
    Frequency(EqBand),
    /// Band Q (0.1 - 10)
    Q(EqBand),
    /// 1.0 = band active, 0.0 = bypassed
    Enabled(EqBand),
}

#[derive(Debug, Clone)]
struct Band {
    frequency: f32,
    gain_db: f32,
    q: f32,
    enabled: bool,
    coeffs: BiquadCoeffs,
    state: [BiquadState; NUM_CHANNELS],
}

#[derive(Debug, Clone)]
pub struct EqEffect {
    bands: [Band; 3],
    sample_rate: f32,
}

impl Default for EqEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl EqEffect {
    /// Flat EQ with bands at 100 Hz, 1 kHz and 8 kHz.
    pub fn new() -> Self {
        let band = |b: EqBand| Band {
            frequency: b.default_frequency(),
            gain_db: 0.0,
            q: 1.0,
            enabled: true,
            coeffs: BiquadCoeffs::passthrough(),
            state: Default::default(),
        };
        let mut eq = Self {
            bands: EqBand::ALL.map(band),
            sample_rate: DEFAULT_SAMPLE_RATE,
        };
        eq.update_all();
        eq
    }

    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_all();
        self.reset();
    }

    fn update_all(&mut self) {
        for band in EqBand::ALL {
            self.update(band);
        }
    }

    fn update(&mut self, band: EqBand) {
        let sample_rate = self.sample_rate;
        let b = &mut self.bands[band.index()];
        b.coeffs = BiquadCoeffs::design(band.shape(), b.frequency, b.gain_db, b.q, sample_rate);
    }

    pub fn set_gain(&mut self, band: EqBand, gain_db: f32) {
        let b = &mut self.bands[band.index()];
        b.gain_db = clamp_param(gain_db, MIN_GAIN_DB, MAX_GAIN_DB, b.gain_db);
        self.update(band);
    }

    pub fn gain(&self, band: EqBand) -> f32 {
        self.bands[band.index()].gain_db
    }

    pub fn set_frequency(&mut self, band: EqBand, freq: f32) {
        let b = &mut self.bands[band.index()];
        b.frequency = clamp_param(freq, MIN_FREQ, MAX_FREQ, b.frequency);
        self.update(band);
    }

    pub fn frequency(&self, band: EqBand) -> f32 {
        self.bands[band.index()].frequency
    }

    pub fn set_q(&mut self, band: EqBand, q: f32) {
        let b = &mut self.bands[band.index()];
        b.q = clamp_param(q, MIN_Q, MAX_Q, b.q);
        self.update(band);
    }

    pub fn q(&self, band: EqBand) -> f32 {
        self.bands[band.index()].q
    }

    pub fn set_band_enabled(&mut self, band: EqBand, enabled: bool) {
        self.bands[band.index()].enabled = enabled;
    }

    pub fn is_band_enabled(&self, band: EqBand) -> bool {
        self.bands[band.index()].enabled
    }

    pub fn coefficients(&self, band: EqBand) -> BiquadCoeffs {
        self.bands[band.index()].coeffs
    }

    pub fn process(&mut self, block: &mut StereoBlock) {
        for band in self.bands.iter_mut().filter(|b| b.enabled) {
            for (ch, state) in band.state.iter_mut().enumerate() {
                state.render(block.channel_mut(ch), &band.coeffs);
            }
        }
    }

    pub fn reset(&mut self) {
        for band in &mut self.bands {
            for state in &mut band.state {
                state.reset();
            }
        }
    }
}

impl Parameterized for EqEffect {
    type Param = EqParam;

    fn params() -> &'static [EqParam] {
        use EqBand::*;
        &[
            EqParam::Gain(Low),
            EqParam::Frequency(Low),
            EqParam::Q(Low),
            EqParam::Enabled(Low),
            EqParam::Gain(Mid),
            EqParam::Frequency(Mid),
            EqParam::Q(Mid),
            EqParam::Enabled(Mid),
            EqParam::Gain(High),
            EqParam::Frequency(High),
            EqParam::Q(High),
            EqParam::Enabled(High),
        ]
    }

    fn get_param(&self, param: EqParam) -> f32 {
        match param {
            EqParam::Gain(band) => self.gain(band),
            EqParam::Frequency(band) => self.frequency(band),
            EqParam::Q(band) => self.q(band),
            EqParam::Enabled(band) => self.is_band_enabled(band) as u8 as f32,
        }
    }

    fn set_param(&mut self, param: EqParam, value: f32) {
        match param {
            EqParam::Gain(band) => self.set_gain(band, value),
            EqParam::Frequency(band) => self.set_frequency(band, value),
            EqParam::Q(band) => self.set_q(band, value),
            EqParam::Enabled(band) => self.set_band_enabled(band, value >= 0.5),
        }
    }
}
