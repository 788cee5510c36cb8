//! Reverb network: parallel damped combs into series allpasses
//!
//! ```text
//!            ┌─► comb 0 ─┐
//!            ├─► comb 1 ─┤
//! input ─────┼─►  ...   ─┼─► Σ/8 ─► allpass 0 ─► allpass 1 ─► allpass 2 ─► allpass 3 ─► out
//!            └─► comb 7 ─┘
//! ```
//!
//! Each comb is a feedback delay with a one-pole lowpass in its loop, so high
//! frequencies die away faster than lows:
//!
//! ```text
//! out     = buf[i]
//! store   = out * (1 - damp) + store * damp
//! buf[i]  = in + store * feedback
//! ```
//!
//! The allpasses then smear the comb echoes into a dense tail:
//!
//! ```text
//! delayed = buf[i]
//! out     = delayed - in
//! buf[i]  = in + delayed * 0.5
//! ```
//!
//! Delay lengths are the usual tunings at 44.1 kHz, rescaled to the running
//! sample rate. Room size maps to comb feedback in `[0.7, 0.98]` and damping
//! to the loop filter coefficient in `[0, 0.4]`.
//!
//! ## Stereo
//!
//! [`StereoReverb`] feeds the mono sum into two networks whose right-hand
//! delays are longer by [`STEREO_SPREAD`] samples, so the tails decorrelate.
//! Width then cross-blends them:
//!
//! ```text
//! wet1 = wet * (width / 2 + 0.5)
//! wet2 = wet * ((1 - width) / 2)
//!
//! out_l = tail_l * wet1 + tail_r * wet2 + in_l * dry
//! out_r = tail_r * wet1 + tail_l * wet2 + in_r * dry
//! ```
//!
//! Width 1.0 keeps the tails fully separate, 0.0 collapses them to mono.

/// Comb lengths in samples at 44.1 kHz
const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
/// Allpass lengths in samples at 44.1 kHz
const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];
const TUNING_RATE: f32 = 44_100.0;
const ALLPASS_FEEDBACK: f32 = 0.5;
const ROOM_OFFSET: f32 = 0.7;
const ROOM_SCALE: f32 = 0.28;
const DAMP_SCALE: f32 = 0.4;
/// Extra delay on the right network, in samples at 44.1 kHz
pub const STEREO_SPREAD: usize = 23;

fn scaled_len(tuning: usize, spread: usize, sample_rate: f32) -> usize {
    (((tuning + spread) as f32 * sample_rate / TUNING_RATE) as usize).max(1)
}

/// Feedback comb with a lowpass in the loop.
#[derive(Debug, Clone)]
pub struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    damp: f32,
    store: f32,
}

impl CombFilter {
    pub fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            index: 0,
            feedback: ROOM_OFFSET,
            damp: 0.0,
            store: 0.0,
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    /// Loop filter coefficient, 0 = no damping.
    pub fn set_damp(&mut self, damp: f32) {
        self.damp = damp.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let out = self.buffer[self.index];
        self.store = out * (1.0 - self.damp) + self.store * self.damp;
        self.buffer[self.index] = input + self.store * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        out
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.store = 0.0;
        self.index = 0;
    }
}

/// Diffusing allpass stage.
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
}

impl AllpassFilter {
    pub fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            index: 0,
            feedback: ALLPASS_FEEDBACK,
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.9);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.index];
        self.buffer[self.index] = input + delayed * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        delayed - input
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }
}

/// One mono network: 8 combs, 4 allpasses.
#[derive(Debug, Clone)]
pub struct SchroederReverb {
    combs: [CombFilter; 8],
    allpasses: [AllpassFilter; 4],
}

impl SchroederReverb {
    /// Create a network for `sample_rate`, every delay lengthened by `spread`
    /// samples at 44.1 kHz. Allocates; call from prepare only.
    pub fn new(sample_rate: f32, spread: usize) -> Self {
        let mut network = Self {
            combs: COMB_TUNING.map(|t| CombFilter::new(scaled_len(t, spread, sample_rate))),
            allpasses: ALLPASS_TUNING
                .map(|t| AllpassFilter::new(scaled_len(t, spread, sample_rate))),
        };
        network.set_room_size(0.5);
        network.set_damping(0.5);
        network
    }

    pub fn set_room_size(&mut self, size: f32) {
        let feedback = ROOM_OFFSET + size.clamp(0.0, 1.0) * ROOM_SCALE;
        for comb in &mut self.combs {
            comb.set_feedback(feedback);
        }
    }

    pub fn set_damping(&mut self, damping: f32) {
        let damp = damping.clamp(0.0, 1.0) * DAMP_SCALE;
        for comb in &mut self.combs {
            comb.set_damp(damp);
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mut out = self.combs.iter_mut().map(|c| c.process(input)).sum::<f32>()
            / self.combs.len() as f32;
        for allpass in &mut self.allpasses {
            out = allpass.process(out);
        }
        out
    }

    pub fn reset(&mut self) {
        self.combs.iter_mut().for_each(CombFilter::reset);
        self.allpasses.iter_mut().for_each(AllpassFilter::reset);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbSettings {
    pub room_size: f32,
    pub damping: f32,
    pub wet: f32,
    pub dry: f32,
    pub width: f32,
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            wet: 0.33,
            dry: 0.4,
            width: 1.0,
        }
    }
}

/// Two decorrelated Schroeder networks with wet/dry/width control.
#[derive(Debug, Clone)]
pub struct StereoReverb {
    left: SchroederReverb,
    right: SchroederReverb,
    wet1: f32,
    wet2: f32,
    dry: f32,
}

impl StereoReverb {
    pub fn new(sample_rate: f32) -> Self {
        let mut reverb = Self {
            left: SchroederReverb::new(sample_rate, 0),
            right: SchroederReverb::new(sample_rate, STEREO_SPREAD),
            wet1: 0.0,
            wet2: 0.0,
            dry: 1.0,
        };
        reverb.apply(&ReverbSettings::default());
        reverb
    }

    /// Push a full parameter set into both networks.
    pub fn apply(&mut self, settings: &ReverbSettings) {
        for net in [&mut self.left, &mut self.right] {
            net.set_room_size(settings.room_size);
            net.set_damping(settings.damping);
        }
        let width = settings.width.clamp(0.0, 1.0);
        let wet = settings.wet.clamp(0.0, 1.0);
        self.wet1 = wet * (width / 2.0 + 0.5);
        self.wet2 = wet * ((1.0 - width) / 2.0);
        self.dry = settings.dry.clamp(0.0, 1.0);
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let input = (*l + *r) * 0.5;
            let tail_l = self.left.process(input);
            let tail_r = self.right.process(input);
            let out_l = tail_l * self.wet1 + tail_r * self.wet2 + *l * self.dry;
            let out_r = tail_r * self.wet1 + tail_l * self.wet2 + *r * self.dry;
            *l = out_l;
            *r = out_r;
        }
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comb_echo_arrives_after_its_length() {
        let mut comb = CombFilter::new(10);
        comb.set_feedback(0.5);

        assert_eq!(comb.process(1.0), 0.0);
        for _ in 0..9 {
            assert_eq!(comb.process(0.0), 0.0);
        }
        assert_eq!(comb.process(0.0), 1.0);
        // Second pass through the loop is scaled by the feedback
        for _ in 0..9 {
            comb.process(0.0);
        }
        assert!((comb.process(0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_damping_softens_repeats() {
        let mut bright = CombFilter::new(4);
        let mut dark = CombFilter::new(4);
        bright.set_feedback(0.9);
        dark.set_feedback(0.9);
        dark.set_damp(0.4);

        let mut bright_energy = 0.0;
        let mut dark_energy = 0.0;
        for i in 0..64 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            bright_energy += bright.process(x).powi(2);
            dark_energy += dark.process(x).powi(2);
        }
        assert!(dark_energy < bright_energy);
    }

    #[test]
    fn test_allpass_inverts_then_echoes() {
        let mut allpass = AllpassFilter::new(5);
        assert_eq!(allpass.process(1.0), -1.0);
        for _ in 0..4 {
            assert_eq!(allpass.process(0.0), 0.0);
        }
        assert_eq!(allpass.process(0.0), 1.0);
    }

    #[test]
    fn test_network_produces_tail() {
        let mut reverb = SchroederReverb::new(48_000.0, 0);
        let _ = reverb.process(1.0);

        // Longest comb is ~1760 samples at 48 kHz
        let has_tail = (0..5000).any(|_| reverb.process(0.0).abs() > 0.001);
        assert!(has_tail, "no tail after impulse");
    }

    #[test]
    fn test_network_stays_bounded_at_max_room() {
        let mut reverb = SchroederReverb::new(48_000.0, 0);
        reverb.set_room_size(1.0);
        reverb.set_damping(0.0);

        for _ in 0..20_000 {
            let out = reverb.process(0.1);
            assert!(out.is_finite());
            assert!(out.abs() < 10.0, "unstable: {}", out);
        }
    }

    #[test]
    fn test_reset_clears_tail() {
        let mut reverb = SchroederReverb::new(44_100.0, 0);
        for _ in 0..2000 {
            reverb.process(0.5);
        }
        reverb.reset();
        assert!((0..4000).all(|_| reverb.process(0.0) == 0.0));
    }

    #[test]
    fn test_stereo_tails_differ_at_full_width() {
        let mut reverb = StereoReverb::new(48_000.0);
        reverb.apply(&ReverbSettings {
            wet: 1.0,
            dry: 0.0,
            ..Default::default()
        });

        let mut left = vec![0.0; 8192];
        let mut right = vec![0.0; 8192];
        left[0] = 1.0;
        right[0] = 1.0;
        reverb.process(&mut left, &mut right);

        assert!(left.iter().zip(&right).any(|(l, r)| (l - r).abs() > 1e-4));
    }

    #[test]
    fn test_zero_width_collapses_to_mono() {
        let mut reverb = StereoReverb::new(48_000.0);
        reverb.apply(&ReverbSettings {
            wet: 1.0,
            dry: 0.0,
            width: 0.0,
            ..Default::default()
        });

        let mut left = vec![0.0; 4096];
        let mut right = vec![0.0; 4096];
        left[0] = 1.0;
        reverb.process(&mut left, &mut right);

        for (l, r) in left.iter().zip(&right) {
            assert!((l - r).abs() < 1e-6);
        }
    }

    #[test]
    fn test_dry_only_passes_input() {
        let mut reverb = StereoReverb::new(48_000.0);
        reverb.apply(&ReverbSettings {
            wet: 0.0,
            dry: 1.0,
            ..Default::default()
        });

        let mut left = vec![0.25; 256];
        let mut right = vec![-0.25; 256];
        reverb.process(&mut left, &mut right);
        assert!(left.iter().all(|&s| s == 0.25));
        assert!(right.iter().all(|&s| s == -0.25));
    }
}
