//! Signal summing, wet/dry blending and panning primitives.

/*
Summing and Panning
===================

Vocabulary
----------

  summing       Adding signals at equal levels (no weighting). This is how the
                mixer combines channels into the master bus. It can exceed
                [-1.0, +1.0] when several loud channels line up.

  wet/dry       Effect mixing.
                  dry = original signal (unprocessed)
                  wet = effect signal (processed)
                A "30% wet" mix means mix = 0.3.

  pan           Stereo placement, -1.0 (hard left) to +1.0 (hard right).


Wet/Dry: Linear Crossfade
-------------------------

    output = dry × (1 - mix) + wet × mix

The weights sum to 1.0, so a fully correlated wet and dry never boost.


Equal-Gain Pan
--------------

The channel being panned towards stays at unity. The opposite channel is
attenuated linearly:

    pan ≤ 0:  left = 1.0        right = 1.0 + pan
    pan ≥ 0:  left = 1.0 - pan  right = 1.0

    Gain
      1.0 ───────────┬───────────
          ╲ right    │    left ╱
           ╲         │        ╱    (mirror: the far side falls off)
      0.0   ╲────────┴───────╱
          -1.0      0.0     +1.0
                    pan

At centre both channels pass at unity, so a centred track is not quieter than
the dry input. This is not a constant-power law: a hard-panned mono source is
as loud as a centred one on its side and silent on the other.
*/

/// `a += b`, sample by sample. No clipping: the mixer sums at full range.
#[inline]
pub fn sum_in_place(a: &mut [f32], b: &[f32]) {
    debug_assert_eq!(a.len(), b.len());
    a.iter_mut().zip(b).for_each(|(acc, &x)| *acc += x);
}

/// Crossfade the processed signal in `wet` against `dry` by `mix` (0 = dry).
#[inline]
pub fn apply_dry_wet(dry: &[f32], wet: &mut [f32], mix: f32) {
    debug_assert_eq!(dry.len(), wet.len());
    if mix >= 1.0 {
        return;
    }
    let mix = mix.max(0.0);
    let keep = 1.0 - mix;
    for (w, &d) in wet.iter_mut().zip(dry) {
        *w = d * keep + *w * mix;
    }
}

/// Left/right gains for an equal-gain pan position in [-1, 1].
#[inline]
pub fn equal_gain_pan(pan: f32) -> (f32, f32) {
    let pan = pan.clamp(-1.0, 1.0);
    let left = if pan <= 0.0 { 1.0 } else { 1.0 - pan };
    let right = if pan >= 0.0 { 1.0 } else { 1.0 + pan };
    (left, right)
}
