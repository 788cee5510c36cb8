/*
Identity Phase Locking
======================

A plain phase vocoder advances every bin's phase on its own. For a sinusoid
that spreads over several bins this slowly scrambles the phase relation
between them, which is heard as "phasiness".

Identity locking treats each spectral peak as the owner of the bins around
it. Only the peak's synthesis phase is accumulated; every other bin keeps
the analysis phase offset it had from its peak:

    synth[j] = synth[p] + (analysis[j] - analysis[p])

Regions are split halfway between neighbouring peaks:

    magnitude
       │     p0               p1
       │     ▲                ▲
       │    ╱ ╲              ╱ ╲
       │   ╱   ╲____    ____╱   ╲
       └──────────────┼──────────────  bin
          owned by p0 │ owned by p1
*/

use super::wrap_phase;

/// Relative magnitude below which a local maximum is not treated as a peak.
const PEAK_THRESHOLD: f32 = 1e-6;

/// Collect indices of local maxima in `magnitude` into `peaks`.
///
/// `peaks` must have capacity for `magnitude.len()` entries; it is cleared
/// first and never grows beyond that.
pub fn find_peaks(magnitude: &[f32], peaks: &mut Vec<usize>) {
    peaks.clear();
    let len = magnitude.len();
    if len < 3 {
        return;
    }

    let loudest = magnitude.iter().fold(0.0f32, |a, &m| a.max(m));
    let threshold = loudest * PEAK_THRESHOLD;

    for j in 1..len - 1 {
        let m = magnitude[j];
        if m > threshold && m > magnitude[j - 1] && m >= magnitude[j + 1] {
            peaks.push(j);
        }
    }
}

/// Last bin (inclusive) owned by `peaks[i]`: halfway to the next peak, or the
/// final bin of a `len`-bin spectrum.
#[inline]
pub fn region_end(peaks: &[usize], i: usize, len: usize) -> usize {
    match peaks.get(i + 1) {
        Some(&next) => (peaks[i] + next) / 2,
        None => len - 1,
    }
}

/// Rewrite the synthesis phase of every non-peak bin relative to its peak.
pub fn lock_to_peaks(peaks: &[usize], analysis_phase: &[f32], synth_phase: &mut [f64]) {
    if peaks.is_empty() {
        return;
    }

    let len = synth_phase.len();
    let mut start = 0;
    for (i, &peak) in peaks.iter().enumerate() {
        let end = region_end(peaks, i, len);

        let peak_synth = synth_phase[peak];
        let peak_analysis = analysis_phase[peak] as f64;
        for j in start..=end {
            if j != peak {
                synth_phase[j] =
                    wrap_phase(peak_synth + analysis_phase[j] as f64 - peak_analysis);
            }
        }
        start = end + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_local_maxima() {
        let magnitude = [0.0, 1.0, 0.5, 0.2, 0.8, 0.3, 0.1];
        let mut peaks = Vec::with_capacity(magnitude.len());
        find_peaks(&magnitude, &mut peaks);
        assert_eq!(peaks, vec![1, 4]);
    }

    #[test]
    fn test_silent_spectrum_has_no_peaks() {
        let mut peaks = Vec::with_capacity(8);
        find_peaks(&[0.0; 8], &mut peaks);
        assert!(peaks.is_empty());
    }

    #[test]
    fn test_non_peak_bins_follow_their_peak() {
        let peaks = [2, 7];
        let analysis: Vec<f32> = (0..10).map(|j| j as f32 * 0.1).collect();
        let mut synth = vec![0.0f64; 10];
        synth[2] = 1.0;
        synth[7] = -1.0;

        lock_to_peaks(&peaks, &analysis, &mut synth);

        // Bins 0..=4 belong to peak 2, 5..=9 to peak 7
        for j in 0..=4 {
            let expected = 1.0 + (analysis[j] - analysis[2]) as f64;
            assert!((synth[j] - expected).abs() < 1e-6, "bin {j}");
        }
        for j in 5..10 {
            let expected = -1.0 + (analysis[j] - analysis[7]) as f64;
            assert!((synth[j] - expected).abs() < 1e-6, "bin {j}");
        }
    }

    #[test]
    fn test_regions_split_halfway() {
        let peaks = [2, 7, 12];
        assert_eq!(region_end(&peaks, 0, 16), 4);
        assert_eq!(region_end(&peaks, 1, 16), 9);
        assert_eq!(region_end(&peaks, 2, 16), 15);
    }

    #[test]
    fn test_no_peaks_leaves_phases_alone() {
        let mut synth = vec![0.25f64; 4];
        lock_to_peaks(&[], &[0.0; 4], &mut synth);
        assert!(synth.iter().all(|&p| p == 0.25));
    }
}
