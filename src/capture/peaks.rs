//! Dip detection on calibrated waveforms.
//!
//! Dips are found as local maxima of the negated signal, then thinned out by a
//! minimum horizontal distance (tallest first) and finally filtered by
//! topographic prominence.
use std::ops::Range;
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakConfig {
    /// Minimum number of samples between two reported peaks.
    pub distance: usize,
    /// Minimum prominence, in volts.
    pub prominence: f64,
}
impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            distance: 5,
            prominence: 0.02,
        }
    }
}
/// Indices of the dips in `samples`, ascending, using [`PeakConfig::default`].
pub fn find_peaks(samples: &[f64]) -> Vec<usize> {
    find_peaks_with(samples, PeakConfig::default())
}
/// Same as [`find_peaks`] on `samples[range]`; indices are relative to the
/// window. Out-of-bounds ranges are clamped like a slice would be in a
/// forgiving language: an empty or inverted range yields no peaks.
pub fn find_peaks_in(samples: &[f64], range: Option<Range<usize>>, config: PeakConfig) -> Vec<usize> {
    let window = match range {
        Some(range) => {
            let end = range.end.min(samples.len());
            let start = range.start.min(end);
            &samples[start..end]
        }
        None => samples,
    };
    find_peaks_with(window, config)
}
pub fn count_peaks(samples: &[f64]) -> usize {
    find_peaks(samples).len()
}
pub fn find_peaks_with(samples: &[f64], config: PeakConfig) -> Vec<usize> {
    let inverted: Vec<f64> = samples.iter().map(|v| -v).collect();
    let candidates = local_maxima(&inverted);
    let spaced = select_by_distance(&inverted, &candidates, config.distance);
    spaced
        .into_iter()
        .filter(|&peak| prominence(&inverted, peak) >= config.prominence)
        .collect()
}
/// Strict local maxima, excluding both edges. A flat top counts once, at its
/// middle sample (rounded down).
fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                let left = i;
                let right = ahead - 1;
                peaks.push((left + right) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}
/// Drop peaks closer than `distance` to a higher one. Equal heights are
/// resolved in favour of the later peak.
fn select_by_distance(x: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    if distance <= 1 || peaks.len() < 2 {
        return peaks.to_vec();
    }
    let mut keep = vec![true; peaks.len()];
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]));
    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }
    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&peak, kept)| kept.then_some(peak))
        .collect()
}
/// Height of `peak` above the higher of the two lowest points reachable on
/// each side without climbing above the peak.
fn prominence(x: &[f64], peak: usize) -> f64 {
    let top = x[peak];
    let left_min = x[..=peak]
        .iter()
        .rev()
        .take_while(|&&v| v <= top)
        .fold(top, |acc, &v| acc.min(v));
    let right_min = x[peak..]
        .iter()
        .take_while(|&&v| v <= top)
        .fold(top, |acc, &v| acc.min(v));
    top - left_min.max(right_min)
}
