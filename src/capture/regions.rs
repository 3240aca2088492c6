//! Labelled regions of a trace and their shape metrics.
//!
//! A label track runs parallel to the samples: `0` is unlabelled, any other
//! value tags the sample as part of a region of that class.
use crate::capture::units::round_to_decimals;
use serde::Serialize;
/// Label given to regions found by [`threshold_regions`].
pub const PEAK_LABEL: u8 = 2;
const METRIC_DECIMALS: usize = 3;
/// A run of equally labelled samples, `start..=end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub label: u8,
    pub start: usize,
    pub end: usize,
}
impl Region {
    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }
}
/// Contiguous runs of one non-zero label, left to right.
pub fn label_regions(labels: &[u8]) -> Vec<Region> {
    let mut regions = Vec::new();
    let mut current: Option<Region> = None;
    for (i, &label) in labels.iter().enumerate() {
        if let Some(r) = current.as_mut().filter(|r| r.label == label) {
            r.end = i;
            continue;
        }
        regions.extend(current.take());
        if label != 0 {
            current = Some(Region {
                label,
                start: i,
                end: i,
            });
        }
    }
    regions.extend(current);
    regions
}
/// Runs strictly above `threshold` that are at least `min_width` samples
/// wide, labelled [`PEAK_LABEL`].
pub fn threshold_regions(samples: &[f64], threshold: f64, min_width: usize) -> Vec<Region> {
    let labels: Vec<u8> = samples
        .iter()
        .map(|&v| if v > threshold { PEAK_LABEL } else { 0 })
        .collect();
    label_regions(&labels)
        .into_iter()
        .filter(|r| r.width() >= min_width)
        .collect()
}
/// Grow every [`PEAK_LABEL`] run outwards while the trace stays above
/// `baseline`. Returns the number of newly labelled samples.
pub fn expand_to_baseline(samples: &[f64], labels: &mut [u8], baseline: f64) -> usize {
    let n = samples.len().min(labels.len());
    let mut grown = 0;
    for region in label_regions(&labels[..n]) {
        if region.label != PEAK_LABEL {
            continue;
        }
        let mut left = region.start;
        while left > 0 && labels[left - 1] == 0 && samples[left - 1] > baseline {
            left -= 1;
            labels[left] = PEAK_LABEL;
            grown += 1;
        }
        let mut right = region.end;
        while right + 1 < n && labels[right + 1] == 0 && samples[right + 1] > baseline {
            right += 1;
            labels[right] = PEAK_LABEL;
            grown += 1;
        }
    }
    grown
}
/// Shape of one region, numbered from 1 in the order given.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegionMetrics {
    pub id: usize,
    pub label: u8,
    pub start: usize,
    pub end: usize,
    pub width: usize,
    /// Full width at half maximum above `baseline`, in samples, with linear
    /// interpolation at both crossings.
    pub fwhm: f64,
    pub max_value: f64,
    pub max_index: usize,
    /// Sum of `sample - baseline` over the region.
    pub area: f64,
}
/// Measure each region of `samples`; regions reaching past the end of the
/// trace are clipped and empty ones skipped.
pub fn measure_regions(samples: &[f64], regions: &[Region], baseline: f64) -> Vec<RegionMetrics> {
    regions
        .iter()
        .filter(|r| r.start <= r.end && r.start < samples.len())
        .map(|r| Region {
            end: r.end.min(samples.len() - 1),
            ..*r
        })
        .enumerate()
        .map(|(i, r)| measure(samples, r, baseline, i + 1))
        .collect()
}
fn measure(samples: &[f64], region: Region, baseline: f64, id: usize) -> RegionMetrics {
    let Region { start, end, label } = region;
    let mut max_value = f64::NEG_INFINITY;
    let mut max_index = start;
    let mut area = 0.0;
    for (i, &v) in samples.iter().enumerate().take(end + 1).skip(start) {
        if v > max_value {
            max_value = v;
            max_index = i;
        }
        area += v - baseline;
    }
    let half = (max_value - baseline) / 2.0 + baseline;
    let mut left = max_index;
    while left > start && samples[left] > half {
        left -= 1;
    }
    let mut fwhm_start = left as f64;
    if left < end && samples[left] <= half && samples[left + 1] > half {
        let (v1, v2) = (samples[left], samples[left + 1]);
        fwhm_start = left as f64 + (half - v1) / (v2 - v1);
    }
    let mut right = max_index;
    while right < end && samples[right] > half {
        right += 1;
    }
    let mut fwhm_end = right as f64;
    if right > start && samples[right] <= half && samples[right - 1] > half {
        let (v1, v2) = (samples[right - 1], samples[right]);
        fwhm_end = (right - 1) as f64 + (half - v1) / (v2 - v1);
    }
    RegionMetrics {
        id,
        label,
        start,
        end,
        width: region.width(),
        fwhm: round_to_decimals((fwhm_end - fwhm_start).max(0.0), METRIC_DECIMALS),
        max_value: round_to_decimals(max_value, METRIC_DECIMALS),
        max_index,
        area: round_to_decimals(area, METRIC_DECIMALS),
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn region(label: u8, start: usize, end: usize) -> Region {
        Region { label, start, end }
    }
    #[test]
    fn runs_are_split_on_label_changes() {
        let labels = [0, 2, 2, 0, 1, 1, 2];
        assert_eq!(
            label_regions(&labels),
            vec![region(2, 1, 2), region(1, 4, 5), region(2, 6, 6)]
        );
        assert!(label_regions(&[0, 0]).is_empty());
        assert!(label_regions(&[]).is_empty());
    }
    #[test]
    fn threshold_keeps_wide_runs_including_trailing() {
        let samples = [0.0, 5.0, 5.0, 5.0, 0.0, 0.0, 5.0, 0.0, 3.0, 3.0];
        assert_eq!(
            threshold_regions(&samples, 1.0, 2),
            vec![region(PEAK_LABEL, 1, 3), region(PEAK_LABEL, 8, 9)]
        );
        // strictly above
        assert!(threshold_regions(&[1.0, 1.0, 1.0], 1.0, 1).is_empty());
    }
    #[test]
    fn expansion_stops_at_baseline_and_other_labels() {
        let samples = [0.0, 0.5, 1.0, 3.0, 1.0, 0.2, 0.4, 0.0];
        let mut labels = [0, 0, 0, 2, 0, 0, 1, 0];
        let grown = expand_to_baseline(&samples, &mut labels, 0.1);
        assert_eq!(labels, [0, 2, 2, 2, 2, 2, 1, 0]);
        assert_eq!(grown, 4);
    }
    #[test]
    fn triangle_metrics() {
        let samples = [0.0, 1.0, 2.0, 1.0, 0.0];
        let m = &measure_regions(&samples, &[region(2, 0, 4)], 0.0)[0];
        assert_eq!(m.id, 1);
        assert_eq!(m.width, 5);
        assert_eq!(m.max_value, 2.0);
        assert_eq!(m.max_index, 2);
        assert_eq!(m.area, 4.0);
        assert_eq!(m.fwhm, 2.0);
    }
    #[test]
    fn half_maximum_crossings_are_interpolated() {
        // half max 2.5 is crossed 3/8 of a sample from each foot
        let samples = [1.0, 5.0, 1.0];
        let m = &measure_regions(&samples, &[region(2, 0, 2)], 0.0)[0];
        assert_eq!(m.fwhm, 1.25);
    }
    #[test]
    fn baseline_offsets_area_and_half_height() {
        let samples = [1.0, 1.0, 3.0, 1.0, 1.0];
        let m = &measure_regions(&samples, &[region(2, 1, 3)], 1.0)[0];
        assert_eq!(m.area, 2.0);
        assert_eq!(m.fwhm, 1.0);
        assert_eq!((m.start, m.end, m.width), (1, 3, 3));
    }
    #[test]
    fn regions_past_the_trace_are_clipped_or_skipped() {
        let samples = [0.0, 1.0, 0.0];
        let metrics = measure_regions(&samples, &[region(2, 9, 12), region(2, 1, 7)], 0.0);
        assert_eq!(metrics.len(), 1);
        assert_eq!((metrics[0].id, metrics[0].end), (1, 2));
    }
    #[test]
    fn metrics_are_rounded_to_three_places() {
        let samples = [0.0, 0.0004, 0.0];
        let m = &measure_regions(&samples, &[region(1, 0, 2)], 0.0)[0];
        assert_eq!(m.max_value, 0.0);
        assert_eq!(m.area, 0.0);
    }
}
