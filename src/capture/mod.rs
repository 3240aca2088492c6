// src/capture/mod.rs
// Submodules declared in this directory
pub mod config;
pub mod decoder;
pub mod error;
pub mod export;
pub mod fields;
pub mod filters;
pub mod merger;
pub mod peaks;
pub mod plot;
pub mod regions;
pub mod scope;
pub mod units;
// Re-export the public types so callers can use `scopecap::Capture` etc.
pub use config::{
    calibrate_sample, CaptureConfig, ChannelConfig, SampleConfig, Tag, TimeBase, TriggerConfig,
    TriggerItems,
};
pub use decoder::{decode_capture, extract_config_json, read_capture_file, split_on_marker, SplitMarker};
pub use error::{CaptureError, ConsistencyError, FormatError, Result};
pub use export::{write_regions_csv, write_signal_csv, SignalTable};
pub use filters::{align_baseline, central_derivative, invert, r_squared, SavitzkyGolay};
pub use merger::merge_captures;
pub use peaks::{count_peaks, find_peaks, find_peaks_in, find_peaks_with, PeakConfig};
pub use plot::{render_channel_png, render_screen_png, PlotStyle};
pub use regions::{
    expand_to_baseline, label_regions, measure_regions, threshold_regions, Region, RegionMetrics,
    PEAK_LABEL,
};
pub use scope::Capture;
pub use units::{parse_probe_multiplier, parse_voltage, round_to_decimals};
