//! Decoding of oscilloscope capture files.
//!
//! A capture file is a binary blob with an embedded JSON configuration block
//! followed by one marker-delimited buffer of 16-bit samples per channel.
//! [`Capture::from_paths`] decodes one or more such files, calibrates the raw
//! counts into volts and stitches consecutive files into one time series.
//! Dips in a calibrated trace are found with [`find_peaks`]; [`SavitzkyGolay`],
//! [`threshold_regions`] and [`measure_regions`] smooth a trace and measure
//! the regions standing above a threshold.
pub mod capture;
pub use capture::*;
