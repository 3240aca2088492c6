//! Parsing of the physical-unit labels the instrument writes into its
//! configuration block, e.g. a vertical scale of `"500mV"` or a probe of `"10X"`.
use once_cell::sync::Lazy;
use regex::Regex;
use crate::capture::error::FormatError;
static VALUE_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)\s*([a-zA-Zµ]+)?").expect("valid unit regex")
});
/// Unit suffixes understood by [`parse_voltage`], with their factor to volts.
/// Lookup is case-sensitive: `mV` and `MV` are different things.
pub const VOLTAGE_UNITS: [(&str, f64); 3] = [("mV", 0.001), ("V", 1.0), ("KV", 1000.0)];
/// Split `"1.5 V"` into `(1.5, Some("V"))`.
pub fn split_value_and_unit(text: &str) -> Result<(f64, Option<&str>), FormatError> {
    let caps = VALUE_WITH_UNIT
        .captures(text)
        .ok_or_else(|| FormatError::MissingNumber {
            text: text.to_string(),
        })?;
    let value = caps[1]
        .parse::<f64>()
        .map_err(|_| FormatError::MissingNumber {
            text: text.to_string(),
        })?;
    Ok((value, caps.get(2).map(|m| m.as_str())))
}
/// Parse a voltage label into volts.
///
/// A label without a unit is rejected the same way as an unknown unit.
pub fn parse_voltage(text: &str) -> Result<f64, FormatError> {
    let (value, unit) = split_value_and_unit(text)?;
    let unit = unit.unwrap_or_default();
    VOLTAGE_UNITS
        .iter()
        .find(|(suffix, _)| *suffix == unit)
        .map(|(_, coeff)| value * coeff)
        .ok_or_else(|| FormatError::UnknownUnit {
            text: text.to_string(),
            unit: unit.to_string(),
        })
}
/// Parse a probe attenuation token such as `"10X"` or `"1x"`.
pub fn parse_probe_multiplier(text: &str) -> Result<i64, FormatError> {
    let digits: String = text.chars().filter(|c| !matches!(c, 'x' | 'X')).collect();
    digits
        .trim()
        .parse::<i64>()
        .map_err(|_| FormatError::InvalidProbe {
            text: text.to_string(),
        })
}
/// Round to `decimals` places on the exact binary value; exact ties go to the
/// even digit.
pub fn round_to_decimals(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.decimals$}").parse().unwrap_or(value)
}
