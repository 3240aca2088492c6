use std::fmt;
use std::ops::Range;
use serde::Serialize;
use serde_json::{Number, Value};
use crate::capture::error::FormatError;
use crate::capture::fields::Fields;
use crate::capture::peaks::{self, PeakConfig};
use crate::capture::units::{parse_probe_multiplier, parse_voltage, round_to_decimals};
/// Instrument setting that shows up as text, a bare number or a boolean,
/// depending on firmware (`"depmem": "4K"` vs `"depmem": 4000`).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Tag {
    Text(String),
    Number(Number),
    Flag(bool),
}
impl Tag {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Tag::Text(s.clone())),
            Value::Number(n) => Some(Tag::Number(n.clone())),
            Value::Bool(b) => Some(Tag::Flag(*b)),
            _ => None,
        }
    }
}
impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Text(s) => f.write_str(s),
            Tag::Number(n) => write!(f, "{n}"),
            Tag::Flag(b) => write!(f, "{b}"),
        }
    }
}
impl<'a> Fields<'a> {
    pub fn tag(&self, field: &str) -> Result<Tag, FormatError> {
        Tag::from_value(self.required(field)?)
            .ok_or_else(|| self.invalid(field, "text, number or boolean"))
    }
    /// Field copied through untouched; only its presence is checked.
    pub fn passthrough(&self, field: &str) -> Result<Value, FormatError> {
        self.required(field).cloned()
    }
}
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeBase {
    /// Time per division, e.g. `"500us"`.
    pub scale: String,
    #[serde(rename = "hoffset")]
    pub h_offset: f64,
}
impl TimeBase {
    pub fn from_fields(fields: &Fields<'_>) -> Result<Self, FormatError> {
        Ok(Self {
            scale: fields.string("scale")?,
            h_offset: fields.number("hoffset")?,
        })
    }
}
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SampleConfig {
    #[serde(rename = "fullscreen")]
    pub full_screen: bool,
    #[serde(rename = "slowmove")]
    pub slow_move: bool,
    /// Samples per channel in one capture file.
    #[serde(rename = "datalen")]
    pub data_len: usize,
    #[serde(rename = "samplerate")]
    pub sample_rate: Tag,
    #[serde(rename = "type")]
    pub kind: Tag,
    #[serde(rename = "depmem")]
    pub dep_mem: Tag,
    pub precision: Tag,
}
impl SampleConfig {
    pub fn from_fields(fields: &Fields<'_>) -> Result<Self, FormatError> {
        let data_len = fields.count("datalen")?;
        if data_len == 0 {
            return Err(FormatError::ZeroDataLen);
        }
        Ok(Self {
            full_screen: fields.flag("fullscreen")?,
            slow_move: fields.flag("slowmove")?,
            data_len,
            sample_rate: fields.tag("samplerate")?,
            kind: fields.tag("type")?,
            dep_mem: fields.tag("depmem")?,
            precision: fields.tag("precision")?,
        })
    }
}
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChannelConfig {
    pub name: String,
    /// `"ON"` when the trace is shown on the instrument screen.
    pub display: String,
    pub current_rate: Value,
    pub current_ratio: Value,
    pub measure_current_switch: Value,
    pub coupling: String,
    /// Probe attenuation token, e.g. `"10X"`.
    pub probe: String,
    /// Volts per division, e.g. `"500mV"`.
    pub scale: String,
    /// Vertical offset in percent of full scale.
    pub offset: f64,
    pub frequence: Value,
    pub inverse: bool,
    pub raw_data: Vec<i16>,
    #[serde(rename = "data")]
    pub calibrated_data: Vec<f64>,
    pub successful_read: bool,
}
impl ChannelConfig {
    /// Build a channel from its configuration object. `raw_data`, `data` and
    /// `successful_read` are optional so that both the bare instrument block and
    /// an exported capture can be read.
    pub fn from_fields(fields: &Fields<'_>) -> Result<Self, FormatError> {
        let raw_data = match fields.get("raw_data") {
            Some(_) => fields
                .array("raw_data")?
                .iter()
                .map(|v| v.as_i64().and_then(|n| i16::try_from(n).ok()))
                .collect::<Option<Vec<i16>>>()
                .ok_or_else(|| fields.invalid("raw_data", "list of 16-bit samples"))?,
            None => Vec::new(),
        };
        let calibrated_data = match fields.get("data") {
            Some(_) => fields
                .array("data")?
                .iter()
                .map(Value::as_f64)
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| fields.invalid("data", "list of voltages"))?,
            None => Vec::new(),
        };
        let successful_read = match fields.get("successful_read") {
            Some(_) => fields.flag("successful_read")?,
            None => false,
        };
        Ok(Self {
            name: fields.string("name")?,
            display: fields.string("display")?,
            current_rate: fields.passthrough("current_rate")?,
            current_ratio: fields.passthrough("current_ratio")?,
            measure_current_switch: fields.passthrough("measure_current_switch")?,
            coupling: fields.string("coupling")?,
            probe: fields.string("probe")?,
            scale: fields.string("scale")?,
            offset: fields.number("offset")?,
            frequence: fields.passthrough("frequence")?,
            inverse: fields.flag("inverse")?,
            raw_data,
            calibrated_data,
            successful_read,
        })
    }
    pub fn is_displayed(&self) -> bool {
        self.display.eq_ignore_ascii_case("ON")
    }
    /// Convert raw instrument counts to volts and append them to
    /// `calibrated_data`. Scale and probe labels are parsed once per call.
    pub fn calibrate(&mut self, raw_samples: &[i16]) -> Result<(), FormatError> {
        let volts_per_div = parse_voltage(&self.scale)?;
        let probe = parse_probe_multiplier(&self.probe)? as f64;
        let offset = self.offset;
        self.calibrated_data.extend(
            raw_samples
                .iter()
                .map(|&raw| calibrate_sample(raw, offset, volts_per_div, probe)),
        );
        Ok(())
    }
    pub fn find_peaks(&self, range: Option<Range<usize>>) -> Vec<usize> {
        peaks::find_peaks_in(&self.calibrated_data, range, PeakConfig::default())
    }
    pub fn count_peaks(&self, range: Option<Range<usize>>) -> usize {
        self.find_peaks(range).len()
    }
    /// Raw samples of one file-sized frame, as the instrument screen shows them.
    /// Frames past the end yield an empty slice.
    pub fn raw_frame(&self, frame: usize, data_len: usize) -> &[i16] {
        let start = (frame * data_len).min(self.raw_data.len());
        let end = (start + data_len).min(self.raw_data.len());
        &self.raw_data[start..end]
    }
}
/// `(5 * raw / 2000 - offset * 2 / 100) * volts_per_div * probe`, rounded to
/// millivolt resolution with exact ties going to the even neighbour.
pub fn calibrate_sample(raw: i16, offset_percent: f64, volts_per_div: f64, probe: f64) -> f64 {
    let volts = (5.0 * f64::from(raw) / 2000.0 - offset_percent * 2.0 / 100.0) * volts_per_div * probe;
    round_to_decimals(volts, 3)
}
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TriggerItems {
    pub channel: Tag,
    pub level: Tag,
    pub edge: Tag,
    pub coupling: Tag,
    pub holdoff: Tag,
}
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TriggerConfig {
    pub mode: Tag,
    #[serde(rename = "type")]
    pub kind: Tag,
    pub items: TriggerItems,
    pub sweep: Tag,
}
impl TriggerConfig {
    pub fn from_fields(fields: &Fields<'_>) -> Result<Self, FormatError> {
        let items = fields.nested("items")?;
        Ok(Self {
            mode: fields.tag("mode")?,
            kind: fields.tag("type")?,
            items: TriggerItems {
                channel: items.tag("channel")?,
                level: items.tag("level")?,
                edge: items.tag("edge")?,
                coupling: items.tag("coupling")?,
                holdoff: items.tag("holdoff")?,
            },
            sweep: fields.tag("sweep")?,
        })
    }
}
/// Everything the instrument stores about one acquisition, plus the decoded
/// channel samples.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaptureConfig {
    pub timebase: TimeBase,
    pub sample: SampleConfig,
    #[serde(rename = "channel")]
    pub channels: Vec<ChannelConfig>,
    #[serde(rename = "datatype")]
    pub data_type: Tag,
    #[serde(rename = "runstatus")]
    pub run_status: Tag,
    pub idn: String,
    pub model: String,
    #[serde(rename = "trig")]
    pub trigger: Option<TriggerConfig>,
}
impl CaptureConfig {
    pub fn from_value(document: &Value) -> Result<Self, FormatError> {
        let fields = Fields::new("document", document)?;
        let channels = fields
            .array("channel")?
            .iter()
            .enumerate()
            .map(|(idx, ch)| ChannelConfig::from_fields(&Fields::new(format!("channel[{idx}]"), ch)?))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            timebase: TimeBase::from_fields(&fields.nested("timebase")?)?,
            sample: SampleConfig::from_fields(&fields.nested("sample")?)?,
            channels,
            data_type: fields.tag("datatype")?,
            run_status: fields.tag("runstatus")?,
            idn: fields.string("idn")?,
            model: fields.string("model")?,
            trigger: parse_trigger(&fields),
        })
    }
    pub fn channel(&self, name: &str) -> Option<&ChannelConfig> {
        self.channels.iter().find(|ch| ch.name == name)
    }
    pub fn active_channels(&self) -> impl Iterator<Item = &ChannelConfig> {
        self.channels.iter().filter(|ch| ch.is_displayed())
    }
}
fn parse_trigger(fields: &Fields<'_>) -> Option<TriggerConfig> {
    match fields.get("trig") {
        None | Some(Value::Null) => None,
        Some(value) => match Fields::new("trig", value).and_then(|f| TriggerConfig::from_fields(&f)) {
            Ok(trigger) => Some(trigger),
            Err(err) => {
                log::warn!("ignoring trigger configuration: {err}");
                None
            }
        },
    }
}
