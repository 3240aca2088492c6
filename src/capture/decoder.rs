use std::fs;
use std::path::Path;
use log::{debug, warn};
use serde_json::Value;
use crate::capture::config::CaptureConfig;
use crate::capture::error::{CaptureError, FormatError, Result};
/// Null-delimited segment of the file that carries the configuration JSON.
const CONFIG_SEGMENT: usize = 2;
/// Four-byte big-endian marker in front of every channel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitMarker {
    Standard,
    /// Used by the fixed 1520-sample acquisition mode.
    FixedLength1520,
}
impl SplitMarker {
    pub const FIXED_DATA_LEN: usize = 1520;
    pub fn for_data_len(data_len: usize) -> Self {
        if data_len == Self::FIXED_DATA_LEN {
            SplitMarker::FixedLength1520
        } else {
            SplitMarker::Standard
        }
    }
    pub fn value(self) -> u32 {
        match self {
            SplitMarker::Standard => 0xF005_0000,
            SplitMarker::FixedLength1520 => 0xE00B_0000,
        }
    }
    pub fn bytes(self) -> [u8; 4] {
        self.value().to_be_bytes()
    }
}
/// Read and decode one capture file.
pub fn read_capture_file(path: impl AsRef<Path>) -> Result<CaptureConfig> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| CaptureError::io(path, e))?;
    debug!("read {} bytes from {}", bytes.len(), path.display());
    decode_capture(&bytes)
}
/// Decode the configuration block and every channel buffer of one capture.
pub fn decode_capture(bytes: &[u8]) -> Result<CaptureConfig> {
    let document = extract_config_json(bytes)?;
    let mut config = CaptureConfig::from_value(&document)?;
    let data_len = config.sample.data_len;
    let marker = SplitMarker::for_data_len(data_len);
    let segments = split_on_marker(bytes, &marker.bytes());
    debug!(
        "marker {:#010X}: {} channel buffers for {} configured channels",
        marker.value(),
        segments.len().saturating_sub(1),
        config.channels.len()
    );
    for (idx, channel) in config.channels.iter_mut().enumerate() {
        channel.calibrated_data.clear();
        match segments.get(idx + 1) {
            Some(segment) => {
                let samples = read_samples(segment, data_len);
                if samples.len() < data_len {
                    return Err(FormatError::ShortChannelBuffer {
                        channel: channel.name.clone(),
                        expected: data_len,
                        found: samples.len(),
                    }
                    .into());
                }
                channel.calibrate(&samples)?;
                channel.raw_data = samples;
                channel.successful_read = true;
            }
            None => {
                warn!("no sample buffer for channel {}, filling with zeros", channel.name);
                let zeros = vec![0i16; data_len];
                channel.calibrate(&zeros)?;
                channel.raw_data = zeros;
                channel.successful_read = false;
            }
        }
    }
    Ok(config)
}
/// Pull the configuration object out of the binary blob: third null-delimited
/// segment, first `{` to last `}`.
pub fn extract_config_json(bytes: &[u8]) -> Result<Value, FormatError> {
    let mut segments = bytes.split(|&b| b == 0);
    let Some(segment) = segments.nth(CONFIG_SEGMENT) else {
        return Err(FormatError::TooFewSegments {
            found: bytes.split(|&b| b == 0).count(),
        });
    };
    // Latin-1: every byte maps to one char, so stray binary never fails decoding.
    let text: String = segment.iter().map(|&b| char::from(b)).collect();
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(FormatError::MissingJson);
    };
    if end < start {
        return Err(FormatError::MissingJson);
    }
    serde_json::from_str(&text[start..=end]).map_err(FormatError::MalformedJson)
}
/// Split `bytes` on every non-overlapping occurrence of `marker`, left to right.
pub fn split_on_marker<'a>(bytes: &'a [u8], marker: &[u8]) -> Vec<&'a [u8]> {
    if marker.is_empty() {
        return vec![bytes];
    }
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + marker.len() <= bytes.len() {
        if &bytes[i..i + marker.len()] == marker {
            segments.push(&bytes[start..i]);
            i += marker.len();
            start = i;
        } else {
            i += 1;
        }
    }
    segments.push(&bytes[start..]);
    segments
}
/// First `data_len` little-endian i16 samples of a channel buffer.
fn read_samples(segment: &[u8], data_len: usize) -> Vec<i16> {
    segment
        .chunks_exact(2)
        .take(data_len)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::capture::config::tests::setup_json;
    /// Header, two filler segments, the JSON block, then one marker-prefixed
    /// buffer per entry of `buffers`.
    pub(crate) fn synthetic_capture(
        data_len: usize,
        channels: &[(&str, &str)],
        buffers: &[Vec<i16>],
    ) -> Vec<u8> {
        let mut bytes = b"\x7fSCOPE\x01".to_vec();
        bytes.push(0);
        bytes.extend_from_slice(b"\x02\x03hdr");
        bytes.push(0);
        bytes.extend_from_slice(b"\x12\x34");
        bytes.extend_from_slice(setup_json(data_len, channels).to_string().as_bytes());
        bytes.extend_from_slice(b"\x55");
        bytes.push(0);
        bytes.extend_from_slice(&[0xAA; 6]);
        let marker = SplitMarker::for_data_len(data_len).bytes();
        for buffer in buffers {
            bytes.extend_from_slice(&marker);
            for sample in buffer {
                bytes.extend_from_slice(&sample.to_le_bytes());
            }
        }
        bytes
    }
    #[test]
    fn marker_depends_on_data_len() {
        assert_eq!(SplitMarker::for_data_len(1520).value(), 0xE00B0000);
        assert_eq!(SplitMarker::for_data_len(760).value(), 0xF0050000);
        assert_eq!(SplitMarker::for_data_len(1519).value(), 0xF0050000);
        assert_eq!(SplitMarker::Standard.bytes(), [0xF0, 0x05, 0x00, 0x00]);
    }
    #[test]
    fn split_matches_bytes_split_semantics() {
        let m = [0xF0, 0x05, 0x00, 0x00];
        let data = [1, 0xF0, 0x05, 0x00, 0x00, 2, 3, 0xF0, 0x05, 0x00, 0x00];
        let parts = split_on_marker(&data, &m);
        let expected: Vec<&[u8]> = vec![&[1u8][..], &[2u8, 3][..], &[0u8; 0][..]];
        assert_eq!(parts, expected);
        assert_eq!(split_on_marker(&[1, 2], &m), vec![&[1u8, 2][..]]);
        let empty: &[u8] = &[];
        assert_eq!(split_on_marker(empty, &m), vec![empty]);
        assert_eq!(split_on_marker(&m, &m), vec![empty, empty]);
    }
    #[test]
    fn decodes_all_channels() {
        let bytes = synthetic_capture(
            4,
            &[("CH1", "ON"), ("CH2", "ON")],
            &[vec![400, -400, 0, 800], vec![1, 2, 3, 4]],
        );
        let config = decode_capture(&bytes).unwrap();
        assert_eq!(config.idn, "OWON,HDS2202S,2023001,V3.0.0");
        let ch1 = &config.channels[0];
        assert!(ch1.successful_read);
        assert_eq!(ch1.raw_data, vec![400, -400, 0, 800]);
        assert_eq!(ch1.calibrated_data, vec![1.0, -1.0, 0.0, 2.0]);
        let ch2 = &config.channels[1];
        assert_eq!(ch2.raw_data, vec![1, 2, 3, 4]);
        assert_eq!(ch2.calibrated_data.len(), 4);
    }
    #[test]
    fn extra_samples_are_truncated_to_data_len() {
        let bytes = synthetic_capture(2, &[("CH1", "ON")], &[vec![10, 20, 30, 40]]);
        let config = decode_capture(&bytes).unwrap();
        assert_eq!(config.channels[0].raw_data, vec![10, 20]);
        assert_eq!(config.channels[0].calibrated_data.len(), 2);
    }
    #[test]
    fn missing_buffer_is_zero_filled() {
        let bytes = synthetic_capture(3, &[("CH1", "ON"), ("CH2", "OFF")], &[vec![7, 8, 9]]);
        let config = decode_capture(&bytes).unwrap();
        assert!(config.channels[0].successful_read);
        let ch2 = &config.channels[1];
        assert!(!ch2.successful_read);
        assert_eq!(ch2.raw_data, vec![0, 0, 0]);
        assert_eq!(ch2.calibrated_data, vec![0.0, 0.0, 0.0]);
    }
    #[test]
    fn fixed_length_mode_uses_alternate_marker() {
        let samples: Vec<i16> = (0..1520).map(|i| (i % 200) as i16).collect();
        let bytes = synthetic_capture(1520, &[("CH1", "ON")], &[samples.clone()]);
        assert_eq!(split_on_marker(&bytes, &SplitMarker::Standard.bytes()).len(), 1);
        let config = decode_capture(&bytes).unwrap();
        assert!(config.channels[0].successful_read);
        assert_eq!(config.channels[0].raw_data, samples);
    }
    #[test]
    fn short_buffer_fails_the_decode() {
        let bytes = synthetic_capture(8, &[("CH1", "ON")], &[vec![1, 2, 3]]);
        assert!(matches!(
            decode_capture(&bytes),
            Err(CaptureError::Format(FormatError::ShortChannelBuffer { expected: 8, found: 3, .. }))
        ));
    }
    #[test]
    fn too_few_segments() {
        assert!(matches!(
            extract_config_json(b"header\0only"),
            Err(FormatError::TooFewSegments { found: 2 })
        ));
    }
    #[test]
    fn missing_or_broken_json() {
        assert!(matches!(
            extract_config_json(b"a\0b\0no braces here"),
            Err(FormatError::MissingJson)
        ));
        assert!(matches!(
            extract_config_json(b"a\0b\0} backwards {"),
            Err(FormatError::MissingJson)
        ));
        assert!(matches!(
            extract_config_json(b"a\0b\0{\"timebase\": }"),
            Err(FormatError::MalformedJson(_))
        ));
    }
    #[test]
    fn non_ascii_bytes_in_config_segment_decode() {
        let mut bytes = synthetic_capture(2, &[("CH1", "ON")], &[vec![1, 2]]);
        // 0xB5 is the Latin-1 micro sign: swap it in for the `u` of "500us"
        let unit = bytes
            .windows(5)
            .position(|w| w == b"500us")
            .unwrap();
        bytes[unit + 3] = 0xB5;
        // and put high bytes on both sides of the braces
        let open = bytes.iter().position(|&b| b == b'{').unwrap();
        bytes.splice(open..open, [0xB5, 0xFF, 0x80]);
        let close = bytes.iter().rposition(|&b| b == b'}').unwrap();
        bytes.splice(close + 1..close + 1, [0xE9, 0xB5]);
        let config = decode_capture(&bytes).unwrap();
        assert_eq!(config.timebase.scale, "500\u{b5}s");
        assert_eq!(config.timebase.scale, "500µs");
        assert_eq!(config.channels[0].raw_data, vec![1, 2]);
        assert!(config.channels[0].successful_read);
    }
    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("scopecap-does-not-exist.bin");
        assert!(matches!(
            read_capture_file(&path),
            Err(CaptureError::Io { .. })
        ));
    }
}
