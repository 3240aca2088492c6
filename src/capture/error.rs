use std::path::PathBuf;
use thiserror::Error;
/// Structural problems with a capture file or its embedded configuration.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("missing required field `{field}` in {section}")]
    MissingField { section: String, field: String },
    #[error("field `{field}` in {section} is not a valid {expected}")]
    InvalidField {
        section: String,
        field: String,
        expected: &'static str,
    },
    #[error("no numeric value at the start of `{text}`")]
    MissingNumber { text: String },
    #[error("unknown unit `{unit}` in `{text}`")]
    UnknownUnit { text: String, unit: String },
    #[error("probe token `{text}` is not an attenuation like `10X`")]
    InvalidProbe { text: String },
    #[error("expected at least 3 null-delimited segments, found {found}")]
    TooFewSegments { found: usize },
    #[error("no embedded JSON object found in the configuration segment")]
    MissingJson,
    #[error("embedded configuration is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),
    #[error("sample.datalen must be greater than zero")]
    ZeroDataLen,
    #[error("channel {channel} buffer holds {found} samples, expected {expected}")]
    ShortChannelBuffer {
        channel: String,
        expected: usize,
        found: usize,
    },
}
/// Mismatches between captures that are supposed to describe one acquisition.
#[derive(Debug, Error)]
pub enum ConsistencyError {
    #[error("nothing to merge: no captures given")]
    NoCaptures,
    #[error("capture #{index} has {actual} channels, expected {expected}")]
    ChannelCountMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("capture #{index} channel {position} is `{actual}`, expected `{expected}`")]
    ChannelNameMismatch {
        index: usize,
        position: usize,
        expected: String,
        actual: String,
    },
    #[error("capture #{index} has datalen {actual}, expected {expected}")]
    DataLenMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("channel {channel} has {raw} raw samples but {calibrated} calibrated samples")]
    SampleLengthMismatch {
        channel: String,
        raw: usize,
        calibrated: usize,
    },
}
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
    #[error("failed to serialize capture: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl CaptureError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CaptureError::Io {
            path: path.into(),
            source,
        }
    }
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for CaptureError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        CaptureError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for CaptureError {
    fn from(value: image::ImageError) -> Self {
        CaptureError::Plot(value.to_string())
    }
}
pub type Result<T, E = CaptureError> = std::result::Result<T, E>;
