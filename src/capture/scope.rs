use std::fs;
use std::path::{Path, PathBuf};
use log::info;
use serde::Serialize;
use serde_json::Value;
use crate::capture::config::{CaptureConfig, ChannelConfig};
use crate::capture::decoder::read_capture_file;
use crate::capture::error::{CaptureError, FormatError, Result};
use crate::capture::fields::Fields;
use crate::capture::merger::merge_captures;
/// One logical acquisition, possibly stitched together from several files.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Capture {
    pub file_paths: Vec<PathBuf>,
    #[serde(flatten)]
    pub config: CaptureConfig,
}
impl Capture {
    /// Decode every file and merge them in the given order.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let file_paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        let decoded = file_paths
            .iter()
            .map(read_capture_file)
            .collect::<Result<Vec<_>>>()?;
        let config = merge_captures(decoded)?;
        info!("loaded capture from {} file(s)", file_paths.len());
        Ok(Self { file_paths, config })
    }
    pub fn from_config(file_paths: Vec<PathBuf>, config: CaptureConfig) -> Self {
        Self { file_paths, config }
    }
    /// Parse an exported capture. Key case is ignored; `file_paths` is optional.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(text).map_err(FormatError::MalformedJson)?;
        let config = CaptureConfig::from_value(&document)?;
        let fields = Fields::new("document", &document)?;
        let file_paths = match fields.get("file_paths") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(PathBuf::from))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| fields.invalid("file_paths", "list of paths"))?,
            Some(_) => return Err(fields.invalid("file_paths", "list of paths").into()),
        };
        Ok(Self { file_paths, config })
    }
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CaptureError::io(path, e))?;
        Self::from_json_str(&text)
    }
    /// Write the capture as JSON, creating the parent directory if needed.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CaptureError::io(parent, e))?;
        }
        fs::write(path, self.to_json_string()?).map_err(|e| CaptureError::io(path, e))
    }
    pub fn channels(&self) -> &[ChannelConfig] {
        &self.config.channels
    }
    pub fn channel(&self, name: &str) -> Option<&ChannelConfig> {
        self.config.channel(name)
    }
    pub fn active_channels(&self) -> Vec<&ChannelConfig> {
        self.config.active_channels().collect()
    }
    pub fn data_len(&self) -> usize {
        self.config.sample.data_len
    }
    /// Number of file-sized frames held by the longest channel.
    pub fn frame_count(&self) -> usize {
        let longest = self
            .config
            .channels
            .iter()
            .map(|c| c.raw_data.len())
            .max()
            .unwrap_or(0);
        longest.div_ceil(self.data_len())
    }
}
