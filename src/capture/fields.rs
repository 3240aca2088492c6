use std::collections::BTreeMap;
use serde_json::Value;
use crate::capture::error::FormatError;
/// Key/value view over one JSON object with lower-cased keys.
///
/// The instrument writes `Timebase`, `DataLen`, `HOffset` and so on, while the
/// exported JSON uses lower snake case. Every lookup goes through here so both
/// spellings resolve to the same field and a missing one is reported by name.
pub struct Fields<'a> {
    section: String,
    entries: BTreeMap<String, &'a Value>,
}
impl<'a> Fields<'a> {
    pub fn new(section: impl Into<String>, value: &'a Value) -> Result<Self, FormatError> {
        let section = section.into();
        let object = value.as_object().ok_or_else(|| FormatError::InvalidField {
            section: "document".to_string(),
            field: section.clone(),
            expected: "object",
        })?;
        let entries = object
            .iter()
            .map(|(key, value)| (key.to_lowercase(), value))
            .collect();
        Ok(Self { section, entries })
    }
    pub fn section(&self) -> &str {
        &self.section
    }
    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.entries.get(field).copied()
    }
    pub fn required(&self, field: &str) -> Result<&'a Value, FormatError> {
        self.get(field).ok_or_else(|| FormatError::MissingField {
            section: self.section.clone(),
            field: field.to_string(),
        })
    }
    pub fn string(&self, field: &str) -> Result<String, FormatError> {
        match self.required(field)? {
            Value::String(s) => Ok(s.clone()),
            _ => Err(self.invalid(field, "string")),
        }
    }
    pub fn number(&self, field: &str) -> Result<f64, FormatError> {
        let value = self.required(field)?;
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| self.invalid(field, "number"))
    }
    pub fn count(&self, field: &str) -> Result<usize, FormatError> {
        let value = self.required(field)?;
        match value {
            Value::Number(n) => n.as_u64().map(|v| v as usize),
            Value::String(s) => s.trim().parse::<usize>().ok(),
            _ => None,
        }
        .ok_or_else(|| self.invalid(field, "non-negative integer"))
    }
    /// Accepts JSON booleans, 0/1 numbers and the ON/OFF/TRUE/FALSE strings
    /// the instrument uses for toggles.
    pub fn flag(&self, field: &str) -> Result<bool, FormatError> {
        let value = self.required(field)?;
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|v| v != 0.0),
            Value::String(s) => match s.trim().to_ascii_uppercase().as_str() {
                "ON" | "TRUE" | "1" => Some(true),
                "OFF" | "FALSE" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
        .ok_or_else(|| self.invalid(field, "flag"))
    }
    pub fn array(&self, field: &str) -> Result<&'a Vec<Value>, FormatError> {
        self.required(field)?
            .as_array()
            .ok_or_else(|| self.invalid(field, "array"))
    }
    pub fn nested(&self, field: &str) -> Result<Fields<'a>, FormatError> {
        let value = self.required(field)?;
        Fields::new(field, value)
    }
    pub fn invalid(&self, field: &str, expected: &'static str) -> FormatError {
        FormatError::InvalidField {
            section: self.section.clone(),
            field: field.to_string(),
            expected,
        }
    }
}
