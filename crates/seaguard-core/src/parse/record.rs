use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::validate::parse_number;

/// Latitude spellings in precedence order.
pub const LATITUDE_KEYS: &[&str] = &["lat", "latitude"];
/// Longitude spellings in precedence order.
pub const LONGITUDE_KEYS: &[&str] = &["lon", "longitude"];

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Structured(Value),
}

impl FieldValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(*flag),
            Value::Number(number) => number
                .as_f64()
                .map_or_else(|| Self::Text(number.to_string()), Self::Number),
            Value::String(text) => Self::Text(text.clone()),
            Value::Array(_) | Value::Object(_) => Self::Structured(value.clone()),
        }
    }

    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            Self::Null
        } else {
            Self::Text(trimmed.to_string())
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value).filter(|value| value.is_finite()),
            Self::Text(text) => parse_number(text),
            _ => None,
        }
    }

    /// Scalar text form; `None` for blanks and structured values.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.trim().to_string()).filter(|text| !text.is_empty()),
            Self::Number(value) => Some(value.to_string()),
            Self::Bool(flag) => Some(flag.to_string()),
            Self::Null | Self::Structured(_) => None,
        }
    }

    pub fn display_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Structured(value) => value.to_string(),
            other => other.as_text().unwrap_or_default(),
        }
    }
}

/// Ordered field map with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, FieldValue)>,
}

impl FieldMap {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts or replaces (case-insensitively) a field.
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&key))
        {
            slot.1 = value;
            return;
        }
        self.entries.push((key, value));
    }

    /// Returns the first non-blank value among `aliases`, tried in order.
    pub fn get(&self, aliases: &[&str]) -> Option<&FieldValue> {
        aliases.iter().find_map(|alias| {
            self.entries
                .iter()
                .find(|(key, value)| key.eq_ignore_ascii_case(alias) && !value.is_blank())
                .map(|(_, value)| value)
        })
    }

    /// Like [`FieldMap::get`] but also returns blank values, for presence checks.
    pub fn get_raw(&self, aliases: &[&str]) -> Option<&FieldValue> {
        aliases.iter().find_map(|alias| {
            self.entries
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(alias))
                .map(|(_, value)| value)
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn has_any_key<'a>(keys: impl IntoIterator<Item = &'a str>, aliases: &[&str]) -> bool {
    keys.into_iter()
        .any(|key| aliases.iter().any(|alias| key.trim().eq_ignore_ascii_case(alias)))
}

/// One parsed input row, tagged with the format it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    CsvRow { line: usize, fields: FieldMap },
    JsonRow { index: usize, fields: FieldMap },
    GeoJsonFeature { index: usize, fields: FieldMap },
}

impl RawRecord {
    pub fn fields(&self) -> &FieldMap {
        match self {
            Self::CsvRow { fields, .. }
            | Self::JsonRow { fields, .. }
            | Self::GeoJsonFeature { fields, .. } => fields,
        }
    }

    pub fn origin(&self) -> String {
        match self {
            Self::CsvRow { line, .. } => format!("line {line}"),
            Self::JsonRow { index, .. } => format!("record {}", index + 1),
            Self::GeoJsonFeature { index, .. } => format!("feature {}", index + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub location: String,
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Json,
    GeoJson,
}

impl SourceFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::GeoJson => "geojson",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "geojson" => Some(Self::GeoJson),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub format: SourceFormat,
    pub records: Vec<RawRecord>,
    pub warnings: Vec<ParseWarning>,
}
