mod csv;
mod geojson;
mod json;
mod record;

use std::path::Path;

use crate::error::Result;

pub use csv::parse_csv;
#[cfg(test)]
pub(crate) use csv::split_csv_line;
pub use geojson::parse_geojson;
pub use json::{parse_json_text, parse_json_value};
pub use record::{
    FieldMap, FieldValue, LATITUDE_KEYS, LONGITUDE_KEYS, ParseOutcome, ParseWarning, RawRecord,
    SourceFormat, has_any_key,
};

impl SourceFormat {
    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
    }

    /// Guesses the format from content: JSON starts with `{` or `[`, GeoJSON is a JSON
    /// object typed `FeatureCollection`/`Feature`, anything else is CSV.
    pub fn sniff(text: &str) -> Self {
        let trimmed = text.trim_start_matches('\u{feff}').trim_start();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return Self::Csv;
        }
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(value) if json::is_geojson(&value) => Self::GeoJson,
            _ => Self::Json,
        }
    }
}

/// Parses raw text in the given format, or a sniffed one when `format` is `None`.
pub fn parse_text(text: &str, format: Option<SourceFormat>) -> Result<ParseOutcome> {
    match format.unwrap_or_else(|| SourceFormat::sniff(text)) {
        SourceFormat::Csv => parse_csv(text),
        SourceFormat::Json | SourceFormat::GeoJson => parse_json_text(text),
    }
}
