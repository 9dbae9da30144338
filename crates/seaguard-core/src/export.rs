use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::{Result, SeaguardError};

const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Pretty JSON (2-space indent) of exactly the records given.
pub fn to_json<T: Serialize>(records: &[T]) -> Result<String> {
    if records.is_empty() {
        return Err(SeaguardError::EmptyExport);
    }
    Ok(serde_json::to_string_pretty(records)?)
}

/// CSV whose header is the first record's keys in field order. Every cell is quoted;
/// nested values are written as JSON text.
pub fn to_csv<T: Serialize>(records: &[T]) -> Result<String> {
    let rows = records
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let Some(first) = rows.first() else {
        return Err(SeaguardError::EmptyExport);
    };
    let header = match first {
        Value::Object(object) => object.keys().cloned().collect::<Vec<_>>(),
        _ => vec!["value".to_string()],
    };

    let mut out = String::new();
    push_row(&mut out, header.iter().map(String::as_str).map(quote));
    for row in &rows {
        let cells = header.iter().map(|key| {
            let cell = match row {
                Value::Object(object) => object.get(key).map(cell_text).unwrap_or_default(),
                other => cell_text(other),
            };
            quote(&cell)
        });
        push_row(&mut out, cells);
    }
    Ok(out)
}

pub fn export_filename(base: &str, format: ExportFormat, date: NaiveDate) -> String {
    format!("{base}_{}.{}", date.format("%Y-%m-%d"), format.extension())
}

/// Writes `{base}_{YYYY-MM-DD}.{ext}` into `dir`. CSV files start with a UTF-8 BOM.
pub fn write_export<T: Serialize>(
    dir: &Path,
    base: &str,
    format: ExportFormat,
    records: &[T],
    date: NaiveDate,
) -> Result<PathBuf> {
    let body = match format {
        ExportFormat::Json => to_json(records)?,
        ExportFormat::Csv => format!("{UTF8_BOM}{}", to_csv(records)?),
    };
    fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(base, format, date));
    fs::write(&path, body)?;
    info!(path = %path.display(), records = records.len(), "export written");
    Ok(path)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>) {
    let line = cells.collect::<Vec<_>>().join(",");
    out.push_str(&line);
    out.push('\n');
}
