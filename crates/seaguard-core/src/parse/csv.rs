use tracing::warn;

use crate::error::{Result, SeaguardError};

use super::record::{
    FieldMap, FieldValue, LATITUDE_KEYS, LONGITUDE_KEYS, ParseOutcome, ParseWarning, RawRecord,
    SourceFormat, has_any_key,
};

/// Parses header-first CSV text. Rows whose column count differs from the header are
/// skipped with a warning; the file as a whole fails only on structural problems.
/// Quoted cells may span line breaks; a row is reported by the line it starts on.
pub fn parse_csv(text: &str) -> Result<ParseOutcome> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = read_rows(text).into_iter();

    let (Some(header_row), Some(first_row)) = (rows.next(), rows.next()) else {
        return Err(SeaguardError::Parse(
            "CSV must contain a header row and at least one data row".to_string(),
        ));
    };

    let header = header_row
        .cells
        .into_iter()
        .map(|name| name.trim().to_string())
        .collect::<Vec<_>>();
    let missing = missing_required_columns(&header);
    if !missing.is_empty() {
        return Err(SeaguardError::Parse(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    let mut warnings = Vec::new();
    for row in std::iter::once(first_row).chain(rows) {
        if row.cells.len() != header.len() {
            let warning = ParseWarning {
                location: format!("line {}", row.line),
                message: format!(
                    "expected {} columns, found {}; row skipped",
                    header.len(),
                    row.cells.len()
                ),
            };
            warn!(%warning, "csv row rejected");
            warnings.push(warning);
            continue;
        }
        let mut fields = FieldMap::new();
        for (name, cell) in header.iter().zip(row.cells.iter()) {
            fields.insert(name.clone(), FieldValue::from_cell(cell));
        }
        records.push(RawRecord::CsvRow {
            line: row.line,
            fields,
        });
    }

    Ok(ParseOutcome {
        format: SourceFormat::Csv,
        records,
        warnings,
    })
}

fn missing_required_columns(header: &[String]) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if !has_any_key(header.iter().map(String::as_str), LATITUDE_KEYS) {
        missing.push("latitude");
    }
    if !has_any_key(header.iter().map(String::as_str), LONGITUDE_KEYS) {
        missing.push("longitude");
    }
    missing
}

#[derive(Debug, PartialEq, Eq)]
struct CsvRow {
    line: usize,
    cells: Vec<String>,
}

/// Tokenizes the whole text, honouring double-quoted cells, `""` escapes and line breaks
/// inside quotes. Blank lines are dropped.
fn read_rows(text: &str) -> Vec<CsvRow> {
    let mut rows = Vec::new();
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_start = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => cells.push(std::mem::take(&mut current)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                cells.push(std::mem::take(&mut current));
                push_row(&mut rows, row_start, std::mem::take(&mut cells));
                line += 1;
                row_start = line;
            }
            '\n' => {
                current.push(ch);
                line += 1;
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() || !cells.is_empty() {
        cells.push(current);
        push_row(&mut rows, row_start, cells);
    }
    rows
}

fn push_row(rows: &mut Vec<CsvRow>, line: usize, cells: Vec<String>) {
    let blank = matches!(cells.as_slice(), [only] if only.trim().is_empty());
    if !blank {
        rows.push(CsvRow { line, cells });
    }
}

/// Cells of the first row of `line`.
#[cfg(test)]
pub(crate) fn split_csv_line(line: &str) -> Vec<String> {
    read_rows(line)
        .into_iter()
        .next()
        .map(|row| row.cells)
        .unwrap_or_default()
}
