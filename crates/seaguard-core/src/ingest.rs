use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::classify::resolve_behavior;
use crate::error::{Result, SeaguardError};
use crate::models::Vessel;
use crate::normalize::{
    RowRejection, empty_result, normalize_record, normalize_with_offset, synthesized_id,
};
use crate::parse::{FieldValue, ParseWarning, SourceFormat, parse_json_value, parse_text};
use crate::validate::check_coordinate_fields;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total_records: usize,
    pub unique_vessels: usize,
    pub time_range: Option<TimeRange>,
}

impl BatchSummary {
    pub fn from_vessels(vessels: &[Vessel]) -> Self {
        let unique_vessels = vessels
            .iter()
            .map(|vessel| vessel.vessel_id.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        let timestamps = vessels
            .iter()
            .filter_map(|vessel| vessel.timestamp.as_deref())
            .collect::<BTreeSet<_>>();
        let time_range = match (timestamps.first(), timestamps.last()) {
            (Some(start), Some(end)) => Some(TimeRange {
                start: (*start).to_string(),
                end: (*end).to_string(),
            }),
            _ => None,
        };
        Self {
            total_records: vessels.len(),
            unique_vessels,
            time_range,
        }
    }
}

/// Everything one ingestion produced: the surviving vessels plus what was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub sources: Vec<SourceReport>,
    pub vessels: Vec<Vessel>,
    pub warnings: Vec<ParseWarning>,
    pub rejections: Vec<RowRejection>,
    pub summary: BatchSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub format: Option<SourceFormat>,
    pub records: usize,
    pub accepted: usize,
}

#[derive(Debug, Default)]
struct Batch {
    sources: Vec<SourceReport>,
    vessels: Vec<Vessel>,
    warnings: Vec<ParseWarning>,
    rejections: Vec<RowRejection>,
    next_sequence: usize,
}

impl Batch {
    fn absorb_text(
        &mut self,
        source: &str,
        text: &str,
        format: Option<SourceFormat>,
    ) -> Result<()> {
        let outcome = parse_text(text, format)?;
        let normalized = normalize_with_offset(&outcome.records, self.next_sequence);
        self.next_sequence += outcome.records.len();
        self.sources.push(SourceReport {
            source: source.to_string(),
            format: Some(outcome.format),
            records: outcome.records.len(),
            accepted: normalized.vessels.len(),
        });
        self.vessels.extend(normalized.vessels);
        self.warnings.extend(outcome.warnings);
        self.rejections.extend(normalized.rejections);
        Ok(())
    }

    fn finish(self) -> Result<IngestReport> {
        if self.vessels.is_empty() {
            return Err(empty_result(&self.rejections));
        }
        let summary = BatchSummary::from_vessels(&self.vessels);
        info!(
            sources = self.sources.len(),
            vessels = summary.total_records,
            unique = summary.unique_vessels,
            rejected = self.rejections.len(),
            "ingestion complete"
        );
        Ok(IngestReport {
            sources: self.sources,
            vessels: self.vessels,
            warnings: self.warnings,
            rejections: self.rejections,
            summary,
        })
    }
}

/// Parses and normalizes pasted or fetched text.
pub fn ingest_text(text: &str, format: Option<SourceFormat>) -> Result<IngestReport> {
    let mut batch = Batch::default();
    batch.absorb_text("<input>", text, format)?;
    batch.finish()
}

/// Format precedence: explicit hint, then extension, then content sniffing.
pub fn ingest_file(path: &Path, format: Option<SourceFormat>) -> Result<IngestReport> {
    let text = fs::read_to_string(path)?;
    let format = format.or_else(|| SourceFormat::from_extension(path));
    let mut batch = Batch::default();
    batch.absorb_text(&path.display().to_string(), &text, format)?;
    batch.finish()
}

/// Ingests every supported file below `dir` in path order. A file that fails to parse
/// is recorded as a rejection and the batch continues.
pub fn ingest_directory(dir: &Path) -> Result<IngestReport> {
    let files = collect_source_files(dir)?;
    let mut batch = Batch::default();
    for path in files {
        let source = path.display().to_string();
        let result = fs::read_to_string(&path)
            .map_err(SeaguardError::from)
            .and_then(|text| {
                batch.absorb_text(&source, &text, SourceFormat::from_extension(&path))
            });
        if let Err(err) = result {
            warn!(%source, error = %err, "source file skipped");
            batch.sources.push(SourceReport {
                source: source.clone(),
                format: SourceFormat::from_extension(&path),
                records: 0,
                accepted: 0,
            });
            batch.rejections.push(RowRejection {
                origin: source,
                reason: err.to_string(),
            });
        }
    }
    batch.finish()
}

/// Strict variant for rows the service already decoded: one bad row rejects the set.
pub fn ingest_rows_strict(source: &str, rows: &Value) -> Result<IngestReport> {
    let outcome =
        parse_json_value(rows).map_err(|err| SeaguardError::InvalidDataFormat(err.to_string()))?;
    if let Some(warning) = outcome.warnings.first() {
        return Err(SeaguardError::InvalidDataFormat(warning.to_string()));
    }
    if outcome.records.is_empty() {
        return Err(SeaguardError::InvalidDataFormat(
            "no vessel rows in response".to_string(),
        ));
    }
    let mut vessels = Vec::with_capacity(outcome.records.len());
    for (position, record) in outcome.records.iter().enumerate() {
        let vessel = normalize_record(record, position + 1).map_err(|reason| {
            SeaguardError::InvalidDataFormat(format!("{}: {reason}", record.origin()))
        })?;
        vessels.push(vessel);
    }
    let batch = Batch {
        sources: vec![SourceReport {
            source: source.to_string(),
            format: Some(outcome.format),
            records: outcome.records.len(),
            accepted: vessels.len(),
        }],
        next_sequence: vessels.len(),
        vessels,
        ..Batch::default()
    };
    batch.finish()
}

pub fn ingest_path(path: &Path, format: Option<SourceFormat>) -> Result<IngestReport> {
    if path.is_dir() {
        ingest_directory(path)
    } else {
        ingest_file(path, format)
    }
}

fn collect_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| SeaguardError::Io(e.into()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        if SourceFormat::from_extension(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// A single position typed in by hand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualEntry {
    pub vessel_id: Option<String>,
    pub latitude: String,
    pub longitude: String,
    pub behavior: Option<String>,
    pub speed: Option<f64>,
}

/// Runs a hand-typed position through the same validator and classifier as file input.
pub fn manual_vessel(entry: &ManualEntry, sequence: usize) -> Result<Vessel> {
    let latitude = FieldValue::from_cell(&entry.latitude);
    let longitude = FieldValue::from_cell(&entry.longitude);
    let (lat, lon) = check_coordinate_fields(Some(&latitude), Some(&longitude)).map_err(
        |rejection| SeaguardError::InvalidCoordinate {
            index: sequence.saturating_sub(1),
            reason: rejection.to_string(),
        },
    )?;
    let vessel_id = entry
        .vessel_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map_or_else(|| synthesized_id(sequence), str::to_string);
    let mut vessel = Vessel::unchecked(vessel_id, lat, lon)
        .with_behavior(resolve_behavior(entry.behavior.as_deref(), entry.speed));
    vessel.speed = entry.speed;
    Ok(vessel)
}
