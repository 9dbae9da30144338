use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::resolve_behavior;
use crate::error::{Result, SeaguardError};
use crate::models::Vessel;
use crate::parse::{FieldMap, LATITUDE_KEYS, LONGITUDE_KEYS, RawRecord};
use crate::validate::check_coordinate_fields;

const VESSEL_ID_KEYS: &[&str] = &["vessel_id", "vesselid", "vessel id", "mmsi", "id"];
const BEHAVIOR_KEYS: &[&str] = &["behavior", "behaviour"];
const SPEED_KEYS: &[&str] = &["speed", "sog"];
const COURSE_KEYS: &[&str] = &["course", "cog"];
const HEADING_KEYS: &[&str] = &["heading"];
const LENGTH_KEYS: &[&str] = &["length"];
const WIDTH_KEYS: &[&str] = &["width", "beam"];
const DRAUGHT_KEYS: &[&str] = &["draught", "draft"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "time", "basedatetime", "datetime"];
const VESSEL_TYPE_KEYS: &[&str] = &["vessel_type", "vesseltype", "type"];
const FLAG_KEYS: &[&str] = &["flag"];
const STATUS_KEYS: &[&str] = &["status", "navstat"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    pub origin: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NormalizeReport {
    pub vessels: Vec<Vessel>,
    pub rejections: Vec<RowRejection>,
}

/// Lenient batch normalization: bad rows are dropped and reported, the batch goes on.
/// Fails only when no row survives.
pub fn normalize_records(records: &[RawRecord]) -> Result<NormalizeReport> {
    let report = normalize_with_offset(records, 0);
    if report.vessels.is_empty() {
        return Err(empty_result(&report.rejections));
    }
    Ok(report)
}

/// Like [`normalize_records`] but never fails; synthesized ids start after `offset`.
pub fn normalize_with_offset(records: &[RawRecord], offset: usize) -> NormalizeReport {
    let mut report = NormalizeReport::default();
    for (position, record) in records.iter().enumerate() {
        match normalize_record(record, offset + position + 1) {
            Ok(vessel) => report.vessels.push(vessel),
            Err(reason) => {
                let origin = record.origin();
                warn!(%origin, %reason, "vessel row dropped");
                report.rejections.push(RowRejection { origin, reason });
            }
        }
    }
    debug!(
        kept = report.vessels.len(),
        dropped = report.rejections.len(),
        "normalized records"
    );
    report
}

pub(crate) fn empty_result(rejections: &[RowRejection]) -> SeaguardError {
    let detail = match rejections.first() {
        Some(first) => format!(
            "all {} row(s) rejected; first: {}: {}",
            rejections.len(),
            first.origin,
            first.reason
        ),
        None => "input contained no rows".to_string(),
    };
    SeaguardError::EmptyResult(detail)
}

/// One row to one vessel. `sequence` is the 1-based position used for a missing id.
pub fn normalize_record(
    record: &RawRecord,
    sequence: usize,
) -> std::result::Result<Vessel, String> {
    let fields = record.fields();
    let (latitude, longitude) =
        check_coordinate_fields(fields.get(LATITUDE_KEYS), fields.get(LONGITUDE_KEYS))
            .map_err(|rejection| rejection.to_string())?;

    let vessel_id = text(fields, VESSEL_ID_KEYS).unwrap_or_else(|| synthesized_id(sequence));
    let speed = number(fields, SPEED_KEYS);
    let behavior = resolve_behavior(text(fields, BEHAVIOR_KEYS).as_deref(), speed);

    let mut vessel = Vessel::unchecked(vessel_id, latitude, longitude).with_behavior(behavior);
    vessel.speed = speed;
    vessel.course = number(fields, COURSE_KEYS);
    vessel.heading = number(fields, HEADING_KEYS);
    vessel.length = number(fields, LENGTH_KEYS);
    vessel.width = number(fields, WIDTH_KEYS);
    vessel.draught = number(fields, DRAUGHT_KEYS);
    vessel.timestamp = text(fields, TIMESTAMP_KEYS);
    vessel.vessel_type = text(fields, VESSEL_TYPE_KEYS);
    vessel.flag = text(fields, FLAG_KEYS);
    vessel.status = text(fields, STATUS_KEYS);
    Ok(vessel)
}

pub fn synthesized_id(sequence: usize) -> String {
    format!("VESSEL{sequence:03}")
}

fn text(fields: &FieldMap, keys: &[&str]) -> Option<String> {
    fields.get(keys).and_then(|value| value.as_text())
}

fn number(fields: &FieldMap, keys: &[&str]) -> Option<f64> {
    fields.get(keys).and_then(|value| value.as_number())
}
