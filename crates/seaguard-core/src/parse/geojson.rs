use serde_json::Value;
use tracing::warn;

use crate::error::{Result, SeaguardError};

use super::record::{FieldMap, FieldValue, ParseOutcome, ParseWarning, RawRecord, SourceFormat};

/// Parses a `FeatureCollection` (or a lone `Feature`). Each feature's properties are
/// merged with `LAT`/`LON` taken from a Point geometry, flipping GeoJSON's `[lon, lat]`.
pub fn parse_geojson(value: &Value) -> Result<ParseOutcome> {
    let features = match value.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => value
            .get("features")
            .and_then(Value::as_array)
            .map(|features| features.iter().collect::<Vec<_>>())
            .ok_or_else(|| {
                SeaguardError::Parse("FeatureCollection has no features array".to_string())
            })?,
        Some("Feature") => vec![value],
        other => {
            return Err(SeaguardError::Parse(format!(
                "expected a GeoJSON FeatureCollection or Feature, found type {}",
                other.unwrap_or("<missing>")
            )));
        }
    };

    let mut records = Vec::with_capacity(features.len());
    let mut warnings = Vec::new();
    for (index, feature) in features.into_iter().enumerate() {
        let location = format!("feature {}", index + 1);
        let Some(object) = feature.as_object() else {
            push_warning(&mut warnings, location, "feature is not an object; skipped");
            continue;
        };

        let mut fields = FieldMap::new();
        if let Some(properties) = object.get("properties").and_then(Value::as_object) {
            for (key, value) in properties {
                fields.insert(key.clone(), FieldValue::from_json(value));
            }
        }

        match point_coordinates(object.get("geometry")) {
            Ok((lon, lat)) => {
                fields.insert("LAT", FieldValue::from_json(lat));
                fields.insert("LON", FieldValue::from_json(lon));
            }
            Err(reason) => push_warning(&mut warnings, location, reason),
        }

        records.push(RawRecord::GeoJsonFeature { index, fields });
    }

    Ok(ParseOutcome {
        format: SourceFormat::GeoJson,
        records,
        warnings,
    })
}

fn point_coordinates(geometry: Option<&Value>) -> std::result::Result<(&Value, &Value), String> {
    let geometry = geometry
        .filter(|geometry| !geometry.is_null())
        .ok_or_else(|| "feature has no geometry".to_string())?;
    match geometry.get("type").and_then(Value::as_str) {
        Some("Point") => {}
        Some(other) => return Err(format!("unsupported geometry type {other}")),
        None => return Err("geometry has no type".to_string()),
    }
    match geometry.get("coordinates").and_then(Value::as_array) {
        Some(coordinates) if coordinates.len() >= 2 => Ok((&coordinates[0], &coordinates[1])),
        _ => Err("Point geometry needs [longitude, latitude]".to_string()),
    }
}

fn push_warning(warnings: &mut Vec<ParseWarning>, location: String, message: impl Into<String>) {
    let warning = ParseWarning {
        location,
        message: message.into(),
    };
    warn!(%warning, "geojson feature degraded");
    warnings.push(warning);
}
