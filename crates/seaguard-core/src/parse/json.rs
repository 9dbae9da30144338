use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Result, SeaguardError};

use super::geojson::parse_geojson;
use super::record::{FieldMap, FieldValue, ParseOutcome, ParseWarning, RawRecord, SourceFormat};

/// Object keys under which a row array may be wrapped.
const WRAPPER_KEYS: &[&str] = &["vessels", "data", "csv_data"];

pub fn parse_json_text(text: &str) -> Result<ParseOutcome> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let value: Value = serde_json::from_str(text)
        .map_err(|err| SeaguardError::Parse(format!("invalid JSON: {err}")))?;
    parse_json_value(&value)
}

/// Accepts a bare row array, an object wrapping one, a single row object, or GeoJSON.
pub fn parse_json_value(value: &Value) -> Result<ParseOutcome> {
    if is_geojson(value) {
        return parse_geojson(value);
    }
    match value {
        Value::Array(rows) => Ok(rows_outcome(rows)),
        Value::Object(object) => match wrapped_rows(object) {
            Some(rows) => Ok(rows_outcome(rows)),
            None => Ok(rows_outcome(std::slice::from_ref(value))),
        },
        _ => Err(SeaguardError::Parse(
            "JSON input must be an array of vessel objects".to_string(),
        )),
    }
}

pub(crate) fn is_geojson(value: &Value) -> bool {
    matches!(
        value.get("type").and_then(Value::as_str),
        Some("FeatureCollection" | "Feature")
    )
}

fn wrapped_rows(object: &Map<String, Value>) -> Option<&[Value]> {
    WRAPPER_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
}

fn rows_outcome(rows: &[Value]) -> ParseOutcome {
    let mut records = Vec::with_capacity(rows.len());
    let mut warnings = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let Some(object) = row.as_object() else {
            let warning = ParseWarning {
                location: format!("record {}", index + 1),
                message: "element is not an object; skipped".to_string(),
            };
            warn!(%warning, "json row rejected");
            warnings.push(warning);
            continue;
        };
        let mut fields = FieldMap::new();
        for (key, value) in object {
            fields.insert(key.clone(), FieldValue::from_json(value));
        }
        records.push(RawRecord::JsonRow { index, fields });
    }
    ParseOutcome {
        format: SourceFormat::Json,
        records,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::parse::LATITUDE_KEYS;

    #[test]
    fn parses_bare_array_and_skips_non_objects() {
        let outcome =
            parse_json_text(r#"[{"LATITUDE": 1.5, "longitude": 2}, 7, {"lat": "3"}]"#)
                .expect("parse");
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].location, "record 2");
        assert_eq!(outcome.records[1].origin(), "record 3");
        assert_eq!(
            outcome.records[0].fields().get(LATITUDE_KEYS),
            Some(&FieldValue::Number(1.5))
        );
    }

    #[test]
    fn unwraps_known_container_keys() {
        for key in ["vessels", "data", "csv_data"] {
            let value = json!({ key: [{ "lat": 1, "lon": 2 }] });
            let outcome = parse_json_value(&value).expect("parse");
            assert_eq!(outcome.records.len(), 1, "wrapper {key}");
        }
    }

    #[test]
    fn single_object_is_one_row() {
        let outcome = parse_json_value(&json!({ "lat": 1, "lon": 2 })).expect("parse");
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.format, SourceFormat::Json);
    }

    #[test]
    fn delegates_feature_collections() {
        let outcome = parse_json_value(&json!({ "type": "FeatureCollection", "features": [] }))
            .expect("parse");
        assert_eq!(outcome.format, SourceFormat::GeoJson);
    }

    #[test]
    fn rejects_scalars_and_malformed_text() {
        assert_eq!(
            parse_json_value(&json!(42)).expect_err("scalar").code(),
            "PARSE_ERROR"
        );
        assert_eq!(
            parse_json_text("{not json").expect_err("syntax").code(),
            "PARSE_ERROR"
        );
    }
}
