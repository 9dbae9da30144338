use std::fmt;

use crate::parse::FieldValue;

pub const LATITUDE_MIN: f64 = -90.0;
pub const LATITUDE_MAX: f64 = 90.0;
pub const LONGITUDE_MIN: f64 = -180.0;
pub const LONGITUDE_MAX: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateAxis {
    Latitude,
    Longitude,
}

impl CoordinateAxis {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateRejection {
    Missing(CoordinateAxis),
    NonNumeric { axis: CoordinateAxis, raw: String },
    OutOfRange { axis: CoordinateAxis, value: f64 },
}

impl fmt::Display for CoordinateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(axis) => write!(f, "missing {}", axis.as_str()),
            Self::NonNumeric { axis, raw } => {
                write!(f, "{} is not a number: {raw:?}", axis.as_str())
            }
            Self::OutOfRange { axis, value } => {
                let (min, max) = match axis {
                    CoordinateAxis::Latitude => (LATITUDE_MIN, LATITUDE_MAX),
                    CoordinateAxis::Longitude => (LONGITUDE_MIN, LONGITUDE_MAX),
                };
                write!(
                    f,
                    "{} {value} out of range [{min}, {max}]",
                    axis.as_str()
                )
            }
        }
    }
}

/// The one coordinate predicate every ingestion and request path goes through.
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (LATITUDE_MIN..=LATITUDE_MAX).contains(&latitude)
        && (LONGITUDE_MIN..=LONGITUDE_MAX).contains(&longitude)
}

pub fn is_valid_coordinate_text(latitude: &str, longitude: &str) -> bool {
    match (parse_number(latitude), parse_number(longitude)) {
        (Some(lat), Some(lon)) => is_valid_coordinate(lat, lon),
        _ => false,
    }
}

/// Parses a trimmed decimal; non-finite results count as non-numeric.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

pub fn check_coordinate_values(
    latitude: f64,
    longitude: f64,
) -> std::result::Result<(), CoordinateRejection> {
    if is_valid_coordinate(latitude, longitude) {
        return Ok(());
    }
    for (axis, value) in [
        (CoordinateAxis::Latitude, latitude),
        (CoordinateAxis::Longitude, longitude),
    ] {
        if !value.is_finite() {
            return Err(CoordinateRejection::NonNumeric {
                axis,
                raw: value.to_string(),
            });
        }
    }
    let axis = if is_valid_coordinate(latitude, 0.0) {
        CoordinateAxis::Longitude
    } else {
        CoordinateAxis::Latitude
    };
    let value = match axis {
        CoordinateAxis::Latitude => latitude,
        CoordinateAxis::Longitude => longitude,
    };
    Err(CoordinateRejection::OutOfRange { axis, value })
}

/// Coerces raw latitude/longitude fields and validates the pair.
pub fn check_coordinate_fields(
    latitude: Option<&FieldValue>,
    longitude: Option<&FieldValue>,
) -> std::result::Result<(f64, f64), CoordinateRejection> {
    let lat = coerce_axis(CoordinateAxis::Latitude, latitude)?;
    let lon = coerce_axis(CoordinateAxis::Longitude, longitude)?;
    check_coordinate_values(lat, lon)?;
    Ok((lat, lon))
}

fn coerce_axis(
    axis: CoordinateAxis,
    value: Option<&FieldValue>,
) -> std::result::Result<f64, CoordinateRejection> {
    let value = value
        .filter(|value| !value.is_blank())
        .ok_or(CoordinateRejection::Missing(axis))?;
    value
        .as_number()
        .ok_or_else(|| CoordinateRejection::NonNumeric {
            axis,
            raw: value.display_text(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_accepts_inclusive_bounds() {
        assert!(is_valid_coordinate(90.0, 180.0));
        assert!(is_valid_coordinate(-90.0, -180.0));
        assert!(is_valid_coordinate(0.0, 0.0));
    }

    #[test]
    fn predicate_rejects_out_of_range_and_non_finite() {
        assert!(!is_valid_coordinate(90.000_001, 0.0));
        assert!(!is_valid_coordinate(0.0, -180.5));
        assert!(!is_valid_coordinate(f64::NAN, 0.0));
        assert!(!is_valid_coordinate(0.0, f64::INFINITY));
    }

    #[test]
    fn text_predicate_parses_before_checking() {
        assert!(is_valid_coordinate_text(" 55.123456 ", "12.1"));
        assert!(!is_valid_coordinate_text("abc", "12.1"));
        assert!(!is_valid_coordinate_text("999", "12.1"));
        assert!(!is_valid_coordinate_text("inf", "0"));
    }

    #[test]
    fn check_values_names_the_failing_axis() {
        assert_eq!(
            check_coordinate_values(999.0, 12.0),
            Err(CoordinateRejection::OutOfRange {
                axis: CoordinateAxis::Latitude,
                value: 999.0
            })
        );
        assert_eq!(
            check_coordinate_values(10.0, 200.0),
            Err(CoordinateRejection::OutOfRange {
                axis: CoordinateAxis::Longitude,
                value: 200.0
            })
        );
    }

    #[test]
    fn check_fields_distinguishes_missing_and_non_numeric() {
        let lat = FieldValue::Text("north".to_string());
        let lon = FieldValue::Number(12.0);
        let err = check_coordinate_fields(Some(&lat), Some(&lon)).expect_err("non numeric");
        assert!(matches!(
            err,
            CoordinateRejection::NonNumeric {
                axis: CoordinateAxis::Latitude,
                ..
            }
        ));

        let err = check_coordinate_fields(Some(&FieldValue::Number(1.0)), Some(&FieldValue::Null))
            .expect_err("missing");
        assert_eq!(err, CoordinateRejection::Missing(CoordinateAxis::Longitude));
        assert_eq!(err.to_string(), "missing longitude");

        let ok = check_coordinate_fields(
            Some(&FieldValue::Text("55.5".to_string())),
            Some(&FieldValue::Number(-3.25)),
        )
        .expect("valid");
        assert_eq!(ok, (55.5, -3.25));
    }
}
