use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeaguardError};
use crate::validate::{CoordinateRejection, check_coordinate_values};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Behavior {
    Transit,
    Fishing,
    Stopped,
    Maneuvering,
    Unknown,
    /// A label outside the known vocabulary, kept verbatim (lowercased).
    Other(String),
}

impl Behavior {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Transit => "transit",
            Self::Fishing => "fishing",
            Self::Stopped => "stopped",
            Self::Maneuvering => "maneuvering",
            Self::Unknown => "unknown",
            Self::Other(label) => label.as_str(),
        }
    }

    /// Parses an explicit label. Blank input yields `None` so the caller can fall back
    /// to the speed classifier.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return None;
        }
        Some(match normalized.as_str() {
            "transit" | "transiting" | "underway" => Self::Transit,
            "fishing" => Self::Fishing,
            "stopped" | "anchored" | "moored" => Self::Stopped,
            "maneuvering" | "manoeuvring" | "maneuvring" => Self::Maneuvering,
            "unknown" => Self::Unknown,
            _ => Self::Other(normalized),
        })
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Behavior {
    fn from(value: String) -> Self {
        Self::parse(&value).unwrap_or(Self::Unknown)
    }
}

impl From<Behavior> for String {
    fn from(value: Behavior) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Canonical vessel position. Coordinates are always within range once a value has
/// left the normalizer; result-time fields stay `None` until a zone check enriches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VesselFields")]
pub struct Vessel {
    pub vessel_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub behavior: Behavior,
    pub speed: Option<f64>,
    pub course: Option<f64>,
    pub heading: Option<f64>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub draught: Option<f64>,
    pub timestamp: Option<String>,
    pub vessel_type: Option<String>,
    pub flag: Option<String>,
    pub status: Option<String>,
    pub in_mpa: Option<bool>,
    pub in_eez: Option<bool>,
    pub in_port: Option<bool>,
    pub illegal_fishing: Option<bool>,
    pub risk_level: Option<RiskLevel>,
}

impl Vessel {
    /// Builds a vessel from typed coordinates, rejecting out-of-range values.
    pub fn new(vessel_id: impl Into<String>, latitude: f64, longitude: f64) -> Result<Self> {
        check_coordinate_values(latitude, longitude).map_err(|rejection| {
            SeaguardError::InvalidCoordinate {
                index: 0,
                reason: rejection.to_string(),
            }
        })?;
        Ok(Self::unchecked(vessel_id.into(), latitude, longitude))
    }

    pub(crate) fn unchecked(vessel_id: String, latitude: f64, longitude: f64) -> Self {
        Self {
            vessel_id,
            latitude,
            longitude,
            behavior: Behavior::Unknown,
            speed: None,
            course: None,
            heading: None,
            length: None,
            width: None,
            draught: None,
            timestamp: None,
            vessel_type: None,
            flag: None,
            status: None,
            in_mpa: None,
            in_eez: None,
            in_port: None,
            illegal_fishing: None,
            risk_level: None,
        }
    }

    #[must_use]
    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// GeoJSON axis order.
    pub fn location(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    pub fn coordinate_rejection(&self) -> Option<CoordinateRejection> {
        check_coordinate_values(self.latitude, self.longitude).err()
    }
}

/// Unvalidated shape of a decoded vessel.
#[derive(Deserialize)]
struct VesselFields {
    vessel_id: String,
    latitude: f64,
    longitude: f64,
    behavior: Behavior,
    speed: Option<f64>,
    course: Option<f64>,
    heading: Option<f64>,
    length: Option<f64>,
    width: Option<f64>,
    draught: Option<f64>,
    timestamp: Option<String>,
    vessel_type: Option<String>,
    flag: Option<String>,
    status: Option<String>,
    #[serde(default)]
    in_mpa: Option<bool>,
    #[serde(default)]
    in_eez: Option<bool>,
    #[serde(default)]
    in_port: Option<bool>,
    #[serde(default)]
    illegal_fishing: Option<bool>,
    #[serde(default)]
    risk_level: Option<RiskLevel>,
}

impl TryFrom<VesselFields> for Vessel {
    type Error = CoordinateRejection;

    fn try_from(fields: VesselFields) -> std::result::Result<Self, Self::Error> {
        check_coordinate_values(fields.latitude, fields.longitude)?;
        Ok(Self {
            vessel_id: fields.vessel_id,
            latitude: fields.latitude,
            longitude: fields.longitude,
            behavior: fields.behavior,
            speed: fields.speed,
            course: fields.course,
            heading: fields.heading,
            length: fields.length,
            width: fields.width,
            draught: fields.draught,
            timestamp: fields.timestamp,
            vessel_type: fields.vessel_type,
            flag: fields.flag,
            status: fields.status,
            in_mpa: fields.in_mpa,
            in_eez: fields.in_eez,
            in_port: fields.in_port,
            illegal_fishing: fields.illegal_fishing,
            risk_level: fields.risk_level,
        })
    }
}
