use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::vessel::Vessel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneCheckVessel {
    #[serde(alias = "vesselId")]
    pub vessel_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Vessel> for ZoneCheckVessel {
    fn from(vessel: &Vessel) -> Self {
        Self {
            vessel_id: vessel.vessel_id.clone(),
            latitude: vessel.latitude,
            longitude: vessel.longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneCheckRequest {
    pub vessels: Vec<ZoneCheckVessel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateData {
    pub latitude: f64,
    pub longitude: f64,
}

/// A result entry as the service reports it. Only `vessel_id` is relied upon;
/// everything else is decoded leniently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneViolationWire {
    #[serde(alias = "vesselId")]
    pub vessel_id: String,
    #[serde(default, alias = "zoneType")]
    pub zone_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub location: Option<Vec<f64>>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneCheckResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default, alias = "totalVessels")]
    pub total_vessels: Option<u64>,
    #[serde(default)]
    pub violations: Option<u64>,
    #[serde(default, alias = "mpaViolations")]
    pub mpa_violations: Option<u64>,
    #[serde(default, alias = "eezViolations")]
    pub eez_violations: Option<u64>,
    #[serde(default, alias = "processingTime")]
    pub processing_time: Option<String>,
    #[serde(default)]
    pub results: Vec<ZoneViolationWire>,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") || self.status.eq_ignore_ascii_case("ok")
    }
}

/// Payload of the prediction and analysis endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselData {
    pub vessel_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,
    pub course: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vessel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl From<&Vessel> for VesselData {
    fn from(vessel: &Vessel) -> Self {
        Self {
            vessel_id: vessel.vessel_id.clone(),
            latitude: vessel.latitude,
            longitude: vessel.longitude,
            speed: vessel.speed.unwrap_or(0.0),
            course: vessel.course.unwrap_or(0.0),
            vessel_type: vessel.vessel_type.clone(),
            timestamp: vessel.timestamp.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub vessel_id: String,
    #[serde(default)]
    pub predictions: Value,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselAnalysisResponse {
    pub vessel_id: String,
    #[serde(default)]
    pub analysis_results: Value,
    #[serde(default)]
    pub risk_score: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Body of the CSV-by-URL endpoint. `csv_data` is either decoded rows or raw CSV text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvFetchResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    pub csv_data: Value,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}
