use serde::{Deserialize, Serialize};

use super::vessel::Vessel;

/// Marker that opens `details` on every result the client synthesized itself.
pub const INFERRED_DETAILS_PREFIX: &str = "[inferred]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    Mpa,
    Eez,
}

impl ZoneType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mpa => "mpa",
            Self::Eez => "eez",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mpa" | "marine_protected_area" => Some(Self::Mpa),
            "eez" | "exclusive_economic_zone" => Some(Self::Eez),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" => Self::High,
            "medium" | "moderate" => Self::Medium,
            _ => Self::Low,
        }
    }
}

/// One reconciled entry per submitted vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationDetail {
    pub vessel_id: String,
    /// `None` when no authoritative zone membership is known.
    pub zone_type: Option<ZoneType>,
    pub timestamp: String,
    pub location: [f64; 2],
    pub severity: Severity,
    pub details: String,
    pub illegal_fishing: bool,
    pub inferred: bool,
}

impl ViolationDetail {
    pub fn is_inferred(&self) -> bool {
        self.inferred && self.details.starts_with(INFERRED_DETAILS_PREFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneCheckResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub total_vessels: usize,
    pub violations: usize,
    pub mpa_violations: usize,
    pub eez_violations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<String>,
    pub results: Vec<ViolationDetail>,
    pub vessels: Vec<Vessel>,
}

impl ZoneCheckResult {
    /// Builds a result whose tallies are derived from `results`, never supplied.
    pub fn from_results(results: Vec<ViolationDetail>, vessels: Vec<Vessel>) -> Self {
        let violations = results.iter().filter(|item| item.illegal_fishing).count();
        let mpa_violations = count_zone(&results, ZoneType::Mpa);
        let eez_violations = count_zone(&results, ZoneType::Eez);
        Self {
            success: true,
            error: None,
            suggestion: None,
            total_vessels: results.len(),
            violations,
            mpa_violations,
            eez_violations,
            processing_time: None,
            results,
            vessels,
        }
    }

    #[must_use]
    pub fn into_failed(mut self, error: impl Into<String>, suggestion: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn inferred_count(&self) -> usize {
        self.results.iter().filter(|item| item.is_inferred()).count()
    }
}

fn count_zone(results: &[ViolationDetail], zone: ZoneType) -> usize {
    results
        .iter()
        .filter(|item| item.illegal_fishing && item.zone_type == Some(zone))
        .count()
}
