use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::SecondsFormat;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{Result, SeaguardError};
use crate::models::{
    Behavior, INFERRED_DETAILS_PREFIX, RiskLevel, Severity, Vessel, ViolationDetail,
    ZoneCheckRequest, ZoneCheckResult, ZoneCheckVessel, ZoneType, ZoneViolationWire,
};
use crate::resilience::{CancelToken, Clock, SystemClock};
use crate::service::AnalysisService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneCheckState {
    Idle,
    Validating,
    Requesting,
    Reconciling,
    Completed,
    Failed,
}

/// Strict pre-submission check: the request is atomic, so one bad vessel voids it.
pub fn validate_submission(vessels: &[Vessel]) -> Result<()> {
    if vessels.is_empty() {
        return Err(SeaguardError::EmptyInput);
    }
    for (index, vessel) in vessels.iter().enumerate() {
        if let Some(rejection) = vessel.coordinate_rejection() {
            return Err(SeaguardError::InvalidCoordinate {
                index,
                reason: rejection.to_string(),
            });
        }
    }
    Ok(())
}

pub fn build_request(vessels: &[Vessel]) -> ZoneCheckRequest {
    ZoneCheckRequest {
        vessels: vessels.iter().map(ZoneCheckVessel::from).collect(),
    }
}

/// Drives one zone check from validation to a complete, per-vessel result.
pub struct ZoneCheckOrchestrator<'a> {
    service: &'a AnalysisService,
    clock: Arc<dyn Clock>,
}

impl<'a> ZoneCheckOrchestrator<'a> {
    pub fn new(service: &'a AnalysisService) -> Self {
        Self {
            service,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Always yields a renderable result; `Err` only when `cancel` fires mid-run.
    pub fn run(&self, vessels: &[Vessel], cancel: &CancelToken) -> Result<ZoneCheckResult> {
        let mut run = Run::new(vessels.len());
        run.advance(ZoneCheckState::Validating);
        if let Err(err) = validate_submission(vessels) {
            return Ok(self.fail(&mut run, vessels, &err));
        }

        run.advance(ZoneCheckState::Requesting);
        let response = match self.service.check_zone(&build_request(vessels), cancel) {
            Ok(response) => response,
            Err(SeaguardError::Cancelled) => {
                info!(vessels = vessels.len(), "zone check cancelled");
                return Err(SeaguardError::Cancelled);
            }
            Err(err) => return Ok(self.fail(&mut run, vessels, &err)),
        };
        if cancel.is_cancelled() {
            return Err(SeaguardError::Cancelled);
        }
        if !response.success {
            let err = SeaguardError::InvalidDataFormat(
                "analysis service reported an unsuccessful zone check".to_string(),
            );
            return Ok(self.fail(&mut run, vessels, &err));
        }

        run.advance(ZoneCheckState::Reconciling);
        let now = self.timestamp();
        let results = reconcile(vessels, &response.results, &now);
        let enriched = enrich_vessels(vessels, &results);
        let mut result = ZoneCheckResult::from_results(results, enriched);
        result.processing_time = response.processing_time;
        run.advance(ZoneCheckState::Completed);
        info!(
            vessels = result.total_vessels,
            violations = result.violations,
            inferred = result.inferred_count(),
            "zone check completed"
        );
        Ok(result)
    }

    fn fail(&self, run: &mut Run, vessels: &[Vessel], err: &SeaguardError) -> ZoneCheckResult {
        run.advance(ZoneCheckState::Failed);
        error!(code = err.code(), error = %err, "zone check failed");
        let now = self.timestamp();
        let results = vessels
            .iter()
            .map(|vessel| synthesize(vessel, &now))
            .collect::<Vec<_>>();
        let enriched = enrich_vessels(vessels, &results);
        ZoneCheckResult::from_results(results, enriched)
            .into_failed(err.to_string(), err.suggestion())
    }

    fn timestamp(&self) -> String {
        self.clock.now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Per-run state; never shared between runs.
struct Run {
    state: ZoneCheckState,
    vessels: usize,
}

impl Run {
    fn new(vessels: usize) -> Self {
        Self {
            state: ZoneCheckState::Idle,
            vessels,
        }
    }

    fn advance(&mut self, next: ZoneCheckState) {
        debug!(from = ?self.state, to = ?next, vessels = self.vessels, "zone check state");
        self.state = next;
    }
}

/// Produces exactly one result per vessel, in input order. Entries are matched by
/// `vessel_id`, then leftovers positionally; vessels still unmatched get an inferred entry.
pub fn reconcile(
    vessels: &[Vessel],
    entries: &[ZoneViolationWire],
    now: &str,
) -> Vec<ViolationDetail> {
    let mut by_id: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, vessel) in vessels.iter().enumerate() {
        by_id.entry(vessel.vessel_id.as_str()).or_default().push(index);
    }

    let mut groups: Vec<Vec<&ZoneViolationWire>> = vec![Vec::new(); vessels.len()];
    let mut unmatched = VecDeque::new();
    for entry in entries {
        match by_id.get(entry.vessel_id.as_str()) {
            Some(indices) => {
                for index in indices {
                    groups[*index].push(entry);
                }
            }
            None => unmatched.push_back(entry),
        }
    }
    for group in groups.iter_mut().filter(|group| group.is_empty()) {
        match unmatched.pop_front() {
            Some(entry) => group.push(entry),
            None => break,
        }
    }
    if !unmatched.is_empty() {
        warn!(
            discarded = unmatched.len(),
            "zone results matched no submitted vessel"
        );
    }

    let results = vessels
        .iter()
        .zip(groups)
        .map(|(vessel, group)| {
            if group.is_empty() {
                synthesize(vessel, now)
            } else {
                authoritative(vessel, &group, now)
            }
        })
        .collect::<Vec<_>>();
    let inferred = results.iter().filter(|item| item.inferred).count();
    if inferred > 0 {
        warn!(
            inferred,
            submitted = vessels.len(),
            "service omitted results; inferred entries synthesized"
        );
    }
    results
}

fn authoritative(vessel: &Vessel, group: &[&ZoneViolationWire], now: &str) -> ViolationDetail {
    let zones = group
        .iter()
        .filter_map(|entry| entry.zone_type.as_deref().and_then(ZoneType::parse))
        .collect::<Vec<_>>();
    let zone_type = if zones.contains(&ZoneType::Mpa) {
        Some(ZoneType::Mpa)
    } else {
        zones.first().copied()
    };
    let severity = group
        .iter()
        .map(|entry| Severity::parse(entry.severity.as_deref().unwrap_or_default()))
        .max()
        .unwrap_or(Severity::Low);
    let timestamp = group
        .iter()
        .find_map(|entry| entry.timestamp.clone())
        .or_else(|| vessel.timestamp.clone())
        .unwrap_or_else(|| now.to_string());
    let location = group
        .iter()
        .find_map(|entry| match entry.location.as_deref() {
            Some([lon, lat, ..]) => Some([*lon, *lat]),
            _ => None,
        })
        .unwrap_or_else(|| vessel.location());
    let details = group
        .iter()
        .filter_map(|entry| entry.details.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("; ");
    let details = if details.is_empty() {
        match zone_type {
            Some(zone) => format!(
                "Vessel detected inside {} boundary",
                zone.as_str().to_uppercase()
            ),
            None => "Vessel flagged by the analysis service".to_string(),
        }
    } else {
        details
    };

    ViolationDetail {
        vessel_id: vessel.vessel_id.clone(),
        zone_type,
        timestamp,
        location,
        severity,
        details,
        illegal_fishing: true,
        inferred: false,
    }
}

/// Deterministic stand-in for a vessel the service did not classify.
pub fn synthesize(vessel: &Vessel, now: &str) -> ViolationDetail {
    let fishing = vessel.behavior == Behavior::Fishing;
    let (severity, details) = if fishing {
        (
            Severity::Medium,
            format!(
                "{INFERRED_DETAILS_PREFIX} no service result; behavior {} flags this vessel for review",
                vessel.behavior
            ),
        )
    } else {
        (
            Severity::Low,
            format!(
                "{INFERRED_DETAILS_PREFIX} no service result; behavior {} does not indicate fishing",
                vessel.behavior
            ),
        )
    };
    ViolationDetail {
        vessel_id: vessel.vessel_id.clone(),
        zone_type: None,
        timestamp: vessel.timestamp.clone().unwrap_or_else(|| now.to_string()),
        location: vessel.location(),
        severity,
        details,
        illegal_fishing: fishing,
        inferred: true,
    }
}

/// Copies each vessel with its result-time fields filled from the matching result.
pub fn enrich_vessels(vessels: &[Vessel], results: &[ViolationDetail]) -> Vec<Vessel> {
    vessels
        .iter()
        .zip(results)
        .map(|(vessel, result)| {
            let mut vessel = vessel.clone();
            let confirmed = !result.inferred;
            vessel.in_mpa = Some(confirmed && result.zone_type == Some(ZoneType::Mpa));
            vessel.in_eez = Some(confirmed && result.zone_type == Some(ZoneType::Eez));
            vessel.illegal_fishing = Some(result.illegal_fishing);
            vessel.risk_level = Some(risk_level(result));
            vessel
        })
        .collect()
}

fn risk_level(result: &ViolationDetail) -> RiskLevel {
    let mpa_violation =
        !result.inferred && result.illegal_fishing && result.zone_type == Some(ZoneType::Mpa);
    if mpa_violation || result.severity == Severity::High {
        RiskLevel::High
    } else if result.illegal_fishing {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
