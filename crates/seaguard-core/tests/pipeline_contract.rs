use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use seaguard_core::export::{ExportFormat, to_csv, write_export};
use seaguard_core::ingest::{ingest_file, ingest_text};
use seaguard_core::models::{Behavior, RiskLevel, Vessel, ZoneType};
use seaguard_core::parse::SourceFormat;
use seaguard_core::resilience::{
    ApiRequest, ApiResponse, CancelToken, ManualClock, RecordingSleeper, ResilientClient,
    RetryPolicy, Transport,
};
use seaguard_core::{AnalysisService, Result, ZoneCheckOrchestrator};
use serde_json::{Value, json};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture_json(name: &str) -> Value {
    let raw = fs::read_to_string(fixture_path(name)).expect("read fixture");
    serde_json::from_str(&raw).expect("parse fixture")
}

/// Scripted peer: pops one response per call, repeating the last one.
struct FakeService {
    responses: Mutex<VecDeque<ApiResponse>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl FakeService {
    fn new(responses: Vec<ApiResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().expect("calls").clone()
    }
}

impl Transport for FakeService {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.calls.lock().expect("calls").push(request.clone());
        let mut responses = self.responses.lock().expect("responses");
        let next = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        Ok(next.expect("scripted response"))
    }
}

fn service_with(fake: Arc<FakeService>) -> (AnalysisService, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = ResilientClient::new(fake).with_sleeper(sleeper.clone());
    (AnalysisService::new(client), sleeper)
}

fn fixed_clock() -> Arc<ManualClock> {
    let start = Utc
        .with_ymd_and_hms(2026, 4, 1, 12, 0, 0)
        .single()
        .expect("start");
    Arc::new(ManualClock::new(start))
}

fn four_vessels() -> Vec<Vessel> {
    vec![
        Vessel::new("V1", 55.1, 12.1)
            .expect("v1")
            .with_behavior(Behavior::Transit),
        Vessel::new("V2", 55.2, 12.2)
            .expect("v2")
            .with_behavior(Behavior::Fishing),
        Vessel::new("V3", 55.3, 12.3)
            .expect("v3")
            .with_behavior(Behavior::Stopped),
        Vessel::new("V4", 55.4, 12.4)
            .expect("v4")
            .with_behavior(Behavior::Fishing),
    ]
}

#[test]
fn scenario_csv_keeps_only_the_in_range_row() {
    let report = ingest_file(&fixture_path("scenario_positions.csv"), None).expect("ingest");
    assert_eq!(report.vessels.len(), 1);
    assert_eq!(report.vessels[0].vessel_id, "VESSEL001");
    assert_eq!(report.vessels[0].behavior, Behavior::Fishing);
    assert_eq!(report.rejections.len(), 1);
    assert!(report.rejections[0].reason.contains("latitude"));
}

#[test]
fn geojson_features_flip_axes_and_drop_bad_points() {
    let report = ingest_file(&fixture_path("mixed_features.geojson"), None).expect("ingest");
    assert_eq!(report.vessels.len(), 1);
    let vessel = &report.vessels[0];
    assert_eq!(vessel.vessel_id, "219000001");
    assert_eq!(vessel.latitude, 55.25);
    assert_eq!(vessel.longitude, 12.5);
    assert_eq!(vessel.behavior, Behavior::Stopped);
    assert_eq!(vessel.flag.as_deref(), Some("DK"));
    assert_eq!(report.rejections.len(), 2);
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn surviving_vessels_are_always_in_range() {
    let text = "lat,lon\n90,180\n-90,-180\n90.0001,0\n0,-180.0001\nnan,0\n1e3,1\n";
    let report = ingest_text(text, None).expect("ingest");
    assert_eq!(report.vessels.len(), 2);
    for vessel in &report.vessels {
        assert!((-90.0..=90.0).contains(&vessel.latitude));
        assert!((-180.0..=180.0).contains(&vessel.longitude));
    }
}

#[test]
fn exported_csv_parses_back_with_ids_and_coordinates() {
    let report = ingest_text(
        "vessel_id,latitude,longitude,speed,flag\n\
         A,55.123456,12.123456,2.5,\"DK, Faroe\"\n\
         B,-33.5,151.25,,\n",
        Some(SourceFormat::Csv),
    )
    .expect("ingest");
    let csv = to_csv(&report.vessels).expect("export");
    let reparsed = ingest_text(&csv, Some(SourceFormat::Csv)).expect("reparse");
    assert_eq!(reparsed.vessels.len(), report.vessels.len());
    for (before, after) in report.vessels.iter().zip(&reparsed.vessels) {
        assert_eq!(before.vessel_id, after.vessel_id);
        assert_eq!(before.latitude, after.latitude);
        assert_eq!(before.longitude, after.longitude);
    }

    let dir = tempfile::tempdir().expect("tempdir");
    let date = NaiveDate::from_ymd_opt(2026, 4, 1).expect("date");
    let path = write_export(dir.path(), "vessels", ExportFormat::Csv, &report.vessels, date)
        .expect("write");
    let from_disk = ingest_file(&path, None).expect("reparse file with BOM");
    assert_eq!(from_disk.vessels[0].vessel_id, "A");
}

#[test]
fn exported_csv_keeps_rows_whose_text_spans_lines() {
    let report = ingest_text(
        r#"[
            {"vessel_id": "A", "lat": 10.5, "lon": 20.5, "status": "line1\nline2"},
            {"vessel_id": "B", "lat": -1.25, "lon": 3.75, "status": "ok"}
        ]"#,
        Some(SourceFormat::Json),
    )
    .expect("ingest");
    let csv = to_csv(&report.vessels).expect("export");
    let reparsed = ingest_text(&csv, Some(SourceFormat::Csv)).expect("reparse");

    assert!(reparsed.warnings.is_empty(), "{:?}", reparsed.warnings);
    let ids = reparsed
        .vessels
        .iter()
        .map(|vessel| vessel.vessel_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["A", "B"]);
    assert_eq!(reparsed.vessels[0].status.as_deref(), Some("line1\nline2"));
    assert_eq!(reparsed.vessels[1].latitude, -1.25);
    assert_eq!(reparsed.vessels[1].longitude, 3.75);
}

#[test]
fn health_check_within_ttl_issues_one_call() {
    let fake = FakeService::new(vec![ApiResponse::json(
        200,
        &json!({"status": "healthy", "timestamp": "2026-04-01T12:00:00Z"}),
    )]);
    let clock = fixed_clock();
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = ResilientClient::new(fake.clone())
        .with_sleeper(sleeper)
        .with_clock(clock.clone());
    let service = AnalysisService::new(client);
    let cancel = CancelToken::new();

    service.health_check(&cancel).expect("first");
    clock.advance(Duration::from_secs(29));
    service.health_check(&cancel).expect("second");
    assert_eq!(fake.calls().len(), 1);

    clock.advance(Duration::from_secs(2));
    service.health_check(&cancel).expect("after expiry");
    assert_eq!(fake.calls().len(), 2);
}

#[test]
fn server_errors_exhaust_four_attempts_with_doubling_delays() {
    let fake = FakeService::new(vec![ApiResponse::new(
        500,
        r#"{"detail": "Zone check failed: db down"}"#,
    )]);
    let (service, sleeper) = service_with(fake.clone());
    let result = ZoneCheckOrchestrator::new(&service)
        .with_clock(fixed_clock())
        .run(&four_vessels(), &CancelToken::new())
        .expect("failed result, not an error");

    assert_eq!(fake.calls().len(), 4);
    assert_eq!(
        sleeper.delays(),
        vec![
            Duration::from_millis(1000),
            Duration::from_millis(2000),
            Duration::from_millis(4000)
        ]
    );
    assert!(!result.success);
    assert!(
        result
            .error
            .as_deref()
            .expect("error message")
            .contains("db down")
    );
    assert_eq!(result.results.len(), 4);
    assert_eq!(result.inferred_count(), 4);
    let flagged = result.results.iter().filter(|r| r.illegal_fishing).count();
    assert_eq!(result.violations, flagged);
    assert_eq!(result.violations, 2);
    assert_eq!(result.vessels.len(), 4);
}

#[test]
fn unauthorized_is_attempted_exactly_once() {
    let fake = FakeService::new(vec![ApiResponse::new(401, r#"{"detail": "login"}"#)]);
    let (service, sleeper) = service_with(fake.clone());
    let result = ZoneCheckOrchestrator::new(&service)
        .run(&four_vessels(), &CancelToken::new())
        .expect("failed result");
    assert_eq!(fake.calls().len(), 1);
    assert!(sleeper.delays().is_empty());
    assert!(!result.success);
    assert!(result.suggestion.is_some());
}

#[test]
fn partial_response_is_completed_with_inferred_entries() {
    let body = load_fixture_json("partial_zone_response.json");
    let fake = FakeService::new(vec![ApiResponse::json(200, &body)]);
    let (service, _) = service_with(fake.clone());
    let result = ZoneCheckOrchestrator::new(&service)
        .with_clock(fixed_clock())
        .run(&four_vessels(), &CancelToken::new())
        .expect("result");

    assert!(result.success);
    assert!(result.error.is_none());
    assert_eq!(result.results.len(), 4);
    assert_eq!(result.inferred_count(), 3);
    assert!(!result.results[0].inferred);
    assert_eq!(result.results[0].zone_type, Some(ZoneType::Mpa));
    let ids = result
        .results
        .iter()
        .map(|r| r.vessel_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["V1", "V2", "V3", "V4"]);

    // V1 authoritative, V2 and V4 inferred from fishing behavior.
    assert_eq!(result.violations, 3);
    assert_eq!(
        result.violations,
        result.results.iter().filter(|r| r.illegal_fishing).count()
    );
    assert_eq!(result.mpa_violations, 1);
    assert_eq!(result.eez_violations, 0);
    assert_eq!(result.total_vessels, 4);
    assert_eq!(result.processing_time.as_deref(), Some("0.42s"));
    assert_eq!(result.results[1].timestamp, "2026-04-01T12:00:00Z");

    assert_eq!(result.vessels[0].in_mpa, Some(true));
    assert_eq!(result.vessels[0].risk_level, Some(RiskLevel::High));
    assert_eq!(result.vessels[2].risk_level, Some(RiskLevel::Low));

    let sent = fake.calls();
    assert_eq!(sent.len(), 1);
    let body = sent[0].body.as_ref().expect("body");
    assert_eq!(body["vessels"].as_array().map(Vec::len), Some(4));
    assert_eq!(body["vessels"][3]["vessel_id"], "V4");
}

#[test]
fn invalid_vessel_fails_the_whole_submission_without_network() {
    let fake = FakeService::new(vec![ApiResponse::new(200, "{}")]);
    let (service, _) = service_with(fake.clone());
    let mut vessels = four_vessels();
    vessels[2].longitude = 181.0;
    let result = ZoneCheckOrchestrator::new(&service)
        .run(&vessels, &CancelToken::new())
        .expect("failed result");
    assert!(fake.calls().is_empty());
    assert!(!result.success);
    assert!(
        result
            .error
            .as_deref()
            .expect("error")
            .contains("index 2")
    );
    assert_eq!(result.results.len(), 4);
}

#[test]
fn cancelled_run_produces_no_result() {
    let fake = FakeService::new(vec![ApiResponse::new(503, "")]);
    let (service, _) = service_with(fake.clone());
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = ZoneCheckOrchestrator::new(&service)
        .run(&four_vessels(), &cancel)
        .expect_err("cancelled");
    assert_eq!(err.code(), "CANCELLED");
    assert!(fake.calls().is_empty());
}

#[test]
fn zero_retry_policy_fails_after_one_attempt() {
    let fake = FakeService::new(vec![ApiResponse::new(503, "")]);
    let client = ResilientClient::new(fake.clone())
        .with_policy(RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        })
        .with_sleeper(Arc::new(RecordingSleeper::default()));
    let service = AnalysisService::new(client);
    let err = service
        .health_check(&CancelToken::new())
        .expect_err("server error");
    assert_eq!(err.code(), "SERVER_ERROR");
    assert_eq!(fake.calls().len(), 1);
}
