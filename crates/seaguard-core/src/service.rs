use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::error::{ErrorPayload, Result, SeaguardError};
use crate::ingest::{IngestReport, ingest_rows_strict, ingest_text};
use crate::models::{
    CoordinateData, CsvFetchResponse, HealthStatus, PredictionResponse, VesselAnalysisResponse,
    VesselData, ZoneCheckRequest, ZoneCheckResponse,
};
use crate::parse::SourceFormat;
use crate::resilience::{ApiRequest, CancelToken, ResilientClient};
use crate::url::{extract_csv_filename, prepare_csv_url};
use crate::validate::check_coordinate_values;

pub const HEALTH_PATH: &str = "/health";
pub const CHECK_ZONE_PATH: &str = "/api/check-zone/";
pub const CHECK_SINGLE_ZONE_PATH: &str = "/api/check-single-zone/";
pub const PREDICT_PATH: &str = "/api/predict/";
pub const ANALYZE_VESSEL_PATH: &str = "/api/analyze-vessel/";
pub const FETCH_CSV_PATH: &str = "/api/fetch-csv/";

/// Outcome for one vessel of a batch analysis.
#[derive(Debug, Clone, Serialize)]
pub struct BatchAnalysisItem {
    pub vessel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<VesselAnalysisResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchedCsv {
    pub url: String,
    pub filename: String,
    pub report: IngestReport,
}

/// Typed endpoints of the analysis service on top of the resilient request layer.
#[derive(Debug)]
pub struct AnalysisService {
    client: ResilientClient,
}

impl AnalysisService {
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Ok(Self::new(ResilientClient::from_config(config)?))
    }

    pub fn client(&self) -> &ResilientClient {
        &self.client
    }

    pub fn health_check(&self, cancel: &CancelToken) -> Result<HealthStatus> {
        let ttl = self.client.ttls().health;
        let value =
            self.client
                .send_cached("health", &ApiRequest::get(HEALTH_PATH), ttl, cancel)?;
        decode(value, "health status")
    }

    /// Never cached: every submission is request-specific.
    pub fn check_zone(
        &self,
        request: &ZoneCheckRequest,
        cancel: &CancelToken,
    ) -> Result<ZoneCheckResponse> {
        let body = serde_json::to_value(request)?;
        let value = self
            .client
            .send(&ApiRequest::post(CHECK_ZONE_PATH, body), cancel)?;
        decode(value, "zone check response")
    }

    pub fn check_single_zone(
        &self,
        latitude: f64,
        longitude: f64,
        cancel: &CancelToken,
    ) -> Result<ZoneCheckResponse> {
        check_coordinate_values(latitude, longitude).map_err(|rejection| {
            SeaguardError::InvalidCoordinate {
                index: 0,
                reason: rejection.to_string(),
            }
        })?;
        let body = serde_json::to_value(CoordinateData {
            latitude,
            longitude,
        })?;
        let value = self
            .client
            .send(&ApiRequest::post(CHECK_SINGLE_ZONE_PATH, body), cancel)?;
        decode(value, "zone check response")
    }

    pub fn predict(&self, vessel: &VesselData, cancel: &CancelToken) -> Result<PredictionResponse> {
        let request = ApiRequest::post(PREDICT_PATH, serde_json::to_value(vessel)?);
        let value =
            self.client
                .send_cached("predict", &request, self.client.ttls().default, cancel)?;
        decode(value, "prediction")
    }

    pub fn analyze_vessel(
        &self,
        vessel: &VesselData,
        cancel: &CancelToken,
    ) -> Result<VesselAnalysisResponse> {
        let request = ApiRequest::post(ANALYZE_VESSEL_PATH, serde_json::to_value(vessel)?);
        let value = self.client.send_cached(
            "analyze_vessel",
            &request,
            self.client.ttls().default,
            cancel,
        )?;
        decode(value, "vessel analysis")
    }

    /// Analyzes vessels one by one, bypassing the cache. A failing vessel is reported in
    /// its own item; only cancellation aborts the batch.
    pub fn analyze_batch(
        &self,
        vessels: &[VesselData],
        cancel: &CancelToken,
    ) -> Result<Vec<BatchAnalysisItem>> {
        let mut items = Vec::with_capacity(vessels.len());
        for vessel in vessels {
            let outcome = serde_json::to_value(vessel)
                .map_err(SeaguardError::from)
                .and_then(|body| {
                    self.client
                        .send(&ApiRequest::post(ANALYZE_VESSEL_PATH, body), cancel)
                })
                .and_then(|value| decode::<VesselAnalysisResponse>(value, "vessel analysis"));
            let item = match outcome {
                Ok(analysis) => BatchAnalysisItem {
                    vessel_id: vessel.vessel_id.clone(),
                    analysis: Some(analysis),
                    error: None,
                },
                Err(SeaguardError::Cancelled) => return Err(SeaguardError::Cancelled),
                Err(err) => {
                    warn!(vessel_id = %vessel.vessel_id, error = %err, "vessel analysis failed");
                    BatchAnalysisItem {
                        vessel_id: vessel.vessel_id.clone(),
                        analysis: None,
                        error: Some(err.to_payload("analyze_batch")),
                    }
                }
            };
            items.push(item);
        }
        info!(
            vessels = items.len(),
            failed = items.iter().filter(|item| item.error.is_some()).count(),
            "batch analysis complete"
        );
        Ok(items)
    }

    /// Asks the service to download a CSV. Decoded rows are validated strictly; raw CSV
    /// text goes through the lenient parser and normalizer.
    pub fn fetch_csv(&self, url: &str, cancel: &CancelToken) -> Result<FetchedCsv> {
        let url = prepare_csv_url(url)?;
        let request = ApiRequest::get(FETCH_CSV_PATH).with_query("url", url.clone());
        let value =
            self.client
                .send_cached("fetch_csv", &request, self.client.ttls().default, cancel)?;
        let response: CsvFetchResponse = decode(value, "CSV fetch response")?;
        if !response.success {
            return Err(SeaguardError::InvalidDataFormat(
                "service reported an unsuccessful fetch".to_string(),
            ));
        }
        let filename = response
            .filename
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| extract_csv_filename(&url));
        let report = match &response.csv_data {
            Value::String(text) => ingest_text(text, Some(SourceFormat::Csv))?,
            rows @ (Value::Array(_) | Value::Object(_)) => ingest_rows_strict(&filename, rows)?,
            other => {
                return Err(SeaguardError::InvalidDataFormat(format!(
                    "csv_data must be rows or CSV text, got {other}"
                )));
            }
        };
        Ok(FetchedCsv {
            url,
            filename,
            report,
        })
    }
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|err| SeaguardError::InvalidDataFormat(format!("unexpected {what}: {err}")))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;
    use crate::resilience::{ApiResponse, RecordingSleeper, Transport};

    #[derive(Default)]
    struct Recorder {
        responses: Mutex<VecDeque<ApiResponse>>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl Recorder {
        fn with(responses: Vec<ApiResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::default(),
            })
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().expect("requests").clone()
        }
    }

    impl Transport for Recorder {
        fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
            self.requests.lock().expect("requests").push(request.clone());
            Ok(self
                .responses
                .lock()
                .expect("responses")
                .pop_front()
                .unwrap_or_else(|| ApiResponse::new(500, "")))
        }
    }

    fn service(transport: Arc<Recorder>) -> AnalysisService {
        AnalysisService::new(
            ResilientClient::new(transport).with_sleeper(Arc::new(RecordingSleeper::default())),
        )
    }

    fn vessel(id: &str) -> VesselData {
        VesselData {
            vessel_id: id.to_string(),
            latitude: 10.0,
            longitude: 20.0,
            speed: 2.0,
            course: 90.0,
            vessel_type: None,
            timestamp: None,
        }
    }

    #[test]
    fn health_check_is_cached() {
        let transport = Recorder::with(vec![ApiResponse::json(
            200,
            &json!({"status": "healthy", "timestamp": "2026-01-01T00:00:00Z"}),
        )]);
        let service = service(transport.clone());
        let cancel = CancelToken::new();
        assert!(service.health_check(&cancel).expect("first").is_healthy());
        assert!(service.health_check(&cancel).expect("second").is_healthy());
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(transport.requests()[0].path, HEALTH_PATH);
    }

    #[test]
    fn single_zone_validates_before_sending() {
        let transport = Recorder::with(Vec::new());
        let service = service(transport.clone());
        let err = service
            .check_single_zone(120.0, 0.0, &CancelToken::new())
            .expect_err("invalid");
        assert_eq!(err.code(), "INVALID_COORDINATE");
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn predict_posts_vessel_data() {
        let transport = Recorder::with(vec![ApiResponse::json(
            200,
            &json!({"vessel_id": "A", "predictions": {"behavior": "fishing"}, "confidence": 0.8}),
        )]);
        let service = service(transport.clone());
        let prediction = service
            .predict(&vessel("A"), &CancelToken::new())
            .expect("predict");
        assert_eq!(prediction.vessel_id, "A");
        let sent = transport.requests();
        assert_eq!(sent[0].path, PREDICT_PATH);
        assert_eq!(sent[0].body.as_ref().expect("body")["speed"], 2.0);
    }

    #[test]
    fn single_vessel_analysis_is_cached_per_vessel() {
        let transport = Recorder::with(vec![
            ApiResponse::json(
                200,
                &json!({"vessel_id": "A", "risk_score": 0.7, "recommendations": ["patrol"]}),
            ),
            ApiResponse::json(200, &json!({"vessel_id": "B", "risk_score": 0.2})),
        ]);
        let service = service(transport.clone());
        let cancel = CancelToken::new();
        let first = service.analyze_vessel(&vessel("A"), &cancel).expect("first");
        let again = service.analyze_vessel(&vessel("A"), &cancel).expect("cached");
        let other = service.analyze_vessel(&vessel("B"), &cancel).expect("other");
        assert_eq!(first.recommendations, vec!["patrol".to_string()]);
        assert_eq!(again.risk_score, 0.7);
        assert_eq!(other.vessel_id, "B");
        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].path, ANALYZE_VESSEL_PATH);
    }

    #[test]
    fn batch_reports_failures_per_vessel_and_skips_cache() {
        let ok = ApiResponse::json(
            200,
            &json!({"vessel_id": "A", "analysis_results": {}, "risk_score": 0.1, "recommendations": []}),
        );
        let transport = Recorder::with(vec![
            ok.clone(),
            ApiResponse::new(401, r#"{"detail": "no"}"#),
            ok,
        ]);
        let service = service(transport.clone());
        let items = service
            .analyze_batch(&[vessel("A"), vessel("B"), vessel("A")], &CancelToken::new())
            .expect("batch");
        assert_eq!(items.len(), 3);
        assert!(items[0].analysis.is_some());
        assert_eq!(
            items[1].error.as_ref().map(|err| err.code.as_str()),
            Some("UNAUTHORIZED")
        );
        assert!(items[2].analysis.is_some());
        assert_eq!(transport.requests().len(), 3);
        assert!(service.client().cache().is_empty());
    }

    #[test]
    fn fetch_csv_parses_raw_text_and_converts_github_links() {
        let transport = Recorder::with(vec![ApiResponse::json(
            200,
            &json!({
                "success": true,
                "csv_data": "latitude,longitude,vessel_id\n1,2,A\n200,2,B\n",
                "filename": "ais.csv",
                "content_type": "text/csv"
            }),
        )]);
        let service = service(transport.clone());
        let fetched = service
            .fetch_csv("https://github.com/o/r/blob/main/ais.csv", &CancelToken::new())
            .expect("fetch");
        assert_eq!(fetched.filename, "ais.csv");
        assert_eq!(fetched.report.vessels.len(), 1);
        assert_eq!(fetched.report.rejections.len(), 1);
        let sent = transport.requests();
        assert_eq!(
            sent[0].query,
            vec![(
                "url".to_string(),
                "https://raw.githubusercontent.com/o/r/main/ais.csv".to_string()
            )]
        );
    }

    #[test]
    fn fetch_csv_rows_are_validated_strictly() {
        let transport = Recorder::with(vec![ApiResponse::json(
            200,
            &json!({"csv_data": [
                {"vessel_id": "A", "latitude": 1, "longitude": 2},
                {"vessel_id": "B", "latitude": 1, "longitude": 999}
            ]}),
        )]);
        let service = service(transport);
        let err = service
            .fetch_csv("https://example.org/ais.csv", &CancelToken::new())
            .expect_err("bad row");
        assert_eq!(err.code(), "INVALID_DATA_FORMAT");
    }

    #[test]
    fn fetch_csv_rejects_non_csv_links_locally() {
        let transport = Recorder::with(Vec::new());
        let service = service(transport.clone());
        let err = service
            .fetch_csv("https://example.org/image.png", &CancelToken::new())
            .expect_err("invalid url");
        assert_eq!(err.code(), "INVALID_URL");
        assert!(transport.requests().is_empty());
    }
}
