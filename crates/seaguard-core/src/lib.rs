// Public fallible APIs in this crate share one concrete error contract (`SeaguardError`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod parse;
pub mod resilience;
pub mod service;
pub mod url;
pub mod validate;
pub mod zone_check;

pub use config::{ConfigOverrides, ServiceConfig};
pub use error::{ErrorPayload, Result, SeaguardError};
pub use models::{Behavior, RiskLevel, Vessel, ViolationDetail, ZoneCheckResult, ZoneType};
pub use resilience::{CancelToken, ResilientClient};
pub use service::AnalysisService;
pub use zone_check::ZoneCheckOrchestrator;
