mod vessel;
mod wire;
mod zone;

pub use vessel::{Behavior, RiskLevel, Vessel};
pub use wire::{
    CoordinateData, CsvFetchResponse, HealthStatus, PredictionResponse, VesselAnalysisResponse,
    VesselData, ZoneCheckRequest, ZoneCheckResponse, ZoneCheckVessel, ZoneViolationWire,
};
pub use zone::{INFERRED_DETAILS_PREFIX, Severity, ViolationDetail, ZoneCheckResult, ZoneType};
