use crate::models::Behavior;

pub const STOPPED_BELOW_KNOTS: f64 = 0.5;
pub const FISHING_BELOW_KNOTS: f64 = 3.0;
pub const MANEUVERING_BELOW_KNOTS: f64 = 8.0;

/// Provisional behavior from speed over ground in knots.
pub fn classify_speed(speed: Option<f64>) -> Behavior {
    match speed {
        Some(knots) if !knots.is_finite() => Behavior::Unknown,
        Some(knots) if knots < STOPPED_BELOW_KNOTS => Behavior::Stopped,
        Some(knots) if knots < FISHING_BELOW_KNOTS => Behavior::Fishing,
        Some(knots) if knots < MANEUVERING_BELOW_KNOTS => Behavior::Maneuvering,
        Some(_) => Behavior::Transit,
        None => Behavior::Unknown,
    }
}

/// An explicit label always wins over the speed heuristic.
pub fn resolve_behavior(explicit: Option<&str>, speed: Option<f64>) -> Behavior {
    explicit
        .and_then(Behavior::parse)
        .unwrap_or_else(|| classify_speed(speed))
}
