use std::fmt;

use crate::services::ProviderError;

/// Errors produced by the navigation session.
///
/// Everything except `StaleResult` is reported to the host through
/// `NavEvent::Error`. None of them end the session.
#[derive(Debug, Clone, PartialEq)]
pub enum NavError {
    /// The destination text could not be resolved to a coordinate.
    Geocode(ProviderError),
    /// The routing provider found no usable route.
    Route(ProviderError),
    /// `start_navigating` was called with no route set.
    NoRoute,
    /// A destination was requested before any position fix arrived.
    NoLocation,
    /// A route must have at least one step.
    EmptyRoute,
    InvalidCoordinate { lat: f64, lon: f64 },
    /// An async result arrived for a superseded request. Internal only.
    StaleResult { generation: u64, current: u64 },
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavError::Geocode(e) => write!(f, "geocoding failed: {e}"),
            NavError::Route(e) => write!(f, "route computation failed: {e}"),
            NavError::NoRoute => write!(f, "no route set"),
            NavError::NoLocation => write!(f, "current location unknown"),
            NavError::EmptyRoute => write!(f, "route has no steps"),
            NavError::InvalidCoordinate { lat, lon } => {
                write!(f, "invalid coordinate: lat={lat}, lon={lon}")
            }
            NavError::StaleResult {
                generation,
                current,
            } => write!(f, "stale result (generation {generation}, current {current})"),
        }
    }
}

impl std::error::Error for NavError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NavError::Geocode(e) | NavError::Route(e) => Some(e),
            _ => None,
        }
    }
}
