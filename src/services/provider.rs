use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::route::Route;
use crate::geo::Coordinate;

/// Errors that can occur while talking to a geocoding or routing service.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Provider misconfigured (bad URL, bad client settings).
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused).
    Network(String),
    /// Service answered with a non-success HTTP status.
    Api { status: u16, message: String },
    /// Failed to parse the service's response.
    Parse(String),
    /// The address did not resolve to any place.
    NotFound(String),
    /// No path exists between the two coordinates.
    NoRoute(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Config(msg) => write!(f, "config error: {msg}"),
            ProviderError::Network(msg) => write!(f, "network error: {msg}"),
            ProviderError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            ProviderError::Parse(msg) => write!(f, "parse error: {msg}"),
            ProviderError::NotFound(query) => write!(f, "no match for '{query}'"),
            ProviderError::NoRoute(msg) => write!(f, "no route found: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// How the traveler moves. Selects the routing profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Cycling,
}

impl TravelMode {
    pub fn label(self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Cycling => "cycling",
        }
    }
}

/// Resolves free-text addresses to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    fn name(&self) -> &str;

    async fn geocode(&self, address: &str) -> Result<Coordinate, ProviderError>;
}

/// Computes a route between two coordinates.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn compute_route(
        &self,
        source: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<Route, ProviderError>;
}
