//! OSRM routing provider.
//!
//! Calls `/route/v1/{profile}/{lon},{lat};{lon},{lat}` with `steps=true`
//! and `geometries=geojson`, then maps every OSRM step to a [`Step`]:
//!
//! - boundary = the maneuver location,
//! - polyline = the step's GeoJSON line,
//! - instruction = maneuver type + modifier + road name, in English.
//!
//! OSRM coordinates are `[lon, lat]` pairs.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;

use super::build_client;
use crate::core::route::{Route, Step};
use crate::geo::Coordinate;
use crate::services::{ProviderError, RoutingProvider, TravelMode};

// ============================================================================
// OSRM Response Types
// ============================================================================

#[derive(Deserialize, Debug)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize, Debug)]
struct OsrmRoute {
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Deserialize, Debug)]
struct Leg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Deserialize, Debug)]
struct OsrmStep {
    distance: f64,
    #[serde(default)]
    name: String,
    maneuver: Maneuver,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Deserialize, Debug)]
struct Maneuver {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
    location: [f64; 2],
    #[serde(default)]
    exit: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct Geometry {
    coordinates: Vec<[f64; 2]>,
}

// ============================================================================
// Translation Layer
// ============================================================================

fn lon_lat(pair: [f64; 2]) -> Result<Coordinate, ProviderError> {
    Coordinate::new(pair[1], pair[0]).map_err(|e| ProviderError::Parse(e.to_string()))
}

fn modifier_phrase(modifier: &str) -> &'static str {
    match modifier {
        "uturn" => "make a U-turn",
        "sharp right" => "turn sharp right",
        "right" => "turn right",
        "slight right" => "keep slightly right",
        "straight" => "continue straight",
        "slight left" => "keep slightly left",
        "left" => "turn left",
        "sharp left" => "turn sharp left",
        _ => "continue",
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// English instruction for one OSRM maneuver.
fn describe_maneuver(maneuver: &Maneuver, road: &str) -> String {
    let modifier = maneuver.modifier.as_deref();
    let base = match maneuver.kind.as_str() {
        "depart" => "head out".to_string(),
        "arrive" => return "Arrive at destination".to_string(),
        "roundabout" | "rotary" => match maneuver.exit {
            Some(exit) => format!("enter the roundabout and take exit {exit}"),
            None => "enter the roundabout".to_string(),
        },
        "merge" => "merge".to_string(),
        "on ramp" => "take the ramp".to_string(),
        "off ramp" => "take the exit".to_string(),
        "fork" => match modifier {
            Some(m) if m.contains("left") => "keep left at the fork".to_string(),
            Some(m) if m.contains("right") => "keep right at the fork".to_string(),
            _ => "continue at the fork".to_string(),
        },
        _ => modifier.map(modifier_phrase).unwrap_or("continue").to_string(),
    };

    if road.is_empty() {
        capitalize(&base)
    } else {
        capitalize(&format!("{base} onto {road}"))
    }
}

fn convert_step(step: &OsrmStep) -> Result<Step, ProviderError> {
    let boundary = lon_lat(step.maneuver.location)?;
    let polyline = match &step.geometry {
        Some(geometry) => geometry
            .coordinates
            .iter()
            .map(|pair| lon_lat(*pair))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    Ok(
        Step::new(describe_maneuver(&step.maneuver, &step.name), step.distance, boundary)
            .with_polyline(polyline),
    )
}

/// Converts the first route of an OSRM response into a [`Route`].
fn convert_response(response: RouteResponse) -> Result<Route, ProviderError> {
    match response.code.as_str() {
        "Ok" => {}
        "NoRoute" | "NoSegment" => {
            return Err(ProviderError::NoRoute(
                response.message.unwrap_or(response.code),
            ));
        }
        other => {
            return Err(ProviderError::Parse(format!(
                "OSRM code {other}: {}",
                response.message.unwrap_or_default()
            )));
        }
    }

    let route = response
        .routes
        .first()
        .ok_or_else(|| ProviderError::NoRoute("empty route list".to_string()))?;
    let steps = route
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .map(convert_step)
        .collect::<Result<Vec<_>, _>>()?;

    Route::new(steps).map_err(|e| ProviderError::NoRoute(e.to_string()))
}

// ============================================================================
// Provider Implementation
// ============================================================================

pub struct OsrmRouter {
    base_url: String,
    client: reqwest::Client,
}

impl OsrmRouter {
    /// Creates a router against `base_url` (no trailing `/route/v1`).
    pub fn new(base_url: String, user_agent: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(user_agent, timeout)?,
        })
    }

    fn route_url(&self, source: Coordinate, destination: Coordinate, mode: TravelMode) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.base_url,
            mode.label(),
            source.lon,
            source.lat,
            destination.lon,
            destination.lat
        )
    }
}

#[async_trait]
impl RoutingProvider for OsrmRouter {
    fn name(&self) -> &str {
        "osrm"
    }

    async fn compute_route(
        &self,
        source: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<Route, ProviderError> {
        let url = self.route_url(source, destination, mode);
        debug!("OSRM request: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("steps", "true"),
                ("geometries", "geojson"),
                ("overview", "false"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        // OSRM reports NoRoute with a 400 and a JSON body, so read the body
        // before deciding what the status means.
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let parsed: RouteResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }
            Err(e) => return Err(ProviderError::Parse(e.to_string())),
        };

        let route = convert_response(parsed)?;
        info!(
            "OSRM route: {} steps, {:.0} m ({})",
            route.len(),
            route.total_distance_m(),
            mode.label()
        );
        Ok(route)
    }
}
