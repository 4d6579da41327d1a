//! # Route Model
//!
//! A route is produced once by a routing provider and never edited.
//! A new route replaces the old one wholesale.

use serde::{Deserialize, Serialize};

use crate::core::error::NavError;
use crate::geo::{BoundingBox, Coordinate};

/// One leg of a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    /// Human-readable maneuver, e.g. "Turn left onto Main Street".
    pub instruction: String,
    /// Length of this leg in meters.
    pub distance_m: f64,
    /// Where the maneuver happens. The step's geofence is centered here.
    pub boundary: Coordinate,
    /// Geometry of the leg, in travel order.
    pub polyline: Vec<Coordinate>,
}

impl Step {
    pub fn new(instruction: impl Into<String>, distance_m: f64, boundary: Coordinate) -> Self {
        Self {
            instruction: instruction.into(),
            distance_m: distance_m.max(0.0),
            boundary,
            polyline: Vec::new(),
        }
    }

    pub fn with_polyline(mut self, polyline: Vec<Coordinate>) -> Self {
        self.polyline = polyline;
        self
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            instruction: String,
            distance_m: f64,
            boundary: Coordinate,
            #[serde(default)]
            polyline: Vec<Coordinate>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(Step::new(raw.instruction, raw.distance_m, raw.boundary).with_polyline(raw.polyline))
    }
}

/// A non-empty, ordered sequence of steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    steps: Vec<Step>,
}

impl Route {
    /// Builds a route. Fails with `NavError::EmptyRoute` when `steps` is empty.
    pub fn new(steps: Vec<Step>) -> Result<Self, NavError> {
        if steps.is_empty() {
            return Err(NavError::EmptyRoute);
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; kept for the `len`/`is_empty` pairing.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn total_distance_m(&self) -> f64 {
        self.steps.iter().map(|s| s.distance_m).sum()
    }

    /// Bounding box over every step boundary and polyline point.
    pub fn bounds(&self) -> BoundingBox {
        let mut bbox = BoundingBox::around(self.steps[0].boundary);
        for step in &self.steps {
            bbox.extend(&step.boundary);
            for c in &step.polyline {
                bbox.extend(c);
            }
        }
        bbox
    }
}

impl<'de> Deserialize<'de> for Route {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            steps: Vec<Step>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Route::new(raw.steps).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pt, three_step_route};

    #[test]
    fn test_empty_route_rejected() {
        assert_eq!(Route::new(Vec::new()), Err(NavError::EmptyRoute));
    }

    #[test]
    fn test_negative_distance_clamped() {
        let step = Step::new("Go", -5.0, pt(0.0, 0.0));
        assert_eq!(step.distance_m, 0.0);
    }

    #[test]
    fn test_total_distance() {
        let route = three_step_route();
        assert_eq!(route.len(), 3);
        assert_eq!(route.total_distance_m(), 150.0);
    }

    #[test]
    fn test_bounds_include_polyline() {
        let route = Route::new(vec![
            Step::new("Head north", 100.0, pt(48.0, 16.0))
                .with_polyline(vec![pt(48.0, 16.0), pt(48.001, 15.999)]),
            Step::new("Arrive", 0.0, pt(48.002, 16.0)),
        ])
        .unwrap();
        let bbox = route.bounds();
        assert_eq!(bbox.min_lon, 15.999);
        assert_eq!(bbox.max_lat, 48.002);
    }

    #[test]
    fn test_deserialize_rejects_empty_steps() {
        let result: Result<Route, _> = serde_json::from_str(r#"{"steps": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_route() {
        let json = r#"{"steps": [
            {"instruction": "Turn left", "distance_m": 100.0, "boundary": {"lat": 1.0, "lon": 2.0}}
        ]}"#;
        let route: Route = serde_json::from_str(json).unwrap();
        assert_eq!(route.steps()[0].instruction, "Turn left");
        assert!(route.steps()[0].polyline.is_empty());
    }

    #[test]
    fn test_deserialize_step_clamps_distance() {
        let step: Step = serde_json::from_str(
            r#"{"instruction": "Go", "distance_m": -12.0, "boundary": {"lat": 1.0, "lon": 2.0}}"#,
        )
        .unwrap();
        assert_eq!(step.distance_m, 0.0);
    }

    #[test]
    fn test_deserialize_rejects_out_of_range_boundary() {
        let json = r#"{"steps": [
            {"instruction": "Go", "distance_m": 5.0, "boundary": {"lat": 123.0, "lon": 2.0}}
        ]}"#;
        let result: Result<Route, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
