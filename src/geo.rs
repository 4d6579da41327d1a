//! # Geodesy
//!
//! WGS84 coordinates, great-circle distance and bounding boxes.
//! Everything here is plain math with no I/O.

use serde::{Deserialize, Serialize};

use crate::core::error::NavError;

/// Earth radius in meters (WGS84 mean).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting non-finite or out-of-range degrees.
    pub fn new(lat: f64, lon: f64) -> Result<Self, NavError> {
        let coordinate = Self { lat, lon };
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(NavError::InvalidCoordinate { lat, lon })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine(self, other)
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            lat: f64,
            lon: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Coordinate::new(raw.lat, raw.lon).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// Haversine distance between two coordinates in meters.
pub fn haversine(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Axis-aligned latitude/longitude rectangle.
///
/// Hosts use this to fit a map view to the active route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// A degenerate box around a single coordinate.
    pub fn around(c: Coordinate) -> Self {
        Self {
            min_lat: c.lat,
            min_lon: c.lon,
            max_lat: c.lat,
            max_lon: c.lon,
        }
    }

    pub fn extend(&mut self, c: &Coordinate) {
        self.min_lat = self.min_lat.min(c.lat);
        self.min_lon = self.min_lon.min(c.lon);
        self.max_lat = self.max_lat.max(c.lat);
        self.max_lon = self.max_lon.max(c.lon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    #[test]
    fn haversine_same_point() {
        let p = pt(48.2082, 16.3738);
        assert!(haversine(&p, &p).abs() < 0.01);
    }

    #[test]
    fn haversine_known_distance() {
        // Vienna to Bratislava ~55 km
        let vienna = pt(48.2082, 16.3738);
        let bratislava = pt(48.1486, 17.1077);
        let dist = vienna.distance_to(&bratislava);
        assert!(
            dist > 50_000.0 && dist < 60_000.0,
            "Expected ~55 km, got {:.0} m",
            dist
        );
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn bounding_box_extends_to_cover_points() {
        let mut bbox = BoundingBox::around(pt(48.0, 16.0));
        for p in [pt(48.5, 15.5), pt(47.9, 16.4)] {
            bbox.extend(&p);
        }
        assert_eq!(bbox.min_lat, 47.9);
        assert_eq!(bbox.max_lat, 48.5);
        assert_eq!(bbox.min_lon, 15.5);
        assert_eq!(bbox.max_lon, 16.4);
    }

    #[test]
    fn deserialize_validates_range() {
        let ok: Coordinate = serde_json::from_str(r#"{"lat": 48.2, "lon": 16.37}"#).unwrap();
        assert_eq!(ok, pt(48.2, 16.37));
        let bad: Result<Coordinate, _> = serde_json::from_str(r#"{"lat": 95.0, "lon": 16.37}"#);
        assert!(bad.is_err());
    }
}
