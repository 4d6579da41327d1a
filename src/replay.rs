//! # GPX Replay
//!
//! Feeds a recorded GPX track into a running navigator as if it were a
//! live location provider. Each point is posted as a location update,
//! followed by a region event for every step geofence the point enters.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use tokio::task::JoinHandle;

use crate::core::region::SoftwareGeofence;
use crate::geo::Coordinate;
use crate::runtime::NavigatorHandle;

#[derive(Debug)]
pub enum ReplayError {
    Io(std::io::Error),
    Parse(String),
    /// The file holds no track or route points.
    Empty,
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::Io(e) => write!(f, "replay I/O error: {e}"),
            ReplayError::Parse(msg) => write!(f, "GPX parse error: {msg}"),
            ReplayError::Empty => write!(f, "GPX file has no track or route points"),
        }
    }
}

impl std::error::Error for ReplayError {}

/// Reads the positions of a GPX document in travel order.
///
/// Track points are used when present (all tracks and segments,
/// flattened); otherwise route points.
pub fn parse_track<R: Read>(reader: R) -> Result<Vec<Coordinate>, ReplayError> {
    let gpx = gpx::read(reader).map_err(|e| ReplayError::Parse(e.to_string()))?;

    let to_coordinate = |wp: &gpx::Waypoint| Coordinate {
        lat: wp.point().y(),
        lon: wp.point().x(),
    };

    let mut points: Vec<Coordinate> = gpx
        .tracks
        .iter()
        .flat_map(|t| t.segments.iter())
        .flat_map(|seg| seg.points.iter())
        .map(to_coordinate)
        .collect();

    if points.is_empty() {
        points = gpx
            .routes
            .iter()
            .flat_map(|r| r.points.iter())
            .map(to_coordinate)
            .collect();
    }

    if points.is_empty() {
        return Err(ReplayError::Empty);
    }
    Ok(points)
}

/// Reads a GPX file from disk. See [`parse_track`].
pub fn load_track(path: &Path) -> Result<Vec<Coordinate>, ReplayError> {
    let file = File::open(path).map_err(ReplayError::Io)?;
    let points = parse_track(BufReader::new(file))?;
    info!("Loaded {} replay points from {}", points.len(), path.display());
    Ok(points)
}

/// Posts every point to `handle`, waiting `interval` between points.
///
/// The replay is the geofence's only position source. Feeding it points
/// before navigation starts would mark the first region as already
/// entered.
///
/// Resolves to the number of points delivered; stops early if the
/// runtime goes away.
pub fn spawn_replay(
    points: Vec<Coordinate>,
    interval: Duration,
    geofence: SoftwareGeofence,
    handle: NavigatorHandle,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut delivered = 0;
        for point in points {
            if !handle.location_update(point) {
                break;
            }
            for id in geofence.observe(point) {
                debug!("Replay crossed region {}", id);
                handle.region_entered(id);
            }
            delivered += 1;
            tokio::time::sleep(interval).await;
        }
        info!("Replay finished after {} points", delivered);
        delivered
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"
     xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="48.0" lon="16.0"></trkpt>
      <trkpt lat="48.1" lon="16.1"></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="48.2" lon="16.2"></trkpt>
    </trkseg>
  </trk>
  <rte>
    <rtept lat="10.0" lon="10.0"></rtept>
  </rte>
</gpx>"#;

    const ROUTE_ONLY_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"
     xmlns="http://www.topografix.com/GPX/1/1">
  <rte>
    <rtept lat="48.2000" lon="16.3500"></rtept>
    <rtept lat="48.2100" lon="16.3600"></rtept>
  </rte>
</gpx>"#;

    #[test]
    fn parse_track_flattens_segments() {
        let points = parse_track(TRACK_GPX.as_bytes()).unwrap();
        assert_eq!(points.len(), 3);
        assert!((points[0].lat - 48.0).abs() < 1e-9);
        assert!((points[2].lon - 16.2).abs() < 1e-9);
    }

    #[test]
    fn parse_track_falls_back_to_route_points() {
        let points = parse_track(ROUTE_ONLY_GPX.as_bytes()).unwrap();
        assert_eq!(points.len(), 2);
        assert!((points[1].lat - 48.21).abs() < 1e-9);
    }

    #[test]
    fn parse_empty_gpx_is_error() {
        let empty = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"
     xmlns="http://www.topografix.com/GPX/1/1">
</gpx>"#;
        assert!(matches!(parse_track(empty.as_bytes()), Err(ReplayError::Empty)));
    }

    #[test]
    fn parse_invalid_xml_returns_error() {
        assert!(matches!(
            parse_track(&b"not xml at all"[..]),
            Err(ReplayError::Parse(_))
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = load_track(Path::new("/nonexistent/stepnav/track.gpx"));
        assert!(matches!(result, Err(ReplayError::Io(_))));
    }
}
