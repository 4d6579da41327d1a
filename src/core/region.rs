//! # Monitored Regions
//!
//! The session places one circular geofence on every step boundary and
//! advances when the platform reports that the traveler entered one.
//!
//! ```text
//! Session ──register_regions()──▶ RegionMonitor (platform / SoftwareGeofence)
//!    ▲                                   │
//!    └──────── Action::RegionEntered(id) ┘  (through the runtime queue)
//! ```
//!
//! Geofencing itself belongs to the platform. `SoftwareGeofence` is the
//! fallback for hosts without one: it compares observed positions against
//! the registered circles using haversine distance.

use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use crate::core::route::Route;
use crate::geo::Coordinate;

/// Radius of every step geofence, in meters.
pub const REGION_RADIUS_M: f64 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredRegion {
    pub center: Coordinate,
    pub radius_m: f64,
    /// Step index rendered as a string, the form platforms hand back.
    pub identifier: String,
}

impl MonitoredRegion {
    pub fn contains(&self, c: &Coordinate) -> bool {
        self.center.distance_to(c) <= self.radius_m
    }

    /// One region per step, centered on the step boundary.
    pub fn for_route(route: &Route) -> Vec<MonitoredRegion> {
        route
            .steps()
            .iter()
            .enumerate()
            .map(|(i, step)| MonitoredRegion {
                center: step.boundary,
                radius_m: REGION_RADIUS_M,
                identifier: i.to_string(),
            })
            .collect()
    }
}

/// Platform geofencing capability consumed by the session.
pub trait RegionMonitor: Send {
    /// Starts monitoring every region in `regions`, in addition to any
    /// already registered.
    fn register_regions(&mut self, regions: &[MonitoredRegion]);

    /// Stops monitoring everything.
    fn unregister_all(&mut self);
}

#[derive(Debug, Default)]
struct FenceState {
    regions: Vec<(MonitoredRegion, bool)>,
    last_position: Option<Coordinate>,
}

/// Haversine geofence shared between the session (which registers
/// regions) and the location feed (which calls [`observe`]).
///
/// Clones share state.
///
/// [`observe`]: SoftwareGeofence::observe
#[derive(Debug, Clone, Default)]
pub struct SoftwareGeofence {
    inner: Arc<Mutex<FenceState>>,
}

impl SoftwareGeofence {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FenceState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Feeds a position and returns identifiers of regions that went from
    /// outside to inside, in registration order.
    pub fn observe(&self, position: Coordinate) -> Vec<String> {
        let mut state = self.state();
        state.last_position = Some(position);

        let mut entered = Vec::new();
        for (region, inside) in state.regions.iter_mut() {
            let now_inside = region.contains(&position);
            if now_inside && !*inside {
                entered.push(region.identifier.clone());
            }
            *inside = now_inside;
        }
        if !entered.is_empty() {
            debug!("Geofence entered: {:?} at {}", entered, position);
        }
        entered
    }

    /// Number of regions currently monitored.
    pub fn len(&self) -> usize {
        self.state().regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RegionMonitor for SoftwareGeofence {
    fn register_regions(&mut self, regions: &[MonitoredRegion]) {
        let mut state = self.state();
        let position = state.last_position;
        for region in regions {
            // Already inside at registration time is not an entry.
            let inside = position.is_some_and(|p| region.contains(&p));
            state.regions.push((region.clone(), inside));
        }
        debug!("Geofence monitoring {} regions", state.regions.len());
    }

    fn unregister_all(&mut self) {
        self.state().regions.clear();
    }
}
