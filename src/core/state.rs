//! # Navigation Session
//!
//! The step-tracking state machine. Owns the active route, the step
//! cursor and the monitored region set.
//!
//! ```text
//! Session
//! ├── state: NavigationState            // Idle / Previewing / Navigating / Arrived
//! ├── route: Option<Route>              // replaced wholesale, never edited
//! ├── step_cursor: usize                // step being navigated
//! ├── regions: Vec<MonitoredRegion>     // one per step while navigating
//! ├── last_entered: Option<usize>       // strict-ordered policy bookkeeping
//! ├── generation: u64                   // tags outstanding destination requests
//! ├── last_location: Option<Coordinate> // most recent position fix
//! ├── permission: PermissionState       // platform location authorization
//! ├── monitor: Box<dyn RegionMonitor>   // injected geofencing
//! └── sink: Box<dyn EventSink>          // injected display / speech
//! ```
//!
//! ```text
//!            set_route            start_navigating
//!   Idle ───────────────▶ Previewing ───────────────▶ Navigating
//!    ▲  ◀──── stop ────────────┘  ◀──── set_route ───────┘ │
//!    │                                                     │ last region
//!    └──── location update / stop ──── Arrived ◀───────────┘
//! ```
//!
//! Mutations happen only through the methods below, driven serially by
//! `update()` in action.rs.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::error::NavError;
use crate::core::event::{EventSink, NavEvent};
use crate::core::instruction::{InstructionTemplate, format_opening, format_single};
use crate::core::permission::PermissionState;
use crate::core::region::{MonitoredRegion, RegionMonitor};
use crate::core::route::Route;
use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NavigationState {
    /// No active route; the map follows the traveler.
    #[default]
    Idle,
    /// A route is shown but steps are not tracked yet.
    Previewing,
    /// Region crossings advance the step cursor.
    Navigating,
    /// The last step was reached. Returns to Idle on the next fix.
    Arrived,
}

/// How region-entered events advance the cursor.
///
/// Step regions near junctions can overlap and fire back to back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancePolicy {
    /// Every entry advances the cursor by one, whatever its identifier.
    #[default]
    Permissive,
    /// An entry advances only if its identifier is a step index greater
    /// than every index accepted so far in this run.
    StrictOrdered,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionSettings {
    pub advance_policy: AdvancePolicy,
    pub template: InstructionTemplate,
}

pub struct Session {
    state: NavigationState,
    route: Option<Route>,
    step_cursor: usize,
    regions: Vec<MonitoredRegion>,
    last_entered: Option<usize>,
    generation: u64,
    last_location: Option<Coordinate>,
    permission: PermissionState,
    settings: SessionSettings,
    monitor: Box<dyn RegionMonitor>,
    sink: Box<dyn EventSink>,
}

impl Session {
    pub fn new(
        monitor: Box<dyn RegionMonitor>,
        sink: Box<dyn EventSink>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            state: NavigationState::Idle,
            route: None,
            step_cursor: 0,
            regions: Vec::new(),
            last_entered: None,
            generation: 0,
            last_location: None,
            permission: PermissionState::default(),
            settings,
            monitor,
            sink,
        }
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn step_cursor(&self) -> usize {
        self.step_cursor
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn monitored_regions(&self) -> &[MonitoredRegion] {
        &self.regions
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_location(&self) -> Option<Coordinate> {
        self.last_location
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    pub fn is_navigating(&self) -> bool {
        self.state == NavigationState::Navigating
    }

    // ── Route lifecycle ─────────────────────────────────────────────────────

    /// Makes `route` the active route and shows it for preview.
    ///
    /// Any monitoring from a previous run is torn down first, so calling
    /// this while navigating is an implicit re-route. Outstanding
    /// destination requests become stale.
    pub fn set_route(&mut self, route: Route) {
        if self.is_navigating() {
            info!("Re-route while navigating: tearing down {} regions", self.regions.len());
        }
        self.clear_regions();
        self.step_cursor = 0;
        self.last_entered = None;
        self.generation += 1;

        info!(
            "Route set: {} steps, {:.0} m (generation {})",
            route.len(),
            route.total_distance_m(),
            self.generation
        );
        self.sink.emit(NavEvent::RouteReady {
            steps: route.len(),
            distance_m: route.total_distance_m(),
        });
        self.sink.emit(NavEvent::FitToRoute(route.bounds()));
        self.route = Some(route);
        self.state = NavigationState::Previewing;
    }

    /// Starts tracking the active route.
    ///
    /// Registers one region per step, resets the cursor and announces the
    /// first two steps. Rejected with `NavError::NoRoute`, leaving all
    /// state untouched, when no route is set.
    pub fn start_navigating(&mut self) -> Result<(), NavError> {
        let Some(route) = self.route.as_ref() else {
            return Err(NavError::NoRoute);
        };

        let regions = MonitoredRegion::for_route(route);
        let opening = format_opening(route.steps(), self.settings.template);

        self.clear_regions();
        self.monitor.register_regions(&regions);
        self.regions = regions;
        self.step_cursor = 0;
        self.last_entered = None;
        self.state = NavigationState::Navigating;
        info!("Navigation started: monitoring {} regions", self.regions.len());

        if let Some(location) = self.last_location {
            self.sink.emit(NavEvent::Recenter(location));
        }
        if let Some(text) = opening {
            self.announce(text);
        }
        Ok(())
    }

    /// Stops navigation from any state. Always ends in Idle with no
    /// regions and the cursor at 0.
    pub fn stop_navigating(&mut self) {
        self.clear_regions();
        self.step_cursor = 0;
        self.last_entered = None;
        self.generation += 1;

        if let Some(route) = self.route.take() {
            self.sink.emit(NavEvent::FitToRoute(route.bounds()));
        }
        if self.state != NavigationState::Idle {
            info!("Navigation stopped ({:?} -> Idle)", self.state);
        }
        self.state = NavigationState::Idle;
    }

    // ── Location events ─────────────────────────────────────────────────────

    /// Records a position fix.
    ///
    /// Outside of navigation the map follows the traveler. While
    /// navigating the fix is only recorded; progress comes from region
    /// events alone.
    pub fn on_location_update(&mut self, coordinate: Coordinate) {
        self.last_location = Some(coordinate);

        if self.is_navigating() {
            return;
        }
        if self.state == NavigationState::Arrived {
            debug!("Arrived -> Idle");
            self.route = None;
            self.state = NavigationState::Idle;
        }
        self.sink.emit(NavEvent::Recenter(coordinate));
    }

    /// Handles the traveler entering a step region.
    pub fn on_region_entered(&mut self, region_id: &str) {
        if !self.is_navigating() {
            debug!("Region '{}' entered while {:?}, ignored", region_id, self.state);
            return;
        }
        let Some(len) = self.route.as_ref().map(Route::len) else {
            return;
        };

        match self.settings.advance_policy {
            AdvancePolicy::Permissive => self.step_cursor += 1,
            AdvancePolicy::StrictOrdered => match region_id.parse::<usize>() {
                // Entering region i means boundary i is behind the traveler,
                // so missed regions before it are skipped.
                Ok(index) if index < len && self.last_entered.is_none_or(|last| index > last) => {
                    self.last_entered = Some(index);
                    self.step_cursor = index + 1;
                }
                _ => {
                    debug!(
                        "Region '{}' out of order (last accepted {:?}), ignored",
                        region_id, self.last_entered
                    );
                    return;
                }
            },
        }
        debug!("Region '{}' entered, cursor -> {}", region_id, self.step_cursor);

        if self.step_cursor < len {
            let text = self
                .route
                .as_ref()
                .and_then(|route| route.step(self.step_cursor))
                .map(|step| format_single(step, self.settings.template));
            if let Some(text) = text {
                self.announce(text);
            }
        } else {
            info!("Arrived at destination");
            self.sink.emit(NavEvent::Arrived);
            self.step_cursor = 0;
            self.last_entered = None;
            self.clear_regions();
            self.state = NavigationState::Arrived;
        }
    }

    /// Reacts to a change in location authorization.
    pub fn on_authorization_changed(&mut self, permission: PermissionState) {
        self.permission = permission;
        if permission.is_authorized() {
            if let Some(location) = self.last_location {
                self.sink.emit(NavEvent::Recenter(location));
            }
            return;
        }
        match permission {
            PermissionState::NotDetermined => {
                self.sink.emit(NavEvent::AuthorizationRequested);
            }
            PermissionState::Restricted | PermissionState::Denied => {
                warn!("Location access {:?}; position updates will not arrive", permission);
            }
            _ => {
                warn!("Unrecognized location authorization state, ignoring");
            }
        }
    }

    // ── Async request bookkeeping ───────────────────────────────────────────

    /// Opens a new destination request and returns its generation.
    /// Every earlier request becomes stale.
    pub fn begin_request(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Fails with `NavError::StaleResult` unless `generation` is current.
    pub fn check_generation(&self, generation: u64) -> Result<(), NavError> {
        if generation == self.generation {
            Ok(())
        } else {
            Err(NavError::StaleResult {
                generation,
                current: self.generation,
            })
        }
    }

    /// Surfaces an error to the host. Stale results are only logged.
    pub fn report(&mut self, error: NavError) {
        match error {
            NavError::StaleResult { .. } => debug!("Discarding {}", error),
            _ => {
                warn!("{}", error);
                self.sink.emit(NavEvent::Error(error));
            }
        }
    }

    fn announce(&mut self, text: String) {
        info!("Instruction: {}", text);
        self.sink.emit(NavEvent::Instruction(text));
    }

    fn clear_regions(&mut self) {
        self.monitor.unregister_all();
        self.regions.clear();
    }
}
