//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::{Arc, Mutex};

use crate::core::event::{EventSink, NavEvent};
use crate::core::region::{MonitoredRegion, RegionMonitor};
use crate::core::route::{Route, Step};
use crate::core::state::{Session, SessionSettings};
use crate::geo::Coordinate;

pub fn pt(lat: f64, lon: f64) -> Coordinate {
    Coordinate { lat, lon }
}

/// Turn left (100 m), Turn right (50 m), Arrive (0 m).
pub fn three_step_route() -> Route {
    Route::new(vec![
        Step::new("Turn left", 100.0, pt(48.0, 16.0)),
        Step::new("Turn right", 50.0, pt(48.001, 16.0)),
        Step::new("Arrive", 0.0, pt(48.001, 16.001)),
    ])
    .unwrap()
}

/// `n` steps named "Step i", 10 m apart along a meridian.
pub fn route_with_steps(n: usize) -> Route {
    let steps = (0..n)
        .map(|i| {
            Step::new(
                format!("Step {i}"),
                10.0 * (i + 1) as f64,
                pt(48.0 + 0.001 * i as f64, 16.0),
            )
        })
        .collect();
    Route::new(steps).unwrap()
}

/// Records every emitted event. Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<NavEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<NavEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns and clears the recorded events.
    pub fn take(&self) -> Vec<NavEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn instructions(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                NavEvent::Instruction(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: NavEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Keeps the currently registered regions. Clones share state.
#[derive(Clone, Default)]
pub struct RecordingMonitor {
    registered: Arc<Mutex<Vec<MonitoredRegion>>>,
}

impl RecordingMonitor {
    pub fn registered(&self) -> Vec<MonitoredRegion> {
        self.registered.lock().unwrap().clone()
    }
}

impl RegionMonitor for RecordingMonitor {
    fn register_regions(&mut self, regions: &[MonitoredRegion]) {
        self.registered.lock().unwrap().extend_from_slice(regions);
    }

    fn unregister_all(&mut self) {
        self.registered.lock().unwrap().clear();
    }
}

/// Creates a session with default settings wired to recording collaborators.
pub fn test_session() -> (Session, RecordingSink, RecordingMonitor) {
    test_session_with(SessionSettings::default())
}

pub fn test_session_with(settings: SessionSettings) -> (Session, RecordingSink, RecordingMonitor) {
    let sink = RecordingSink::default();
    let monitor = RecordingMonitor::default();
    let session = Session::new(Box::new(monitor.clone()), Box::new(sink.clone()), settings);
    (session, sink, monitor)
}
