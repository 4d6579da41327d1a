//! # Runtime
//!
//! Serial event loop around a [`Session`]. Every input (host commands,
//! location fixes, region crossings, provider results) arrives as an
//! [`Action`] on one queue and is applied in arrival order, so no two
//! events ever touch the session concurrently.
//!
//! Provider calls run as spawned tokio tasks. Their results are posted
//! back to the same queue tagged with the generation they were started
//! under; `update()` drops results whose generation is no longer current.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::AbortHandle;

use crate::core::action::{Action, Effect, update};
use crate::core::permission::PermissionState;
use crate::core::route::Route;
use crate::core::state::Session;
use crate::geo::Coordinate;
use crate::services::{Geocoder, RoutingProvider, TravelMode};

/// Cloneable entry point for hosts and location feeds.
#[derive(Clone)]
pub struct NavigatorHandle {
    tx: UnboundedSender<Action>,
}

impl NavigatorHandle {
    /// Queues an action. Returns false if the runtime has stopped.
    pub fn send(&self, action: Action) -> bool {
        if self.tx.send(action).is_err() {
            warn!("Failed to queue action: runtime stopped");
            return false;
        }
        true
    }

    /// Geocodes `text`, routes to it from the last known location and
    /// makes the result the active route.
    pub fn set_destination_text(&self, text: impl Into<String>) -> bool {
        self.send(Action::SetDestination(text.into()))
    }

    /// Reports the starting position, then asks for a route from it to
    /// `destination`. Returns false if the runtime has stopped.
    pub fn begin_trip(&self, origin: Coordinate, destination: impl Into<String>) -> bool {
        self.location_update(origin) && self.set_destination_text(destination)
    }

    pub fn set_route(&self, route: Route) -> bool {
        self.send(Action::SetRoute(route))
    }

    pub fn start_navigating(&self) -> bool {
        self.send(Action::StartNavigating)
    }

    pub fn stop_navigating(&self) -> bool {
        self.send(Action::StopNavigating)
    }

    pub fn location_update(&self, coordinate: Coordinate) -> bool {
        self.send(Action::LocationUpdated(coordinate))
    }

    pub fn region_entered(&self, region_id: impl Into<String>) -> bool {
        self.send(Action::RegionEntered(region_id.into()))
    }

    pub fn authorization_changed(&self, permission: PermissionState) -> bool {
        self.send(Action::AuthorizationChanged(permission))
    }

    pub fn shutdown(&self) -> bool {
        self.send(Action::Shutdown)
    }
}

pub struct Runtime {
    session: Session,
    geocoder: Arc<dyn Geocoder>,
    router: Arc<dyn RoutingProvider>,
    travel_mode: TravelMode,
    tx: UnboundedSender<Action>,
    rx: UnboundedReceiver<Action>,
    // Abort handles for the current destination request
    in_flight: Vec<AbortHandle>,
}

impl Runtime {
    pub fn new(
        session: Session,
        geocoder: Arc<dyn Geocoder>,
        router: Arc<dyn RoutingProvider>,
        travel_mode: TravelMode,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session,
            geocoder,
            router,
            travel_mode,
            tx,
            rx,
            in_flight: Vec::new(),
        }
    }

    pub fn handle(&self) -> NavigatorHandle {
        NavigatorHandle {
            tx: self.tx.clone(),
        }
    }

    /// Processes actions until `Action::Shutdown`, then hands the session
    /// back to the caller.
    pub async fn run(mut self) -> Session {
        info!(
            "Runtime started (geocoder={}, router={}, mode={})",
            self.geocoder.name(),
            self.router.name(),
            self.travel_mode.label()
        );

        while let Some(action) = self.rx.recv().await {
            debug!("Runtime received: {:?}", action);
            let effect = update(&mut self.session, action);
            if !self.dispatch(effect) {
                break;
            }
        }

        for handle in self.in_flight.drain(..) {
            handle.abort();
        }
        info!("Runtime stopped");
        self.session
    }

    /// Performs an effect. Returns false when the loop should stop.
    fn dispatch(&mut self, effect: Effect) -> bool {
        match effect {
            Effect::None => {}
            Effect::Geocode {
                generation,
                address,
            } => {
                // A newer request makes the old one pointless
                for handle in self.in_flight.drain(..) {
                    handle.abort();
                }
                let handle = spawn_geocode(
                    generation,
                    address,
                    self.geocoder.clone(),
                    self.tx.clone(),
                );
                self.in_flight.push(handle);
            }
            Effect::ComputeRoute {
                generation,
                source,
                destination,
            } => {
                let handle = spawn_route(
                    generation,
                    source,
                    destination,
                    self.travel_mode,
                    self.router.clone(),
                    self.tx.clone(),
                );
                self.in_flight.push(handle);
            }
            Effect::Shutdown => return false,
        }
        true
    }
}

fn spawn_geocode(
    generation: u64,
    address: String,
    geocoder: Arc<dyn Geocoder>,
    tx: UnboundedSender<Action>,
) -> AbortHandle {
    info!("Spawning geocode for '{}' (generation {})", address, generation);
    let handle = tokio::spawn(async move {
        let result = geocoder.geocode(&address).await;
        if tx
            .send(Action::GeocodeFinished { generation, result })
            .is_err()
        {
            warn!("Failed to send geocode result (generation {generation}): receiver dropped");
        }
    });
    handle.abort_handle()
}

fn spawn_route(
    generation: u64,
    source: Coordinate,
    destination: Coordinate,
    mode: TravelMode,
    router: Arc<dyn RoutingProvider>,
    tx: UnboundedSender<Action>,
) -> AbortHandle {
    info!("Spawning route computation (generation {})", generation);
    let handle = tokio::spawn(async move {
        let result = router.compute_route(source, destination, mode).await;
        if tx
            .send(Action::RouteFinished { generation, result })
            .is_err()
        {
            warn!("Failed to send route result (generation {generation}): receiver dropped");
        }
    });
    handle.abort_handle()
}
