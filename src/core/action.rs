//! # Actions
//!
//! Everything that can happen to a navigation session becomes an `Action`.
//! Host presses "Start"? That's `Action::StartNavigating`.
//! The geocoder answers? That's `Action::GeocodeFinished { generation, result }`.
//!
//! `update()` applies one action to the session and returns the `Effect`
//! the runtime must perform. The session does no I/O of its own; async
//! work is requested through effects and its results come back as actions
//! tagged with the generation they were started under.
//!
//! ```text
//! Session + Action  →  update()  →  Effect
//! ```

use log::{debug, info};

use crate::core::error::NavError;
use crate::core::permission::PermissionState;
use crate::core::route::Route;
use crate::core::state::Session;
use crate::geo::Coordinate;
use crate::services::ProviderError;

#[derive(Debug, Clone)]
pub enum Action {
    /// Look up `text` and route to it from the last known location.
    SetDestination(String),
    /// Use a route computed elsewhere.
    SetRoute(Route),
    StartNavigating,
    StopNavigating,
    LocationUpdated(Coordinate),
    RegionEntered(String),
    AuthorizationChanged(PermissionState),
    GeocodeFinished {
        generation: u64,
        result: Result<Coordinate, ProviderError>,
    },
    RouteFinished {
        generation: u64,
        result: Result<Route, ProviderError>,
    },
    Shutdown,
}

/// Work the runtime performs on behalf of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Geocode {
        generation: u64,
        address: String,
    },
    ComputeRoute {
        generation: u64,
        source: Coordinate,
        destination: Coordinate,
    },
    Shutdown,
}

pub fn update(session: &mut Session, action: Action) -> Effect {
    match action {
        Action::SetDestination(text) => {
            let generation = session.begin_request();
            info!("Destination '{}' requested (generation {})", text, generation);
            Effect::Geocode {
                generation,
                address: text,
            }
        }
        Action::SetRoute(route) => {
            session.set_route(route);
            Effect::None
        }
        Action::StartNavigating => {
            if let Err(e) = session.start_navigating() {
                session.report(e);
            }
            Effect::None
        }
        Action::StopNavigating => {
            session.stop_navigating();
            Effect::None
        }
        Action::LocationUpdated(coordinate) => {
            session.on_location_update(coordinate);
            Effect::None
        }
        Action::RegionEntered(id) => {
            session.on_region_entered(&id);
            Effect::None
        }
        Action::AuthorizationChanged(permission) => {
            session.on_authorization_changed(permission);
            Effect::None
        }
        Action::GeocodeFinished { generation, result } => {
            if let Err(stale) = session.check_generation(generation) {
                session.report(stale);
                return Effect::None;
            }
            let destination = match result {
                Ok(destination) => destination,
                Err(e) => {
                    session.report(NavError::Geocode(e));
                    return Effect::None;
                }
            };
            let Some(source) = session.last_location() else {
                session.report(NavError::NoLocation);
                return Effect::None;
            };
            debug!("Routing {} -> {} (generation {})", source, destination, generation);
            Effect::ComputeRoute {
                generation,
                source,
                destination,
            }
        }
        Action::RouteFinished { generation, result } => {
            if let Err(stale) = session.check_generation(generation) {
                session.report(stale);
                return Effect::None;
            }
            match result {
                Ok(route) => session.set_route(route),
                Err(e) => session.report(NavError::Route(e)),
            }
            Effect::None
        }
        Action::Shutdown => Effect::Shutdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::NavEvent;
    use crate::core::state::NavigationState;
    use crate::test_support::{pt, route_with_steps, test_session, three_step_route};

    #[test]
    fn test_destination_requests_geocode() {
        let (mut session, _, _) = test_session();
        let effect = update(&mut session, Action::SetDestination("Stephansplatz".into()));
        assert_eq!(
            effect,
            Effect::Geocode {
                generation: 1,
                address: "Stephansplatz".into()
            }
        );
    }

    #[test]
    fn test_geocode_result_requests_route_from_last_location() {
        let (mut session, _, _) = test_session();
        update(&mut session, Action::LocationUpdated(pt(48.0, 16.0)));
        let Effect::Geocode { generation, .. } =
            update(&mut session, Action::SetDestination("x".into()))
        else {
            panic!("expected geocode effect");
        };
        let effect = update(
            &mut session,
            Action::GeocodeFinished {
                generation,
                result: Ok(pt(48.2, 16.4)),
            },
        );
        assert_eq!(
            effect,
            Effect::ComputeRoute {
                generation,
                source: pt(48.0, 16.0),
                destination: pt(48.2, 16.4)
            }
        );
    }

    #[test]
    fn test_geocode_without_location_reports() {
        let (mut session, sink, _) = test_session();
        update(&mut session, Action::SetDestination("x".into()));
        let effect = update(
            &mut session,
            Action::GeocodeFinished {
                generation: 1,
                result: Ok(pt(48.2, 16.4)),
            },
        );
        assert_eq!(effect, Effect::None);
        assert_eq!(sink.events(), vec![NavEvent::Error(NavError::NoLocation)]);
    }

    #[test]
    fn test_geocode_error_surfaces_without_state_change() {
        let (mut session, sink, _) = test_session();
        update(&mut session, Action::SetRoute(three_step_route()));
        sink.take();
        update(&mut session, Action::SetDestination("nowhere".into()));
        let generation = session.generation();
        update(
            &mut session,
            Action::GeocodeFinished {
                generation,
                result: Err(ProviderError::NotFound("nowhere".into())),
            },
        );
        assert_eq!(session.state(), NavigationState::Previewing);
        assert_eq!(
            sink.events(),
            vec![NavEvent::Error(NavError::Geocode(ProviderError::NotFound(
                "nowhere".into()
            )))]
        );
    }

    #[test]
    fn test_route_error_keeps_prior_state() {
        let (mut session, sink, _) = test_session();
        update(&mut session, Action::SetRoute(three_step_route()));
        update(&mut session, Action::StartNavigating);
        update(&mut session, Action::SetDestination("elsewhere".into()));
        sink.take();
        let generation = session.generation();
        update(
            &mut session,
            Action::RouteFinished {
                generation,
                result: Err(ProviderError::NoRoute("island".into())),
            },
        );
        assert_eq!(session.state(), NavigationState::Navigating);
        assert_eq!(session.monitored_regions().len(), 3);
        let events = sink.events();
        assert!(matches!(events.as_slice(), [NavEvent::Error(NavError::Route(_))]));
    }

    #[test]
    fn test_only_latest_generation_applies() {
        let (mut session, _, _) = test_session();
        update(&mut session, Action::LocationUpdated(pt(48.0, 16.0)));
        update(&mut session, Action::SetDestination("first".into()));
        let gen1 = session.generation();
        update(&mut session, Action::SetDestination("second".into()));
        let gen2 = session.generation();

        update(
            &mut session,
            Action::RouteFinished {
                generation: gen2,
                result: Ok(route_with_steps(2)),
            },
        );
        // gen 1 completes later and must be dropped
        update(
            &mut session,
            Action::RouteFinished {
                generation: gen1,
                result: Ok(three_step_route()),
            },
        );
        assert_eq!(session.route().map(|r| r.len()), Some(2));
    }

    #[test]
    fn test_stop_cancels_in_flight_request() {
        let (mut session, sink, _) = test_session();
        update(&mut session, Action::LocationUpdated(pt(48.0, 16.0)));
        update(&mut session, Action::SetDestination("x".into()));
        let generation = session.generation();
        update(&mut session, Action::StopNavigating);
        sink.take();

        let effect = update(
            &mut session,
            Action::GeocodeFinished {
                generation,
                result: Ok(pt(48.2, 16.4)),
            },
        );
        assert_eq!(effect, Effect::None);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_start_without_route_surfaces_error() {
        let (mut session, sink, _) = test_session();
        update(&mut session, Action::StartNavigating);
        assert_eq!(session.state(), NavigationState::Idle);
        assert_eq!(sink.events(), vec![NavEvent::Error(NavError::NoRoute)]);
    }

    #[test]
    fn test_shutdown() {
        let (mut session, _, _) = test_session();
        assert_eq!(update(&mut session, Action::Shutdown), Effect::Shutdown);
    }
}
