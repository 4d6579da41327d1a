//! # Navigation Events
//!
//! Everything the session tells its host. Display, speech and map view
//! adapters subscribe through an [`EventSink`].

use log::warn;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::error::NavError;
use crate::geo::{BoundingBox, Coordinate};

#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    /// Text to show and speak.
    Instruction(String),
    /// The last step boundary was crossed.
    Arrived,
    /// Center the map on this position.
    Recenter(Coordinate),
    /// Fit the map to this area (the active route).
    FitToRoute(BoundingBox),
    /// A new route became active.
    RouteReady { steps: usize, distance_m: f64 },
    /// The platform should prompt for location permission.
    AuthorizationRequested,
    Error(NavError),
}

/// Receiver of navigation events. Fire-and-forget.
pub trait EventSink: Send {
    fn emit(&mut self, event: NavEvent);
}

/// Forwards events into a tokio channel.
pub struct ChannelSink {
    tx: UnboundedSender<NavEvent>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<NavEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: NavEvent) {
        if self.tx.send(event).is_err() {
            warn!("Failed to emit navigation event: receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_forwards() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut sink = ChannelSink::new(tx);
        sink.emit(NavEvent::Arrived);
        assert_eq!(rx.try_recv().unwrap(), NavEvent::Arrived);
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let mut sink = ChannelSink::new(tx);
        sink.emit(NavEvent::Instruction("ignored".into()));
    }
}
