//! # Navigation Core
//!
//! The step-tracking state machine and everything it needs.
//! It knows nothing about any specific platform, map or speech engine.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Session (state)      │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No I/O. Injected       │
//!                    │  monitor + sink only.   │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │  Runtime   │      │  Services  │      │  Geofence  │
//!     │  (tokio    │      │ (Nominatim,│      │ (platform  │
//!     │   queue)   │      │   OSRM)    │      │ / software)│
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: the `Session` struct, cursor and region bookkeeping
//! - [`action`]: the `Action` enum and `update()`
//! - [`route`]: `Route` and `Step`
//! - [`region`]: step geofences and the `RegionMonitor` seam
//! - [`instruction`]: announcement text
//! - [`event`]: what the session tells its host

pub mod action;
pub mod config;
pub mod error;
pub mod event;
pub mod instruction;
pub mod permission;
pub mod region;
pub mod route;
pub mod state;

// Re-export commonly used types for convenience
pub use action::{Action, Effect, update};
pub use error::NavError;
pub use event::{ChannelSink, EventSink, NavEvent};
pub use region::{MonitoredRegion, RegionMonitor, SoftwareGeofence};
pub use route::{Route, Step};
pub use state::{AdvancePolicy, NavigationState, Session, SessionSettings};
