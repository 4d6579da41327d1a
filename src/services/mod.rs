pub mod provider;
pub mod providers;

pub use provider::{Geocoder, ProviderError, RoutingProvider, TravelMode};
pub use providers::{NominatimGeocoder, OsrmRouter};
