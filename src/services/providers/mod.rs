pub mod nominatim;
pub mod osrm;

use std::time::Duration;

use log::warn;

pub use nominatim::NominatimGeocoder;
pub use osrm::OsrmRouter;

use crate::services::ProviderError;

/// Builds the HTTP client shared by the adapters.
fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Config(format!("HTTP client: {e}")))
}

/// Turns a non-success response into `ProviderError::Api`.
async fn check_status(
    service: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    warn!("{} API error: {} - {}", service, status, message);
    Err(ProviderError::Api { status, message })
}
