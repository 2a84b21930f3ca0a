use std::time::Duration;

use tokio::time::timeout;

use crate::config::LogbookConfig;
use crate::errors::CoreError;

use super::provider::{Accuracy, Coordinates, LocationProvider};

/// Stored in place of coordinates when no fix could be obtained.
pub const GPS_UNAVAILABLE: &str = "GPS unavailable";

/// Try to get a fix: high accuracy first, then one low-accuracy retry if
/// the first attempt timed out. Denial and other failures are not retried.
pub async fn locate(
    provider: &dyn LocationProvider,
    config: &LogbookConfig,
) -> Result<Coordinates, CoreError> {
    match attempt(provider, Accuracy::High, config.gps_timeout_secs).await {
        Err(CoreError::LocationTimeout(secs)) => {
            tracing::debug!(
                provider = provider.name(),
                secs,
                "high accuracy fix timed out, retrying with low accuracy"
            );
            attempt(provider, Accuracy::Low, config.gps_fallback_timeout_secs).await
        }
        other => other,
    }
}

/// Location as the string stored on trips. Never fails: any error becomes
/// [`GPS_UNAVAILABLE`].
pub async fn capture_location(provider: &dyn LocationProvider, config: &LogbookConfig) -> String {
    match locate(provider, config).await {
        Ok(coords) => coords.to_string(),
        Err(e) => {
            tracing::warn!(provider = provider.name(), error = %e, "no location fix");
            GPS_UNAVAILABLE.to_string()
        }
    }
}

async fn attempt(
    provider: &dyn LocationProvider,
    accuracy: Accuracy,
    secs: u64,
) -> Result<Coordinates, CoreError> {
    timeout(Duration::from_secs(secs), provider.current_position(accuracy))
        .await
        .map_err(|_| CoreError::LocationTimeout(secs))?
}
