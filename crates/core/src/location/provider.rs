use async_trait::async_trait;

use crate::errors::CoreError;

/// Requested fix quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    /// Satellite fix; slow, may time out indoors
    High,
    /// Network/cell based; fast, coarse
    Low,
}

/// A position fix in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Platform geolocation (browser API, GPS daemon, test double).
///
/// Implementations report denial with `CoreError::LocationDenied` and any
/// other failure with `CoreError::LocationUnavailable`. Timeouts are
/// enforced by the caller, so implementations may simply wait.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait LocationProvider: Send + Sync {
    /// Human-readable name of this provider (for logs).
    fn name(&self) -> &str;

    async fn current_position(&self, accuracy: Accuracy) -> Result<Coordinates, CoreError>;
}
