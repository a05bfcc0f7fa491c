use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    error::WeatherError,
    location::{LocationProvider, PermissionStatus},
    model::FetchResult,
};

/// Proof that location permission was granted during the current trigger.
///
/// Only [`PermissionGate::request_access`] hands these out, so coordinate resolution
/// cannot be attempted without asking first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Granted {
    _private: (),
}

#[derive(Debug, Clone)]
pub struct PermissionGate {
    provider: Arc<dyn LocationProvider>,
}

impl PermissionGate {
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self { provider }
    }

    /// Asks the platform once. No automatic retry; the user re-triggers via refresh.
    pub async fn request_access(&self) -> FetchResult<Granted> {
        match self.provider.request_foreground_permission().await {
            Ok(PermissionStatus::Granted) => {
                debug!("Location permission granted");
                FetchResult::Success(Granted { _private: () })
            }
            Ok(status) => {
                warn!("Location permission not granted: {status:?}");
                FetchResult::Failure(WeatherError::PermissionDenied)
            }
            Err(err) => {
                warn!("Location permission request failed: {err}");
                FetchResult::Failure(err)
            }
        }
    }
}
