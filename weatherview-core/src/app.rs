//! Wires the pipeline components to the view-state store for both flows.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    Config,
    config::LookupMode,
    error::WeatherError,
    fetcher::WeatherFetcher,
    location::{ConfiguredLocationProvider, LocationProvider, LocationResolver},
    model::{Accuracy, FetchResult},
    permission::PermissionGate,
    provider::{WeatherProvider, provider_from_config},
    store::{Flow, Trigger, ViewStateStore},
};

/// Result of one refresh or search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerOutcome {
    pub trigger: Trigger,
    /// `false` when a newer trigger superseded this one before it completed.
    pub applied: bool,
}

#[derive(Debug, Clone)]
pub struct WeatherApp {
    gate: PermissionGate,
    resolver: LocationResolver,
    fetcher: WeatherFetcher,
    store: Arc<ViewStateStore>,
    lookup: LookupMode,
}

impl WeatherApp {
    pub fn new(
        location: Arc<dyn LocationProvider>,
        weather: Arc<dyn WeatherProvider>,
        store: Arc<ViewStateStore>,
    ) -> Self {
        Self {
            gate: PermissionGate::new(location.clone()),
            resolver: LocationResolver::new(location),
            fetcher: WeatherFetcher::new(weather),
            store,
            lookup: LookupMode::default(),
        }
    }

    /// Builds the app on top of OpenWeather and the configured location.
    pub fn from_config(config: &Config, store: Arc<ViewStateStore>) -> Result<Self> {
        let provider = provider_from_config(config)?;
        let location = ConfiguredLocationProvider::from_config(&config.location, provider.clone());

        Ok(Self::new(Arc::new(location), Arc::new(provider), store)
            .with_lookup(config.location.lookup))
    }

    pub fn with_lookup(mut self, lookup: LookupMode) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn store(&self) -> &Arc<ViewStateStore> {
        &self.store
    }

    /// Permission, then position, then both fetches. Fills the current-location slots only.
    pub async fn refresh_current_location(&self, accuracy: Accuracy) -> TriggerOutcome {
        let trigger = self.store.begin(Flow::CurrentLocation, None);

        let granted = match self.gate.request_access().await {
            FetchResult::Success(granted) => granted,
            FetchResult::Failure(err) => return self.fail(trigger, err),
        };

        let coordinate = match self.resolver.resolve_coordinate(&granted, accuracy).await {
            Ok(coordinate) => coordinate,
            Err(err) => return self.fail(trigger, err),
        };

        let (pair, label) = match self.lookup {
            LookupMode::Coordinates => {
                let (place, pair) = tokio::join!(
                    self.resolver.to_place_name(coordinate),
                    self.fetcher.fetch_by_coordinate(coordinate)
                );
                let label = match place {
                    Ok(place) => place.to_string(),
                    Err(err) => {
                        warn!("Reverse geocoding failed, labelling by coordinate: {err}");
                        coordinate.to_string()
                    }
                };
                (pair, label)
            }
            LookupMode::PlaceName => {
                let place = match self.resolver.to_place_name(coordinate).await {
                    Ok(place) => place,
                    Err(err) => return self.fail(trigger, err),
                };
                (self.fetcher.fetch_by_place_name(&place.query_key()).await, place.to_string())
            }
        };

        let applied = self.store.complete(trigger, pair, Some(label));
        self.log_outcome(trigger, applied);
        TriggerOutcome { trigger, applied }
    }

    /// Fetches weather for user-entered text. Fills the search slots only.
    pub async fn search(&self, term: &str) -> TriggerOutcome {
        let trigger = self.store.begin(Flow::Search, Some(term.to_string()));

        let pair = self.fetcher.fetch_by_place_name(term).await;

        let applied = self.store.complete(trigger, pair, Some(term.to_string()));
        self.log_outcome(trigger, applied);
        TriggerOutcome { trigger, applied }
    }

    fn fail(&self, trigger: Trigger, err: WeatherError) -> TriggerOutcome {
        warn!("{} trigger #{} failed: {err}", trigger.flow.as_str(), trigger.seq);
        let applied = self.store.fail(trigger, err);
        TriggerOutcome { trigger, applied }
    }

    fn log_outcome(&self, trigger: Trigger, applied: bool) {
        if applied {
            info!("{} trigger #{} completed", trigger.flow.as_str(), trigger.seq);
        }
    }
}
