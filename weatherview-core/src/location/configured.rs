//! Location provider for hosts without a positioning service: the position comes from
//! configuration and reverse geocoding goes through the OpenWeather geocoding API.

use async_trait::async_trait;
use tracing::debug;

use crate::{
    config::LocationConfig,
    error::WeatherError,
    model::{Accuracy, Coordinate},
    provider::openweather::OpenWeatherProvider,
};

use super::{GeocodedPlace, LocationProvider, PermissionStatus};

#[derive(Debug, Clone)]
pub struct ConfiguredLocationProvider {
    enabled: bool,
    coordinate: Option<Coordinate>,
    geocoder: OpenWeatherProvider,
}

impl ConfiguredLocationProvider {
    pub fn new(enabled: bool, coordinate: Option<Coordinate>, geocoder: OpenWeatherProvider) -> Self {
        Self { enabled, coordinate, geocoder }
    }

    pub fn from_config(config: &LocationConfig, geocoder: OpenWeatherProvider) -> Self {
        Self::new(config.enabled, config.coordinate(), geocoder)
    }
}

#[async_trait]
impl LocationProvider for ConfiguredLocationProvider {
    async fn request_foreground_permission(&self) -> Result<PermissionStatus, WeatherError> {
        Ok(if self.enabled { PermissionStatus::Granted } else { PermissionStatus::Denied })
    }

    async fn current_position(&self, accuracy: Accuracy) -> Result<Coordinate, WeatherError> {
        // A configured position is exact; the hint only matters to real positioning services.
        debug!("Using configured position ({accuracy} accuracy requested)");
        self.coordinate.ok_or_else(|| {
            WeatherError::location_unavailable(
                "no position configured; run `weatherview configure` to set latitude and longitude",
            )
        })
    }

    async fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> Result<Vec<GeocodedPlace>, WeatherError> {
        self.geocoder.reverse_geocode(coordinate).await
    }
}
