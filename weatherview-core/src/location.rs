use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use tracing::debug;

use crate::{
    error::WeatherError,
    model::{Accuracy, Coordinate, PlaceName},
    permission::Granted,
};

pub mod configured;

pub use configured::ConfiguredLocationProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// One reverse-geocoding candidate as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeocodedPlace {
    pub city: Option<String>,
    pub iso_country_code: Option<String>,
}

/// Platform location service.
#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    async fn request_foreground_permission(&self) -> Result<PermissionStatus, WeatherError>;

    async fn current_position(&self, accuracy: Accuracy) -> Result<Coordinate, WeatherError>;

    async fn reverse_geocode(&self, coordinate: Coordinate)
    -> Result<Vec<GeocodedPlace>, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct LocationResolver {
    provider: Arc<dyn LocationProvider>,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self { provider }
    }

    pub async fn resolve_coordinate(
        &self,
        _granted: &Granted,
        accuracy: Accuracy,
    ) -> Result<Coordinate, WeatherError> {
        debug!("Resolving coordinate at {accuracy} accuracy");

        let coordinate = self
            .provider
            .current_position(accuracy)
            .await
            .map_err(as_location_unavailable)?;

        if !coordinate.is_valid() {
            return Err(WeatherError::location_unavailable(format!(
                "position out of range: {coordinate}"
            )));
        }

        debug!("Resolved coordinate: {coordinate}");
        Ok(coordinate)
    }

    pub async fn to_place_name(&self, coordinate: Coordinate) -> Result<PlaceName, WeatherError> {
        let places = self
            .provider
            .reverse_geocode(coordinate)
            .await
            .map_err(as_location_unavailable)?;

        let first = places.into_iter().next().ok_or_else(|| {
            WeatherError::location_unavailable(format!("no place found at {coordinate}"))
        })?;

        let city = first.city.as_deref().map(strip_quotes).unwrap_or_default();
        if city.is_empty() {
            return Err(WeatherError::location_unavailable(format!(
                "no city name for {coordinate}"
            )));
        }

        let country_code = first.iso_country_code.as_deref().map(strip_quotes).unwrap_or_default();

        debug!("Reverse geocoded {coordinate} to {city}, {country_code}");
        Ok(PlaceName { city, country_code })
    }
}

/// Removes quote characters wrapped around geocoder output. Apostrophes inside a name stay.
pub fn strip_quotes(raw: &str) -> String {
    const QUOTES: &[char] = &['"', '\'', '`', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}'];

    raw.trim().trim_matches(QUOTES).trim().to_string()
}

// Permission problems keep their kind; everything else reads as "no location".
fn as_location_unavailable(err: WeatherError) -> WeatherError {
    match err {
        WeatherError::PermissionDenied | WeatherError::LocationUnavailable { .. } => err,
        other => WeatherError::location_unavailable(other.to_string()),
    }
}
