use std::sync::Arc;

use tracing::debug;

use crate::{
    error::WeatherError,
    model::{Coordinate, CurrentConditions, FetchResult, ForecastSet},
    provider::{WeatherProvider, WeatherQuery},
};

/// Current conditions and forecast for one query; each side fails on its own.
pub type WeatherPair = (FetchResult<CurrentConditions>, FetchResult<ForecastSet>);

#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherFetcher {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    pub async fn fetch_by_coordinate(&self, coordinate: Coordinate) -> WeatherPair {
        self.fetch(WeatherQuery::Coordinate(coordinate)).await
    }

    pub async fn fetch_by_place_name(&self, place: &str) -> WeatherPair {
        if place.trim().is_empty() {
            let err = WeatherError::place_not_found(place);
            return (FetchResult::Failure(err.clone()), FetchResult::Failure(err));
        }

        self.fetch(WeatherQuery::Place(place.to_string())).await
    }

    /// Issues both requests concurrently and waits for both.
    pub async fn fetch(&self, query: WeatherQuery) -> WeatherPair {
        debug!("Fetching weather for {query}");

        let (current, forecast) =
            tokio::join!(self.provider.current(&query), self.provider.forecast(&query));

        if let Err(err) = &current {
            debug!("Current conditions for {query} failed: {err}");
        }
        if let Err(err) = &forecast {
            debug!("Forecast for {query} failed: {err}");
        }

        (current.into(), forecast.into())
    }
}
