use crate::{
    Config,
    error::WeatherError,
    model::{Coordinate, CurrentConditions, ForecastSet},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::{self, Debug};

pub mod openweather;

/// What to ask the weather provider about.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    Coordinate(Coordinate),
    /// Free text as typed by the user, or a `City,CC` key from reverse geocoding.
    Place(String),
}

impl WeatherQuery {
    /// Text used when the provider cannot find the place.
    pub fn label(&self) -> String {
        match self {
            WeatherQuery::Coordinate(c) => c.to_string(),
            WeatherQuery::Place(name) => name.clone(),
        }
    }
}

impl fmt::Display for WeatherQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherQuery::Coordinate(c) => write!(f, "({c})"),
            WeatherQuery::Place(name) => write!(f, "'{name}'"),
        }
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, query: &WeatherQuery) -> Result<CurrentConditions, WeatherError>;

    async fn forecast(&self, query: &WeatherQuery) -> Result<ForecastSet, WeatherError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = config.require_api_key()?;
    OpenWeatherProvider::from_config(api_key, config)
}
