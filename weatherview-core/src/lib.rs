//! Core library for `weatherview`.
//!
//! This crate defines the location-to-weather pipeline:
//! - Permission gate and location resolution
//! - Weather fetching over a provider abstraction (OpenWeather)
//! - Forecast reduction to per-day rows
//! - An explicit view-state store with per-flow trigger sequencing
//!
//! It is used by `weatherview-cli`, but the store and pipeline do not assume any particular
//! presentation layer.

pub mod app;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod forecast;
pub mod location;
pub mod model;
pub mod permission;
pub mod provider;
pub mod store;

pub use app::{TriggerOutcome, WeatherApp};
pub use config::{Config, ForecastConfig, LocationConfig, LookupMode};
pub use error::WeatherError;
pub use fetcher::{WeatherFetcher, WeatherPair};
pub use forecast::{BoundaryMatcher, ForecastRow, ReductionPolicy, RowKind, reduce, reduce_to_daily};
pub use location::{GeocodedPlace, LocationProvider, LocationResolver, PermissionStatus};
pub use model::{
    Accuracy, Coordinate, CurrentConditions, FetchResult, ForecastEntry, ForecastSet, PlaceName,
};
pub use permission::{Granted, PermissionGate};
pub use provider::{WeatherProvider, WeatherQuery, openweather::OpenWeatherProvider};
pub use store::{Flow, FlowPhase, FlowView, SlotState, Trigger, ViewStateStore, WritePolicy};
