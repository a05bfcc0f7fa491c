use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A city plus ISO country code, e.g. `Tampere, FI`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceName {
    pub city: String,
    pub country_code: String,
}

impl PlaceName {
    /// Value for the provider's `q` parameter.
    pub fn query_key(&self) -> String {
        if self.country_code.is_empty() {
            self.city.clone()
        } else {
            format!("{},{}", self.city, self.country_code)
        }
    }
}

impl fmt::Display for PlaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.country_code.is_empty() {
            f.write_str(&self.city)
        } else {
            write!(f, "{}, {}", self.city, self.country_code)
        }
    }
}

/// Requested position accuracy. Lower accuracy resolves faster and is used on refresh paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    Lowest,
    #[default]
    Low,
    Balanced,
    High,
}

impl Accuracy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accuracy::Lowest => "lowest",
            Accuracy::Low => "low",
            Accuracy::Balanced => "balanced",
            Accuracy::High => "high",
        }
    }

    pub const fn all() -> &'static [Accuracy] {
        &[Accuracy::Lowest, Accuracy::Low, Accuracy::Balanced, Accuracy::High]
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Accuracy {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        Accuracy::all()
            .iter()
            .copied()
            .find(|a| a.as_str() == lower)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown accuracy '{value}'. Supported values: lowest, low, balanced, high."
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub description: String,
    pub icon_id: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub wind_speed: f64,
    pub wind_gust: Option<f64>,
    pub precipitation_1h: Option<f64>,
    pub sunrise_unix: Option<i64>,
    pub sunset_unix: Option<i64>,
    pub country_code: String,
    pub place_name: Option<String>,
    pub status_code: u16,
    pub timezone_offset_secs: i32,
}

impl CurrentConditions {
    pub fn sunrise_local(&self) -> Option<DateTime<FixedOffset>> {
        self.sunrise_unix.and_then(|ts| to_local(ts, self.timezone_offset_secs))
    }

    pub fn sunset_local(&self) -> Option<DateTime<FixedOffset>> {
        self.sunset_unix.and_then(|ts| to_local(ts, self.timezone_offset_secs))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp_unix: i64,
    /// Provider slot label, `YYYY-MM-DD HH:MM:SS` in UTC.
    pub time_of_day_text: String,
    pub description: String,
    pub icon_id: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub wind_speed: f64,
    pub wind_gust: Option<f64>,
    pub precipitation_3h: Option<f64>,
}

impl ForecastEntry {
    pub fn time_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp_unix, 0)
    }
}

/// 5-day forecast in 3-hour slots, ascending by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSet {
    status_code: u16,
    entries: Vec<ForecastEntry>,
    pub city: Option<PlaceName>,
    pub timezone_offset_secs: i32,
}

impl ForecastSet {
    /// Rejects entry lists whose timestamps are not strictly increasing.
    pub fn new(status_code: u16, entries: Vec<ForecastEntry>) -> Result<Self, WeatherError> {
        if let Some(pair) = entries
            .windows(2)
            .find(|pair| pair[1].timestamp_unix <= pair[0].timestamp_unix)
        {
            return Err(WeatherError::malformed(format!(
                "forecast entries out of order: {} followed by {}",
                pair[0].time_of_day_text, pair[1].time_of_day_text
            )));
        }

        Ok(Self { status_code, entries, city: None, timezone_offset_secs: 0 })
    }

    pub fn with_city(mut self, city: Option<PlaceName>, timezone_offset_secs: i32) -> Self {
        self.city = city;
        self.timezone_offset_secs = timezone_offset_secs;
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn entries(&self) -> &[ForecastEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of one fetch: exactly one of data or failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult<T> {
    Success(T),
    Failure(WeatherError),
}

impl<T> FetchResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            FetchResult::Success(value) => Some(value),
            FetchResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&WeatherError> {
        match self {
            FetchResult::Success(_) => None,
            FetchResult::Failure(err) => Some(err),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchResult<U> {
        match self {
            FetchResult::Success(value) => FetchResult::Success(f(value)),
            FetchResult::Failure(err) => FetchResult::Failure(err),
        }
    }

    pub fn into_result(self) -> Result<T, WeatherError> {
        self.into()
    }
}

impl<T> From<Result<T, WeatherError>> for FetchResult<T> {
    fn from(result: Result<T, WeatherError>) -> Self {
        match result {
            Ok(value) => FetchResult::Success(value),
            Err(err) => FetchResult::Failure(err),
        }
    }
}

impl<T> From<FetchResult<T>> for Result<T, WeatherError> {
    fn from(result: FetchResult<T>) -> Self {
        match result {
            FetchResult::Success(value) => Ok(value),
            FetchResult::Failure(err) => Err(err),
        }
    }
}

fn to_local(ts: i64, offset_secs: i32) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset_secs)?;
    DateTime::from_timestamp(ts, 0).map(|utc| utc.with_timezone(&offset))
}
