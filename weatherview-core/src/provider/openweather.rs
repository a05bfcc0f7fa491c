use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    Config,
    config::DEFAULT_BASE_URL,
    error::WeatherError,
    location::GeocodedPlace,
    model::{Coordinate, CurrentConditions, ForecastEntry, ForecastSet, PlaceName},
};

use super::{WeatherProvider, WeatherQuery};

const CURRENT_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";
const REVERSE_GEOCODE_PATH: &str = "/geo/1.0/reverse";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    lang: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            lang: "en".to_string(),
            http: Client::new(),
        }
    }

    pub fn from_config(api_key: String, config: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            lang: config.lang.clone(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Candidate places for a coordinate via the OpenWeather geocoding API.
    pub async fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> Result<Vec<GeocodedPlace>, WeatherError> {
        let params = [
            ("lat", coordinate.latitude.to_string()),
            ("lon", coordinate.longitude.to_string()),
            ("limit", "1".to_string()),
            ("appid", self.api_key.clone()),
        ];
        let (status, body) = self.get(REVERSE_GEOCODE_PATH, &params).await?;
        parse_reverse_geocode(status, &body, coordinate)
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<(u16, String), WeatherError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {url}");

        let res = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| WeatherError::network(format!("request to {path} failed: {e}")))?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::network(format!("reading {path} response failed: {e}")))?;

        debug!("{path} answered with HTTP {status} ({} bytes)", body.len());
        Ok((status, body))
    }

    fn weather_params(&self, query: &WeatherQuery) -> Vec<(&'static str, String)> {
        let mut params = match query {
            WeatherQuery::Coordinate(c) => {
                vec![("lat", c.latitude.to_string()), ("lon", c.longitude.to_string())]
            }
            WeatherQuery::Place(name) => vec![("q", name.trim().to_string())],
        };
        params.push(("appid", self.api_key.clone()));
        params.push(("units", "metric".to_string()));
        params.push(("lang", self.lang.clone()));
        params
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, query: &WeatherQuery) -> Result<CurrentConditions, WeatherError> {
        let (status, body) = self.get(CURRENT_PATH, &self.weather_params(query)).await?;
        parse_current(status, &body, query)
    }

    async fn forecast(&self, query: &WeatherQuery) -> Result<ForecastSet, WeatherError> {
        let (status, body) = self.get(FORECAST_PATH, &self.weather_params(query)).await?;
        parse_forecast(status, &body, query)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    gust: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwVolume {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    #[serde(default)]
    timezone: i32,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    rain: Option<OwVolume>,
    snow: Option<OwVolume>,
    sys: Option<OwSys>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: Option<String>,
    country: Option<String>,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    dt_txt: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    rain: Option<OwVolume>,
    snow: Option<OwVolume>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: Option<OwCity>,
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeoPlace {
    name: Option<String>,
    country: Option<String>,
}

/// Normalizes a current-weather body. `cod` is validated before anything else is read.
pub(crate) fn parse_current(
    http_status: u16,
    body: &str,
    query: &WeatherQuery,
) -> Result<CurrentConditions, WeatherError> {
    let value = parse_json(http_status, body, query)?;
    let status = check_status(http_status, &value, body, query)?;

    // A lookup that matched nothing comes back without a name.
    if value.get("name").is_none() {
        return Err(WeatherError::place_not_found(query.label()));
    }

    let parsed: OwCurrentResponse = serde_json::from_value(value)
        .map_err(|e| WeatherError::malformed(format!("current weather: {e}")))?;

    let (description, icon_id) = first_condition(&parsed.weather);
    let sys = parsed.sys.unwrap_or_default();

    Ok(CurrentConditions {
        description,
        icon_id,
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        wind_speed: parsed.wind.speed,
        wind_gust: parsed.wind.gust,
        precipitation_1h: combine_volumes(
            parsed.rain.and_then(|v| v.one_hour),
            parsed.snow.and_then(|v| v.one_hour),
        ),
        sunrise_unix: sys.sunrise,
        sunset_unix: sys.sunset,
        country_code: sys.country.unwrap_or_default(),
        place_name: Some(parsed.name).filter(|n| !n.is_empty()),
        status_code: status,
        timezone_offset_secs: parsed.timezone,
    })
}

/// Normalizes a 5-day/3-hour forecast body.
pub(crate) fn parse_forecast(
    http_status: u16,
    body: &str,
    query: &WeatherQuery,
) -> Result<ForecastSet, WeatherError> {
    let value = parse_json(http_status, body, query)?;
    let status = check_status(http_status, &value, body, query)?;

    let parsed: OwForecastResponse = serde_json::from_value(value)
        .map_err(|e| WeatherError::malformed(format!("forecast: {e}")))?;

    let entries = parsed
        .list
        .into_iter()
        .map(|e| {
            let (description, icon_id) = first_condition(&e.weather);
            ForecastEntry {
                timestamp_unix: e.dt,
                time_of_day_text: e.dt_txt,
                description,
                icon_id,
                temperature_c: e.main.temp,
                feels_like_c: e.main.feels_like,
                wind_speed: e.wind.speed,
                wind_gust: e.wind.gust,
                precipitation_3h: combine_volumes(
                    e.rain.and_then(|v| v.three_hours),
                    e.snow.and_then(|v| v.three_hours),
                ),
            }
        })
        .collect();

    let (city, timezone) = match parsed.city {
        Some(city) => {
            let place = city.name.filter(|n| !n.is_empty()).map(|name| PlaceName {
                city: name,
                country_code: city.country.unwrap_or_default(),
            });
            (place, city.timezone)
        }
        None => (None, 0),
    };

    Ok(ForecastSet::new(status, entries)?.with_city(city, timezone))
}

pub(crate) fn parse_reverse_geocode(
    http_status: u16,
    body: &str,
    coordinate: Coordinate,
) -> Result<Vec<GeocodedPlace>, WeatherError> {
    let query = WeatherQuery::Coordinate(coordinate);
    let value = parse_json(http_status, body, &query)?;

    // Success is a bare array; errors are an object carrying `cod`.
    if !value.is_array() {
        check_status(http_status, &value, body, &query)?;
        return Err(WeatherError::malformed("reverse geocoding: expected a list"));
    }

    let places: Vec<OwGeoPlace> = serde_json::from_value(value)
        .map_err(|e| WeatherError::malformed(format!("reverse geocoding: {e}")))?;

    Ok(places
        .into_iter()
        .map(|p| GeocodedPlace { city: p.name, iso_country_code: p.country })
        .collect())
}

fn parse_json(http_status: u16, body: &str, query: &WeatherQuery) -> Result<Value, WeatherError> {
    serde_json::from_str(body).map_err(|e| match http_status {
        401 => WeatherError::InvalidCredential,
        404 => WeatherError::place_not_found(query.label()),
        200..=299 => WeatherError::malformed(e.to_string()),
        status => WeatherError::Provider { status, message: truncate_body(body) },
    })
}

/// Reads `cod` (number or string), falling back to the HTTP status when it is absent.
fn check_status(
    http_status: u16,
    value: &Value,
    body: &str,
    query: &WeatherQuery,
) -> Result<u16, WeatherError> {
    let cod = match value.get("cod") {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse::<u16>().ok(),
        _ => None,
    };
    let status = cod.unwrap_or(http_status);

    match status {
        200 => Ok(status),
        401 => Err(WeatherError::InvalidCredential),
        404 => Err(WeatherError::place_not_found(query.label())),
        status => {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| truncate_body(body));
            Err(WeatherError::Provider { status, message })
        }
    }
}

fn first_condition(weather: &[OwWeather]) -> (String, String) {
    weather
        .first()
        .map(|w| (w.description.clone(), w.icon.clone()))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()))
}

fn combine_volumes(rain: Option<f64>, snow: Option<f64>) -> Option<f64> {
    match (rain, snow) {
        (None, None) => None,
        (rain, snow) => Some(rain.unwrap_or(0.0) + snow.unwrap_or(0.0)),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
