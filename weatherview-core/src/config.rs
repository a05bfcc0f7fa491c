use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    forecast::BoundaryMatcher,
    model::{Accuracy, Coordinate},
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Environment variables checked for the API key, in priority order.
pub const API_KEY_ENV_VARS: &[&str] = &["WEATHERVIEW_API_KEY", "OPENWEATHER_API_KEY"];

/// How the current-location flow queries the weather provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LookupMode {
    /// Query by latitude/longitude; reverse geocoding only labels the result.
    #[default]
    Coordinates,
    /// Reverse geocode first and query by `City,CC`.
    PlaceName,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Whether the user allows the app to read the device location.
    pub enabled: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Accuracy,
    pub lookup: LookupMode,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latitude: None,
            longitude: None,
            accuracy: Accuracy::default(),
            lookup: LookupMode::default(),
        }
    }
}

impl LocationConfig {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Time-of-day substring of the slot that represents a day, e.g. "12:00:00".
    pub boundary: String,
    /// Keep non-boundary slots as detail rows.
    pub detailed: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self { boundary: "12:00:00".to_string(), detailed: false }
    }
}

impl ForecastConfig {
    pub fn matcher(&self) -> BoundaryMatcher {
        BoundaryMatcher::time_of_day(&self.boundary)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// lang = "en"
///
/// [location]
/// latitude = 61.4978
/// longitude = 23.7610
/// accuracy = "low"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub lang: String,
    pub timeout_secs: u64,
    pub location: LocationConfig,
    pub forecast: ForecastConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            lang: "en".to_string(),
            timeout_secs: 10,
            location: LocationConfig::default(),
            forecast: ForecastConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).with_context(|| config_io("read", path))?;
        toml::from_str(&contents).with_context(|| config_io("parse", path))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| config_io("create directory for", path))?;
        }

        let toml = toml::to_string_pretty(self).context("Cannot encode configuration as TOML")?;
        fs::write(path, toml).with_context(|| config_io("write", path))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherview", "weatherview")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        let trimmed = api_key.trim();
        self.api_key = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    pub fn set_location(&mut self, coordinate: Coordinate) {
        self.location.latitude = Some(coordinate.latitude);
        self.location.longitude = Some(coordinate.longitude);
    }

    /// API key from the process environment, falling back to the config file.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::api_key`] with an injectable environment lookup.
    pub fn api_key_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| env(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .or_else(|| self.api_key.clone())
    }

    /// Like [`Config::api_key`], but missing credentials are an error with a hint.
    pub fn require_api_key(&self) -> Result<String> {
        self.api_key().ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `weatherview configure` or set WEATHERVIEW_API_KEY."
            )
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn config_io(action: &str, path: &Path) -> String {
    format!("Could not {action} config file {}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_are_usable() {
        let cfg = Config::default();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.forecast.boundary, "12:00:00");
        assert!(cfg.location.enabled);
        assert!(cfg.location.coordinate().is_none());
        assert!(cfg.api_key_with(no_env).is_none());
    }

    #[test]
    fn env_key_overrides_config_file() {
        let mut cfg = Config::default();
        cfg.set_api_key("FROM_FILE".into());

        let key = cfg.api_key_with(|name| {
            (name == "OPENWEATHER_API_KEY").then(|| "FROM_ENV".to_string())
        });
        assert_eq!(key.as_deref(), Some("FROM_ENV"));
        assert_eq!(cfg.api_key_with(no_env).as_deref(), Some("FROM_FILE"));
    }

    #[test]
    fn primary_env_var_wins_and_blank_values_are_skipped() {
        let cfg = Config::default();

        let key = cfg.api_key_with(|name| match name {
            "WEATHERVIEW_API_KEY" => Some("  ".to_string()),
            "OPENWEATHER_API_KEY" => Some("SECOND".to_string()),
            _ => None,
        });
        assert_eq!(key.as_deref(), Some("SECOND"));
    }

    #[test]
    fn blank_api_key_clears_setting() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.set_api_key("   ".into());
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            api_key = "abc"

            [location]
            latitude = 60.17
            longitude = 24.94
            accuracy = "high"
            lookup = "place_name"
            "#,
        )
        .expect("config should parse");

        assert_eq!(cfg.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.lang, "en");
        assert_eq!(cfg.location.accuracy, Accuracy::High);
        assert_eq!(cfg.location.lookup, LookupMode::PlaceName);
        assert_eq!(cfg.location.coordinate(), Some(Coordinate::new(60.17, 24.94)));
        assert!(!cfg.forecast.detailed);
    }

    #[test]
    fn save_and_load_roundtrip_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.set_location(Coordinate::new(61.5, 23.76));
        cfg.forecast.boundary = "00:00:00".into();
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.api_key.as_deref(), Some("KEY"));
        assert_eq!(loaded.location.coordinate(), Some(Coordinate::new(61.5, 23.76)));
        assert_eq!(loaded.forecast.boundary, "00:00:00");
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&dir.path().join("absent.toml")).expect("load");
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn unparsable_file_names_the_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout_secs = \"soon\"").expect("write");

        let err = Config::load_from(&path).unwrap_err();
        assert_eq!(err.to_string(), format!("Could not parse config file {}", path.display()));
    }
}
