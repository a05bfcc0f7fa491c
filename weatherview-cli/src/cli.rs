use std::{ops::RangeInclusive, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{
    Confirm, CustomType, Password, PasswordDisplayMode, Select, Text, validator::Validation,
};
use weatherview_core::{
    Accuracy, Config, Coordinate, Flow, ReductionPolicy, ViewStateStore, WeatherApp,
};

use tracing::{debug, info};

use crate::render::{self, RenderOptions};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherview", version, about = "Weather for your location or any city")]
pub struct Cli {
    /// Log pipeline steps to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key and the location used for the Weather tab.
    Configure,

    /// Weather tab: conditions and forecast for the current location.
    Weather {
        /// Position accuracy: lowest, low, balanced or high.
        #[arg(long, value_parser = parse_accuracy)]
        accuracy: Option<Accuracy>,

        /// Show every 3-hour slot, not just one per day.
        #[arg(long)]
        detailed: bool,
    },

    /// Search tab: conditions and forecast for a city.
    Search {
        /// City name, optionally with a country code, e.g. "Tampere,FI".
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,

        #[arg(long)]
        detailed: bool,
    },

    /// Interactive loop over the Weather and Search tabs.
    Tabs,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Weather { accuracy, detailed } => {
                let config = Config::load()?;
                let session = Session::new(&config, detailed)?;
                session.refresh(accuracy.unwrap_or(config.location.accuracy)).await;
                Ok(())
            }
            Command::Search { city, detailed } => {
                let config = Config::load()?;
                let session = Session::new(&config, detailed)?;
                session.search(&city.join(" ")).await;
                Ok(())
            }
            Command::Tabs => tabs().await,
        }
    }
}

/// One app instance plus the store it writes to, rendered after every trigger.
struct Session {
    app: WeatherApp,
    store: Arc<ViewStateStore>,
    options: RenderOptions,
}

impl Session {
    fn new(config: &Config, detailed: bool) -> anyhow::Result<Self> {
        let store = Arc::new(ViewStateStore::default());
        let app = WeatherApp::from_config(config, store.clone())?;
        let policy = if detailed || config.forecast.detailed {
            ReductionPolicy::Detailed
        } else {
            ReductionPolicy::DailySummary
        };

        Ok(Self { app, store, options: RenderOptions { matcher: config.forecast.matcher(), policy } })
    }

    async fn refresh(&self, accuracy: Accuracy) {
        debug!("Refreshing current location at {accuracy} accuracy");
        self.app.refresh_current_location(accuracy).await;
        self.show(Flow::CurrentLocation);
    }

    async fn search(&self, term: &str) {
        debug!("Searching for {term:?}");
        self.app.search(term).await;
        self.show(Flow::Search);
    }

    fn show(&self, flow: Flow) {
        print!("{}", render::flow(&self.store.snapshot(flow), flow, &self.options));
    }
}

async fn tabs() -> anyhow::Result<()> {
    const WEATHER: &str = "Weather";
    const SEARCH: &str = "Search";
    const REFRESH: &str = "Refresh";
    const QUIT: &str = "Quit";

    let config = Config::load()?;
    let session = Session::new(&config, false)?;
    let accuracy = config.location.accuracy;

    session.refresh(accuracy).await;

    loop {
        println!();
        let choice = Select::new("Tab:", vec![WEATHER, SEARCH, REFRESH, QUIT]).prompt()?;
        debug!("Selected {choice}");

        match choice {
            WEATHER => session.show(Flow::CurrentLocation),
            SEARCH => {
                let term = Text::new("City:").prompt()?;
                session.search(&term).await;
            }
            // Refresh trades accuracy for speed.
            REFRESH => session.refresh(lower(accuracy)).await,
            _ => break,
        }
    }

    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key);
    }

    config.location.enabled = Confirm::new("Allow access to your location?")
        .with_default(config.location.enabled)
        .prompt()?;

    if config.location.enabled {
        let current = config.location.coordinate();
        let latitude =
            coordinate_prompt("Latitude:", -90.0..=90.0, current.map(|c| c.latitude))?;
        let longitude =
            coordinate_prompt("Longitude:", -180.0..=180.0, current.map(|c| c.longitude))?;

        config.set_location(Coordinate::new(latitude, longitude));

        config.location.accuracy =
            Select::new("Default accuracy:", Accuracy::all().to_vec()).prompt()?;
    }

    config.save()?;
    let path = Config::config_file_path().context("Failed to locate config file")?;
    info!(location_enabled = config.location.enabled, "Configuration saved");
    println!("Saved configuration to {}", path.display());

    Ok(())
}

fn coordinate_prompt(
    label: &str,
    range: RangeInclusive<f64>,
    current: Option<f64>,
) -> anyhow::Result<f64> {
    let message = format!("Must be within {}..{}", range.start(), range.end());
    let mut prompt = CustomType::<f64>::new(label).with_validator(move |v: &f64| {
        Ok(if range.contains(v) {
            Validation::Valid
        } else {
            Validation::Invalid(message.clone().into())
        })
    });
    if let Some(value) = current {
        prompt = prompt.with_default(value);
    }

    Ok(prompt.prompt()?)
}

/// One step coarser than `accuracy`.
fn lower(accuracy: Accuracy) -> Accuracy {
    match accuracy {
        Accuracy::High => Accuracy::Balanced,
        Accuracy::Balanced => Accuracy::Low,
        Accuracy::Low | Accuracy::Lowest => Accuracy::Lowest,
    }
}

fn parse_accuracy(value: &str) -> Result<Accuracy, String> {
    Accuracy::try_from(value).map_err(|e| e.to_string())
}
