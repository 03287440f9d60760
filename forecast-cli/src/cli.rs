use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use forecast_core::{City, Config, ForecastFetcher, config::API_KEY_ENV, forecast_or_unavailable};
use inquire::{Password, PasswordDisplayMode, Select};

use crate::{dashboard, render};

/// How long `show` waits for the keep-alive ping before exiting.
const KEEPALIVE_GRACE: Duration = Duration::from_secs(2);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Weather forecast for the Volgograd region")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and the default city.
    Configure,

    /// Fetch and print the forecast once.
    Show {
        /// City name, e.g. "Камышин". Defaults to the configured city.
        city: Option<String>,

        /// Print the snapshot as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Live dashboard that refreshes automatically.
    Watch {
        /// City to start with. Defaults to the configured city.
        city: Option<String>,
    },

    /// List supported cities.
    Cities,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, json } => {
                let config = Config::load()?;
                let city = resolve_city(city.as_deref(), &config)?;
                let fetcher = ForecastFetcher::from_config(&config)?;

                let snapshot = forecast_or_unavailable(&fetcher, city.as_str()).await;
                if json {
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                } else {
                    println!("{}", render::snapshot(&snapshot));
                }
                fetcher.settle(KEEPALIVE_GRACE).await;
                Ok(())
            }
            Command::Watch { city } => {
                let config = Config::load()?;
                let city = resolve_city(city.as_deref(), &config)?;
                dashboard::run(&config, city).await
            }
            Command::Cities => {
                for city in City::all() {
                    println!("{city}");
                }
                Ok(())
            }
        }
    }
}

fn resolve_city(arg: Option<&str>, config: &Config) -> anyhow::Result<City> {
    match arg {
        Some(name) => City::try_from(name),
        None => config.default_city(),
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let mut prompt = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation();
    if config.has_api_key() {
        prompt = prompt.with_help_message("Leave empty to keep the current key");
    }
    let key = prompt.prompt().context("Failed to read API key")?;
    if !key.trim().is_empty() {
        config.api_key = Some(key.trim().to_string());
    }

    let current = config.default_city()?;
    let cities = City::all().to_vec();
    let start = cities.iter().position(|c| *c == current).unwrap_or(0);
    let city = Select::new("Default city:", cities)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read default city")?;
    config.set_default_city(city);

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    if std::env::var(API_KEY_ENV).is_ok() {
        println!("Note: {API_KEY_ENV} is set and takes precedence over the saved key.");
    }

    Ok(())
}
