//! Command-line interface parsing
//!
//! This module handles parsing of CLI arguments using clap and turns them,
//! together with the config file, into the settings a lookup runs with.

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::Config;
use crate::location::{LocationError, LocationQuery};
use crate::weather::{Language, Units};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified units name is not recognized
    #[error("Invalid units: '{0}'. Valid units: metric, imperial")]
    InvalidUnits(String),

    /// The specified language is not supported
    #[error("Invalid language: '{0}'. Valid languages: en, es")]
    InvalidLanguage(String),

    #[error("Invalid location: {0}")]
    InvalidLocation(#[from] LocationError),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
}

/// Look up current weather and forecasts
#[derive(Parser, Debug)]
#[command(name = "wxlookup")]
#[command(about = "Current weather, 5-day forecasts and a live watch view")]
#[command(version)]
pub struct Cli {
    /// Location to look up: "city", "city, country" or "city, state, country"
    ///
    /// When omitted, the location is estimated from your IP address.
    pub location: Option<String>,

    /// Units of measurement (metric, imperial)
    #[arg(short, long, value_name = "UNITS")]
    pub units: Option<String>,

    /// Language for condition descriptions (en, es)
    #[arg(short, long = "lang", value_name = "LANG")]
    pub language: Option<String>,

    /// Also show the 5-day forecast
    #[arg(short, long)]
    pub forecast: bool,

    /// Also list places matching the location
    #[arg(short, long)]
    pub suggest: bool,

    /// Keep the view open and refresh on an interval
    #[arg(short, long)]
    pub watch: bool,

    /// Seconds between refreshes in watch mode
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Seconds fetched data stays cached
    #[arg(long, value_name = "SECS")]
    pub ttl: Option<u64>,

    /// OpenWeatherMap API key (overrides config and environment)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Path to a JSON config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// What a run should do, derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    /// Explicit location, or `None` to locate by IP
    pub location: Option<LocationQuery>,
    pub forecast: bool,
    pub suggest: bool,
    pub watch: bool,
}

/// Parses a units argument
pub fn parse_units_arg(s: &str) -> Result<Units, CliError> {
    Units::parse(s).ok_or_else(|| CliError::InvalidUnits(s.to_string()))
}

/// Parses a language argument
pub fn parse_language_arg(s: &str) -> Result<Language, CliError> {
    Language::parse(s).ok_or_else(|| CliError::InvalidLanguage(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if the location is malformed
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let location = cli
            .location
            .as_deref()
            .map(LocationQuery::parse)
            .transpose()?;

        Ok(StartupConfig {
            location,
            forecast: cli.forecast,
            suggest: cli.suggest,
            watch: cli.watch,
        })
    }
}

/// Applies CLI overrides on top of loaded configuration
pub fn apply_overrides(cli: &Cli, config: &mut Config) -> Result<(), CliError> {
    if let Some(units) = &cli.units {
        config.units = parse_units_arg(units)?;
    }
    if let Some(language) = &cli.language {
        config.language = parse_language_arg(language)?;
    }
    if let Some(interval) = cli.interval {
        if interval == 0 {
            return Err(CliError::NotPositive("--interval"));
        }
        config.refresh_interval_secs = interval;
    }
    if let Some(ttl) = cli.ttl {
        if ttl == 0 {
            return Err(CliError::NotPositive("--ttl"));
        }
        config.cache_ttl_secs = ttl;
    }
    config.apply_api_key(cli.api_key.clone());
    Ok(())
}
