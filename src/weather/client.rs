//! OpenWeatherMap API client
//!
//! This module fetches current conditions and the 5-day forecast from the
//! OpenWeatherMap REST API and parses them into our weather data structures.

use chrono::{NaiveDateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::{CurrentConditions, Forecast, ForecastEntry, Language, Units};
use crate::cache::CacheError;

/// Base URL for the OpenWeatherMap API
pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";

/// Errors that can occur when fetching weather data
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The API answered with a non-success status
    #[error("Weather API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The API does not know the requested location
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),

    /// Invalid time format in response
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    /// Caching layer rejected the request or the fetch timed out
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Client for fetching weather data from OpenWeatherMap
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    /// Create a new WeatherClient for the public API
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: OPENWEATHER_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Create a new WeatherClient with a custom HTTP client
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: OPENWEATHER_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Point the client at another server (a proxy or a mock)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch current conditions for a free-form location query
    ///
    /// # Arguments
    /// * `query` - "city", "city, country" or "city, state, country"
    /// * `units` - Units for temperature and wind speed
    /// * `language` - Language of the condition description
    ///
    /// # Returns
    /// * `Ok(CurrentConditions)` - Weather at the location
    /// * `Err(WeatherError)` - If the request, the API or parsing fails
    pub async fn fetch_current(
        &self,
        query: &str,
        units: Units,
        language: Language,
    ) -> Result<CurrentConditions, WeatherError> {
        let text = self.get("/data/2.5/weather", query, units, language).await?;
        let api_response: CurrentResponse = serde_json::from_str(&text)?;
        parse_current(api_response, units)
    }

    /// Fetch the 5-day / 3-hour forecast for a free-form location query
    pub async fn fetch_forecast(
        &self,
        query: &str,
        units: Units,
        language: Language,
    ) -> Result<Forecast, WeatherError> {
        let text = self.get("/data/2.5/forecast", query, units, language).await?;
        let api_response: ForecastResponse = serde_json::from_str(&text)?;
        parse_forecast(api_response, units)
    }

    async fn get(
        &self,
        path: &str,
        query: &str,
        units: Units,
        language: Language,
    ) -> Result<String, WeatherError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, location = query, "requesting weather");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("appid", self.api_key.as_str()),
                ("units", units.as_param()),
                ("lang", language.as_param()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &text, query));
        }

        Ok(text)
    }
}

/// Map a non-success response into an error, keeping the API's message
fn status_error(status: StatusCode, body: &str, query: &str) -> WeatherError {
    if status == StatusCode::NOT_FOUND {
        return WeatherError::LocationNotFound(query.to_string());
    }

    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown error").to_string());

    WeatherError::Api {
        status: status.as_u16(),
        message,
    }
}

fn parse_current(response: CurrentResponse, units: Units) -> Result<CurrentConditions, WeatherError> {
    let condition = response
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::MissingField("weather".to_string()))?;

    Ok(CurrentConditions {
        location: place_name(&response.name, response.sys.country.as_deref()),
        temperature: response.main.temp,
        feels_like: response.main.feels_like,
        humidity: clamp_humidity(response.main.humidity),
        wind_speed: response.wind.speed,
        description: condition.description,
        icon: condition.icon,
        units,
        fetched_at: Utc::now(),
    })
}

fn parse_forecast(response: ForecastResponse, units: Units) -> Result<Forecast, WeatherError> {
    let mut entries = Vec::with_capacity(response.list.len());

    for item in response.list {
        let condition = item
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::MissingField("list.weather".to_string()))?;

        entries.push(ForecastEntry {
            time: parse_datetime(&item.dt_txt)?,
            temperature: item.main.temp,
            humidity: clamp_humidity(item.main.humidity),
            wind_speed: item.wind.speed,
            description: condition.description,
            icon: condition.icon,
        });
    }

    Ok(Forecast {
        location: place_name(&response.city.name, response.city.country.as_deref()),
        units,
        entries,
        fetched_at: Utc::now(),
    })
}

/// Parse a forecast slot time (e.g., "2024-07-15 15:00:00")
fn parse_datetime(datetime_str: &str) -> Result<NaiveDateTime, WeatherError> {
    NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S")
        .map_err(|_| WeatherError::InvalidTimeFormat(datetime_str.to_string()))
}

fn place_name(name: &str, country: Option<&str>) -> String {
    match country {
        Some(country) if !country.is_empty() => format!("{}, {}", name, country),
        _ => name.to_string(),
    }
}

fn clamp_humidity(humidity: f64) -> u8 {
    humidity.clamp(0.0, 100.0).round() as u8
}

/// Error body returned by the API, e.g. `{"cod":"404","message":"city not found"}`
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// `/data/2.5/weather` response
#[derive(Debug, Deserialize)]
struct CurrentResponse {
    name: String,
    weather: Vec<Condition>,
    main: MainReadings,
    wind: Wind,
    sys: Sys,
}

/// `/data/2.5/forecast` response
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastItem>,
    city: City,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    main: MainReadings,
    weather: Vec<Condition>,
    wind: Wind,
    dt_txt: String,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct Sys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct City {
    name: String,
    country: Option<String>,
}
