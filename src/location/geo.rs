//! Geolocation lookups
//!
//! IP-based "where am I" detection (ip-api.com) and place-name suggestions
//! from the OpenWeatherMap direct geocoding endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{LocationError, LocationQuery};
use crate::cache::CacheError;
use crate::weather::client::OPENWEATHER_BASE_URL;

/// Default IP geolocation endpoint
pub const IP_LOCATE_URL: &str = "http://ip-api.com/json";

/// Errors from geolocation lookups
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Geolocation service returned {status}")]
    Api { status: u16 },

    /// The service answered but could not resolve a location
    #[error("Could not determine location: {0}")]
    Lookup(String),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// A resolved place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub state: Option<String>,
    /// ISO 3166 country code
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Place {
    /// Query that resolves back to this place ("city, country")
    pub fn query(&self) -> Result<LocationQuery, LocationError> {
        if self.country.is_empty() {
            LocationQuery::parse(&self.name)
        } else {
            LocationQuery::parse(&format!("{}, {}", self.name, self.country))
        }
    }

    /// Human-readable label including the state when known
    pub fn label(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

/// Client for geolocation services
#[derive(Debug, Clone)]
pub struct GeoClient {
    client: Client,
    geo_base_url: String,
    ip_locate_url: String,
    api_key: String,
}

impl GeoClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            geo_base_url: OPENWEATHER_BASE_URL.to_string(),
            ip_locate_url: IP_LOCATE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_geo_base_url(mut self, url: impl Into<String>) -> Self {
        self.geo_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_ip_locate_url(mut self, url: impl Into<String>) -> Self {
        self.ip_locate_url = url.into();
        self
    }

    /// Approximates the caller's location from their public IP address
    pub async fn locate_by_ip(&self) -> Result<Place, GeoError> {
        tracing::debug!(url = %self.ip_locate_url, "locating by IP");

        let response = self.client.get(&self.ip_locate_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Api {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let body: IpLocateResponse = serde_json::from_str(&text)?;
        parse_ip_locate(body)
    }

    /// Places matching `query`, best match first
    pub async fn suggest(&self, query: &LocationQuery, limit: u8) -> Result<Vec<Place>, GeoError> {
        let url = format!("{}/geo/1.0/direct", self.geo_base_url);
        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query.as_str()),
                ("limit", limit.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Api {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let places: Vec<DirectGeocodeEntry> = serde_json::from_str(&text)?;
        Ok(places.into_iter().map(Place::from).collect())
    }
}

fn parse_ip_locate(body: IpLocateResponse) -> Result<Place, GeoError> {
    if body.status != "success" {
        return Err(GeoError::Lookup(
            body.message.unwrap_or_else(|| body.status.clone()),
        ));
    }

    let name = body
        .city
        .filter(|c| !c.is_empty())
        .ok_or_else(|| GeoError::Lookup("no city in response".to_string()))?;

    Ok(Place {
        name,
        state: body.region_name.filter(|r| !r.is_empty()),
        country: body.country_code.unwrap_or_default(),
        latitude: body.lat.unwrap_or_default(),
        longitude: body.lon.unwrap_or_default(),
    })
}

/// ip-api.com response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpLocateResponse {
    status: String,
    message: Option<String>,
    city: Option<String>,
    region_name: Option<String>,
    country_code: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// One entry of `/geo/1.0/direct`
#[derive(Debug, Deserialize)]
struct DirectGeocodeEntry {
    name: String,
    state: Option<String>,
    country: String,
    lat: f64,
    lon: f64,
}

impl From<DirectGeocodeEntry> for Place {
    fn from(entry: DirectGeocodeEntry) -> Self {
        Place {
            name: entry.name,
            state: entry.state,
            country: entry.country,
            latitude: entry.lat,
            longitude: entry.lon,
        }
    }
}
