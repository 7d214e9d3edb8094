//! Cached weather lookups
//!
//! `WeatherService` puts a TTL cache in front of each remote call. It is an
//! ordinary owned value: the one-shot CLI holds it directly and watch mode
//! shares it with the refresh task through an `Arc`.

use chrono::Duration;
use std::time::Duration as StdDuration;

use crate::cache::{CacheError, CacheStats, Clock, SystemClock, TtlCache};
use crate::config::{Config, ConfigError};
use crate::location::{GeoClient, GeoError, LocationQuery, Place};
use crate::weather::{CurrentConditions, Forecast, Language, Units, WeatherClient, WeatherError};

/// Number of suggestions requested from the geocoder
pub const SUGGESTION_LIMIT: u8 = 5;

/// Identity of one cached weather request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WeatherKey {
    /// Normalized, lowercased location
    pub location: String,
    pub units: Units,
    pub language: Language,
}

impl WeatherKey {
    pub fn new(query: &LocationQuery, units: Units, language: Language) -> Self {
        Self {
            location: query.cache_key(),
            units,
            language,
        }
    }
}

/// Current conditions plus an optional forecast for one location
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub current: CurrentConditions,
    pub forecast: Option<Forecast>,
}

/// Weather and geolocation clients fronted by TTL caches
pub struct WeatherService<C: Clock = SystemClock> {
    weather: WeatherClient,
    geo: GeoClient,
    current: TtlCache<WeatherKey, CurrentConditions, C>,
    forecasts: TtlCache<WeatherKey, Forecast, C>,
    suggestions: TtlCache<String, Vec<Place>, C>,
    units: Units,
    language: Language,
    ttl: Duration,
    timeout: StdDuration,
}

impl WeatherService<SystemClock> {
    /// Builds clients and caches from validated configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let api_key = config.api_key.clone().unwrap_or_default();

        let weather = WeatherClient::new(api_key.clone()).with_base_url(&config.base_url);
        let geo = GeoClient::new(api_key)
            .with_geo_base_url(&config.geo_base_url)
            .with_ip_locate_url(&config.ip_locate_url);

        Ok(Self::with_clock(weather, geo, config, SystemClock))
    }
}

impl<C: Clock + Clone> WeatherService<C> {
    /// Builds a service on a specific clock (tests use `ManualClock`)
    pub fn with_clock(weather: WeatherClient, geo: GeoClient, config: &Config, clock: C) -> Self {
        let capacity = config.cache_capacity;
        Self {
            weather,
            geo,
            current: TtlCache::with_clock(clock.clone()).with_max_entries(capacity),
            forecasts: TtlCache::with_clock(clock.clone()).with_max_entries(capacity),
            suggestions: TtlCache::with_clock(clock).with_max_entries(capacity),
            units: config.units,
            language: config.language,
            ttl: config.cache_ttl(),
            timeout: config.fetch_timeout(),
        }
    }
}

impl<C: Clock> WeatherService<C> {
    pub fn units(&self) -> Units {
        self.units
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Current conditions, served from cache while fresh
    pub async fn current(&self, query: &LocationQuery) -> Result<CurrentConditions, WeatherError> {
        let key = WeatherKey::new(query, self.units, self.language);
        let (units, language) = (self.units, self.language);

        let result = self
            .current
            .get_or_fetch_with_timeout(key, self.ttl, self.timeout, || {
                tracing::debug!(location = %query, "fetching current conditions");
                self.weather.fetch_current(query.as_str(), units, language)
            })
            .await;

        if let Err(ref err) = result {
            tracing::warn!(location = %query, error = %err, "current conditions lookup failed");
        }
        result
    }

    /// 5-day forecast, served from cache while fresh
    pub async fn forecast(&self, query: &LocationQuery) -> Result<Forecast, WeatherError> {
        let key = WeatherKey::new(query, self.units, self.language);
        let (units, language) = (self.units, self.language);

        let result = self
            .forecasts
            .get_or_fetch_with_timeout(key, self.ttl, self.timeout, || {
                tracing::debug!(location = %query, "fetching forecast");
                self.weather.fetch_forecast(query.as_str(), units, language)
            })
            .await;

        if let Err(ref err) = result {
            tracing::warn!(location = %query, error = %err, "forecast lookup failed");
        }
        result
    }

    /// Current conditions and, when asked, the forecast, fetched concurrently
    pub async fn report(&self, query: &LocationQuery, with_forecast: bool) -> Result<Report, WeatherError> {
        if with_forecast {
            let (current, forecast) =
                futures::future::try_join(self.current(query), self.forecast(query)).await?;
            Ok(Report {
                current,
                forecast: Some(forecast),
            })
        } else {
            Ok(Report {
                current: self.current(query).await?,
                forecast: None,
            })
        }
    }

    /// Places matching `query`, served from cache while fresh
    pub async fn suggest(&self, query: &LocationQuery) -> Result<Vec<Place>, GeoError> {
        self.suggestions
            .get_or_fetch_with_timeout(query.cache_key(), self.ttl, self.timeout, || {
                tracing::debug!(location = %query, "fetching suggestions");
                self.geo.suggest(query, SUGGESTION_LIMIT)
            })
            .await
    }

    /// The caller's approximate location (not cached)
    pub async fn locate(&self) -> Result<LocationQuery, GeoError> {
        let place = tokio::time::timeout(self.timeout, self.geo.locate_by_ip())
            .await
            .map_err(|_| CacheError::FetchTimedOut(self.timeout))??;
        tracing::info!(place = %place.label(), "located by IP");
        Ok(place.query()?)
    }

    /// Forgets cached weather for `query` so the next lookup fetches
    pub fn invalidate(&self, query: &LocationQuery) {
        let key = WeatherKey::new(query, self.units, self.language);
        self.current.remove(&key);
        self.forecasts.remove(&key);
    }

    /// Drops stale entries from every cache
    pub fn purge_expired(&self) -> usize {
        self.current.purge_expired() + self.forecasts.purge_expired() + self.suggestions.purge_expired()
    }

    /// Hit/miss counters of the current-conditions cache
    pub fn current_stats(&self) -> CacheStats {
        self.current.stats()
    }
}
