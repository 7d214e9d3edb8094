//! Weather data models
//!
//! Types describing current conditions and the 5-day forecast, independent of
//! the API they were fetched from.

pub mod client;

pub use client::{WeatherClient, WeatherError};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Units of measurement requested from the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Celsius, metres per second
    #[default]
    Metric,
    /// Fahrenheit, miles per hour
    Imperial,
}

impl Units {
    /// Parses a units name, accepting a few common aliases
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "metric" | "m" | "c" | "celsius" => Some(Units::Metric),
            "imperial" | "i" | "f" | "fahrenheit" => Some(Units::Imperial),
            _ => None,
        }
    }

    /// Value of the `units` query parameter
    pub fn as_param(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn speed_unit(self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }
}

/// Language for condition descriptions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
}

impl Language {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "es" | "spanish" | "español" | "espanol" => Some(Language::Spanish),
            _ => None,
        }
    }

    /// Value of the `lang` query parameter
    pub fn as_param(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Current weather at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Resolved place name, e.g. "Vancouver, CA"
    pub location: String,
    /// Temperature in the requested units
    pub temperature: f64,
    pub feels_like: f64,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Wind speed in the requested units
    pub wind_speed: f64,
    /// Localized condition text, e.g. "broken clouds"
    pub description: String,
    /// API icon code, e.g. "04d"
    pub icon: String,
    pub units: Units,
    /// When this data was fetched
    pub fetched_at: DateTime<Utc>,
}

/// A single 3-hourly forecast slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Slot time as reported by the API (UTC)
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub description: String,
    pub icon: String,
}

/// 5-day forecast in 3-hour steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub location: String,
    pub units: Units,
    pub entries: Vec<ForecastEntry>,
    pub fetched_at: DateTime<Utc>,
}

/// One day of a forecast collapsed into a single line
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub min_temperature: f64,
    pub max_temperature: f64,
    /// Most frequent description of the day (earliest wins ties)
    pub description: String,
}

impl Forecast {
    /// Groups the 3-hourly entries by calendar date
    pub fn daily_summary(&self) -> Vec<DailySummary> {
        let mut days: BTreeMap<NaiveDate, Vec<&ForecastEntry>> = BTreeMap::new();
        for entry in &self.entries {
            days.entry(entry.time.date()).or_default().push(entry);
        }

        days.into_iter()
            .map(|(date, entries)| {
                let min_temperature = entries
                    .iter()
                    .map(|e| e.temperature)
                    .fold(f64::INFINITY, f64::min);
                let max_temperature = entries
                    .iter()
                    .map(|e| e.temperature)
                    .fold(f64::NEG_INFINITY, f64::max);

                DailySummary {
                    date,
                    min_temperature,
                    max_temperature,
                    description: dominant_description(&entries),
                }
            })
            .collect()
    }

    /// Temperatures in slot order, for sparklines
    pub fn temperatures(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.temperature).collect()
    }
}

fn dominant_description(entries: &[&ForecastEntry]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for entry in entries {
        match counts.iter_mut().find(|(d, _)| *d == entry.description) {
            Some((_, n)) => *n += 1,
            None => counts.push((entry.description.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (description, n) in counts {
        if best.map_or(true, |(_, m)| n > m) {
            best = Some((description, n));
        }
    }
    best.map(|(d, _)| d.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(time: &str, temperature: f64, description: &str) -> ForecastEntry {
        ForecastEntry {
            time: NaiveDateTime::parse_from_str(time, "%Y-%m-%d %H:%M:%S").unwrap(),
            temperature,
            humidity: 70,
            wind_speed: 3.0,
            description: description.to_string(),
            icon: "01d".to_string(),
        }
    }

    #[test]
    fn test_units_parse_aliases() {
        assert_eq!(Units::parse("metric"), Some(Units::Metric));
        assert_eq!(Units::parse("C"), Some(Units::Metric));
        assert_eq!(Units::parse("Imperial"), Some(Units::Imperial));
        assert_eq!(Units::parse("f"), Some(Units::Imperial));
        assert_eq!(Units::parse("kelvin"), None);
    }

    #[test]
    fn test_units_symbols_follow_units_not_temperature() {
        assert_eq!(Units::Metric.temperature_symbol(), "°C");
        assert_eq!(Units::Imperial.temperature_symbol(), "°F");
        assert_eq!(Units::Metric.speed_unit(), "m/s");
        assert_eq!(Units::Imperial.speed_unit(), "mph");
    }

    #[test]
    fn test_language_parse_and_param() {
        assert_eq!(Language::parse("es"), Some(Language::Spanish));
        assert_eq!(Language::parse("English"), Some(Language::English));
        assert_eq!(Language::parse("fr"), None);
        assert_eq!(Language::Spanish.as_param(), "es");
        assert_eq!(Language::English.to_string(), "en");
    }

    #[test]
    fn test_units_and_language_serde_names() {
        assert_eq!(serde_json::to_string(&Units::Imperial).unwrap(), "\"imperial\"");
        assert_eq!(serde_json::to_string(&Language::Spanish).unwrap(), "\"es\"");
        let lang: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(lang, Language::English);
    }

    #[test]
    fn test_daily_summary_groups_by_date() {
        let forecast = Forecast {
            location: "Vancouver, CA".to_string(),
            units: Units::Metric,
            entries: vec![
                entry("2024-07-15 12:00:00", 18.0, "light rain"),
                entry("2024-07-15 15:00:00", 21.5, "clear sky"),
                entry("2024-07-15 18:00:00", 20.0, "clear sky"),
                entry("2024-07-16 00:00:00", 14.0, "few clouds"),
                entry("2024-07-16 03:00:00", 12.5, "few clouds"),
            ],
            fetched_at: Utc::now(),
        };

        let days = forecast.daily_summary();
        assert_eq!(days.len(), 2);

        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 7, 15).unwrap());
        assert!((days[0].min_temperature - 18.0).abs() < 0.01);
        assert!((days[0].max_temperature - 21.5).abs() < 0.01);
        assert_eq!(days[0].description, "clear sky");

        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 7, 16).unwrap());
        assert!((days[1].min_temperature - 12.5).abs() < 0.01);
        assert_eq!(days[1].description, "few clouds");
    }

    #[test]
    fn test_dominant_description_tie_prefers_earliest() {
        let a = entry("2024-07-15 12:00:00", 18.0, "mist");
        let b = entry("2024-07-15 15:00:00", 18.0, "haze");
        assert_eq!(dominant_description(&[&a, &b]), "mist");
    }

    #[test]
    fn test_empty_forecast_has_no_days() {
        let forecast = Forecast {
            location: String::new(),
            units: Units::Metric,
            entries: vec![],
            fetched_at: Utc::now(),
        };
        assert!(forecast.daily_summary().is_empty());
        assert!(forecast.temperatures().is_empty());
    }
}
