//! Plain-text output for one-shot lookups

use std::fmt::Write;

use crate::location::Place;
use crate::service::Report;
use crate::weather::{CurrentConditions, Forecast, Units};

/// Formats a temperature with the symbol for `units`, e.g. "17.4°C"
pub fn format_temperature(value: f64, units: Units) -> String {
    format!("{:.1}{}", value, units.temperature_symbol())
}

/// Formats a wind speed with the unit for `units`, e.g. "3.6 m/s"
pub fn format_wind(value: f64, units: Units) -> String {
    format!("{:.1} {}", value, units.speed_unit())
}

pub fn render_current(current: &CurrentConditions) -> String {
    let units = current.units;
    let mut out = String::new();
    let _ = writeln!(out, "Current weather in {}", current.location);
    let _ = writeln!(
        out,
        "  Temperature: {} (feels like {})",
        format_temperature(current.temperature, units),
        format_temperature(current.feels_like, units)
    );
    let _ = writeln!(out, "  Humidity:    {}%", current.humidity);
    let _ = writeln!(out, "  Wind:        {}", format_wind(current.wind_speed, units));
    let _ = writeln!(out, "  Conditions:  {} [{}]", current.description, current.icon);
    out
}

/// One line per forecast day: date, low/high, dominant conditions
pub fn render_forecast(forecast: &Forecast) -> String {
    let units = forecast.units;
    let mut out = String::new();
    let _ = writeln!(out, "5-day forecast for {}", forecast.location);

    let days = forecast.daily_summary();
    if days.is_empty() {
        let _ = writeln!(out, "  (no forecast data)");
    }
    for day in days {
        let _ = writeln!(
            out,
            "  {}  {:>8} / {:<8}  {}",
            day.date.format("%a %b %d"),
            format_temperature(day.min_temperature, units),
            format_temperature(day.max_temperature, units),
            day.description
        );
    }
    out
}

pub fn render_suggestions(places: &[Place]) -> String {
    let mut out = String::new();
    if places.is_empty() {
        let _ = writeln!(out, "No matching locations found.");
        return out;
    }

    let _ = writeln!(out, "Suggested locations:");
    for place in places {
        let _ = writeln!(
            out,
            "  {} ({:.4}, {:.4})",
            place.label(),
            place.latitude,
            place.longitude
        );
    }
    out
}

/// Current conditions followed by the forecast, if present
pub fn render_report(report: &Report) -> String {
    let mut out = render_current(&report.current);
    if let Some(forecast) = &report.forecast {
        out.push('\n');
        out.push_str(&render_forecast(forecast));
    }
    out
}
