//! Watch screen rendering
//!
//! Shows the latest conditions for the watched location, the forecast trend
//! when one was fetched, and a status line with refresh state.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::help_overlay;
use super::widgets::TemperatureSparkline;
use crate::app::WatchApp;
use crate::display::{format_temperature, format_wind};
use crate::weather::{CurrentConditions, Forecast, Units};

/// Color for temperature (warmer = more red, cooler = more blue)
fn temperature_color(temp: f64, units: Units) -> Color {
    let celsius = match units {
        Units::Metric => temp,
        Units::Imperial => (temp - 32.0) * 5.0 / 9.0,
    };

    if celsius >= 30.0 {
        Color::Red
    } else if celsius >= 25.0 {
        Color::LightRed
    } else if celsius >= 20.0 {
        Color::Yellow
    } else if celsius >= 15.0 {
        Color::Green
    } else if celsius >= 5.0 {
        Color::Cyan
    } else {
        Color::Blue
    }
}

/// Renders the whole watch screen
pub fn render(frame: &mut Frame, app: &WatchApp) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, app, chunks[0]);

    match &app.report {
        Some(report) => {
            render_current(frame, &report.current, chunks[1]);
            match &report.forecast {
                Some(forecast) => render_forecast(frame, forecast, chunks[2]),
                None => render_placeholder(frame, "Forecast not requested (use --forecast)", chunks[2]),
            }
        }
        None => {
            let message = if app.last_error.is_some() {
                "No data yet"
            } else {
                "Loading weather data..."
            };
            render_placeholder(frame, message, chunks[1]);
        }
    }

    render_status(frame, app, chunks[3]);

    if app.show_help {
        help_overlay::render(frame);
    }
}

fn render_header(frame: &mut Frame, app: &WatchApp, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            "Weather: ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(app.location.clone()),
    ]);

    let header = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(header, area);
}

fn render_current(frame: &mut Frame, current: &CurrentConditions, area: Rect) {
    let units = current.units;
    let label = Style::default().fg(Color::DarkGray);

    let lines = vec![
        Line::from(vec![
            Span::styled("Temperature  ", label),
            Span::styled(
                format_temperature(current.temperature, units),
                Style::default()
                    .fg(temperature_color(current.temperature, units))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  (feels like {})",
                format_temperature(current.feels_like, units)
            )),
        ]),
        Line::from(vec![
            Span::styled("Conditions   ", label),
            Span::raw(current.description.clone()),
        ]),
        Line::from(vec![
            Span::styled("Humidity     ", label),
            Span::raw(format!("{}%", current.humidity)),
        ]),
        Line::from(vec![
            Span::styled("Wind         ", label),
            Span::raw(format_wind(current.wind_speed, units)),
        ]),
    ];

    let block = Block::default()
        .title(format!(" {} ", current.location))
        .borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_forecast(frame: &mut Frame, forecast: &Forecast, area: Rect) {
    let block = Block::default().title(" Forecast ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let temperatures = forecast.temperatures();
    frame.render_widget(TemperatureSparkline::new(&temperatures).marker(0), rows[0]);

    let units = forecast.units;
    let lines: Vec<Line> = forecast
        .daily_summary()
        .into_iter()
        .map(|day| {
            Line::from(vec![
                Span::styled(
                    format!("{}  ", day.date.format("%a %d")),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format_temperature(day.min_temperature, units),
                    Style::default().fg(temperature_color(day.min_temperature, units)),
                ),
                Span::raw(" / "),
                Span::styled(
                    format_temperature(day.max_temperature, units),
                    Style::default().fg(temperature_color(day.max_temperature, units)),
                ),
                Span::raw(format!("  {}", day.description)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), rows[1]);
}

fn render_placeholder(frame: &mut Frame, message: &str, area: Rect) {
    let text = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(text, area);
}

fn render_status(frame: &mut Frame, app: &WatchApp, area: Rect) {
    let mut spans = Vec::new();

    if app.refreshing {
        spans.push(Span::styled("Refreshing... ", Style::default().fg(Color::Yellow)));
    } else if let Some(at) = app.last_refresh {
        spans.push(Span::styled(
            format!("Updated {} ", at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if let Some(err) = &app.last_error {
        spans.push(Span::styled(
            format!("Error: {} ", err),
            Style::default().fg(Color::Red),
        ));
    }

    spans.push(Span::styled(
        "[r] refresh  [?] help  [q] quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
