//! Temperature sparkline widget for inline forecast visualization

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Block characters for different temperatures (8 levels)
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// A one-row sparkline of forecast temperatures
///
/// Values are scaled between the lowest and highest temperature in the
/// series, so the shape shows the trend regardless of units.
pub struct TemperatureSparkline<'a> {
    /// Temperature for each forecast slot
    temperatures: &'a [f64],
    min: f64,
    max: f64,
    /// Highlighted slot (index into temperatures)
    marker: Option<usize>,
    /// Style for the sparkline
    style: Style,
    /// Style for the highlighted slot
    marker_style: Style,
}

impl<'a> TemperatureSparkline<'a> {
    pub fn new(temperatures: &'a [f64]) -> Self {
        let min = temperatures.iter().copied().fold(f64::INFINITY, f64::min);
        let max = temperatures.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            temperatures,
            min,
            max,
            marker: None,
            style: Style::default().fg(Color::Cyan),
            marker_style: Style::default().fg(Color::Yellow),
        }
    }

    pub fn marker(mut self, pos: usize) -> Self {
        self.marker = Some(pos);
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn temperature_to_block(&self, temperature: f64) -> char {
        let range = self.max - self.min;
        if !range.is_finite() || range <= f64::EPSILON {
            return BLOCKS[3];
        }
        let normalized = ((temperature - self.min) / range).clamp(0.0, 1.0);
        let index = ((normalized * 7.0).round() as usize).min(7);
        BLOCKS[index]
    }
}

impl<'a> Widget for TemperatureSparkline<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;

        for (i, temperature) in self.temperatures.iter().take(width).enumerate() {
            let block = self.temperature_to_block(*temperature);
            let x = area.x + i as u16;
            let y = area.y;

            let style = if self.marker == Some(i) {
                self.marker_style
            } else {
                self.style
            };

            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char(block).set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_and_highest_map_to_extremes() {
        let temps = [10.0, 15.0, 20.0];
        let sparkline = TemperatureSparkline::new(&temps);
        assert_eq!(sparkline.temperature_to_block(10.0), '▁');
        assert_eq!(sparkline.temperature_to_block(20.0), '█');
        assert!(BLOCKS.contains(&sparkline.temperature_to_block(15.0)));
    }

    #[test]
    fn test_negative_temperatures_scale() {
        let temps = [-10.0, -5.0, 0.0];
        let sparkline = TemperatureSparkline::new(&temps);
        assert_eq!(sparkline.temperature_to_block(-10.0), '▁');
        assert_eq!(sparkline.temperature_to_block(0.0), '█');
    }

    #[test]
    fn test_flat_series_uses_middle_block() {
        let temps = [12.0, 12.0, 12.0];
        let sparkline = TemperatureSparkline::new(&temps);
        assert_eq!(sparkline.temperature_to_block(12.0), '▄');
    }

    #[test]
    fn test_empty_series_does_not_panic() {
        let sparkline = TemperatureSparkline::new(&[]);
        assert_eq!(sparkline.temperature_to_block(1.0), '▄');
    }

    #[test]
    fn test_render_writes_one_cell_per_value() {
        let temps = [1.0, 2.0, 3.0, 4.0];
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);

        TemperatureSparkline::new(&temps)
            .marker(1)
            .style(Style::default().fg(Color::Blue))
            .render(area, &mut buf);

        let row: String = (0..4u16)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect();
        assert_eq!(row, "▁▃▆█");
        assert_eq!(buf.cell((1, 0)).unwrap().fg, Color::Yellow);
        assert_eq!(buf.cell((0, 0)).unwrap().fg, Color::Blue);
    }
}
