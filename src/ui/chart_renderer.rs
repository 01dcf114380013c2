// Bar chart of the selected records: one bar per record, x = id, height = price

use crate::data::record::Record;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    prelude::*,
    style::{Color, Style},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
};

/// Price bands drive the width and colour of a bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBand {
    /// Below 10
    Low,
    /// 10 up to and including 20
    Mid,
    /// Above 20
    High,
}

impl PriceBand {
    pub fn of(price: f64) -> Self {
        if price < 10.0 {
            PriceBand::Low
        } else if price <= 20.0 {
            PriceBand::Mid
        } else {
            PriceBand::High
        }
    }

    pub fn bar_width(self) -> u16 {
        match self {
            PriceBand::Low => 1,
            PriceBand::Mid => 2,
            PriceBand::High => 3,
        }
    }

    pub fn color(self) -> Color {
        match self {
            PriceBand::Low => Color::Green,
            PriceBand::Mid => Color::Yellow,
            PriceBand::High => Color::Magenta,
        }
    }
}

/// Bar heights are prices in cents so two-decimal prices stay distinct
fn price_cents(price: f64) -> u64 {
    (price * 100.0).round().max(0.0) as u64
}

/// Records that fit in `width` columns, in selection order
fn fitting(records: &[Record], width: u16) -> usize {
    let mut used = 0u16;
    let mut count = 0;
    for record in records {
        let needed = PriceBand::of(record.price).bar_width() + 1;
        if used + needed > width {
            break;
        }
        used += needed;
        count += 1;
    }
    count
}

pub fn render_chart(f: &mut Frame, area: Rect, records: &[Record]) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(
            "Selected prices ({}) - green < 10, yellow 10-20, magenta > 20",
            records.len()
        ));

    if records.is_empty() {
        let empty = Paragraph::new("Select products with Space to chart their prices")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let inner = block.inner(area);
    f.render_widget(block, area);

    let shown = fitting(records, inner.width);
    let records = &records[..shown];
    let max = records
        .iter()
        .map(|r| price_cents(r.price))
        .max()
        .unwrap_or(1)
        .max(1);

    // One column per bar so each bar can have its own width
    let constraints: Vec<Constraint> = records
        .iter()
        .map(|r| Constraint::Length(PriceBand::of(r.price).bar_width() + 1))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(inner);

    for (record, column) in records.iter().zip(columns.iter()) {
        let band = PriceBand::of(record.price);
        let bar = Bar::default()
            .value(price_cents(record.price))
            .text_value(String::new())
            .label(Line::from(record.id.to_string()))
            .style(Style::default().fg(band.color()));
        let chart = BarChart::default()
            .data(BarGroup::default().bars(&[bar]))
            .bar_width(band.bar_width())
            .bar_gap(1)
            .max(max);
        f.render_widget(chart, *column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_price_thresholds() {
        assert_eq!(PriceBand::of(9.99), PriceBand::Low);
        assert_eq!(PriceBand::of(10.0), PriceBand::Mid);
        assert_eq!(PriceBand::of(20.0), PriceBand::Mid);
        assert_eq!(PriceBand::of(20.01), PriceBand::High);
        assert!(PriceBand::Low.bar_width() < PriceBand::High.bar_width());
    }

    #[test]
    fn only_whole_bars_are_laid_out() {
        let records = vec![
            Record::new(1, "a", "x", 5.0, 1),   // 2 columns
            Record::new(2, "b", "x", 15.0, 1),  // 3 columns
            Record::new(3, "c", "x", 150.0, 1), // 4 columns
        ];
        assert_eq!(fitting(&records, 9), 3);
        assert_eq!(fitting(&records, 8), 2);
        assert_eq!(fitting(&records, 1), 0);
    }

    #[test]
    fn prices_become_cents() {
        assert_eq!(price_cents(9.99), 999);
        assert_eq!(price_cents(0.0), 0);
    }
}
