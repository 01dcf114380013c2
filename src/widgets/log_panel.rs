use crate::utils::logging::{LogEntry, LogRingBuffer};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Scrollable view over the in-memory log buffer (F5)
pub struct LogPanel {
    buffer: LogRingBuffer,
    /// Lines scrolled up from the newest entry
    scroll_offset: usize,
}

impl LogPanel {
    pub fn new(buffer: LogRingBuffer) -> Self {
        Self {
            buffer,
            scroll_offset: 0,
        }
    }

    /// Handle a key while the panel is open. Returns true when it should close.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(10),
            KeyCode::PageDown => self.scroll_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.scroll_offset = self.buffer.len(),
            KeyCode::End | KeyCode::Char('G') => self.scroll_offset = 0,
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::F(5) => return true,
            _ => {}
        }
        false
    }

    pub fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = (self.scroll_offset + amount).min(self.buffer.len());
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    /// Entries that fit in `height` lines, ending `scroll_offset` entries
    /// before the newest
    pub fn visible_entries(&self, height: usize) -> Vec<LogEntry> {
        let mut entries = self.buffer.get_recent(height + self.scroll_offset);
        entries.truncate(entries.len().saturating_sub(self.scroll_offset));
        let skip = entries.len().saturating_sub(height);
        entries.split_off(skip)
    }

    fn level_color(level: &str) -> Color {
        match level {
            "ERROR" => Color::Red,
            "WARN" => Color::Yellow,
            "DEBUG" => Color::Cyan,
            "TRACE" => Color::DarkGray,
            _ => Color::White,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let height = area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .visible_entries(height)
            .into_iter()
            .map(|entry| {
                let color = Self::level_color(&entry.level);
                Line::from(vec![
                    Span::styled(
                        format!("{} ", entry.timestamp),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(format!("{:<5} ", entry.level), Style::default().fg(color)),
                    Span::styled(
                        format!("[{}] ", entry.target),
                        Style::default().fg(Color::Blue),
                    ),
                    Span::raw(entry.message),
                ])
            })
            .collect();

        let title = format!(
            "Logs ({} entries) - ↑↓ scroll, Home/End, Esc/F5 close",
            self.buffer.len()
        );
        let panel = Paragraph::new(Text::from(lines))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(panel, area);
    }
}
