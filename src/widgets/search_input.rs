//! Debounced search box
//!
//! Keystrokes update the text immediately, but the term only reaches the
//! browser once typing has paused for the configured delay, so filtering
//! runs once per burst instead of once per key.

use crate::utils::debouncer::Debouncer;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

/// Result of handling a key in the search box
#[derive(Debug, Clone, PartialEq)]
pub enum SearchInputAction {
    /// Key consumed, nothing to apply yet
    Continue,
    /// Text changed; the term will be emitted after the quiet period
    InputChanged(String),
    /// Enter pressed: apply this term now and leave the box
    Confirm(String),
    /// Esc pressed: leave the box, keep the applied term
    Cancel,
    /// Not for us
    PassThrough,
}

pub struct SearchInput {
    input: Input,
    debouncer: Debouncer<String>,
    /// Last term handed out, so unchanged text is not emitted twice
    last_emitted: String,
    title: String,
    active: bool,
}

impl SearchInput {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            input: Input::default(),
            debouncer: Debouncer::new(debounce_ms),
            last_emitted: String::new(),
            title: "Search Products".to_string(),
            active: false,
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Empty the box and schedule the empty term
    pub fn clear(&mut self) {
        self.input.reset();
        self.debouncer.push(String::new());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SearchInputAction {
        if !self.active {
            return SearchInputAction::PassThrough;
        }

        match key.code {
            KeyCode::Esc => {
                self.deactivate();
                SearchInputAction::Cancel
            }
            KeyCode::Enter => {
                self.deactivate();
                self.debouncer.cancel();
                let term = self.input.value().to_string();
                self.last_emitted = term.clone();
                SearchInputAction::Confirm(term)
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                SearchInputAction::PassThrough
            }
            _ => {
                let before = self.input.value().to_string();
                self.input.handle_event(&Event::Key(key));
                let current = self.input.value().to_string();
                if current == before {
                    return SearchInputAction::Continue;
                }
                self.debouncer.push(current.clone());
                SearchInputAction::InputChanged(current)
            }
        }
    }

    /// Call from the event loop; returns the term once typing has paused
    pub fn check_debounce(&mut self) -> Option<String> {
        let term = self.debouncer.poll()?;
        if term == self.last_emitted {
            return None;
        }
        self.last_emitted = term.clone();
        Some(term)
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let title = if self.debouncer.is_pending() {
            format!("{} (typing...)", self.title)
        } else {
            self.title.clone()
        };
        let style = if self.active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };

        let text = if self.input.value().is_empty() && !self.active {
            "Press / to search by name or category".to_string()
        } else {
            self.input.value().to_string()
        };

        let widget = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(style),
            )
            .style(style);
        f.render_widget(widget, area);

        if self.active {
            f.set_cursor_position((area.x + self.input.visual_cursor() as u16 + 1, area.y + 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn inactive_box_passes_keys_through() {
        let mut input = SearchInput::new(0);
        assert_eq!(
            input.handle_key(key(KeyCode::Char('a'))),
            SearchInputAction::PassThrough
        );
    }

    #[test]
    fn typing_emits_once_after_quiet_period() {
        let mut input = SearchInput::new(0);
        input.activate();
        input.handle_key(key(KeyCode::Char('b')));
        input.handle_key(key(KeyCode::Char('e')));
        assert_eq!(
            input.handle_key(key(KeyCode::Char('d'))),
            SearchInputAction::InputChanged("bed".to_string())
        );

        assert_eq!(input.check_debounce(), Some("bed".to_string()));
        assert_eq!(input.check_debounce(), None);
    }

    #[test]
    fn enter_confirms_without_waiting() {
        let mut input = SearchInput::new(60_000);
        input.activate();
        input.handle_key(key(KeyCode::Char('x')));
        assert_eq!(
            input.handle_key(key(KeyCode::Enter)),
            SearchInputAction::Confirm("x".to_string())
        );
        assert!(!input.is_active());
        assert!(!input.is_pending());
        assert_eq!(input.check_debounce(), None);
    }
}
