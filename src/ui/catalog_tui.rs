//! Terminal front end for the catalog browser.
//!
//! The event loop never awaits a fetch. Page loads and the startup prefetch
//! run as tokio tasks and report back through a channel, which the loop
//! drains between frames, so the table keeps redrawing while data arrives.

use crate::config::config::Config;
use crate::data::data_provider::CatalogSource;
use crate::data::record::PageRecords;
use crate::error::BrowserResult;
use crate::search_filter::FilterOptions;
use crate::state::browser::{CatalogBrowser, PageView};
use crate::state::events::SelectionSnapshot;
use crate::state::pagination::PageRequest;
use crate::ui::chart_renderer::render_chart;
use crate::ui::table_renderer::{render_table, status_line, TableGlyphs};
use crate::utils::logging::LogRingBuffer;
use crate::widgets::log_panel::LogPanel;
use crate::widgets::search_input::{SearchInput, SearchInputAction};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::Line,
    widgets::{Paragraph, TableState},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const MAX_PAGE_SIZE: usize = 50;

/// Results sent back to the event loop by background tasks
enum AppMessage {
    PageLoaded {
        request: PageRequest,
        result: BrowserResult<PageRecords>,
        /// Start the background prefetch once this page is in
        prefetch_after: bool,
    },
    Prefetched {
        pages: usize,
    },
}

pub struct CatalogApp {
    browser: CatalogBrowser<dyn CatalogSource>,
    runtime: Handle,
    tx: UnboundedSender<AppMessage>,
    rx: UnboundedReceiver<AppMessage>,
    search: SearchInput,
    table_state: TableState,
    chart: SelectionSnapshot,
    log_panel: LogPanel,
    show_logs: bool,
    show_chart: bool,
    glyphs: TableGlyphs,
    status_message: String,
    should_quit: bool,
}

impl CatalogApp {
    /// Must be called from inside a tokio runtime
    pub fn new(source: Arc<dyn CatalogSource>, config: &Config, logs: LogRingBuffer) -> Self {
        let mut browser = CatalogBrowser::new(source, config.browser_config());
        let chart = SelectionSnapshot::new();
        browser.subscribe(Box::new(chart.clone()));

        let (tx, rx) = mpsc::unbounded_channel();
        let glyphs = if config.display.use_glyphs {
            TableGlyphs::unicode()
        } else {
            TableGlyphs::ascii()
        };

        Self {
            browser,
            runtime: Handle::current(),
            tx,
            rx,
            search: SearchInput::new(config.search.debounce_ms),
            table_state: TableState::default(),
            chart,
            log_panel: LogPanel::new(logs),
            show_logs: false,
            show_chart: config.display.show_chart,
            glyphs,
            status_message: "Loading catalog...".to_string(),
            should_quit: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        if let Err(e) = enable_raw_mode() {
            return Err(anyhow::anyhow!("Failed to enable raw mode: {}", e));
        }

        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(anyhow::anyhow!("Failed to setup terminal: {}", e));
        }

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = match Terminal::new(backend) {
            Ok(t) => t,
            Err(e) => {
                let _ = disable_raw_mode();
                return Err(anyhow::anyhow!("Failed to create terminal: {}", e));
            }
        };

        let res = self.run_app(&mut terminal);

        // Always restore terminal, even on error
        let _ = disable_raw_mode();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        res.map_err(|e| anyhow::anyhow!("TUI error: {}", e))
    }

    fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let request = self.browser.begin_initial_load();
        self.spawn_load(request, true);

        while !self.should_quit {
            self.drain_messages();

            if let Some(term) = self.search.check_debounce() {
                self.apply_search(&term);
            }

            let view = self.browser.view();
            self.sync_row_cursor(&view);
            terminal.draw(|f| self.ui(f, &view))?;

            if event::poll(POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    // Some platforms also report releases
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    self.handle_key(key, &view);
                }
            }
        }

        info!(target: "tui", "Exiting");
        Ok(())
    }

    // ===== Background work =====

    fn spawn_load(&self, request: PageRequest, prefetch_after: bool) {
        debug!(target: "tui", "Spawning load of page {}", request.index + 1);
        let load = self.browser.load(request);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = load.await;
            // The receiver only goes away when the app is exiting
            let _ = tx.send(AppMessage::PageLoaded {
                request,
                result,
                prefetch_after,
            });
        });
    }

    fn spawn_prefetch(&self) {
        let prefetch = self.browser.prefetch();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let pages = prefetch.await;
            let _ = tx.send(AppMessage::Prefetched { pages });
        });
    }

    fn drain_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            match message {
                AppMessage::PageLoaded {
                    request,
                    result,
                    prefetch_after,
                } => {
                    let loaded = result.is_ok();
                    if !self.browser.complete_load(request, result) {
                        debug!(target: "tui", "Ignoring superseded load of page {}", request.index + 1);
                        continue;
                    }
                    if loaded {
                        self.status_message.clear();
                        if prefetch_after {
                            self.spawn_prefetch();
                        }
                    }
                }
                AppMessage::Prefetched { pages } => {
                    let stats = self.browser.cache().stats();
                    self.status_message = format!(
                        "{} products cached across {} pages",
                        stats.records, stats.pages
                    );
                    debug!(target: "tui", "Prefetch finished ({} new pages)", pages);
                }
            }
        }
    }

    // ===== Actions =====

    fn apply_search(&mut self, term: &str) {
        if let Some(request) = self.browser.set_search_term(term) {
            self.spawn_load(request, false);
        }
        self.table_state.select(Some(0));
    }

    fn go_to(&mut self, page: usize) {
        if let Some(request) = self.browser.begin_go_to(page) {
            self.spawn_load(request, false);
        }
        self.table_state.select(Some(0));
    }

    fn toggle_current(&mut self, view: &PageView) {
        let Some(row) = self
            .table_state
            .selected()
            .and_then(|index| view.rows.get(index))
        else {
            return;
        };
        if self.browser.toggle(row.record.id).is_none() {
            warn!(target: "tui", "Row {} is no longer known", row.record.id);
        }
    }

    fn change_page_size(&mut self, delta: isize) {
        let current = self.browser.config().page_size;
        let size = current.saturating_add_signed(delta).clamp(1, MAX_PAGE_SIZE);
        if let Some(request) = self.browser.set_page_size(size) {
            self.status_message = format!("Page size {}", size);
            self.spawn_load(request, true);
        }
    }

    fn cycle_filter_mode(&mut self) {
        let current = self.browser.filter_options().clone();
        let options = FilterOptions {
            mode: current.mode.next(),
            ..current
        };
        self.status_message = format!("Search mode: {}", options.mode.as_str());
        self.search
            .set_title(format!("Search Products [{}]", options.mode.as_str()));
        self.browser.set_filter_options(options);
    }

    fn handle_key(&mut self, key: KeyEvent, view: &PageView) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.show_logs {
            if self.log_panel.handle_key(key) {
                self.show_logs = false;
            }
            return;
        }

        if key.code == KeyCode::F(5) {
            self.show_logs = true;
            return;
        }

        match self.search.handle_key(key) {
            SearchInputAction::PassThrough => {}
            SearchInputAction::Confirm(term) => {
                self.apply_search(&term);
                return;
            }
            _ => return,
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                if view.search_term.is_empty() {
                    self.should_quit = true;
                } else {
                    self.search.clear();
                }
            }
            KeyCode::Char('/') => self.search.activate(),
            KeyCode::Up => {
                let index = self.table_state.selected().unwrap_or(0);
                self.table_state.select(Some(index.saturating_sub(1)));
            }
            KeyCode::Down => {
                let index = self.table_state.selected().map_or(0, |i| i + 1);
                let last = view.rows.len().saturating_sub(1);
                self.table_state.select(Some(index.min(last)));
            }
            KeyCode::Char(' ') => self.toggle_current(view),
            KeyCode::Left | KeyCode::PageUp => self.go_to(view.page.saturating_sub(1)),
            KeyCode::Right | KeyCode::PageDown => self.go_to(view.page + 1),
            KeyCode::Home => self.go_to(1),
            KeyCode::End => self.go_to(view.total_pages),
            KeyCode::Char('r') => {
                let refill = self.browser.is_reloading();
                match self.browser.retry() {
                    Some(request) => self.spawn_load(request, refill),
                    None => self.status_message = "Nothing to retry".to_string(),
                }
            }
            KeyCode::Char('R') => {
                self.status_message = "Refreshing...".to_string();
                let request = self.browser.refresh();
                self.spawn_load(request, true);
            }
            KeyCode::Char('c') => self.browser.clear_selection(),
            KeyCode::Char('+') => self.change_page_size(1),
            KeyCode::Char('-') => self.change_page_size(-1),
            KeyCode::Char('m') => self.cycle_filter_mode(),
            _ => {}
        }
    }

    fn sync_row_cursor(&mut self, view: &PageView) {
        match (self.table_state.selected(), view.rows.len()) {
            (_, 0) => self.table_state.select(None),
            (None, _) => self.table_state.select(Some(0)),
            (Some(index), len) if index >= len => self.table_state.select(Some(len - 1)),
            _ => {}
        }
    }

    // ===== Drawing =====

    fn ui(&mut self, f: &mut Frame, view: &PageView) {
        let mut constraints = vec![
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(1),
            Constraint::Length(1),
        ];
        if self.show_chart {
            constraints.push(Constraint::Length(10));
        }
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(f.area());

        self.search.render(f, chunks[0]);

        if self.show_logs {
            let area = if self.show_chart {
                chunks[1].union(chunks[4])
            } else {
                chunks[1]
            };
            self.log_panel.render(f, area);
        } else {
            let page_size = self.browser.config().page_size;
            render_table(
                f,
                chunks[1],
                view,
                page_size,
                &mut self.table_state,
                &self.glyphs,
            );
            if self.show_chart {
                render_chart(f, chunks[4], &self.chart.records());
            }
        }

        let source = self.browser.source().describe();
        f.render_widget(Paragraph::new(status_line(view, &source)), chunks[2]);

        let hint = if self.status_message.is_empty() {
            "/ search  Space toggle  ←/→ page  r retry  R refresh  c clear  +/- page size  m mode  F5 logs  q quit"
                .to_string()
        } else {
            self.status_message.clone()
        };
        f.render_widget(
            Paragraph::new(Line::from(hint)).style(Style::default().fg(Color::DarkGray)),
            chunks[3],
        );
    }
}

/// Run the browser TUI against `source` until the user quits
pub fn run_catalog_tui(
    source: Arc<dyn CatalogSource>,
    config: &Config,
    logs: LogRingBuffer,
) -> Result<()> {
    let app = CatalogApp::new(source, config, logs);
    // The draw/poll loop blocks; move it off the async worker
    tokio::task::block_in_place(move || app.run())
}
