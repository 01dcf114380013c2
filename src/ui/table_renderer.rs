// Table rendering driven only by a PageView; no access to browser internals

use crate::state::browser::PageView;
use crate::state::pagination::LoadState;
use ratatui::{
    layout::Constraint,
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

const HEADERS: [&str; 6] = ["Check", "ID", "Name", "Category", "Price", "Quantity"];

/// Glyphs used for checkboxes and skeleton cells
#[derive(Debug, Clone, Copy)]
pub struct TableGlyphs {
    pub checked: &'static str,
    pub unchecked: &'static str,
    pub skeleton: &'static str,
}

impl TableGlyphs {
    pub fn unicode() -> Self {
        Self {
            checked: "☑",
            unchecked: "☐",
            skeleton: "░",
        }
    }

    pub fn ascii() -> Self {
        Self {
            checked: "[x]",
            unchecked: "[ ]",
            skeleton: "-",
        }
    }
}

fn column_widths() -> [Constraint; 6] {
    [
        Constraint::Length(7),
        Constraint::Length(6),
        Constraint::Min(20),
        Constraint::Percentage(25),
        Constraint::Length(10),
        Constraint::Length(9),
    ]
}

fn header_row() -> Row<'static> {
    Row::new(HEADERS.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    }))
}

/// Placeholder rows shown while the first page is loading
fn skeleton_rows(count: usize, glyphs: &TableGlyphs) -> Vec<Row<'static>> {
    let widths = [3, 3, 18, 10, 6, 4];
    (0..count)
        .map(|_| {
            Row::new(
                widths
                    .iter()
                    .map(|w| Cell::from(glyphs.skeleton.repeat(*w)))
                    .collect::<Vec<_>>(),
            )
            .style(Style::default().fg(Color::DarkGray))
        })
        .collect()
}

fn title(view: &PageView) -> String {
    match view.matches {
        Some(matches) => format!("Products matching '{}' ({})", view.search_term, matches),
        None => "Products".to_string(),
    }
}

/// Render the product table for `view`.
///
/// While a load is in flight the current rows stay visible; skeleton rows are
/// only drawn when there is nothing else to show yet.
pub fn render_table(
    f: &mut Frame,
    area: Rect,
    view: &PageView,
    page_size: usize,
    state: &mut TableState,
    glyphs: &TableGlyphs,
) {
    let block = Block::default().borders(Borders::ALL).title(title(view));

    if view.rows.is_empty() {
        if view.load_state.is_loading() {
            let table = Table::new(skeleton_rows(page_size, glyphs), column_widths())
                .header(header_row())
                .block(block);
            f.render_widget(table, area);
            return;
        }

        let message = match (&view.load_state, view.matches) {
            (LoadState::Error { cause, .. }, _) => format!("Could not load products: {}", cause),
            (_, Some(_)) => "No products match the search".to_string(),
            _ => "No products".to_string(),
        };
        let empty = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(Color::Yellow));
        f.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = view
        .rows
        .iter()
        .map(|row| {
            let record = &row.record;
            let (mark, style) = if row.checked {
                (glyphs.checked, Style::default().fg(Color::Green))
            } else {
                (glyphs.unchecked, Style::default())
            };
            Row::new(vec![
                Cell::from(mark),
                Cell::from(record.id.to_string()),
                Cell::from(record.name.clone()),
                Cell::from(record.category.clone()),
                Cell::from(record.price_label()),
                Cell::from(record.quantity.to_string()),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(rows, column_widths())
        .header(header_row())
        .block(block)
        .column_spacing(1)
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    f.render_stateful_widget(table, area, state);
}

/// One-line pagination / load status summary
pub fn status_line(view: &PageView, source: &str) -> Line<'static> {
    let pages = format!(" Page {}/{} ", view.page, view.total_pages.max(1));
    let mut spans = vec![
        Span::styled(pages, Style::default().fg(Color::Black).bg(Color::Cyan)),
        Span::raw(format!(" {} selected ", view.selected)),
        Span::styled(format!("| {} ", source), Style::default().fg(Color::DarkGray)),
    ];

    match &view.load_state {
        LoadState::Idle => {}
        LoadState::Loading(index) => spans.push(Span::styled(
            format!("| loading page {}... ", index + 1),
            Style::default().fg(Color::Yellow),
        )),
        LoadState::Error { index, cause } => spans.push(Span::styled(
            format!("| page {} {}: {} (r to retry) ", index + 1, cause.kind(), cause),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
    }

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::Record;
    use crate::error::BrowserError;
    use crate::state::selection::RowView;
    use ratatui::{backend::TestBackend, Terminal};

    fn view(rows: Vec<RowView>, load_state: LoadState) -> PageView {
        PageView {
            page: 1,
            total_pages: 3,
            selected: rows.iter().filter(|r| r.checked).count(),
            rows,
            load_state,
            search_term: String::new(),
            matches: None,
        }
    }

    fn rendered(view: &PageView) -> String {
        let backend = TestBackend::new(80, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut state = TableState::default();
        terminal
            .draw(|f| {
                let area = f.area();
                render_table(f, area, view, 5, &mut state, &TableGlyphs::ascii())
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn rows_show_checkbox_state() {
        let rows = vec![
            RowView {
                record: Record::new(1, "Mascara", "beauty", 9.99, 5),
                checked: true,
            },
            RowView {
                record: Record::new(2, "Palette", "beauty", 19.99, 44),
                checked: false,
            },
        ];
        let screen = rendered(&view(rows, LoadState::Idle));
        assert!(screen.contains("[x]"));
        assert!(screen.contains("[ ]"));
        assert!(screen.contains("19.99"));
    }

    #[test]
    fn empty_loading_view_draws_skeleton() {
        let screen = rendered(&view(Vec::new(), LoadState::Loading(0)));
        assert!(screen.contains("------"));
        assert!(screen.contains("Category"));
    }

    #[test]
    fn status_line_reports_error_and_retry() {
        let v = view(
            Vec::new(),
            LoadState::Error {
                index: 1,
                cause: BrowserError::unavailable("HTTP 503"),
            },
        );
        let text: String = status_line(&v, "demo")
            .spans
            .iter()
            .map(|s| s.content.to_string())
            .collect();
        assert!(text.contains("Page 1/3"));
        assert!(text.contains("page 2 unavailable"));
        assert!(text.contains("r to retry"));
    }
}
