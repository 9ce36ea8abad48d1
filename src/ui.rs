//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! Layout, top to bottom: source tabs, query bar (filter, days, search,
//! parser state), error banner, the table with the statistics panel beside
//! it, the parser log, the pagination bar and the status bar.  The detail
//! modal and the parser picker are drawn over everything else.

use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell as TableCell, Clear, Paragraph, Row as TableRow, Table, Wrap},
    Frame,
};

use crate::app::{App, Focus, Mode, StatsView};
use crate::catalog::SourceKind;
use crate::highlight::{highlight, Highlighter, Segment};
use crate::log_panel::LogLevel;
use crate::render::{self, category_label, CellKind, RenderedTable, RiskLevel};
use crate::schema::{Column, ColumnKind};

/// Expanded text is wrapped at this many characters.
const EXPANDED_WIDTH: usize = 60;
const LOG_HEIGHT: u16 = 8;
const STATS_WIDTH: u16 = 32;
const NO_DATA: &str = "No data";

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn match_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

/// Draw the complete UI for one frame.
///
/// Called once per tick from the main loop.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let error = app.fetcher.error().map(str::to_string);
    let [tabs_area, bar_area, error_area, body_area, log_area, pager_area, status_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(u16::from(error.is_some())),
            Constraint::Min(3),
            Constraint::Length(if app.log.visible { LOG_HEIGHT } else { 0 }),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

    draw_sources(app, frame, tabs_area);
    draw_query_bar(app, frame, bar_area);
    if let Some(error) = error {
        let banner = Paragraph::new(format!(" ✖ {error}"))
            .style(Style::default().fg(Color::White).bg(Color::Red));
        frame.render_widget(banner, error_area);
    }

    if app.show_stats {
        let [table_area, stats_area] =
            Layout::horizontal([Constraint::Min(20), Constraint::Length(STATS_WIDTH)])
                .areas(body_area);
        draw_table(app, frame, table_area);
        draw_stats(app, frame, stats_area);
    } else {
        draw_table(app, frame, body_area);
    }

    if app.log.visible {
        draw_log(app, frame, log_area);
    }
    draw_pagination(app, frame, pager_area);
    draw_status_bar(app, frame, status_area);

    match app.mode {
        Mode::Detail(_) => draw_detail(app, frame),
        Mode::ParserPicker | Mode::UniversalUrl => draw_picker(app, frame),
        Mode::Normal | Mode::Search => {}
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

fn draw_sources(app: &App, frame: &mut Frame, area: Rect) {
    let selected = app.catalog.selected_index();
    let start = selected.saturating_sub(3);
    let mut spans = Vec::new();
    if start > 0 {
        spans.push(Span::styled("‹", dim()));
    }
    for (i, entry) in app.catalog.entries().iter().enumerate().skip(start) {
        let style = if i == selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if entry.kind == SourceKind::Social {
            Style::default().fg(Color::Magenta)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" {} ", entry.label), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_query_bar(app: &App, frame: &mut Frame, area: Rect) {
    let sep = || Span::styled(" │ ", dim());
    let mut spans = vec![Span::raw(" ")];

    if let Some((label, value)) = app.filter_display() {
        spans.push(Span::raw(format!("{label}: ")));
        spans.push(Span::styled(value, Style::default().fg(Color::Cyan)));
        spans.push(sep());
    }

    spans.push(Span::raw(format!("Days: {}", app.query.days_window())));
    spans.push(sep());

    spans.push(Span::raw("Search: "));
    if app.mode == Mode::Search {
        spans.push(Span::styled(
            format!("{}_", app.search_input),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::UNDERLINED),
        ));
    } else if app.query.search_query().is_empty() {
        spans.push(Span::styled(render::PLACEHOLDER, dim()));
    } else {
        spans.push(Span::styled(
            app.query.search_query().to_string(),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(sep());

    let running = app.parser.running();
    spans.push(if running.is_empty() {
        Span::styled("Parsers: idle", dim())
    } else {
        Span::styled(
            format!("Parsers: {}", running.join(", ")),
            Style::default().fg(Color::Green),
        )
    });
    spans.push(sep());
    spans.push(if app.connected {
        Span::styled("● live", Style::default().fg(Color::Green))
    } else {
        Span::styled("○ offline", dim())
    });

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

fn draw_table(app: &mut App, frame: &mut Frame, area: Rect) {
    let mut title = format!(" {} ", app.catalog.selected().label);
    if app.fetcher.is_loading() {
        title.push_str("· loading… ");
    }
    let block = Block::default().title(title).borders(Borders::ALL);

    match &app.table {
        RenderedTable::NoData => {
            let text = if app.fetcher.is_loading() { "Loading…" } else { NO_DATA };
            let empty = Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(dim())
                .block(block);
            frame.render_widget(empty, area);
        }
        RenderedTable::Rows { headers, rows } => {
            let header = TableRow::new(headers.iter().map(|c| TableCell::from(c.label)))
                .style(Style::default().add_modifier(Modifier::BOLD));
            let body = rows
                .iter()
                .map(|row| table_row(row, app.highlighter.as_ref()));
            let widths: Vec<Constraint> = headers.iter().map(column_width).collect();
            let table = Table::new(body, widths)
                .header(header)
                .block(block)
                .row_highlight_style(
                    Style::default()
                        .add_modifier(Modifier::BOLD)
                        .bg(Color::DarkGray),
                )
                .highlight_symbol("▸ ");
            frame.render_stateful_widget(table, area, &mut app.table_state);
        }
    }
}

fn column_width(column: &Column) -> Constraint {
    match column.kind {
        ColumnKind::Date(_) => Constraint::Length(21),
        ColumnKind::Title => Constraint::Fill(3),
        ColumnKind::Content => Constraint::Fill(4),
        ColumnKind::Category => Constraint::Length(18),
        ColumnKind::Count | ColumnKind::Percent | ColumnKind::Risk => Constraint::Length(11),
        ColumnKind::Plain => Constraint::Fill(1),
    }
}

fn risk_color(level: RiskLevel) -> Option<Color> {
    match level {
        RiskLevel::High => Some(Color::Red),
        RiskLevel::Medium => Some(Color::Yellow),
        RiskLevel::Low => None,
    }
}

fn table_row<'a>(row: &'a render::Row, highlighter: Option<&Highlighter>) -> TableRow<'a> {
    let texts: Vec<Text<'a>> = row.cells.iter().map(|c| cell_text(c, highlighter)).collect();
    let height = texts.iter().map(|t| t.lines.len()).max().unwrap_or(1).max(1);
    let mut style = Style::default();
    if let Some(color) = row.risk.and_then(risk_color) {
        style = style.fg(color);
    }
    TableRow::new(texts.into_iter().map(TableCell::from))
        .height(height as u16)
        .style(style)
}

/// Text of one cell.  Search matches are marked only in title and content
/// cells, and never inside the expand/collapse label.
fn cell_text<'a>(cell: &'a render::Cell, highlighter: Option<&Highlighter>) -> Text<'a> {
    let base = match cell.kind {
        CellKind::Date => dim(),
        CellKind::Category => Style::default().fg(Color::Cyan),
        CellKind::Risk(level) => risk_color(level)
            .map(|c| Style::default().fg(c).add_modifier(Modifier::BOLD))
            .unwrap_or_default(),
        _ => Style::default(),
    };
    let segments = if cell.is_searchable() {
        highlight(highlighter, &cell.text)
    } else {
        vec![Segment {
            text: &cell.text,
            matched: false,
        }]
    };
    let mut lines = match cell.kind {
        CellKind::Content { expanded: true, .. } => wrap_segments(&segments, EXPANDED_WIDTH, base),
        _ => vec![Line::from(styled_spans(&segments, base))],
    };
    if let (Some(label), Some(last)) = (cell.toggle_label(), lines.last_mut()) {
        last.spans.push(Span::styled(
            format!(" {label}"),
            Style::default().fg(Color::Blue),
        ));
    }
    Text::from(lines)
}

fn styled_spans<'a>(segments: &[Segment<'a>], base: Style) -> Vec<Span<'a>> {
    segments
        .iter()
        .map(|s| {
            let style = if s.matched { base.patch(match_style()) } else { base };
            Span::styled(s.text, style)
        })
        .collect()
}

/// Break segments into lines of at most `width` characters, keeping each
/// piece's highlight.
fn wrap_segments<'a>(segments: &[Segment<'a>], width: usize, base: Style) -> Vec<Line<'a>> {
    let width = width.max(1);
    let mut lines = vec![Line::default()];
    let mut used = 0;
    for segment in segments {
        let style = if segment.matched { base.patch(match_style()) } else { base };
        let mut rest = segment.text;
        while !rest.is_empty() {
            if used == width {
                lines.push(Line::default());
                used = 0;
            }
            let split = rest
                .char_indices()
                .nth(width - used)
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            let (head, tail) = rest.split_at(split);
            if let Some(line) = lines.last_mut() {
                line.spans.push(Span::styled(head, style));
            }
            used += head.chars().count();
            rest = tail;
        }
    }
    lines
}

// ---------------------------------------------------------------------------
// Side and bottom panels
// ---------------------------------------------------------------------------

fn draw_stats(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(format!(" Statistics · {}d ", app.query.days_window()))
        .borders(Borders::ALL);
    let lines: Vec<Line> = match &app.stats {
        StatsView::Loading => vec![Line::styled("Loading…", dim())],
        StatsView::Unavailable => vec![Line::styled("statistics unavailable", dim())],
        StatsView::Ready(stats) => {
            let mut lines = vec![
                Line::from(vec![
                    Span::raw("Total: "),
                    Span::styled(
                        stats.total.to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::default(),
            ];
            let groups = [
                ("Categories", &stats.categories),
                ("Custom sources", &stats.custom_sources),
            ];
            for (heading, counts) in groups {
                if counts.is_empty() {
                    continue;
                }
                lines.push(Line::styled(heading, Style::default().fg(Color::Cyan)));
                for (id, entry) in counts {
                    let name = if entry.name.is_empty() {
                        category_label(id)
                    } else {
                        entry.name.as_str()
                    };
                    lines.push(Line::from(format!("  {name}: {}", entry.count)));
                }
            }
            lines
        }
    };
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Info => Style::default(),
        LogLevel::Success => Style::default().fg(Color::Green),
        LogLevel::Warning => Style::default().fg(Color::Yellow),
        LogLevel::Error => Style::default().fg(Color::Red),
    }
}

fn draw_log(app: &App, frame: &mut Frame, area: Rect) {
    let entries = app.log.entries();
    let visible = area.height.saturating_sub(2) as usize;
    let start = entries.len().saturating_sub(visible);
    let lines: Vec<Line> = entries[start..]
        .iter()
        .map(|entry| {
            let mut spans = Vec::with_capacity(2);
            if !entry.stamp.is_empty() {
                spans.push(Span::styled(format!("[{}] ", entry.stamp), dim()));
            }
            spans.push(Span::styled(entry.message.as_str(), level_style(entry.level)));
            Line::from(spans)
        })
        .collect();
    let block = Block::default().title(" Parser log ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_pagination(app: &App, frame: &mut Frame, area: Rect) {
    if app.controls.is_empty() {
        return;
    }
    let mut spans = vec![Span::raw(" ")];
    for (i, control) in app.controls.iter().enumerate() {
        let mut style = Style::default();
        if control.is_active() {
            style = style
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD);
        }
        if app.focus == Focus::Pagination && i == app.control_cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        spans.push(Span::styled(format!(" {} ", control.label()), style));
    }
    spans.push(Span::styled(
        format!("  page {} of {}", app.query.page(), app.total_pages),
        dim(),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let help = match app.mode {
        Mode::Search => "Enter: search  Esc: leave",
        Mode::ParserPicker => "Space: toggle  u: site URL  Enter: run  Esc: cancel",
        Mode::UniversalUrl => "Enter/Esc: done",
        Mode::Detail(_) => "Esc: close",
        Mode::Normal if app.focus == Focus::Pagination => "←/→: move  Enter: open page  b: back",
        Mode::Normal => "q: quit  Tab: source  f: filter  d: days  /: search  n/p: page  R/x: parsers",
    };
    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} items", app.table.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(help, dim()),
    ]));
    frame.render_widget(status, area);
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [center] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    center
}

fn draw_detail(app: &App, frame: &mut Frame) {
    let Some(detail) = app.detail() else {
        return;
    };
    let area = centered(frame.area(), 80, 70);
    let hl = app.highlighter.as_ref();
    let title_style = Style::default().add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(styled_spans(&highlight(hl, &detail.title), title_style)),
        Line::default(),
        Line::from(vec![
            Span::styled("Source: ", dim()),
            Span::raw(detail.source.as_str()),
            Span::styled("   Date: ", dim()),
            Span::raw(detail.date.as_str()),
        ]),
    ];
    if let Some(link) = &detail.link {
        lines.push(Line::from(vec![
            Span::styled("Link: ", dim()),
            Span::styled(link.as_str(), Style::default().fg(Color::Blue)),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(styled_spans(
        &highlight(hl, &detail.content),
        Style::default(),
    )));

    let block = Block::default().title(" Article ").borders(Borders::ALL);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_picker(app: &App, frame: &mut Frame) {
    let area = centered(frame.area(), 50, 70);
    let mut lines: Vec<Line> = app
        .parser_candidates()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let mark = if app.picker.chosen.contains(&entry.id) { "[x]" } else { "[ ]" };
            let style = if i == app.picker.cursor && app.mode == Mode::ParserPicker {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::styled(format!(" {mark} {}", entry.label), style)
        })
        .collect();
    lines.push(Line::default());

    let url_style = if app.mode == Mode::UniversalUrl {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::UNDERLINED)
    } else {
        Style::default()
    };
    let cursor = if app.mode == Mode::UniversalUrl { "_" } else { "" };
    lines.push(Line::from(vec![
        Span::styled(" Site URL: ", dim()),
        Span::styled(format!("{}{cursor}", app.picker.universal_url), url_style),
    ]));

    let block = Block::default().title(" Run parsers ").borders(Borders::ALL);
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::envelope::NewsEnvelope;
    use crate::api::{ParserTarget, Statistics};
    use crate::app::Settings;
    use crate::worker::{Command, WorkerMsg};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use serde_json::json;

    fn screen(app: &mut App) -> String {
        let backend = TestBackend::new(120, 32);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        let buf = terminal.backend().buffer().clone();
        let width = buf.area.width as usize;
        buf.content()
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn with_page(body: serde_json::Value) -> App {
        let mut app = App::new(Settings::default());
        app.fetch();
        let seq = app
            .take_commands()
            .into_iter()
            .find_map(|c| match c {
                Command::FetchList { seq, .. } => Some(seq),
                _ => None,
            })
            .unwrap();
        let envelope: NewsEnvelope = serde_json::from_value(body).unwrap();
        app.handle_worker_msg(WorkerMsg::List {
            seq,
            result: envelope.into_list(),
        });
        app
    }

    #[test]
    fn empty_app_shows_no_data() {
        let mut app = App::new(Settings::default());
        assert!(screen(&mut app).contains(NO_DATA));
    }

    #[test]
    fn loading_state_is_shown() {
        let mut app = App::new(Settings::default());
        app.fetch();
        assert!(screen(&mut app).contains("Loading…"));
    }

    #[test]
    fn rows_headers_and_pagination_are_drawn() {
        let mut app = with_page(json!({
            "status": "success",
            "data": [{"title": "Headline one", "category": "ukraine"}],
            "total_pages": 10,
            "current_page": 10,
        }));
        let text = screen(&mut app);
        assert!(text.contains("Title"));
        assert!(text.contains("Headline one"));
        assert!(text.contains("Украина"));
        assert!(text.contains(" « "));
        assert!(text.contains(" 10 "));
        assert!(!text.contains('»'), "no next control on the last page");
        assert!(text.contains("1 items"));
    }

    #[test]
    fn error_banner_shows_message() {
        let mut app = with_page(json!({"status": "error", "message": "Источник не найден"}));
        assert!(screen(&mut app).contains("Источник не найден"));
    }

    #[test]
    fn statistics_panel_states() {
        let mut app = App::new(Settings::default());
        app.stats = StatsView::Unavailable;
        assert!(screen(&mut app).contains("statistics unavailable"));

        let stats: Statistics = serde_json::from_value(json!({
            "total": 1234,
            "categories": {"ukraine": {"count": 7, "name": "Украина"}},
        }))
        .unwrap();
        app.stats = StatsView::Ready(stats);
        let text = screen(&mut app);
        assert!(text.contains("Total: 1234"));
        assert!(text.contains("Украина: 7"));
    }

    #[test]
    fn log_panel_shows_latest_lines() {
        let mut app = App::new(Settings::default());
        app.run_parsers(vec![ParserTarget::Named("ria".into())]);
        let text = screen(&mut app);
        assert!(text.contains("Parser log"));
        assert!(text.contains("Selected sources: ria"));
        assert!(text.contains("Parsers: ria"));
    }

    #[test]
    fn detail_modal_shows_link() {
        let mut app = with_page(json!({
            "status": "success",
            "data": [{"title": "Headline", "content": "Body", "link": "https://ria.ru/1"}],
            "total_pages": 1,
        }));
        app.open_detail();
        let text = screen(&mut app);
        assert!(text.contains("Article"));
        assert!(text.contains("https://ria.ru/1"));
        assert!(text.contains("unknown date"));
    }

    #[test]
    fn picker_lists_parser_sources() {
        let mut app = App::new(Settings::default());
        app.open_parser_picker();
        app.picker_toggle();
        let text = screen(&mut app);
        assert!(text.contains("Run parsers"));
        assert!(text.contains("[x] Telegram"));
        assert!(text.contains("Site URL"));
    }

    #[test]
    fn matches_are_marked_outside_toggle_label() {
        let hl = Highlighter::new("expand").unwrap();
        let mut cell = render::render_cell(
            &serde_json::from_value(json!({ "text": "expand ".repeat(30) })).unwrap(),
            &Column::new("text", "Text", ColumnKind::Content),
        );
        let text = cell_text(&cell, Some(&hl));
        let line = &text.lines[0];
        let label = line.spans.last().unwrap();
        assert_eq!(label.content, format!(" {}", render::EXPAND_LABEL));
        assert_ne!(label.style, match_style());
        assert!(line.spans.iter().any(|s| s.style == match_style()));

        cell.toggle();
        let text = cell_text(&cell, Some(&hl));
        assert!(text.lines.len() > 1, "expanded text wraps");
    }

    #[test]
    fn non_searchable_cells_are_never_marked() {
        let hl = Highlighter::new("other").unwrap();
        let cell = render::render_cell(
            &serde_json::from_value(json!({})).unwrap(),
            &Column::new("category", "Category", ColumnKind::Category),
        );
        let text = cell_text(&cell, Some(&hl));
        assert!(text.lines[0].spans.iter().all(|s| s.style != match_style()));
    }

    #[test]
    fn wrap_keeps_every_character() {
        let segments = [
            Segment { text: "abcde", matched: false },
            Segment { text: "fgh", matched: true },
        ];
        let lines = wrap_segments(&segments, 4, Style::default());
        let rendered: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(rendered, vec!["abcd", "efgh"]);
        assert_eq!(lines[1].spans[1].style, match_style());
    }
}
