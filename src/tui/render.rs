use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use crate::ops::VisibleRow;
use crate::timer::format_remaining;
use crate::util::unicode;

use super::app::{App, Mode};

/// Most recent completions shown under the outline
const DONE_ROWS: usize = 5;

const CURSOR: &str = "\u{258C}";

/// Main render function: outline, done list, note panel, status row
pub fn render(frame: &mut Frame, app: &mut App, now: Instant) {
    let area = frame.area();
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    let done_height = match app.screen.frame.done.len() {
        0 => 0,
        n => n.min(DONE_ROWS) + 1,
    };
    let detail_height = if app.screen.frame.detail.is_some() { 2 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(done_height as u16),
            Constraint::Length(detail_height),
            Constraint::Length(1),
        ])
        .split(area);

    render_outline(frame, app, chunks[0]);
    render_done(frame, app, chunks[1]);
    render_detail(frame, app, chunks[2]);
    render_status_row(frame, app, chunks[3], now);
}

/// Keep the focused row inside a window of `height` rows
fn adjust_scroll(app: &mut App, height: usize) {
    let total = app.screen.frame.rows.len();
    let focus_row = app
        .screen
        .focus
        .as_ref()
        .and_then(|id| app.screen.frame.rows.iter().position(|r| &r.id == id));
    if let Some(focus) = focus_row {
        if focus < app.scroll_offset {
            app.scroll_offset = focus;
        } else if focus >= app.scroll_offset + height {
            app.scroll_offset = focus + 1 - height;
        }
    }
    app.scroll_offset = app.scroll_offset.min(total.saturating_sub(height));
}

fn render_outline(frame: &mut Frame, app: &mut App, area: Rect) {
    app.outline_area = area;
    let height = area.height as usize;
    adjust_scroll(app, height);
    let app: &App = app;

    let width = area.width as usize;
    let lines: Vec<Line> = app
        .screen
        .frame
        .rows
        .iter()
        .skip(app.scroll_offset)
        .take(height)
        .map(|row| {
            let focused = app.screen.focus.as_ref() == Some(&row.id);
            outline_line(app, row, focused, width)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

fn marker(row: &VisibleRow) -> &'static str {
    match (row.has_children, row.collapsed) {
        (true, true) => "+",
        (true, false) => "-",
        (false, _) => "\u{2022}",
    }
}

fn outline_line<'a>(app: &App, row: &VisibleRow, focused: bool, width: usize) -> Line<'a> {
    let theme = &app.theme;
    let bg = if focused {
        theme.selection_bg
    } else {
        theme.background
    };
    let prefix = format!("{}{} ", "  ".repeat(row.depth), marker(row));
    let room = width.saturating_sub(unicode::display_width(&prefix));

    let mut spans = vec![Span::styled(prefix, Style::default().fg(theme.dim).bg(bg))];
    let text_style = if focused {
        Style::default().fg(theme.text_bright).bg(bg)
    } else {
        Style::default().fg(theme.text).bg(bg)
    };
    if focused && app.mode == Mode::EditText {
        spans.push(Span::styled(
            unicode::tail_to_width(&row.text, room.saturating_sub(1)),
            text_style,
        ));
        spans.push(Span::styled(CURSOR, Style::default().fg(theme.highlight).bg(bg)));
    } else {
        spans.push(Span::styled(
            unicode::truncate_to_width(&row.text, room),
            text_style,
        ));
    }
    Line::from(spans)
}

fn render_done(frame: &mut Frame, app: &App, area: Rect) {
    if area.height == 0 {
        return;
    }
    let theme = &app.theme;
    let done = &app.screen.frame.done;
    let width = area.width as usize;
    let mut lines = vec![Line::from(Span::styled(
        "Done",
        Style::default()
            .fg(theme.dim)
            .add_modifier(Modifier::BOLD),
    ))];
    let start = done.len().saturating_sub(DONE_ROWS);
    for text in &done[start..] {
        lines.push(Line::from(vec![
            Span::styled("[x] ", Style::default().fg(theme.green)),
            Span::styled(
                unicode::truncate_to_width(text, width.saturating_sub(4)),
                Style::default().fg(theme.dim),
            ),
        ]));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let Some(detail) = &app.screen.frame.detail else {
        return;
    };
    let theme = &app.theme;
    let width = area.width as usize;
    let mut note = vec![];
    if app.mode == Mode::EditNote {
        note.push(Span::styled(
            unicode::tail_to_width(&detail.note, width.saturating_sub(1)),
            Style::default().fg(theme.text_bright),
        ));
        note.push(Span::styled(CURSOR, Style::default().fg(theme.highlight)));
    } else {
        note.push(Span::styled(
            unicode::truncate_to_width(&detail.note, width),
            Style::default().fg(theme.text),
        ));
    }
    let lines = vec![
        Line::from(Span::styled(
            "Note",
            Style::default()
                .fg(theme.dim)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(note),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

/// Mode or alert on the left, session countdown on the right
fn render_status_row(frame: &mut Frame, app: &App, area: Rect, now: Instant) {
    let theme = &app.theme;
    let bg = theme.background;
    let width = area.width as usize;

    let (left, left_style) = match (&app.alerts.message, app.mode) {
        (Some(message), _) => (message.as_str(), Style::default().fg(theme.highlight).bg(bg)),
        (None, Mode::EditText) => ("EDIT", Style::default().fg(theme.text_bright).bg(bg)),
        (None, Mode::EditNote) => ("NOTE", Style::default().fg(theme.text_bright).bg(bg)),
        (None, Mode::Navigate) => ("", Style::default().bg(bg)),
    };
    let right = app
        .session
        .filter(|s| !s.is_over(now))
        .map(|s| format_remaining(s.remaining(now)))
        .unwrap_or_default();

    let right_width = unicode::display_width(&right);
    let left = unicode::truncate_to_width(left, width.saturating_sub(right_width + 1));
    let padding = width.saturating_sub(unicode::display_width(&left) + right_width);
    let line = Line::from(vec![
        Span::styled(left, left_style),
        Span::styled(" ".repeat(padding), Style::default().bg(bg)),
        Span::styled(right, Style::default().fg(theme.dim).bg(bg)),
    ]);
    frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), area);
}
