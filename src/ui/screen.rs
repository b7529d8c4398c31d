//! The single status screen.

use ratatui::{
    Frame,
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

use crate::registry::RosterSnapshot;
use crate::sink::SinkState;
use crate::ui::wrap::wrap_by_width;

/// Column where values start; the row labels occupy everything before it.
const VALUE_COLUMN: usize = 10;

const TITLE: &str = "MPRIS To Text";
const FOOTER: &str = "Enter number to select player or q to exit.";

pub fn render(frame: &mut Frame, roster: &RosterSnapshot, output: &SinkState, path: &str) {
    let lines = build_lines(roster, output, path, frame.area().width);
    frame.render_widget(Paragraph::new(lines), frame.area());
}

/// Parting frame drawn once the loops have stopped.
pub fn render_exit(frame: &mut Frame) {
    frame.render_widget(Paragraph::new("Exiting..."), frame.area());
}

fn build_lines(
    roster: &RosterSnapshot,
    output: &SinkState,
    path: &str,
    width: u16,
) -> Vec<Line<'static>> {
    let mut lines = vec![header_line(width), Line::default()];

    // One row per player, sharing the label column. An empty roster still
    // shows the bare label.
    if roster.players.is_empty() {
        lines.push(Line::from(label("  Player: ")));
    }
    for (index, player) in roster.players.iter().enumerate() {
        let entry = format!("{index}: {}", player.display_name);
        let style = if roster.is_active(&player.bus_name) {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            row_prefix(index == 0, "  Player: "),
            Span::styled(entry, style),
        ]));
    }

    lines.push(Line::from(vec![
        label("  File:   "),
        Span::raw(path.to_string()),
    ]));

    let wrap_width = (width as usize).saturating_sub(VALUE_COLUMN);
    let wrapped = wrap_by_width(&output.last_written, wrap_width);
    if wrapped.is_empty() {
        lines.push(Line::from(label("  Output: ")));
    }
    for (index, piece) in wrapped.into_iter().enumerate() {
        lines.push(Line::from(vec![
            row_prefix(index == 0, "  Output: "),
            Span::raw(piece),
        ]));
    }

    if let Some(error) = &output.last_error {
        lines.push(Line::from(vec![
            label("  Error:  "),
            Span::styled(error.clone(), Style::default().fg(Color::Red)),
        ]));
    }

    lines.push(Line::default());
    lines.push(Line::from(FOOTER));
    lines
}

fn header_line(width: u16) -> Line<'static> {
    let pad = (width as usize).saturating_sub(TITLE.width());
    let text = format!("{TITLE}{}", " ".repeat(pad));
    Line::from(Span::styled(
        text,
        Style::default().fg(Color::White).bg(Color::DarkGray).bold(),
    ))
}

fn label(text: &str) -> Span<'static> {
    Span::styled(text.to_string(), Style::default().bold())
}

/// First row of a block carries its label, the rest stay in column.
fn row_prefix(first: bool, text: &str) -> Span<'static> {
    if first {
        label(text)
    } else {
        Span::raw(" ".repeat(VALUE_COLUMN))
    }
}
