//! Drawing: transcript rows with find highlights, and the bottom bar.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style as TermStyle};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tfind_engine::controller::FindStatus;
use tfind_engine::{HighlightKind, RenderedSpan};

use crate::find_bar::{FindBar, status_text};
use crate::style::{StyledLine, to_ratatui};
use crate::surface::ViewSurface;
use crate::view::ScreenRow;

/// Byte range of a row painted as a match.
type Mark = (usize, usize, HighlightKind);

/// What the bottom bar shows besides the find state.
#[derive(Debug, Default)]
pub struct BarInfo<'a> {
    pub notice: Option<&'a str>,
}

/// Height available to transcript rows for a terminal of `height` rows.
pub fn viewport_height(height: u16) -> usize {
    usize::from(height.saturating_sub(1))
}

pub fn render(
    frame: &mut Frame<'_>,
    surface: &ViewSurface,
    find: &FindBar,
    status: &FindStatus,
    info: &BarInfo<'_>,
) {
    let [body, bar] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    let (lines, position, following) = {
        let mut view = surface.view();
        let rows = view.screen_rows();
        let all = view.highlights(HighlightKind::All);
        let current = view.highlights(HighlightKind::Current);
        let lines: Vec<Line<'static>> = rows
            .iter()
            .map(|row| row_line(row, all, current))
            .collect();
        let window = view.visible_window();
        let total = view.transcript().len();
        let position = if window.is_empty() {
            format!("0/{total}")
        } else {
            format!("{}-{}/{total}", window.start + 1, window.end)
        };
        (lines, position, view.is_following())
    };

    frame.render_widget(Paragraph::new(lines), body);
    render_bar(frame, bar, find, status, info, &position, following);
}

fn render_bar(
    frame: &mut Frame<'_>,
    area: Rect,
    find: &FindBar,
    status: &FindStatus,
    info: &BarInfo<'_>,
    position: &str,
    following: bool,
) {
    let dim = TermStyle::default().fg(Color::DarkGray);
    let mut spans = Vec::new();
    if find.is_open() {
        spans.push(Span::styled("/", TermStyle::default().fg(Color::Yellow)));
        spans.push(Span::raw(find.query().to_string()));
        spans.push(Span::styled("▏", TermStyle::default().fg(Color::Yellow)));
    } else if let Some(term) = status.term.as_deref() {
        spans.push(Span::styled(format!("/{term}"), dim));
    } else {
        spans.push(Span::styled("/ find  q quit", dim));
    }

    let counter = status_text(status);
    if !counter.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            counter,
            TermStyle::default().add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(notice) = info.notice {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(notice.to_string(), TermStyle::default().fg(Color::Red)));
    }

    let mut right = position.to_string();
    if following {
        right.push_str("  follow");
    }
    let [left_area, right_area] = Layout::horizontal([
        Constraint::Min(1),
        Constraint::Length(u16::try_from(right.len() + 1).unwrap_or(u16::MAX)),
    ])
    .areas(area);
    frame.render_widget(Paragraph::new(Line::from(spans)), left_area);
    frame.render_widget(
        Paragraph::new(Line::styled(right, dim)).alignment(Alignment::Right),
        right_area,
    );
}

fn row_line(row: &ScreenRow, all: &[RenderedSpan], current: &[RenderedSpan]) -> Line<'static> {
    let Some(line) = row.line else {
        return Line::default();
    };
    let Some(styled) = row.item.lines.get(line) else {
        return Line::default();
    };
    let marks: Vec<Mark> = all
        .iter()
        .map(|span| (span, HighlightKind::All))
        .chain(current.iter().map(|span| (span, HighlightKind::Current)))
        .filter(|(span, _)| span.item_index == row.item_index && span.line == line)
        .map(|(span, kind)| (span.start, span.end, kind))
        .collect();
    paint(styled, &marks)
}

fn highlight_style(kind: HighlightKind) -> TermStyle {
    match kind {
        HighlightKind::All => TermStyle::default().bg(Color::Yellow).fg(Color::Black),
        HighlightKind::Current => TermStyle::default()
            .bg(Color::LightRed)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    }
}

/// The mark covering byte `at`. The current match wins over the others.
fn mark_at(marks: &[Mark], at: usize) -> Option<HighlightKind> {
    let mut found = None;
    for &(start, end, kind) in marks {
        if start <= at && at < end {
            if kind == HighlightKind::Current {
                return Some(kind);
            }
            found = Some(kind);
        }
    }
    found
}

/// Converts a row, splitting spans where marks begin and end.
fn paint(line: &StyledLine, marks: &[Mark]) -> Line<'static> {
    let mut spans = Vec::new();
    let mut offset = 0;
    for span in &line.spans {
        let base = to_ratatui(span.style);
        let len = span.text.len();
        if marks.is_empty() {
            spans.push(Span::styled(span.text.clone(), base));
            offset += len;
            continue;
        }

        let mut cuts = vec![0, len];
        for &(start, end, _) in marks {
            for bound in [start, end] {
                if bound > offset && bound < offset + len {
                    cuts.push(bound - offset);
                }
            }
        }
        cuts.retain(|&cut| span.text.is_char_boundary(cut));
        cuts.sort_unstable();
        cuts.dedup();

        for pair in cuts.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let text = &span.text[from..to];
            let style = mark_at(marks, offset + from)
                .map_or(base, |kind| base.patch(highlight_style(kind)));
            spans.push(Span::styled(text.to_string(), style));
        }
        offset += len;
    }
    Line::from(spans)
}
