//! Rendered form of one list item.
//!
//! An item renders as a header row (depth guide plus title) followed by body
//! rows, wrapped to the viewport width. The rendered form is what the find
//! engine sees through the surface, and it is deliberately lossier than the
//! data: tool arguments collapse to a key summary, long tool output is cut to
//! a preview, and wrapping can split a term across rows. The engine's
//! reconciliation absorbs those differences.
//!
//! Text the view adds on its own (labels, guides, truncation markers) is
//! drawn but never searched, so an item never shows more matches than its
//! data holds.

use serde_json::{Map, Value};
use tfind_engine::config::ViewConfig;
use tfind_engine::extract::{event_text, event_title};
use tfind_engine::matching::TermMatcher;
use tfind_types::{
    Event, ListItem, Role, substitute_tool_call_content, tool_result_text, value_text,
};
use unicode_width::UnicodeWidthStr;

use crate::style::{Style, StyledLine, StyledSpan};
use crate::wrap::{clip, sanitize, wrap_columns, wrap_words};

const INDENT: &str = "  ";
const MAX_DEPTH_INDENT: u32 = 8;
const MARKER: &str = "▸ ";
const MIN_CONTENT_WIDTH: usize = 10;

/// How items are drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellOptions {
    pub tool_output_preview_lines: usize,
    pub expand_tool_args: bool,
}

impl Default for CellOptions {
    fn default() -> Self {
        Self::from(&ViewConfig::default())
    }
}

impl From<&ViewConfig> for CellOptions {
    fn from(config: &ViewConfig) -> Self {
        Self {
            tool_output_preview_lines: config.tool_output_preview_lines,
            expand_tool_args: config.expand_tool_args,
        }
    }
}

/// Rows of one item plus their plain text, index-aligned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedItem {
    pub lines: Vec<StyledLine>,
    pub text: Vec<String>,
    runs: Vec<SearchRun>,
}

/// Searchable text within one row.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchRun {
    line: usize,
    /// Byte offset of the run in the row.
    start: usize,
    text: String,
}

/// A match in a rendered item, as a byte range of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMatch {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl RenderedItem {
    fn new(lines: Vec<StyledLine>) -> Self {
        let text = lines.iter().map(StyledLine::text).collect();
        let mut runs: Vec<SearchRun> = Vec::new();
        for (line, row) in lines.iter().enumerate() {
            let mut offset = 0;
            for span in &row.spans {
                let start = offset;
                offset += span.text.len();
                if !span.style.is_searchable() || span.text.is_empty() {
                    continue;
                }
                match runs.last_mut() {
                    Some(run) if run.line == line && run.start + run.text.len() == start => {
                        run.text.push_str(&span.text);
                    }
                    _ => runs.push(SearchRun {
                        line,
                        start,
                        text: span.text.clone(),
                    }),
                }
            }
        }
        Self { lines, text, runs }
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }

    /// Matches in drawing order. Labels and guides never match.
    pub fn matches<'a>(&'a self, matcher: &'a TermMatcher) -> impl Iterator<Item = RowMatch> + 'a {
        self.runs.iter().flat_map(move |run| {
            matcher.spans(&run.text).map(move |span| RowMatch {
                line: run.line,
                start: run.start + span.start,
                end: run.start + span.end,
            })
        })
    }

    pub fn count(&self, matcher: &TermMatcher) -> usize {
        self.runs.iter().map(|run| matcher.count(&run.text)).sum()
    }

    /// The `n`th (1-based) match.
    pub fn locate(&self, matcher: &TermMatcher, n: usize) -> Option<RowMatch> {
        self.matches(matcher).nth(n.checked_sub(1)?)
    }
}

/// Renders `item` for a viewport `width` columns wide.
pub fn render_item(item: &ListItem, width: usize, options: &CellOptions) -> RenderedItem {
    let mut cell = CellWriter::new(item.depth, width);
    let event = &item.payload;

    if matches!(event, Event::Unknown) {
        cell.header("(unrecognized event)", Style::Label);
        return cell.finish();
    }
    cell.header(&event_title(event), header_style(event));

    match event {
        Event::Model { output, error, .. } => {
            cell.prose(&output.completion_text(), Style::Assistant);
            for call in output.tool_calls() {
                cell.raw(&call.signature(), Style::ToolArgs);
            }
            if let Some(error) = error {
                cell.prose(error, Style::Error);
            }
        }
        Event::Tool {
            arguments,
            view,
            result,
            error,
            ..
        } => {
            if !arguments.is_empty() {
                if options.expand_tool_args {
                    cell.raw(&Value::Object(arguments.clone()).to_string(), Style::ToolArgs);
                } else {
                    cell.note(args_summary(arguments));
                }
            }
            if let Some(view) = view {
                let view = substitute_tool_call_content(view, arguments);
                if let Some(title) = view.title.as_deref() {
                    cell.note(vec![StyledSpan::new(title, Style::Title)]);
                }
                cell.prose(&view.content, Style::Plain);
            }
            cell.preview(
                &tool_result_text(result),
                options.tool_output_preview_lines,
                Style::ToolOutput,
            );
            if let Some(error) = error {
                cell.prose(&error.message, Style::Error);
            }
        }
        Event::Error { error } => {
            cell.prose(&error.message, Style::Error);
            cell.raw(&error.traceback, Style::Muted);
        }
        Event::Message { message } => {
            cell.prose(&message.content.text(), role_style(message.role));
            for call in &message.tool_calls {
                cell.raw(&call.signature(), Style::ToolArgs);
            }
        }
        Event::SampleInit { sample } => {
            cell.prose(&sample.input.text(), Style::User);
            let target = value_text(&sample.target);
            if !target.trim().is_empty() {
                cell.note(vec![StyledSpan::new("target:", Style::Label)]);
                cell.prose(&target, Style::Muted);
            }
        }
        Event::Sandbox { cmd, output, .. } => {
            if let Some(cmd) = cmd {
                cell.raw(cmd, Style::ToolArgs);
            }
            if let Some(output) = output {
                cell.preview(output, options.tool_output_preview_lines, Style::ToolOutput);
            }
        }
        _ => {
            // The title was already drawn; the rest mirrors the data fields.
            for field in event_text(event).iter().skip(1) {
                cell.prose(field, Style::Plain);
            }
        }
    }
    cell.finish()
}

fn header_style(event: &Event) -> Style {
    match event {
        Event::Message { message } => role_style(message.role),
        Event::Tool { .. } | Event::Sandbox { .. } => Style::ToolTitle,
        Event::Error { .. } => Style::Error,
        Event::SpanBegin { .. } | Event::Subtask { .. } => Style::SpanTitle,
        _ => Style::Title,
    }
}

fn role_style(role: Role) -> Style {
    match role {
        Role::User => Style::User,
        Role::Assistant => Style::Assistant,
        Role::System | Role::Tool => Style::System,
    }
}

/// `args: content, path (2 keys)`. Values are not shown; only the key names
/// are searchable.
fn args_summary(arguments: &Map<String, Value>) -> Vec<StyledSpan> {
    let mut spans = vec![StyledSpan::new("args: ", Style::Label)];
    for (i, key) in arguments.keys().enumerate() {
        if i > 0 {
            spans.push(StyledSpan::new(", ", Style::Label));
        }
        spans.push(StyledSpan::new(key.as_str(), Style::ToolArgs));
    }
    let noun = if arguments.len() == 1 { "key" } else { "keys" };
    spans.push(StyledSpan::new(
        format!(" ({} {noun})", arguments.len()),
        Style::Label,
    ));
    spans
}

/// Accumulates rows for one item.
struct CellWriter {
    indent: String,
    width: usize,
    lines: Vec<StyledLine>,
}

impl CellWriter {
    fn new(depth: u32, width: usize) -> Self {
        Self {
            indent: INDENT.repeat(depth.min(MAX_DEPTH_INDENT) as usize),
            width,
            lines: Vec::new(),
        }
    }

    /// Columns left for text after the indent and marker.
    fn content_width(&self) -> usize {
        self.width
            .saturating_sub(self.indent.width() + MARKER.width())
            .max(MIN_CONTENT_WIDTH)
    }

    fn header(&mut self, title: &str, style: Style) {
        let title = sanitize(title);
        for (i, row) in wrap_words(&title, self.content_width()).into_iter().enumerate() {
            let marker = if i == 0 { MARKER } else { "  " };
            self.lines.push(StyledLine {
                spans: vec![
                    StyledSpan::new(format!("{}{marker}", self.indent), Style::Guide),
                    StyledSpan::new(row, style),
                ],
            });
        }
    }

    /// Word-wrapped paragraphs. Empty text draws nothing.
    fn prose(&mut self, text: &str, style: Style) {
        if text.trim().is_empty() {
            return;
        }
        let width = self.content_width();
        for paragraph in text.lines() {
            let paragraph = sanitize(paragraph);
            for row in wrap_words(&paragraph, width) {
                self.body_row(row, style);
            }
        }
    }

    /// Hard-wrapped lines that keep their spacing.
    fn raw(&mut self, text: &str, style: Style) {
        if text.trim().is_empty() {
            return;
        }
        let width = self.content_width();
        for line in text.lines() {
            for row in wrap_columns(&sanitize(line), width) {
                self.body_row(row, style);
            }
        }
    }

    /// A single row of spans, cut to fit. The ellipsis is not searchable.
    fn note(&mut self, spans: Vec<StyledSpan>) {
        let mut budget = self.content_width();
        let mut row = vec![StyledSpan::new(format!("{}  ", self.indent), Style::Guide)];
        for span in spans {
            let text = sanitize(&span.text);
            let width = text.width();
            if width <= budget {
                budget -= width;
                row.push(StyledSpan::new(text, span.style));
                continue;
            }
            row.push(StyledSpan::new(clip(&text, budget.saturating_sub(1)), span.style));
            row.push(StyledSpan::new("…", Style::Truncation));
            break;
        }
        self.lines.push(StyledLine { spans: row });
    }

    /// The first `limit` lines of `text`, then a count of what was left out.
    fn preview(&mut self, text: &str, limit: usize, style: Style) {
        if text.trim().is_empty() {
            return;
        }
        let lines: Vec<&str> = text.lines().collect();
        let shown = lines.len().min(limit);
        self.raw(&lines[..shown].join("\n"), style);
        let hidden = lines.len() - shown;
        if hidden > 0 {
            let noun = if hidden == 1 { "line" } else { "lines" };
            self.note(vec![StyledSpan::new(
                format!("… {hidden} more {noun}"),
                Style::Truncation,
            )]);
        }
    }

    fn body_row(&mut self, row: String, style: Style) {
        self.lines.push(StyledLine {
            spans: vec![
                StyledSpan::new(format!("{}  ", self.indent), Style::Guide),
                StyledSpan::new(row, style),
            ],
        });
    }

    fn finish(self) -> RenderedItem {
        RenderedItem::new(self.lines)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tfind_engine::matching::TermMatcher;
    use tfind_types::{ChatMessage, MessageContent, ToolCallContent, ViewFormat};

    use super::*;

    fn tool(arguments: Value, result: &str) -> Event {
        Event::Tool {
            id: "call-1".into(),
            function: "write_file".into(),
            arguments: arguments.as_object().cloned().unwrap_or_default(),
            view: None,
            result: Value::String(result.into()),
            error: None,
        }
    }

    fn rendered(event: Event, options: &CellOptions) -> RenderedItem {
        render_item(&ListItem::new("event-0", 0, event), 60, options)
    }

    fn count(item: &RenderedItem, term: &str) -> usize {
        item.count(&TermMatcher::new(term).unwrap())
    }

    #[test]
    fn test_header_is_first_row() {
        let item = rendered(
            Event::Input {
                input: "find the error".into(),
            },
            &CellOptions::default(),
        );
        assert_eq!(item.text, vec!["▸ Input", "  find the error"]);
    }

    #[test]
    fn test_depth_indents_every_row() {
        let item = render_item(
            &ListItem::new(
                "event-3",
                2,
                Event::Input {
                    input: "nested".into(),
                },
            ),
            60,
            &CellOptions::default(),
        );
        assert_eq!(item.text, vec!["    ▸ Input", "      nested"]);
    }

    #[test]
    fn test_collapsed_args_hide_values() {
        let event = tool(json!({"path": "notes.txt", "content": "error here"}), "ok");
        let item = rendered(event.clone(), &CellOptions::default());
        assert!(item.text.contains(&"  args: content, path (2 keys)".to_string()));
        assert_eq!(count(&item, "error"), 0);
        assert_eq!(count(&item, "path"), 1);
        // The data still contains it.
        let data = event_text(&event);
        assert_eq!(TermMatcher::new("error").unwrap().count_segments(&data), 1);

        let expanded = rendered(
            event,
            &CellOptions {
                expand_tool_args: true,
                ..CellOptions::default()
            },
        );
        assert_eq!(count(&expanded, "error"), 1);
    }

    #[test]
    fn test_tool_output_preview() {
        let output = "l1\nl2\nl3 error\nl4 error";
        let item = rendered(
            tool(json!({}), output),
            &CellOptions {
                tool_output_preview_lines: 2,
                expand_tool_args: false,
            },
        );
        assert_eq!(
            item.text,
            vec!["▸ Tool: write_file", "  l1", "  l2", "  … 2 more lines"]
        );
        assert_eq!(count(&item, "error"), 0);
    }

    #[test]
    fn test_labels_are_not_searchable() {
        let item = rendered(
            tool(json!({"note": "key"}), "a\nb\nc\nmore"),
            &CellOptions {
                tool_output_preview_lines: 1,
                expand_tool_args: false,
            },
        );
        assert!(item.text.contains(&"  args: note (1 key)".to_string()));
        assert!(item.text.contains(&"  … 3 more lines".to_string()));
        assert_eq!(count(&item, "args"), 0);
        assert_eq!(count(&item, "key"), 0);
        assert_eq!(count(&item, "more"), 0);
        assert_eq!(count(&item, "note"), 1);

        let found = item.locate(&TermMatcher::new("NOTE").unwrap(), 1).unwrap();
        assert_eq!(found, RowMatch { line: 1, start: 8, end: 12 });
    }

    #[test]
    fn test_cut_note_keeps_ellipsis_out_of_matches() {
        let long = "x".repeat(80);
        let mut arguments = Map::new();
        arguments.insert(long.clone(), json!(1));
        let item = rendered(
            Event::Tool {
                id: "call-3".into(),
                function: "f".into(),
                arguments,
                view: None,
                result: Value::Null,
                error: None,
            },
            &CellOptions::default(),
        );
        assert!(item.text[1].ends_with('…'));
        assert_eq!(count(&item, "…"), 0);
        assert_eq!(count(&item, "xxx"), 17);
    }

    #[test]
    fn test_sample_target_label_is_not_searchable() {
        let event: Event = serde_json::from_value(json!({
            "event": "sample_init",
            "sample": {"input": "what is the target?", "target": "42"}
        }))
        .unwrap();
        let item = rendered(event, &CellOptions::default());
        assert!(item.text.contains(&"  target:".to_string()));
        assert!(item.text.contains(&"  42".to_string()));
        assert_eq!(count(&item, "target"), 1);
    }

    #[test]
    fn test_view_content_replaces_placeholders() {
        let mut arguments = Map::new();
        arguments.insert("cmd".into(), json!("grep error log.txt"));
        let event = Event::Tool {
            id: "call-2".into(),
            function: "bash".into(),
            arguments,
            view: Some(ToolCallContent {
                title: Some("Shell".into()),
                format: ViewFormat::Text,
                content: "$ {{cmd}}".into(),
            }),
            result: Value::Null,
            error: None,
        };
        let item = rendered(event, &CellOptions::default());
        assert!(item.text.contains(&"  $ grep error log.txt".to_string()));
    }

    #[test]
    fn test_message_uses_role_title() {
        let event = Event::Message {
            message: ChatMessage {
                role: Role::Assistant,
                content: MessageContent::Text("All fixed.".into()),
                tool_calls: Vec::new(),
            },
        };
        let item = rendered(event, &CellOptions::default());
        assert_eq!(item.text, vec!["▸ Assistant", "  All fixed."]);
        assert_eq!(item.lines[0].spans[1].style, Style::Assistant);
    }

    #[test]
    fn test_wrapping_can_split_a_term() {
        let item = render_item(
            &ListItem::new(
                "event-0",
                0,
                Event::Input {
                    input: "xxxxxxxxxxxxerror".into(),
                },
            ),
            16,
            &CellOptions::default(),
        );
        // 14 content columns: the term straddles two rows.
        assert_eq!(item.text[1], "  xxxxxxxxxxxxer");
        assert_eq!(count(&item, "error"), 0);
    }

    #[test]
    fn test_unknown_event_still_renders() {
        let item = rendered(Event::Unknown, &CellOptions::default());
        assert_eq!(item.height(), 1);
    }
}
