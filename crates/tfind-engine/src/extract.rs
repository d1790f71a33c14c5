//! Searchable text of a list item.
//!
//! Every item maps to an ordered list of strings: a title first, then the
//! kind-specific fields in the order the item renders them. The order defines
//! how occurrences inside one item are numbered.

use serde_json::Value;
use tfind_types::{Event, ListItem, substitute_tool_call_content, tool_result_text, value_text};

/// Stable title for an event, used for display and searched like any other field.
pub fn event_title(event: &Event) -> String {
    match event {
        Event::SampleInit { .. } => "Sample Init".to_string(),
        Event::Model { model, .. } => format!("Model Call: {model}"),
        Event::Tool { function, .. } => format!("Tool: {function}"),
        Event::Error { .. } => "Error".to_string(),
        Event::Info { source, .. } => match source.as_deref() {
            Some(source) if !source.is_empty() => format!("Info: {source}"),
            _ => "Info".to_string(),
        },
        Event::Logger { message } => format!("Logger: {}", message.level),
        Event::Input { .. } => "Input".to_string(),
        Event::Approval { decision, .. } => format!("Approval: {decision}"),
        Event::Score { .. } => "Score".to_string(),
        Event::State { .. } => "State Changes".to_string(),
        Event::Store { .. } => "Store Changes".to_string(),
        Event::SpanBegin {
            name, span_type, ..
        } => match span_type.as_deref() {
            Some(kind) if !kind.is_empty() => format!("{kind}: {name}"),
            _ => name.clone(),
        },
        Event::Subtask { name, .. } => format!("Subtask: {name}"),
        Event::Sandbox { action, .. } => format!("Sandbox: {action}"),
        Event::Message { message } => message.role.label().to_string(),
        Event::SpanEnd { .. } | Event::Unknown => String::new(),
    }
}

/// Ordered searchable strings of `item`. Never fails; unknown payloads yield an empty list.
pub fn searchable_text(item: &ListItem) -> Vec<String> {
    event_text(&item.payload)
}

/// Ordered searchable strings of an event payload.
pub fn event_text(event: &Event) -> Vec<String> {
    let mut out = Fields::default();
    if matches!(event, Event::SpanEnd { .. } | Event::Unknown) {
        return out.0;
    }
    out.push(event_title(event));

    match event {
        Event::SampleInit { sample } => {
            out.push(sample.input.text());
            out.push(value_text(&sample.target));
        }
        Event::Model { output, error, .. } => {
            out.push(output.completion_text());
            for call in output.tool_calls() {
                out.push(call.signature());
            }
            out.push_opt(error.as_deref());
        }
        Event::Tool {
            arguments,
            view,
            result,
            error,
            ..
        } => {
            if !arguments.is_empty() {
                out.push(Value::Object(arguments.clone()).to_string());
            }
            if let Some(view) = view {
                let view = substitute_tool_call_content(view, arguments);
                out.push_opt(view.title.as_deref());
                out.push(view.content);
            }
            out.push(tool_result_text(result));
            if let Some(error) = error {
                out.push(error.message.clone());
            }
        }
        Event::Error { error } => {
            out.push(error.message.clone());
            out.push(error.traceback.clone());
        }
        Event::Info { data, .. } => out.push(value_text(data)),
        Event::Logger { message } => out.push(message.message.clone()),
        Event::Input { input } => out.push(input.clone()),
        Event::Approval {
            message,
            explanation,
            ..
        } => {
            out.push(message.clone());
            out.push_opt(explanation.as_deref());
        }
        Event::Score { score } => {
            out.push(value_text(&score.value));
            out.push_opt(score.answer.as_deref());
            out.push_opt(score.explanation.as_deref());
        }
        Event::State { changes } | Event::Store { changes } => {
            for change in changes {
                let value = value_text(&change.value);
                let line = if value.is_empty() {
                    format!("{} {}", change.op, change.path)
                } else {
                    format!("{} {} {value}", change.op, change.path)
                };
                out.push(line);
            }
        }
        Event::Subtask { input, result, .. } => {
            out.push(value_text(input));
            out.push(value_text(result));
        }
        Event::Sandbox { cmd, output, .. } => {
            out.push_opt(cmd.as_deref());
            out.push_opt(output.as_deref());
        }
        Event::Message { message } => {
            out.push(message.content.text());
            for call in &message.tool_calls {
                out.push(call.signature());
            }
        }
        Event::SpanBegin { .. } | Event::SpanEnd { .. } | Event::Unknown => {}
    }
    out.0
}

#[derive(Default)]
struct Fields(Vec<String>);

impl Fields {
    fn push(&mut self, text: String) {
        if !text.is_empty() {
            self.0.push(text);
        }
    }

    fn push_opt(&mut self, text: Option<&str>) {
        if let Some(text) = text {
            self.push(text.to_string());
        }
    }
}
