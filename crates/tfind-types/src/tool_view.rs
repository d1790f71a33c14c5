//! Custom tool-call views.
//!
//! A tool may ship a view template that replaces the raw `function(args)`
//! presentation. Templates reference arguments with `{{name}}` placeholders.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Markup used by a view's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewFormat {
    #[default]
    Text,
    Markdown,
}

/// Title and content of a tool-call view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub format: ViewFormat,
    #[serde(default)]
    pub content: String,
}

impl ToolCallContent {
    /// Joins title and content the way the view is displayed.
    pub fn display_text(&self) -> String {
        match self.title.as_deref() {
            Some(title) => format!("{title}\n\n{}", self.content),
            None => self.content.clone(),
        }
    }
}

/// Returns a copy of `view` with `{{key}}` placeholders replaced by argument values.
///
/// String arguments are inserted verbatim, other values as compact JSON.
/// Placeholders naming unknown arguments are left as they are.
pub fn substitute_tool_call_content(
    view: &ToolCallContent,
    arguments: &Map<String, Value>,
) -> ToolCallContent {
    ToolCallContent {
        title: view
            .title
            .as_deref()
            .map(|title| substitute_placeholders(title, arguments)),
        format: view.format,
        content: substitute_placeholders(&view.content, arguments),
    }
}

fn substitute_placeholders(template: &str, arguments: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        let key = &after_open[..close];
        out.push_str(&rest[..open]);
        match arguments.get(key) {
            Some(Value::String(text)) => out.push_str(text),
            Some(other) => out.push_str(&other.to_string()),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &after_open[close + 2..];
    }

    out.push_str(rest);
    out
}
