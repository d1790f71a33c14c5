//! Transcript event payloads.
//!
//! Events are decoded from objects tagged by their `"event"` field. Unknown
//! tags decode to [`Event::Unknown`] so a newer transcript never fails to load.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::{ChatMessage, ToolCall};
use crate::tool_view::ToolCallContent;

/// Output of a model call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ModelChoice>,
}

/// One candidate completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelChoice {
    pub message: ChatMessage,
}

impl ModelOutput {
    /// Completion text: the explicit `completion` field, else the first choice's text.
    pub fn completion_text(&self) -> String {
        if let Some(completion) = self.completion.as_deref()
            && !completion.is_empty()
        {
            return completion.to_string();
        }
        self.choices
            .first()
            .map(|choice| choice.message.content.text())
            .unwrap_or_default()
    }

    /// Tool calls requested by the first choice.
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.choices
            .first()
            .map_or(&[], |choice| choice.message.tool_calls.as_slice())
    }
}

/// Error reported by a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallError {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

/// Runtime error attached to an error event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub traceback: String,
}

/// A log record captured during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedMessage {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub message: String,
}

/// Outcome of a tool-call approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    Approve,
    Modify,
    Reject,
    Escalate,
    Terminate,
    #[serde(other)]
    Other,
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalDecision::Approve => write!(f, "approve"),
            ApprovalDecision::Modify => write!(f, "modify"),
            ApprovalDecision::Reject => write!(f, "reject"),
            ApprovalDecision::Escalate => write!(f, "escalate"),
            ApprovalDecision::Terminate => write!(f, "terminate"),
            ApprovalDecision::Other => write!(f, "other"),
        }
    }
}

/// JSON-patch operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeOp::Add => "add",
            ChangeOp::Remove => "remove",
            ChangeOp::Replace => "replace",
            ChangeOp::Move => "move",
            ChangeOp::Copy => "copy",
            ChangeOp::Test => "test",
        };
        f.write_str(name)
    }
}

/// One change applied to state or store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonChange {
    pub op: ChangeOp,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub value: Value,
}

/// A score assigned to the sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetail {
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Sample input: a prompt string or a list of messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleInput {
    Text(String),
    Messages(Vec<ChatMessage>),
}

impl Default for SampleInput {
    fn default() -> Self {
        SampleInput::Text(String::new())
    }
}

impl SampleInput {
    /// Flattens the input to text.
    pub fn text(&self) -> String {
        match self {
            SampleInput::Text(text) => text.clone(),
            SampleInput::Messages(messages) => messages
                .iter()
                .map(|message| message.content.text())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Sample metadata recorded at the start of a transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleInfo {
    #[serde(default)]
    pub input: SampleInput,
    #[serde(default)]
    pub target: Value,
}

/// A transcript event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    SampleInit {
        #[serde(default)]
        sample: SampleInfo,
    },
    Model {
        #[serde(default)]
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        input: Vec<ChatMessage>,
        #[serde(default)]
        output: ModelOutput,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Tool {
        #[serde(default)]
        id: String,
        function: String,
        #[serde(default)]
        arguments: Map<String, Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        view: Option<ToolCallContent>,
        #[serde(default)]
        result: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<ToolCallError>,
    },
    Error {
        error: ErrorDetail,
    },
    Info {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        #[serde(default)]
        data: Value,
    },
    Logger {
        message: LoggedMessage,
    },
    Input {
        #[serde(default)]
        input: String,
    },
    Approval {
        #[serde(default)]
        message: String,
        decision: ApprovalDecision,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
    Score {
        #[serde(default)]
        score: ScoreDetail,
    },
    State {
        #[serde(default)]
        changes: Vec<JsonChange>,
    },
    Store {
        #[serde(default)]
        changes: Vec<JsonChange>,
    },
    SpanBegin {
        id: String,
        #[serde(default)]
        name: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        span_type: Option<String>,
    },
    SpanEnd {
        id: String,
    },
    Subtask {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
        #[serde(default)]
        result: Value,
    },
    Sandbox {
        #[serde(default)]
        action: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cmd: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
    Message {
        message: ChatMessage,
    },
    #[serde(other)]
    Unknown,
}

impl Event {
    /// Wire name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::SampleInit { .. } => "sample_init",
            Event::Model { .. } => "model",
            Event::Tool { .. } => "tool",
            Event::Error { .. } => "error",
            Event::Info { .. } => "info",
            Event::Logger { .. } => "logger",
            Event::Input { .. } => "input",
            Event::Approval { .. } => "approval",
            Event::Score { .. } => "score",
            Event::State { .. } => "state",
            Event::Store { .. } => "store",
            Event::SpanBegin { .. } => "span_begin",
            Event::SpanEnd { .. } => "span_end",
            Event::Subtask { .. } => "subtask",
            Event::Sandbox { .. } => "sandbox",
            Event::Message { .. } => "message",
            Event::Unknown => "unknown",
        }
    }
}

/// Renders a JSON value as text: strings verbatim, everything else compact.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Renders a tool result as text.
///
/// Results are either a string or a list of content parts; text parts are
/// joined with newlines, other shapes fall back to compact JSON.
pub fn tool_result_text(result: &Value) -> String {
    match result {
        Value::Array(parts) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            if texts.is_empty() && !parts.is_empty() {
                result.to_string()
            } else {
                texts.join("\n")
            }
        }
        other => value_text(other),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_tool_event() {
        let event: Event = serde_json::from_value(json!({
            "event": "tool",
            "id": "call-1",
            "function": "bash",
            "arguments": {"cmd": "grep error log.txt"},
            "result": "no error here",
            "error": {"type": "timeout", "message": "command timed out"},
            "timestamp": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        let Event::Tool {
            function,
            arguments,
            error,
            ..
        } = &event
        else {
            panic!("expected tool event, got {event:?}");
        };
        assert_eq!(function, "bash");
        assert_eq!(arguments["cmd"], "grep error log.txt");
        assert_eq!(error.as_ref().unwrap().kind, "timeout");
        assert_eq!(event.kind(), "tool");
    }

    #[test]
    fn test_unknown_tag_decodes_to_unknown() {
        let event: Event =
            serde_json::from_value(json!({"event": "compaction", "tokens": 12})).unwrap();
        assert_eq!(event, Event::Unknown);
    }

    #[test]
    fn test_span_begin_type_field() {
        let event: Event = serde_json::from_value(json!({
            "event": "span_begin",
            "id": "s1",
            "name": "react",
            "type": "agent"
        }))
        .unwrap();
        assert_eq!(
            event,
            Event::SpanBegin {
                id: "s1".into(),
                name: "react".into(),
                span_type: Some("agent".into()),
            }
        );
    }

    #[test]
    fn test_model_completion_falls_back_to_choice() {
        let event: Event = serde_json::from_value(json!({
            "event": "model",
            "model": "m",
            "output": {
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "the answer",
                        "tool_calls": [{"id": "t", "function": "submit", "arguments": {}}]
                    }
                }]
            }
        }))
        .unwrap();
        let Event::Model { output, .. } = event else {
            panic!("expected model event");
        };
        assert_eq!(output.completion_text(), "the answer");
        assert_eq!(output.tool_calls().len(), 1);
    }

    #[test]
    fn test_tool_result_text_shapes() {
        assert_eq!(tool_result_text(&json!("plain")), "plain");
        assert_eq!(
            tool_result_text(&json!([{"type": "text", "text": "a"}, {"type": "text", "text": "b"}])),
            "a\nb"
        );
        assert_eq!(tool_result_text(&json!({"ok": true})), r#"{"ok":true}"#);
        assert_eq!(tool_result_text(&Value::Null), "");
    }

    #[test]
    fn test_sample_input_messages_flatten() {
        let sample: SampleInfo = serde_json::from_value(json!({
            "input": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "what failed?"}
            ],
            "target": "nothing"
        }))
        .unwrap();
        assert_eq!(sample.input.text(), "be brief\nwhat failed?");
    }
}
