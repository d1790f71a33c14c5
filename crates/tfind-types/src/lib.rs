//! Shared transcript types for tfind.
//!
//! The event model mirrors the JSON shape of evaluation transcripts: every
//! event is an object tagged by its `"event"` field.

pub mod event;
pub mod item;
pub mod message;
pub mod tool_view;

pub use event::{
    ApprovalDecision, ChangeOp, ErrorDetail, Event, JsonChange, LoggedMessage, ModelChoice,
    ModelOutput, SampleInfo, SampleInput, ScoreDetail, ToolCallError, tool_result_text,
    value_text,
};
pub use item::{ItemId, ListItem};
pub use message::{ChatMessage, ContentPart, MessageContent, Role, ToolCall};
pub use tool_view::{ToolCallContent, ViewFormat, substitute_tool_call_content};
