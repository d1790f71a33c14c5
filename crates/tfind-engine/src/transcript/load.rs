//! Transcript file loading.
//!
//! Accepted shapes, tried in order: an object with an `events` array, an
//! evaluation log with `samples[0].events`, a bare array of events, and JSON
//! Lines. Events are decoded one by one; an event that fails to decode is kept
//! as [`Event::Unknown`] so a single bad record never hides the rest.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tfind_types::Event;
use tracing::{info, warn};

use super::{SourceEvent, Transcript};

/// Loads a transcript file.
pub fn load_file(path: &Path) -> Result<Transcript> {
    let events = read_events(path)?;
    let transcript = Transcript::from_events(events);
    info!(
        path = %path.display(),
        items = transcript.len(),
        "loaded transcript"
    );
    Ok(transcript)
}

/// Reads and decodes every event in `path`.
pub fn read_events(path: &Path) -> Result<Vec<SourceEvent>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript {}", path.display()))?;
    parse_events(&raw).with_context(|| format!("Failed to parse transcript {}", path.display()))
}

/// Decodes events from transcript text in any accepted shape.
pub fn parse_events(raw: &str) -> Result<Vec<SourceEvent>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(events) = event_array(&value) {
            return Ok(decode_all(events));
        }
        if value.get("event").is_some() {
            return Ok(vec![decode_event(value, 0)]);
        }
        bail!("JSON document has no events array");
    }

    parse_json_lines(trimmed)
}

fn event_array(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(events) => Some(events),
        Value::Object(map) => map
            .get("events")
            .and_then(Value::as_array)
            .or_else(|| {
                map.get("samples")
                    .and_then(Value::as_array)
                    .and_then(|samples| samples.first())
                    .and_then(|sample| sample.get("events"))
                    .and_then(Value::as_array)
            }),
        _ => None,
    }
}

fn decode_all(events: &[Value]) -> Vec<SourceEvent> {
    events
        .iter()
        .enumerate()
        .map(|(position, value)| decode_event(value.clone(), position))
        .collect()
}

fn parse_json_lines(raw: &str) -> Result<Vec<SourceEvent>> {
    let mut events = Vec::new();
    let mut bad_lines = 0usize;
    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => {
                let position = events.len();
                events.push(decode_event(value, position));
            }
            Err(err) => {
                bad_lines += 1;
                warn!(line = line_no + 1, error = %err, "skipping malformed transcript line");
            }
        }
    }
    if events.is_empty() && bad_lines > 0 {
        bail!("no decodable events ({bad_lines} malformed lines)");
    }
    Ok(events)
}

/// Decodes one event object. Never fails.
pub fn decode_event(value: Value, position: usize) -> SourceEvent {
    let uuid = value
        .get("uuid")
        .and_then(Value::as_str)
        .filter(|uuid| !uuid.is_empty())
        .map(str::to_string);
    let timestamp = value
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc));
    let kind = value
        .get("event")
        .and_then(Value::as_str)
        .unwrap_or("<missing>")
        .to_string();

    let event = match serde_json::from_value::<Event>(value) {
        Ok(event) => event,
        Err(err) => {
            warn!(position, kind = %kind, error = %err, "undecodable event kept as unknown");
            Event::Unknown
        }
    };

    SourceEvent {
        uuid,
        timestamp,
        event,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    const EVENTS: &str = r#"[
        {"event": "input", "input": "first", "uuid": "u1"},
        {"event": "span_begin", "id": "s", "name": "solver"},
        {"event": "input", "input": "nested", "timestamp": "2024-05-01T10:00:00Z"},
        {"event": "span_end", "id": "s"}
    ]"#;

    #[test]
    fn test_parse_bare_array() {
        let events = parse_events(EVENTS).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].uuid.as_deref(), Some("u1"));
        assert!(events[2].timestamp.is_some());
    }

    #[test]
    fn test_parse_events_object() {
        let raw = format!(r#"{{"version": 2, "events": {EVENTS}}}"#);
        assert_eq!(parse_events(&raw).unwrap().len(), 4);
    }

    #[test]
    fn test_parse_eval_log_first_sample() {
        let raw = format!(r#"{{"eval": {{}}, "samples": [{{"id": 1, "events": {EVENTS}}}]}}"#);
        assert_eq!(parse_events(&raw).unwrap().len(), 4);
    }

    #[test]
    fn test_parse_json_lines() {
        let raw = "{\"event\": \"input\", \"input\": \"a\"}\n\n{\"event\": \"input\", \"input\": \"b\"}\n";
        let events = parse_events(raw).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_json_lines_skip_malformed_line() {
        let raw = "{\"event\": \"input\", \"input\": \"a\"}\nnot json\n{\"event\": \"input\", \"input\": \"b\"}";
        assert_eq!(parse_events(raw).unwrap().len(), 2);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(parse_events("not a transcript").is_err());
        assert!(parse_events(r#"{"hello": "world"}"#).is_err());
    }

    #[test]
    fn test_malformed_known_event_becomes_unknown() {
        let source = decode_event(json!({"event": "logger", "message": 42}), 0);
        assert_eq!(source.event, Event::Unknown);
    }

    #[test]
    fn test_load_file_builds_items() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EVENTS.as_bytes()).unwrap();

        let transcript = load_file(file.path()).unwrap();
        // span_end produces no item
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.get(2).unwrap().item().depth, 1);
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = load_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read transcript"));
    }
}
