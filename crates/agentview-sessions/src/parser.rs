use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use thiserror::Error;

use crate::types::{Event, EventKind, EventRecord};

/// Why a raw entry could not become an [`EventRecord`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Malformed record in {filename}: {reason}")]
    MalformedRecord { filename: String, reason: String },
}

impl RecordError {
    fn malformed(filename: &str, reason: impl Into<String>) -> Self {
        RecordError::MalformedRecord {
            filename: filename.to_string(),
            reason: reason.into(),
        }
    }
}

impl EventRecord {
    /// Decode the `content` of a log entry.
    ///
    /// The payload must name a known hook and carry a non-empty
    /// `input.sessionId`; anything else is a [`RecordError::MalformedRecord`].
    pub fn from_value(filename: &str, content: Value) -> Result<Self, RecordError> {
        let hook_name = content
            .get("hookName")
            .and_then(Value::as_str)
            .ok_or_else(|| RecordError::malformed(filename, "missing hookName"))?;

        if hook_name.parse::<EventKind>().is_err() {
            return Err(RecordError::malformed(
                filename,
                format!("unknown hookName '{}'", hook_name),
            ));
        }

        let session_id = content
            .get("input")
            .and_then(|input| input.get("sessionId"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if session_id.is_empty() {
            return Err(RecordError::malformed(filename, "missing input.sessionId"));
        }

        let event: Event = serde_json::from_value(content)
            .map_err(|e| RecordError::malformed(filename, e.to_string()))?;

        Ok(EventRecord {
            filename: filename.to_string(),
            content: event,
        })
    }

    /// Decode a `{ filename, content }` entry as served by a log server.
    pub fn from_entry(entry: Value) -> Result<Self, RecordError> {
        let Value::Object(mut fields) = entry else {
            return Err(RecordError::malformed("unknown", "entry is not an object"));
        };

        let filename = fields
            .get("filename")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let content = fields
            .remove("content")
            .ok_or_else(|| RecordError::malformed(&filename, "missing content"))?;

        Self::from_value(&filename, content)
    }
}

/// Decode entries one by one, logging and skipping the malformed ones.
pub fn decode_entries(entries: Vec<Value>) -> Vec<EventRecord> {
    entries
        .into_iter()
        .filter_map(|entry| match EventRecord::from_entry(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping log entry: {}", e);
                None
            }
        })
        .collect()
}

/// Parse one log file into event records.
///
/// A `.jsonl` file holds one event per line; any other file holds a single
/// event. Malformed events are skipped with a warning. Errors are returned
/// only when the file itself cannot be read, or a single-event file is not
/// valid JSON.
pub fn parse_log_file(path: &Path) -> Result<Vec<EventRecord>> {
    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read log file: {:?}", path))?;

    if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        return Ok(parse_event_lines(&filename, &text));
    }

    let content: Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse log file: {:?}", path))?;

    match EventRecord::from_value(&filename, content) {
        Ok(record) => Ok(vec![record]),
        Err(e) => {
            tracing::warn!("Skipping log file: {}", e);
            Ok(Vec::new())
        }
    }
}

/// Parse JSON lines, one event each. Blank lines are ignored.
pub fn parse_event_lines(filename: &str, text: &str) -> Vec<EventRecord> {
    let mut records = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let decoded = serde_json::from_str::<Value>(line)
            .map_err(|e| RecordError::malformed(filename, format!("line {}: {}", line_no + 1, e)))
            .and_then(|content| EventRecord::from_value(filename, content));

        match decoded {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Skipping log line: {}", e),
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prompt_event(session_id: &str) -> Value {
        json!({
            "hookName": "userPromptSubmitted",
            "timestamp": 1768903200000i64,
            "isoTimestamp": "2026-01-20T10:00:00.000Z",
            "context": {"cwd": "/repo", "workspaceRoot": "/repo", "pid": 42, "platform": "linux", "nodeVersion": "v22.1.0"},
            "input": {
                "timestamp": "2026-01-20T10:00:00.000Z",
                "hookEventName": "UserPromptSubmit",
                "sessionId": session_id,
                "transcript_path": "/tmp/t.json",
                "prompt": "fix the login bug",
                "cwd": "/repo"
            }
        })
    }

    #[test]
    fn test_from_value_decodes_known_kind() {
        let record = EventRecord::from_value("a.json", prompt_event("s-1")).unwrap();
        assert_eq!(record.filename, "a.json");
        assert_eq!(record.content.kind(), EventKind::UserPromptSubmitted);
        assert_eq!(record.content.session_id(), "s-1");
        assert_eq!(record.content.prompt(), Some("fix the login bug"));
        assert_eq!(record.content.context().unwrap().pid, 42);
    }

    #[test]
    fn test_from_value_rejects_missing_session_id() {
        let mut event = prompt_event("s-1");
        event["input"].as_object_mut().unwrap().remove("sessionId");
        let err = EventRecord::from_value("a.json", event).unwrap_err();
        assert_eq!(
            err,
            RecordError::MalformedRecord {
                filename: "a.json".to_string(),
                reason: "missing input.sessionId".to_string(),
            }
        );

        let empty = EventRecord::from_value("b.json", prompt_event(""));
        assert!(empty.is_err());
    }

    #[test]
    fn test_from_value_rejects_unknown_hook() {
        let mut event = prompt_event("s-1");
        event["hookName"] = json!("sessionEnd");
        let err = EventRecord::from_value("a.json", event).unwrap_err();
        assert!(err.to_string().contains("unknown hookName 'sessionEnd'"));
    }

    #[test]
    fn test_from_value_rejects_bad_timestamp_type() {
        let mut event = prompt_event("s-1");
        event["timestamp"] = json!("not a number");
        assert!(EventRecord::from_value("a.json", event).is_err());
    }

    #[test]
    fn test_from_value_accepts_float_timestamp() {
        let mut event = prompt_event("s-1");
        event["timestamp"] = json!(1768903200000.0);
        let record = EventRecord::from_value("a.json", event).unwrap();
        assert_eq!(record.content.timestamp(), 1768903200000);

        let mut event = prompt_event("s-1");
        event["timestamp"] = json!(1.7689032e12);
        let record = EventRecord::from_value("b.json", event).unwrap();
        assert_eq!(record.content.timestamp(), 1768903200000);

        let mut event = prompt_event("s-1");
        event["timestamp"] = json!(1768903200123.6);
        let record = EventRecord::from_value("c.json", event).unwrap();
        assert_eq!(record.content.timestamp(), 1768903200124);
    }

    #[test]
    fn test_float_timestamps_order_with_integer_ones() {
        let mut later = prompt_event("s-1");
        later["timestamp"] = json!(1768903200500.0);
        let entries = vec![
            json!({"filename": "later.json", "content": later}),
            json!({"filename": "earlier.json", "content": prompt_event("s-1")}),
        ];
        let sessions = crate::build_sessions(decode_entries(entries));
        let names: Vec<&str> = sessions[0]
            .events
            .iter()
            .map(|e| e.filename.as_str())
            .collect();
        assert_eq!(names, vec!["earlier.json", "later.json"]);
    }

    #[test]
    fn test_tool_input_keeps_unknown_fields() {
        let event = json!({
            "hookName": "preToolUse",
            "timestamp": 1,
            "isoTimestamp": "2026-01-20T10:00:00.001Z",
            "input": {
                "sessionId": "s-1",
                "tool_name": "run_in_terminal",
                "tool_input": {"command": "cargo test", "isBackground": false, "filePath": "/repo/src/lib.rs"},
                "tool_use_id": "tool-1"
            }
        });
        let record = EventRecord::from_value("t.json", event).unwrap();
        let crate::Event::PreToolUse(hook) = &record.content else {
            panic!("expected preToolUse");
        };
        assert_eq!(hook.input.tool_input.command.as_deref(), Some("cargo test"));
        assert_eq!(hook.input.tool_input.is_background, Some(false));
        assert_eq!(
            hook.input.tool_input.extra.get("filePath"),
            Some(&json!("/repo/src/lib.rs"))
        );
        assert!(hook.context.is_none());
    }

    #[test]
    fn test_decode_entries_skips_malformed() {
        let entries = vec![
            json!({"filename": "a.json", "content": prompt_event("s-1")}),
            json!({"filename": "b.json", "content": {"hookName": "sessionStart"}}),
            json!({"filename": "c.json"}),
            json!("not an entry"),
            json!({"filename": "d.json", "content": prompt_event("s-2")}),
        ];
        let records = decode_entries(entries);
        let names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.json", "d.json"]);
    }

    #[test]
    fn test_parse_event_lines_skips_bad_lines() {
        let text = format!(
            "{}\n\n{{not json}}\n{}\n",
            prompt_event("s-1"),
            prompt_event("s-2")
        );
        let records = parse_event_lines("log.jsonl", &text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].content.session_id(), "s-2");
    }
}
