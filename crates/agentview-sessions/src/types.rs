use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One raw hook event as it was logged, together with the file it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub filename: String,
    pub content: Event,
}

/// A Copilot agent hook event, tagged by `hookName`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "hookName", rename_all = "camelCase")]
pub enum Event {
    SessionStart(HookEvent<SessionStartInput>),
    UserPromptSubmitted(HookEvent<UserPromptInput>),
    PreToolUse(HookEvent<PreToolUseInput>),
    PostToolUse(HookEvent<PostToolUseInput>),
}

/// Discriminant of an [`Event`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    SessionStart,
    UserPromptSubmitted,
    PreToolUse,
    PostToolUse,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::SessionStart,
        EventKind::UserPromptSubmitted,
        EventKind::PreToolUse,
        EventKind::PostToolUse,
    ];

    /// The `hookName` string used on the wire.
    pub fn hook_name(&self) -> &'static str {
        match self {
            EventKind::SessionStart => "sessionStart",
            EventKind::UserPromptSubmitted => "userPromptSubmitted",
            EventKind::PreToolUse => "preToolUse",
            EventKind::PostToolUse => "postToolUse",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hook_name())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.hook_name() == s)
            .ok_or_else(|| format!("Unknown hook name: {}", s))
    }
}

/// Fields shared by every hook event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookEvent<I> {
    /// Epoch milliseconds; used for ordering. Fractional values on the wire
    /// are rounded to the nearest millisecond.
    #[serde(deserialize_with = "epoch_millis")]
    pub timestamp: i64,
    /// The same instant as `timestamp`, used for display and date comparisons.
    pub iso_timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<EventContext>,
    pub input: I,
}

/// Accept epoch milliseconds written as an integer or as a float
/// (`1768903200000.0`, `1.7689032e12`).
fn epoch_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Int(i64),
        Float(f64),
    }

    match Millis::deserialize(deserializer)? {
        Millis::Int(ms) => Ok(ms),
        Millis::Float(ms) if ms.is_finite() && ms.abs() < i64::MAX as f64 => Ok(ms.round() as i64),
        Millis::Float(ms) => Err(serde::de::Error::custom(format!(
            "timestamp {} is not a valid epoch millisecond value",
            ms
        ))),
    }
}

/// Process context the hook ran in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventContext {
    pub cwd: String,
    pub workspace_root: String,
    pub pid: u32,
    pub platform: String,
    pub node_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStartInput {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, rename = "hookEventName")]
    pub hook_event_name: String,
    #[serde(default)]
    pub transcript_path: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub cwd: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPromptInput {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, rename = "hookEventName")]
    pub hook_event_name: String,
    #[serde(default)]
    pub transcript_path: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub cwd: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreToolUseInput {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, rename = "hookEventName")]
    pub hook_event_name: String,
    #[serde(default)]
    pub transcript_path: String,
    #[serde(default)]
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: ToolInput,
    #[serde(default)]
    pub tool_use_id: String,
    #[serde(default)]
    pub cwd: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostToolUseInput {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, rename = "hookEventName")]
    pub hook_event_name: String,
    #[serde(default)]
    pub transcript_path: String,
    #[serde(default)]
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: ToolInput,
    #[serde(default)]
    pub tool_response: String,
    #[serde(default)]
    pub tool_use_id: String,
    #[serde(default)]
    pub cwd: String,
}

/// Tool arguments. The common `run_in_terminal` fields are typed; anything
/// else a tool sends is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_background: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::SessionStart(_) => EventKind::SessionStart,
            Event::UserPromptSubmitted(_) => EventKind::UserPromptSubmitted,
            Event::PreToolUse(_) => EventKind::PreToolUse,
            Event::PostToolUse(_) => EventKind::PostToolUse,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            Event::SessionStart(e) => e.timestamp,
            Event::UserPromptSubmitted(e) => e.timestamp,
            Event::PreToolUse(e) => e.timestamp,
            Event::PostToolUse(e) => e.timestamp,
        }
    }

    pub fn iso_timestamp(&self) -> &str {
        match self {
            Event::SessionStart(e) => &e.iso_timestamp,
            Event::UserPromptSubmitted(e) => &e.iso_timestamp,
            Event::PreToolUse(e) => &e.iso_timestamp,
            Event::PostToolUse(e) => &e.iso_timestamp,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Event::SessionStart(e) => &e.input.session_id,
            Event::UserPromptSubmitted(e) => &e.input.session_id,
            Event::PreToolUse(e) => &e.input.session_id,
            Event::PostToolUse(e) => &e.input.session_id,
        }
    }

    pub fn context(&self) -> Option<&EventContext> {
        match self {
            Event::SessionStart(e) => e.context.as_ref(),
            Event::UserPromptSubmitted(e) => e.context.as_ref(),
            Event::PreToolUse(e) => e.context.as_ref(),
            Event::PostToolUse(e) => e.context.as_ref(),
        }
    }

    /// The submitted prompt, for `userPromptSubmitted` events.
    pub fn prompt(&self) -> Option<&str> {
        match self {
            Event::UserPromptSubmitted(e) => Some(&e.input.prompt),
            _ => None,
        }
    }

    /// The invoked tool, for pre/post tool-use events.
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Event::PreToolUse(e) => Some(&e.input.tool_name),
            Event::PostToolUse(e) => Some(&e.input.tool_name),
            _ => None,
        }
    }
}

/// A group of events sharing a session id, oldest event first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    /// `isoTimestamp` of the earliest event, or empty when there are no events.
    pub start_time: String,
    pub events: Vec<EventRecord>,
}

/// A prompt submitted during a session, numbered in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPrompt {
    pub index: usize,
    pub text: String,
}

impl Session {
    /// Parsed `start_time`; `None` when empty or unparsable.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.start_time)
    }

    /// The part of the session id before the first `-`.
    pub fn short_id(&self) -> &str {
        self.session_id
            .split('-')
            .next()
            .unwrap_or(&self.session_id)
    }

    /// User prompts in the order they were submitted.
    pub fn prompts(&self) -> Vec<SessionPrompt> {
        self.events
            .iter()
            .filter_map(|e| e.content.prompt())
            .enumerate()
            .map(|(index, text)| SessionPrompt {
                index,
                text: text.to_string(),
            })
            .collect()
    }

    pub fn count_of(&self, kind: EventKind) -> usize {
        self.events
            .iter()
            .filter(|e| e.content.kind() == kind)
            .count()
    }
}

/// Parse an ISO-8601 timestamp leniently.
///
/// Accepts everything [`parse_instant`] does, plus a bare date (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    parse_instant(s).or_else(|| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
    })
}

/// Parse a full instant: RFC 3339, or a naive `YYYY-MM-DDTHH:MM[:SS[.f]]`
/// date-time taken as UTC. Bare dates are not instants and return `None`.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|naive| naive.and_utc())
}

/// Envelope returned by a log server's `get_all_log_entries` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntries<T = EventRecord> {
    pub success: bool,
    pub count: usize,
    pub entries: Vec<T>,
}

impl<T> LogEntries<T> {
    pub fn new(entries: Vec<T>) -> Self {
        Self {
            success: true,
            count: entries.len(),
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2026-01-20T10:00:00.123Z").unwrap();
        assert_eq!(rfc.timestamp_millis(), 1768903200123);

        let offset = parse_timestamp("2026-01-20T12:00:00+02:00").unwrap();
        assert_eq!(offset, parse_timestamp("2026-01-20T10:00:00Z").unwrap());

        let naive = parse_timestamp("2026-01-20T10:00:00").unwrap();
        assert_eq!(naive, parse_timestamp("2026-01-20T10:00:00Z").unwrap());

        let date = parse_timestamp("2026-01-20").unwrap();
        assert_eq!(date, parse_timestamp("2026-01-20T00:00:00Z").unwrap());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2026-13-45").is_none());
    }

    #[test]
    fn test_parse_instant_needs_a_time() {
        let minutes = parse_instant("2026-01-20T10:30").unwrap();
        assert_eq!(minutes, parse_timestamp("2026-01-20T10:30:00Z").unwrap());

        assert!(parse_instant("2026-01-20").is_none());
        assert!(parse_timestamp("2026-01-20").is_some());
        assert!(parse_instant(" ").is_none());
    }

    #[test]
    fn test_event_kind_from_str() {
        for kind in EventKind::ALL {
            let parsed: EventKind = kind.hook_name().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("sessionEnd".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_short_id() {
        let session = Session {
            session_id: "3f2a9c1e-77aa-4b1d".to_string(),
            start_time: String::new(),
            events: Vec::new(),
        };
        assert_eq!(session.short_id(), "3f2a9c1e");
        assert!(session.started_at().is_none());
    }
}
