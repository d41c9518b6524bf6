//! # agentview-sessions
//!
//! Copilot agent hook events and the sessions built from them.
//!
//! - [`EventRecord`] / [`Event`] - one logged hook event, typed by hook kind
//! - [`build_sessions`] - groups records into time-ordered [`Session`]s
//! - [`EventSource`] - where records come from ([`LogDirSource`], [`HttpEventSource`])

pub mod builder;
pub mod parser;
pub mod source;
pub mod types;

pub use builder::{build_sessions, find_session};
pub use parser::{decode_entries, parse_event_lines, parse_log_file, RecordError};
pub use source::{EventSource, HttpEventSource, LogDirSource, DEFAULT_SOURCE_URL};
pub use types::{
    parse_instant, parse_timestamp, Event, EventContext, EventKind, EventRecord, HookEvent,
    LogEntries, PostToolUseInput, PreToolUseInput, Session, SessionPrompt, SessionStartInput,
    ToolInput, UserPromptInput,
};
