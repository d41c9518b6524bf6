use std::collections::HashSet;
use std::fs;

use agentview_sessions::{
    build_sessions, parse_log_file, Event, EventKind, EventRecord, EventSource, HookEvent,
    LogDirSource, PreToolUseInput, Session, UserPromptInput,
};
use tempfile::TempDir;

fn hook(session_id: &str, hook_name: &str, timestamp: i64, iso: &str, extra: &str) -> String {
    format!(
        r#"{{"hookName":"{hook_name}","timestamp":{timestamp},"isoTimestamp":"{iso}","context":{{"cwd":"/home/user/project","workspaceRoot":"/home/user/project","pid":4242,"platform":"darwin","nodeVersion":"v22.0.0"}},"input":{{"timestamp":"{iso}","sessionId":"{session_id}","transcript_path":"/tmp/transcript.json","cwd":"/home/user/project"{extra}}}}}"#
    )
}

/// Helper: create a temp directory with hook event log files.
fn create_test_logs_dir() -> TempDir {
    let dir = TempDir::new().unwrap();

    // Session alpha: start, prompt, tool use pair (files written out of order)
    fs::write(
        dir.path().join("0003_alpha_pre.json"),
        hook(
            "alpha-1111-2222",
            "preToolUse",
            1768903260000,
            "2026-01-20T10:01:00.000Z",
            r#","hookEventName":"PreToolUse","tool_name":"run_in_terminal","tool_input":{"command":"cargo test","isBackground":false},"tool_use_id":"tu-1""#,
        ),
    )
    .unwrap();
    fs::write(
        dir.path().join("0001_alpha_start.json"),
        hook(
            "alpha-1111-2222",
            "sessionStart",
            1768903200000,
            "2026-01-20T10:00:00.000Z",
            r#","hookEventName":"SessionStart","source":"new""#,
        ),
    )
    .unwrap();
    fs::write(
        dir.path().join("0002_alpha_prompt.json"),
        hook(
            "alpha-1111-2222",
            "userPromptSubmitted",
            1768903230000,
            "2026-01-20T10:00:30.000Z",
            r#","hookEventName":"UserPromptSubmit","prompt":"fix the auth bug in login flow""#,
        ),
    )
    .unwrap();
    fs::write(
        dir.path().join("0004_alpha_post.json"),
        hook(
            "alpha-1111-2222",
            "postToolUse",
            1768903290000,
            "2026-01-20T10:01:30.000Z",
            r#","hookEventName":"PostToolUse","tool_name":"run_in_terminal","tool_input":{"command":"cargo test"},"tool_response":"test result: ok","tool_use_id":"tu-1""#,
        ),
    )
    .unwrap();

    // Session beta: a JSONL file with two prompts, one day later
    let beta = [
        hook(
            "beta-3333",
            "sessionStart",
            1768989600000,
            "2026-01-21T10:00:00.000Z",
            r#","source":"resume""#,
        ),
        hook(
            "beta-3333",
            "userPromptSubmitted",
            1768989660000,
            "2026-01-21T10:01:00.000Z",
            r#","prompt":"add metrics dashboard""#,
        ),
        hook(
            "beta-3333",
            "userPromptSubmitted",
            1768989720000,
            "2026-01-21T10:02:00.000Z",
            r#","prompt":"now add charts""#,
        ),
    ]
    .join("\n");
    fs::write(dir.path().join("beta.jsonl"), beta).unwrap();

    // Malformed: no sessionId, unknown hook, invalid JSON
    fs::write(
        dir.path().join("0005_bad_no_session.json"),
        r#"{"hookName":"sessionStart","timestamp":1,"isoTimestamp":"2026-01-20T10:00:00Z","input":{"source":"new"}}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("0006_bad_hook.json"),
        r#"{"hookName":"sessionEnd","timestamp":1,"isoTimestamp":"2026-01-20T10:00:00Z","input":{"sessionId":"alpha-1111-2222"}}"#,
    )
    .unwrap();
    fs::write(dir.path().join("0007_truncated.json"), r#"{"hookName":"#).unwrap();

    // Ignored: not a log extension
    fs::write(dir.path().join("notes.txt"), "hello").unwrap();

    dir
}

fn prompt_record(filename: &str, session_id: &str, timestamp: i64, iso: &str) -> EventRecord {
    EventRecord {
        filename: filename.to_string(),
        content: Event::UserPromptSubmitted(HookEvent {
            timestamp,
            iso_timestamp: iso.to_string(),
            context: None,
            input: UserPromptInput {
                session_id: session_id.to_string(),
                timestamp: iso.to_string(),
                hook_event_name: "UserPromptSubmit".to_string(),
                transcript_path: String::new(),
                prompt: format!("prompt from {}", filename),
                cwd: String::new(),
            },
        }),
    }
}

fn tool_record(filename: &str, session_id: &str, timestamp: i64, iso: &str) -> EventRecord {
    EventRecord {
        filename: filename.to_string(),
        content: Event::PreToolUse(HookEvent {
            timestamp,
            iso_timestamp: iso.to_string(),
            context: None,
            input: PreToolUseInput {
                session_id: session_id.to_string(),
                timestamp: iso.to_string(),
                hook_event_name: "PreToolUse".to_string(),
                transcript_path: String::new(),
                tool_name: "read_file".to_string(),
                tool_input: Default::default(),
                tool_use_id: format!("tool-{}", filename),
                cwd: String::new(),
            },
        }),
    }
}

fn timestamps(session: &Session) -> Vec<i64> {
    session.events.iter().map(|e| e.content.timestamp()).collect()
}

// ============================================================
// Loading tests
// ============================================================

#[test]
fn test_load_skips_malformed_and_foreign_files() {
    let dir = create_test_logs_dir();
    let source = LogDirSource::with_dir(dir.path().to_path_buf());

    let records = source.load().unwrap();

    // 4 alpha files + 3 beta lines; the 3 malformed files and notes.txt are skipped
    assert_eq!(records.len(), 7);
    assert!(records
        .iter()
        .all(|r| !r.filename.starts_with("0005") && !r.filename.starts_with("0006")));
}

#[test]
fn test_load_reads_files_in_name_order() {
    let dir = create_test_logs_dir();
    let source = LogDirSource::with_dir(dir.path().to_path_buf());

    let records = source.load().unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();

    assert_eq!(
        names,
        vec![
            "0001_alpha_start.json",
            "0002_alpha_prompt.json",
            "0003_alpha_pre.json",
            "0004_alpha_post.json",
            "beta.jsonl",
            "beta.jsonl",
            "beta.jsonl",
        ]
    );
}

#[test]
fn test_parse_log_file_invalid_json_is_error() {
    let dir = create_test_logs_dir();
    let result = parse_log_file(&dir.path().join("0007_truncated.json"));
    assert!(result.is_err());
}

#[test]
fn test_parse_log_file_malformed_event_is_skipped() {
    let dir = create_test_logs_dir();
    let records = parse_log_file(&dir.path().join("0005_bad_no_session.json")).unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_load_empty_dir() {
    let dir = TempDir::new().unwrap();
    let source = LogDirSource::with_dir(dir.path().to_path_buf());
    assert!(source.load().unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_all_matches_load() {
    let dir = create_test_logs_dir();
    let source = LogDirSource::with_dir(dir.path().to_path_buf());

    let fetched = source.fetch_all().await.unwrap();
    assert_eq!(fetched, source.load().unwrap());
    assert_eq!(source.describe(), dir.path().display().to_string());
}

// ============================================================
// Session builder tests
// ============================================================

#[test]
fn test_build_sessions_from_logs() {
    let dir = create_test_logs_dir();
    let records = LogDirSource::with_dir(dir.path().to_path_buf())
        .load()
        .unwrap();

    let sessions = build_sessions(records);

    assert_eq!(sessions.len(), 2);
    // beta starts a day later, so it comes first
    assert_eq!(sessions[0].session_id, "beta-3333");
    assert_eq!(sessions[0].start_time, "2026-01-21T10:00:00.000Z");
    assert_eq!(sessions[1].session_id, "alpha-1111-2222");
    assert_eq!(sessions[1].start_time, "2026-01-20T10:00:00.000Z");
    assert_eq!(sessions[1].short_id(), "alpha");

    let alpha = &sessions[1];
    let kinds: Vec<EventKind> = alpha.events.iter().map(|e| e.content.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::SessionStart,
            EventKind::UserPromptSubmitted,
            EventKind::PreToolUse,
            EventKind::PostToolUse,
        ]
    );
    assert_eq!(alpha.count_of(EventKind::PreToolUse), 1);
    assert_eq!(alpha.events[2].content.tool_name(), Some("run_in_terminal"));
}

#[test]
fn test_session_prompts_are_numbered_in_order() {
    let dir = create_test_logs_dir();
    let records = LogDirSource::with_dir(dir.path().to_path_buf())
        .load()
        .unwrap();
    let sessions = build_sessions(records);

    let prompts = sessions[0].prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0].index, 0);
    assert_eq!(prompts[0].text, "add metrics dashboard");
    assert_eq!(prompts[1].index, 1);
    assert_eq!(prompts[1].text, "now add charts");
}

#[test]
fn test_build_sessions_example_ordering() {
    let sessions = build_sessions(vec![
        prompt_record("1.json", "a", 200, "2026-01-20T10:00:00.200Z"),
        prompt_record("2.json", "a", 100, "2026-01-20T10:00:00.100Z"),
        prompt_record("3.json", "b", 150, "2026-01-20T10:00:00.150Z"),
    ]);

    let ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(timestamps(&sessions[1]), vec![100, 200]);
    assert_eq!(sessions[1].start_time, "2026-01-20T10:00:00.100Z");
}

#[test]
fn test_equal_timestamps_keep_input_order() {
    let sessions = build_sessions(vec![
        tool_record("first.json", "s", 500, "2026-01-20T10:00:00.500Z"),
        prompt_record("early.json", "s", 100, "2026-01-20T10:00:00.100Z"),
        prompt_record("second.json", "s", 500, "2026-01-20T10:00:00.500Z"),
        tool_record("third.json", "s", 500, "2026-01-20T10:00:00.500Z"),
    ]);

    let names: Vec<&str> = sessions[0]
        .events
        .iter()
        .map(|e| e.filename.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["early.json", "first.json", "second.json", "third.json"]
    );
}

#[test]
fn test_every_well_formed_record_lands_in_exactly_one_session() {
    let mut input = Vec::new();
    for i in 0..30i64 {
        let session_id = format!("s{}", i % 4);
        let ts = (i * 37) % 23;
        let iso = format!("2026-01-{:02}T10:00:00Z", 10 + (i % 4));
        input.push(prompt_record(&format!("{}.json", i), &session_id, ts, &iso));
    }
    input.push(prompt_record("orphan.json", "", 3, "2026-01-01T00:00:00Z"));

    let sessions = build_sessions(input.clone());

    let total: usize = sessions.iter().map(|s| s.events.len()).sum();
    assert_eq!(total, 30);

    let mut seen = HashSet::new();
    for session in &sessions {
        for event in &session.events {
            assert_eq!(event.content.session_id(), session.session_id);
            assert!(seen.insert(event.filename.clone()), "duplicate event");
        }
        let ts = timestamps(session);
        assert!(ts.windows(2).all(|w| w[0] <= w[1]));
    }
    assert!(!seen.contains("orphan.json"));

    let starts: Vec<_> = sessions.iter().map(|s| s.started_at()).collect();
    assert!(starts.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_build_sessions_does_not_depend_on_input_order() {
    let forward = vec![
        prompt_record("1.json", "a", 1, "2026-01-20T10:00:00Z"),
        prompt_record("2.json", "b", 2, "2026-01-22T10:00:00Z"),
        prompt_record("3.json", "c", 3, "2026-01-21T10:00:00Z"),
    ];
    let mut backward = forward.clone();
    backward.reverse();

    let ids = |sessions: Vec<Session>| -> Vec<String> {
        sessions.into_iter().map(|s| s.session_id).collect()
    };
    assert_eq!(ids(build_sessions(forward)), vec!["b", "c", "a"]);
    assert_eq!(ids(build_sessions(backward)), vec!["b", "c", "a"]);
}

#[test]
fn test_session_serializes_camel_case() {
    let sessions = build_sessions(vec![prompt_record(
        "1.json",
        "a",
        1,
        "2026-01-20T10:00:00Z",
    )]);
    let json = serde_json::to_value(&sessions[0]).unwrap();

    assert_eq!(json["sessionId"], "a");
    assert_eq!(json["startTime"], "2026-01-20T10:00:00Z");
    assert_eq!(json["events"][0]["content"]["hookName"], "userPromptSubmitted");
    assert_eq!(json["events"][0]["content"]["input"]["sessionId"], "a");
    assert_eq!(json["events"][0]["content"]["isoTimestamp"], "2026-01-20T10:00:00Z");
}
