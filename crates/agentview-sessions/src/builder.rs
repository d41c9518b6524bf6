use indexmap::IndexMap;

use crate::types::{EventRecord, Session};

/// Group event records into sessions.
///
/// Records with an empty session id are dropped. Events inside a session are
/// ordered by their numeric timestamp, keeping input order for ties. Sessions
/// are ordered newest first by start time; a session whose start time does
/// not parse sorts last.
pub fn build_sessions(events: Vec<EventRecord>) -> Vec<Session> {
    let mut groups: IndexMap<String, Vec<EventRecord>> = IndexMap::new();
    let mut skipped = 0usize;

    for record in events {
        let session_id = record.content.session_id();
        if session_id.is_empty() {
            skipped += 1;
            continue;
        }
        groups
            .entry(session_id.to_string())
            .or_default()
            .push(record);
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} event records without a session id", skipped);
    }

    let mut sessions: Vec<Session> = groups
        .into_iter()
        .map(|(session_id, mut events)| {
            events.sort_by_key(|e| e.content.timestamp());
            let start_time = events
                .first()
                .map(|e| e.content.iso_timestamp().to_string())
                .unwrap_or_default();
            Session {
                session_id,
                start_time,
                events,
            }
        })
        .collect();

    // Newest first; `None` (unparsable) compares lowest so it lands at the end.
    sessions.sort_by_cached_key(|s| std::cmp::Reverse(s.started_at()));

    tracing::debug!("Built {} sessions", sessions.len());
    sessions
}

/// Find a session by id in an already built list.
pub fn find_session<'a>(sessions: &'a [Session], session_id: &str) -> Option<&'a Session> {
    sessions.iter().find(|s| s.session_id == session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Event, HookEvent, SessionStartInput};

    fn record(filename: &str, session_id: &str, timestamp: i64, iso: &str) -> EventRecord {
        EventRecord {
            filename: filename.to_string(),
            content: Event::SessionStart(HookEvent {
                timestamp,
                iso_timestamp: iso.to_string(),
                context: None,
                input: SessionStartInput {
                    session_id: session_id.to_string(),
                    timestamp: iso.to_string(),
                    hook_event_name: "SessionStart".to_string(),
                    transcript_path: String::new(),
                    source: "new".to_string(),
                    cwd: "/repo".to_string(),
                },
            }),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(build_sessions(Vec::new()).is_empty());
    }

    #[test]
    fn test_empty_session_id_is_dropped() {
        let sessions = build_sessions(vec![
            record("a.json", "", 100, "2026-01-20T10:00:00Z"),
            record("b.json", "s-1", 200, "2026-01-20T10:00:01Z"),
        ]);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].events.len(), 1);
        assert_eq!(sessions[0].events[0].filename, "b.json");
    }

    #[test]
    fn test_unparsable_start_time_sorts_last() {
        let sessions = build_sessions(vec![
            record("a.json", "broken", 50, "not a date"),
            record("b.json", "old", 100, "2026-01-19T10:00:00Z"),
            record("c.json", "new", 200, "2026-01-21T10:00:00Z"),
        ]);
        let ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "broken"]);
    }

    #[test]
    fn test_find_session() {
        let sessions = build_sessions(vec![record("a.json", "s-1", 1, "2026-01-20T10:00:00Z")]);
        assert!(find_session(&sessions, "s-1").is_some());
        assert!(find_session(&sessions, "s-2").is_none());
    }
}
