//! Session and event data model
//!
//! A session is the bounded context for one pipeline run: the ordered,
//! chronological event history of a single user. Sessions arrive from
//! whatever storage produced them (here: trimmed JSONL files); the pipeline
//! only ever reads them.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{RecError, Result};

/// Opaque item identifier ("aid" in the session records)
pub type Aid = u64;

/// The three prediction targets, each scored by an independent model
///
/// Iteration and output ordering is fixed: clicks, carts, orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Clicks,
    Carts,
    Orders,
}

impl EventType {
    /// All event types in their fixed pipeline order
    pub const ALL: [EventType; 3] = [EventType::Clicks, EventType::Carts, EventType::Orders];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Clicks => "clicks",
            EventType::Carts => "carts",
            EventType::Orders => "orders",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user interaction
///
/// Only `aid` feeds the core pipeline; `ts` and `event_type` are carried
/// through for diagnostics and log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Item the user interacted with
    pub aid: Aid,

    /// Event time in epoch milliseconds
    #[serde(default)]
    pub ts: i64,

    /// Kind of interaction recorded
    #[serde(rename = "type", default = "default_event_type")]
    pub event_type: EventType,
}

fn default_event_type() -> EventType {
    EventType::Clicks
}

impl Event {
    /// Event time as UTC, if the millisecond timestamp is representable
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.ts).single()
    }
}

/// One user's in-session event history, chronological as received
///
/// Duplicates are allowed (repeated interactions with the same item) and
/// the empty session is valid input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier, opaque to the pipeline
    pub session: u64,

    /// Ordered event history
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Session {
    pub fn new(session: u64, events: Vec<Event>) -> Self {
        Self { session, events }
    }

    /// Session with only item ids, for callers that have no timestamps
    pub fn from_aids(session: u64, aids: &[Aid]) -> Self {
        let events = aids
            .iter()
            .map(|&aid| Event {
                aid,
                ts: 0,
                event_type: EventType::Clicks,
            })
            .collect();
        Self { session, events }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total event count ("session length" feature)
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// All historical item ids, in order, with repetition
    pub fn aid_history(&self) -> Vec<Aid> {
        self.events.iter().map(|e| e.aid).collect()
    }

    /// Distinct historical item ids
    pub fn history_set(&self) -> HashSet<Aid> {
        self.events.iter().map(|e| e.aid).collect()
    }

    /// Occurrences of each item id within the session
    pub fn aid_counts(&self) -> HashMap<Aid, u32> {
        let mut counts = HashMap::new();
        for event in &self.events {
            *counts.entry(event.aid).or_insert(0) += 1;
        }
        counts
    }

    /// The most recent `n` distinct item ids, newest first
    ///
    /// Walks the history backwards, deduplicating while preserving recency
    /// order. These are the Stage 1 co-visitation seeds.
    pub fn recent_distinct(&self, n: usize) -> Vec<Aid> {
        let mut seen = HashSet::new();
        let mut recent = Vec::with_capacity(n);
        for event in self.events.iter().rev() {
            if recent.len() >= n {
                break;
            }
            if seen.insert(event.aid) {
                recent.push(event.aid);
            }
        }
        recent
    }
}

/// Read sessions from a JSONL file, one session object per line
///
/// Malformed lines are skipped with a warning rather than aborting the
/// whole batch; an unreadable file is a fatal artifact error.
pub fn read_sessions_jsonl(path: &Path) -> Result<Vec<Session>> {
    let file = File::open(path).map_err(|source| RecError::ArtifactUnreadable {
        name: "sessions".to_string(),
        path: path.to_path_buf(),
        source,
    })?;

    let reader = BufReader::new(file);
    let mut sessions = Vec::new();
    let mut skipped = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line
            .with_context(|| format!("reading line {} of {}", line_no + 1, path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Session>(&line) {
            Ok(session) => sessions.push(session),
            Err(err) => {
                skipped += 1;
                warn!(
                    line = line_no + 1,
                    error = %err,
                    "Skipping malformed session record"
                );
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, total = sessions.len(), "Session file had malformed lines");
    }

    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_event_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&EventType::Carts).unwrap(),
            "\"carts\""
        );
        let parsed: EventType = serde_json::from_str("\"orders\"").unwrap();
        assert_eq!(parsed, EventType::Orders);
    }

    #[test]
    fn test_event_type_fixed_order() {
        let names: Vec<&str> = EventType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["clicks", "carts", "orders"]);
    }

    #[test]
    fn test_session_parses_wire_shape() {
        let line = r#"{"session": 42, "events": [{"aid": 10, "ts": 1661724000000, "type": "clicks"}, {"aid": 20, "ts": 1661724060000, "type": "carts"}]}"#;
        let session: Session = serde_json::from_str(line).unwrap();
        assert_eq!(session.session, 42);
        assert_eq!(session.len(), 2);
        assert_eq!(session.events[1].event_type, EventType::Carts);
        assert!(session.events[0].timestamp().is_some());
    }

    #[test]
    fn test_aid_counts_with_repetition() {
        let session = Session::from_aids(1, &[10, 20, 10]);
        let counts = session.aid_counts();
        assert_eq!(counts[&10], 2);
        assert_eq!(counts[&20], 1);
        assert_eq!(session.history_set().len(), 2);
    }

    #[test]
    fn test_recent_distinct_prefers_newest() {
        let session = Session::from_aids(1, &[1, 2, 3, 2, 4]);
        // Newest first, deduplicated: 4, 2, 3 (the older 2 is absorbed)
        assert_eq!(session.recent_distinct(3), vec![4, 2, 3]);
        assert_eq!(session.recent_distinct(10), vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_empty_session_is_valid() {
        let session = Session::new(7, Vec::new());
        assert!(session.is_empty());
        assert!(session.recent_distinct(5).is_empty());
        assert!(session.aid_counts().is_empty());
    }

    #[test]
    fn test_read_sessions_jsonl_skips_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"session": 1, "events": [{{"aid": 5}}]}}"#).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file, r#"{{"session": 2, "events": []}}"#).unwrap();

        let sessions = read_sessions_jsonl(file.path()).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session, 1);
        assert_eq!(sessions[0].events[0].aid, 5);
        assert!(sessions[1].is_empty());
    }

    #[test]
    fn test_read_sessions_missing_file_is_fatal() {
        let err = read_sessions_jsonl(Path::new("/nonexistent/sessions.jsonl")).unwrap_err();
        assert_eq!(err.code(), "ARTIFACT_UNREADABLE");
    }
}
