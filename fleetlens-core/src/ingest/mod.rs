//! Ingestion layer for reading agent transcripts and session indexes
//!
//! The on-disk layout consumed here is one directory per agent:
//!
//! ```text
//! <agents_root>/
//!   <agent-name>/
//!     sessions.json               session index: key → { "sessionId": ... }
//!     sessions/<sessionId>.jsonl  one transcript per indexed session
//! ```
//!
//! ## Error Handling
//!
//! Everything in this module is designed to degrade rather than fail:
//!
//! - **Malformed JSON lines** are debug-logged and skipped; the rest of
//!   the transcript still loads.
//! - **Missing or unreadable files** (transcript or index) yield empty
//!   data, never an error. A transient read failure self-corrects on the
//!   next recomputation pass.

pub mod content;

use crate::types::Record;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// File name of the per-agent session index.
pub const SESSION_INDEX_FILE: &str = "sessions.json";

/// Directory under an agent holding its transcripts.
pub const SESSIONS_DIR: &str = "sessions";

/// Deterministic transcript path for a session id.
pub fn transcript_path(agent_dir: &Path, session_id: &str) -> PathBuf {
    agent_dir
        .join(SESSIONS_DIR)
        .join(format!("{}.jsonl", session_id))
}

/// Load a transcript file into an ordered sequence of parsed records.
///
/// One record per non-empty line, append order preserved. Lines that fail
/// to decode are dropped; a missing or unreadable file yields an empty
/// sequence.
pub fn read_transcript(path: &Path) -> Vec<Record> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Transcript unreadable, treating as empty");
            return Vec::new();
        }
    };

    let reader = std::io::BufReader::new(file);
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Read error mid-transcript, keeping what we have");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Record>(&line) {
            Ok(record) => records.push(record),
            Err(_) => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!(path = %path.display(), dropped, "Dropped undecodable transcript lines");
    }

    records
}

/// Load an agent's session index as an ordered list of session ids.
///
/// Entry order is the index's own order (the first entry names the
/// agent's active session). Entries without a `sessionId` are skipped.
/// A missing or corrupt index yields an empty list.
pub fn read_session_index(path: &Path) -> Vec<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Session index unreadable, treating as empty");
            return Vec::new();
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Session index corrupt, treating as empty");
            return Vec::new();
        }
    };

    let Some(entries) = value.as_object() else {
        tracing::debug!(path = %path.display(), "Session index is not an object, treating as empty");
        return Vec::new();
    };

    entries
        .values()
        .filter_map(|entry| entry.get("sessionId")?.as_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RecordKind, Role};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_transcript_order_and_roles() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "t.jsonl",
            concat!(
                r#"{"type":"message","message":{"role":"user","content":"hi"}}"#,
                "\n",
                r#"{"type":"message","message":{"role":"assistant","content":"hello"}}"#,
                "\n",
            ),
        );

        let records = read_transcript(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message.as_ref().unwrap().role, Role::User);
        assert_eq!(records[1].message.as_ref().unwrap().role, Role::Assistant);
    }

    #[test]
    fn test_read_transcript_drops_malformed_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "t.jsonl",
            concat!(
                "this is not json\n",
                "\n",
                r#"{"type":"model_change","modelId":"sonnet-4"}"#,
                "\n",
                "{\"type\": truncated",
            ),
        );

        let records = read_transcript(&path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, RecordKind::ModelChange);
        assert_eq!(records[0].model_id.as_deref(), Some("sonnet-4"));
    }

    #[test]
    fn test_read_transcript_missing_file() {
        let records = read_transcript(Path::new("/nonexistent/agent/sessions/x.jsonl"));
        assert!(records.is_empty());
    }

    #[test]
    fn test_read_session_index_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "sessions.json",
            r#"{"zz":{"sessionId":"first"},"aa":{"sessionId":"second"},"mm":{"note":"no id"}}"#,
        );

        let ids = read_session_index(&path);
        // First entry wins as the active session, regardless of key order
        assert_eq!(ids, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_read_session_index_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "sessions.json", "{not valid");
        assert!(read_session_index(&path).is_empty());

        let path = write_file(&dir, "array.json", "[1,2,3]");
        assert!(read_session_index(&path).is_empty());
    }

    #[test]
    fn test_transcript_path_shape() {
        let path = transcript_path(Path::new("/srv/agents/alpha"), "abc-123");
        assert_eq!(
            path,
            PathBuf::from("/srv/agents/alpha/sessions/abc-123.jsonl")
        );
    }
}
