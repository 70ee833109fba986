//! Agent aggregator
//!
//! Discovers agent directories, folds every indexed session through the
//! session aggregator, and derives each agent's liveness status. An
//! agent with a missing or empty session index still appears, with zero
//! counters and status `never`.

use crate::aggregate::session::summarize_session;
use crate::ingest::{read_session_index, read_transcript, transcript_path, SESSION_INDEX_FILE};
use crate::types::{AgentOverview, AgentStatus, SessionSummary};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Discover agent directories under the agents root.
///
/// Sorted by name so encounter order is deterministic across passes.
/// A missing root yields no agents, not an error.
pub fn discover_agents(root: &Path) -> Vec<(String, PathBuf)> {
    let entries = match std::fs::read_dir(root) {
        Ok(e) => e,
        Err(e) => {
            tracing::debug!(root = %root.display(), error = %e, "Agents root unreadable, no agents");
            return Vec::new();
        }
    };

    let mut agents: Vec<(String, PathBuf)> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            Some((name, entry.path()))
        })
        .collect();

    agents.sort_by(|a, b| a.0.cmp(&b.0));
    agents
}

/// Aggregate all of one agent's sessions into an overview.
pub fn aggregate_agent(name: &str, dir: &Path, now: DateTime<Utc>) -> AgentOverview {
    let session_ids = read_session_index(&dir.join(SESSION_INDEX_FILE));
    let active_session = session_ids.first().cloned();

    let mut overview = AgentOverview {
        name: name.to_string(),
        status: AgentStatus::Never,
        model: "unknown".to_string(),
        active_session,
        session_count: 0,
        total_tokens: 0,
        input_tokens: 0,
        output_tokens: 0,
        message_count: 0,
        tool_calls: 0,
        last_activity: None,
        recent_messages: Vec::new(),
        activity_log: Vec::new(),
    };

    // The most-recently-active session contributes the agent-level recent
    // view; ties keep the first session seen.
    let mut recent_source: Option<DateTime<Utc>> = None;
    let mut model_seen: Option<DateTime<Utc>> = None;

    for session_id in &session_ids {
        let path = transcript_path(dir, session_id);
        if !path.exists() {
            tracing::debug!(agent = name, session = %session_id, "Indexed session has no transcript");
            continue;
        }

        let records = read_transcript(&path);
        let summary = summarize_session(session_id, &records);
        accumulate(&mut overview, &summary, &mut recent_source, &mut model_seen);
    }

    overview.status = AgentStatus::from_last_activity(overview.last_activity, now);
    overview
}

fn accumulate(
    overview: &mut AgentOverview,
    summary: &SessionSummary,
    recent_source: &mut Option<DateTime<Utc>>,
    model_seen: &mut Option<DateTime<Utc>>,
) {
    overview.session_count += 1;
    overview.input_tokens += summary.input_tokens;
    overview.output_tokens += summary.output_tokens;
    overview.total_tokens += summary.total_tokens();
    overview.message_count += summary.message_count;
    overview.tool_calls += summary.tool_calls;

    if let Some(ts) = summary.last_activity {
        overview.last_activity = Some(match overview.last_activity {
            Some(prev) => prev.max(ts),
            None => ts,
        });

        if recent_source.map_or(true, |prev| ts > prev) {
            *recent_source = Some(ts);
            overview.recent_messages = summary.recent_messages.clone();
            overview.activity_log = summary.activity_log.clone();
        }

        if summary.model != "unknown" && model_seen.map_or(true, |prev| ts > prev) {
            *model_seen = Some(ts);
            overview.model = summary.model.clone();
        }
    }
}

/// Aggregate every agent under the root, sorted by status rank.
///
/// Sorting is stable, so agents of equal status keep their encounter
/// order.
pub fn agents_overview(root: &Path, now: DateTime<Utc>) -> Vec<AgentOverview> {
    let mut overviews: Vec<AgentOverview> = discover_agents(root)
        .iter()
        .map(|(name, dir)| aggregate_agent(name, dir, now))
        .collect();

    overviews.sort_by_key(|a| a.status.rank());
    overviews
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_agent(root: &Path, name: &str, index: &str, transcripts: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(dir.join("sessions")).unwrap();
        fs::write(dir.join(SESSION_INDEX_FILE), index).unwrap();
        for (session_id, content) in transcripts {
            fs::write(
                dir.join("sessions").join(format!("{}.jsonl", session_id)),
                content,
            )
            .unwrap();
        }
    }

    fn message_line(ts: &str, role: &str, text: &str) -> String {
        format!(
            r#"{{"type":"message","timestamp":"{}","message":{{"role":"{}","content":"{}"}}}}"#,
            ts, role, text
        )
    }

    #[test]
    fn test_agent_without_index_still_appears() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("ghost")).unwrap();

        let agents = agents_overview(root.path(), Utc::now());
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].name, "ghost");
        assert_eq!(agents[0].status, AgentStatus::Never);
        assert_eq!(agents[0].total_tokens, 0);
        assert!(agents[0].active_session.is_none());
    }

    #[test]
    fn test_agent_sums_across_sessions() {
        let root = TempDir::new().unwrap();
        let now = Utc::now();
        let recent = (now - chrono::Duration::minutes(1)).to_rfc3339();
        let older = (now - chrono::Duration::minutes(10)).to_rfc3339();

        make_agent(
            root.path(),
            "alpha",
            r#"{"a":{"sessionId":"s1"},"b":{"sessionId":"s2"}}"#,
            &[
                ("s1", &message_line(&older, "assistant", "earlier work")),
                ("s2", &message_line(&recent, "assistant", "current work")),
            ],
        );

        let agents = agents_overview(root.path(), now);
        assert_eq!(agents.len(), 1);
        let agent = &agents[0];

        assert_eq!(agent.session_count, 2);
        assert_eq!(agent.message_count, 2);
        assert_eq!(
            agent.total_tokens,
            agent.input_tokens + agent.output_tokens
        );
        assert_eq!(agent.active_session.as_deref(), Some("s1"));
        assert_eq!(agent.status, AgentStatus::Active);

        // Recent view comes from the most-recently-active session (s2)
        assert_eq!(agent.recent_messages.len(), 1);
        assert_eq!(agent.recent_messages[0].text, "current work");
    }

    #[test]
    fn test_agent_total_equals_session_sum() {
        let root = TempDir::new().unwrap();
        let now = Utc::now();
        let ts = now.to_rfc3339();

        let t1 = format!(
            "{}\n{}\n",
            message_line(&ts, "user", "aaaaaaaa"),
            message_line(&ts, "assistant", "bbbb")
        );
        let t2 = message_line(&ts, "assistant", "cccccccccccc");

        make_agent(
            root.path(),
            "alpha",
            r#"{"a":{"sessionId":"s1"},"b":{"sessionId":"s2"}}"#,
            &[("s1", &t1), ("s2", &t2)],
        );

        let dir = root.path().join("alpha");
        let sum: u64 = ["s1", "s2"]
            .iter()
            .map(|sid| {
                summarize_session(sid, &read_transcript(&transcript_path(&dir, sid)))
                    .total_tokens()
            })
            .sum();

        let agent = aggregate_agent("alpha", &dir, now);
        assert_eq!(agent.total_tokens, sum);
    }

    #[test]
    fn test_missing_transcript_skipped() {
        let root = TempDir::new().unwrap();
        let now = Utc::now();
        let ts = now.to_rfc3339();

        make_agent(
            root.path(),
            "alpha",
            r#"{"a":{"sessionId":"gone"},"b":{"sessionId":"here"}}"#,
            &[("here", &message_line(&ts, "assistant", "hello"))],
        );

        let agent = aggregate_agent("alpha", &root.path().join("alpha"), now);
        assert_eq!(agent.session_count, 1);
        // Active session is still the index's first entry even without a transcript
        assert_eq!(agent.active_session.as_deref(), Some("gone"));
    }

    #[test]
    fn test_model_tracking_prefers_most_recent() {
        let root = TempDir::new().unwrap();
        let now = Utc::now();
        let older = (now - chrono::Duration::minutes(20)).to_rfc3339();
        let recent = (now - chrono::Duration::minutes(1)).to_rfc3339();

        let t1 = format!(
            "{}\n{}\n",
            r#"{"type":"model_change","modelId":"opus-4"}"#,
            message_line(&recent, "assistant", "new session")
        );
        let t2 = format!(
            "{}\n{}\n",
            r#"{"type":"model_change","modelId":"sonnet-4"}"#,
            message_line(&older, "assistant", "old session")
        );

        make_agent(
            root.path(),
            "alpha",
            r#"{"a":{"sessionId":"s1"},"b":{"sessionId":"s2"}}"#,
            &[("s1", &t1), ("s2", &t2)],
        );

        let agent = aggregate_agent("alpha", &root.path().join("alpha"), now);
        assert_eq!(agent.model, "opus-4");
    }

    #[test]
    fn test_agents_sorted_by_status_rank() {
        let root = TempDir::new().unwrap();
        let now = Utc::now();
        let idle_ts = (now - chrono::Duration::minutes(45)).to_rfc3339();
        let active_ts = now.to_rfc3339();

        make_agent(
            root.path(),
            "aaa-idle",
            r#"{"a":{"sessionId":"s1"}}"#,
            &[("s1", &message_line(&idle_ts, "assistant", "old"))],
        );
        make_agent(
            root.path(),
            "zzz-active",
            r#"{"a":{"sessionId":"s1"}}"#,
            &[("s1", &message_line(&active_ts, "assistant", "fresh"))],
        );
        fs::create_dir_all(root.path().join("mmm-never")).unwrap();

        let agents = agents_overview(root.path(), now);
        let names: Vec<&str> = agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["zzz-active", "aaa-idle", "mmm-never"]);
    }

    #[test]
    fn test_missing_root() {
        let agents = agents_overview(Path::new("/nonexistent/fleet"), Utc::now());
        assert!(agents.is_empty());
    }
}
