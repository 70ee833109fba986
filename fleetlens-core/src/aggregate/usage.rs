//! Fleet-wide usage breakdowns
//!
//! Three independent scans over every readable transcript: tool-call
//! counts, skill reads inferred from file-read tool arguments, and the
//! runtime's own usage counters grouped by provider, model, and API.

use crate::aggregate::agents::discover_agents;
use crate::ingest::{read_session_index, read_transcript, transcript_path, SESSION_INDEX_FILE};
use crate::types::{
    ApiUsageBreakdown, Content, ContentBlock, Record, RecordKind, Role, SkillUsageBreakdown,
    ToolUsageBreakdown,
};
use std::path::Path;

/// Walk every agent's readable transcripts, feeding each record to `visit`
/// together with the agent name.
fn scan_transcripts<F>(root: &Path, mut visit: F)
where
    F: FnMut(&str, &Record),
{
    for (agent, dir) in discover_agents(root) {
        for session_id in read_session_index(&dir.join(SESSION_INDEX_FILE)) {
            let path = transcript_path(&dir, &session_id);
            if !path.exists() {
                continue;
            }
            for record in read_transcript(&path) {
                visit(&agent, &record);
            }
        }
    }
}

fn tool_call_blocks(record: &Record) -> Vec<&ContentBlock> {
    if record.kind != RecordKind::Message {
        return Vec::new();
    }
    let Some(message) = &record.message else {
        return Vec::new();
    };
    if message.role != Role::Assistant {
        return Vec::new();
    }
    match &message.content {
        Some(Content::Blocks(blocks)) => blocks
            .iter()
            .filter(|b| matches!(b, ContentBlock::ToolCall { .. }))
            .collect(),
        _ => Vec::new(),
    }
}

/// Count tool calls by tool name, fleet-wide and per agent.
pub fn tool_usage(root: &Path) -> ToolUsageBreakdown {
    let mut breakdown = ToolUsageBreakdown::default();

    scan_transcripts(root, |agent, record| {
        for block in tool_call_blocks(record) {
            if let ContentBlock::ToolCall { name, .. } = block {
                let tool = name.as_deref().unwrap_or("unknown").to_string();
                *breakdown.total.entry(tool.clone()).or_default() += 1;
                *breakdown
                    .by_agent
                    .entry(agent.to_string())
                    .or_default()
                    .entry(tool)
                    .or_default() += 1;
            }
        }
    });

    breakdown
}

/// Extract a skill identifier from file-read tool arguments.
///
/// The skill is the path segment following `/skills/` in whichever of
/// the conventional path argument keys is present.
fn skill_from_arguments(arguments: &serde_json::Value) -> Option<String> {
    let obj = arguments.as_object()?;
    for key in ["path", "file_path", "filePath"] {
        if let Some(path) = obj.get(key).and_then(|v| v.as_str()) {
            if let Some(rest) = path.split("/skills/").nth(1) {
                let skill = rest.split('/').next().unwrap_or("");
                if !skill.is_empty() {
                    return Some(skill.to_string());
                }
            }
        }
    }
    None
}

/// Count skill reads: calls to the file-read tool whose path argument
/// passes through a `/skills/<skill>/` directory.
///
/// The tool name comparison is case-insensitive so `Read` and `read`
/// count alike.
pub fn skill_usage(root: &Path, file_read_tool: &str) -> SkillUsageBreakdown {
    let mut breakdown = SkillUsageBreakdown::default();
    let wanted = file_read_tool.to_lowercase();

    scan_transcripts(root, |agent, record| {
        for block in tool_call_blocks(record) {
            let ContentBlock::ToolCall { name, arguments } = block else {
                continue;
            };
            let is_read = name
                .as_deref()
                .is_some_and(|n| n.to_lowercase() == wanted);
            if !is_read {
                continue;
            }
            let Some(skill) = arguments.as_ref().and_then(skill_from_arguments) else {
                continue;
            };
            *breakdown.total.entry(skill.clone()).or_default() += 1;
            *breakdown
                .by_agent
                .entry(agent.to_string())
                .or_default()
                .entry(skill)
                .or_default() += 1;
        }
    });

    breakdown
}

/// Fold the runtime's own usage counters, grouped by provider, model,
/// and API, plus a fleet-wide total.
///
/// Only assistant messages carry usage; a missing grouping field lands
/// in the `"unknown"` bucket.
pub fn api_usage(root: &Path) -> ApiUsageBreakdown {
    let mut breakdown = ApiUsageBreakdown::default();

    scan_transcripts(root, |_agent, record| {
        if record.kind != RecordKind::Message {
            return;
        }
        let Some(message) = &record.message else {
            return;
        };
        if message.role != Role::Assistant {
            return;
        }
        let Some(usage) = &message.usage else {
            return;
        };

        let key = |field: &Option<String>| {
            field.as_deref().unwrap_or("unknown").to_string()
        };

        breakdown
            .by_provider
            .entry(key(&usage.provider))
            .or_default()
            .add(usage);
        breakdown
            .by_model
            .entry(key(&usage.model))
            .or_default()
            .add(usage);
        breakdown.by_api.entry(key(&usage.api)).or_default().add(usage);
        breakdown.total.add(usage);
    });

    breakdown
}
