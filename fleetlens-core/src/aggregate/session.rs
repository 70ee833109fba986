//! Session aggregator
//!
//! Folds one transcript's records, in append order, into a
//! [`SessionSummary`]. The fold is stateless across calls: every
//! recomputation pass re-reads and re-folds the whole transcript.

use crate::ingest::content::{estimate_tokens, first_text, flatten_content};
use crate::types::{
    ActivityEntry, Content, ContentBlock, MessagePreview, Record, RecordKind, Role, SessionSummary,
};

/// Most recent assistant messages kept per session.
pub const RECENT_MESSAGES_CAP: usize = 10;

/// Most recent activity entries kept per session.
pub const ACTIVITY_LOG_CAP: usize = 50;

/// Characters of assistant text kept in a message preview.
pub const PREVIEW_CHARS: usize = 200;

/// Characters of serialized tool arguments kept in an activity entry.
pub const TOOL_ARG_PREVIEW_CHARS: usize = 120;

/// Fold a transcript's records into per-session metrics.
pub fn summarize_session(session_id: &str, records: &[Record]) -> SessionSummary {
    let mut summary = SessionSummary {
        session_id: session_id.to_string(),
        model: "unknown".to_string(),
        ..Default::default()
    };

    for record in records {
        if let Some(ts) = record.parsed_timestamp() {
            summary.last_activity = Some(match summary.last_activity {
                Some(prev) => prev.max(ts),
                None => ts,
            });
        }

        match record.kind {
            RecordKind::ModelChange => {
                if let Some(model_id) = &record.model_id {
                    summary.model = model_id.clone();
                }
            }
            RecordKind::Message => {
                let Some(message) = &record.message else {
                    continue;
                };
                fold_message(&mut summary, record, message.role, message.content.as_ref());
            }
            RecordKind::Unknown => {}
        }
    }

    // Report newest-first, capped
    truncate_newest_first(&mut summary.recent_messages, RECENT_MESSAGES_CAP);
    truncate_newest_first(&mut summary.activity_log, ACTIVITY_LOG_CAP);

    summary
}

fn fold_message(
    summary: &mut SessionSummary,
    record: &Record,
    role: Role,
    content: Option<&Content>,
) {
    let text = flatten_content(content);
    let tokens = estimate_tokens(&text);
    let timestamp = record.parsed_timestamp();

    match role {
        Role::User | Role::ToolResult => {
            summary.input_tokens += tokens;
        }
        Role::Assistant => {
            summary.output_tokens += tokens;
            summary.message_count += 1;

            if let Some(Content::Blocks(blocks)) = content {
                for block in blocks {
                    if let ContentBlock::ToolCall { name, arguments } = block {
                        summary.tool_calls += 1;
                        summary.activity_log.push(ActivityEntry::ToolCall {
                            tool: name.clone().unwrap_or_else(|| "unknown".to_string()),
                            arguments: cap_chars(
                                &arguments
                                    .as_ref()
                                    .map(|v| v.to_string())
                                    .unwrap_or_default(),
                                TOOL_ARG_PREVIEW_CHARS,
                            ),
                            tokens,
                            timestamp,
                        });
                    }
                }
            }
        }
        Role::Unknown => return,
    }

    // Text entries for the recent/activity views
    let Some(raw) = first_text(content) else {
        return;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }

    match role {
        Role::Assistant => {
            summary.recent_messages.push(MessagePreview {
                preview: preview_of(trimmed),
                text: trimmed.to_string(),
                timestamp,
            });
            summary.activity_log.push(ActivityEntry::AssistantText {
                text: trimmed.to_string(),
                timestamp,
            });
        }
        Role::User => {
            summary.activity_log.push(ActivityEntry::UserText {
                text: trimmed.to_string(),
                timestamp,
            });
        }
        Role::ToolResult | Role::Unknown => {}
    }
}

/// First `PREVIEW_CHARS` characters, with an ellipsis marker when cut.
fn preview_of(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if preview.len() < text.len() {
        preview.push('…');
    }
    preview
}

fn cap_chars(text: &str, cap: usize) -> String {
    if text.chars().count() <= cap {
        text.to_string()
    } else {
        text.chars().take(cap).collect()
    }
}

/// Keep the last `cap` appended entries, reversed to newest-first.
fn truncate_newest_first<T>(entries: &mut Vec<T>, cap: usize) {
    if entries.len() > cap {
        entries.drain(..entries.len() - cap);
    }
    entries.reverse();
}
