//! Content flattening and token estimation
//!
//! Message content arrives as a plain string, an ordered list of typed
//! blocks, or something else entirely. This module renders any of those
//! into plain text and derives a token estimate from it.
//!
//! The estimate is `ceil(text length / 4)` — a heuristic, not a
//! tokenizer. It exists so sessions without authoritative usage counters
//! still contribute to the rollups; it must never be treated as
//! billing-accurate.

use crate::types::{Content, ContentBlock};

/// Render content into a flattened plain-text representation.
///
/// String content passes through. Structured blocks render individually
/// (tool-call and tool-result blocks as the serialization of their
/// payload, unknown blocks as empty) and join with spaces. Absent or
/// non-string/non-list content yields `""`.
pub fn flatten_content(content: Option<&Content>) -> String {
    match content {
        None => String::new(),
        Some(Content::Text(text)) => text.clone(),
        Some(Content::Blocks(blocks)) => blocks
            .iter()
            .map(render_block)
            .collect::<Vec<_>>()
            .join(" "),
        Some(Content::Other(_)) => String::new(),
    }
}

fn render_block(block: &ContentBlock) -> String {
    match block {
        ContentBlock::Text { text } => text.clone(),
        ContentBlock::Thinking { thinking } => thinking.clone(),
        ContentBlock::ToolCall { arguments, .. } => arguments
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default(),
        ContentBlock::ToolResult { content } => content
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default(),
        ContentBlock::Unknown => String::new(),
    }
}

/// Estimate the token count of a text: `ceil(len / 4)`.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() as u64 + 3) / 4
}

/// The assistant text shown in recent-message logs: the first `text`
/// block of structured content, or the string itself when content is
/// plain.
pub fn first_text(content: Option<&Content>) -> Option<String> {
    match content? {
        Content::Text(text) => Some(text.clone()),
        Content::Blocks(blocks) => blocks.iter().find_map(|b| match b {
            ContentBlock::Text { text } => Some(text.clone()),
            _ => None,
        }),
        Content::Other(_) => None,
    }
}
