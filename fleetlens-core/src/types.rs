//! Core domain types for fleetlens
//!
//! Two families of types live here:
//!
//! - **Wire types** ([`Record`], [`Role`], [`Content`], [`ContentBlock`],
//!   [`Usage`]) mirror one line of an agent transcript. Deserialization is
//!   deliberately lenient: every field defaults, unknown tags map to
//!   `Unknown` variants, and a line that fails to decode is dropped by the
//!   reader rather than failing the file.
//! - **Aggregate types** ([`SessionSummary`], [`AgentOverview`],
//!   [`FleetSummary`], [`Snapshot`], usage breakdowns) are what one
//!   recomputation pass produces. They serialize in camelCase so the
//!   delivery layer can forward them verbatim.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Agent** | A named unit of the runtime, one directory, owning sessions |
//! | **Session** | One conversation, backed by one append-only transcript |
//! | **Transcript** | Line-delimited JSON record file for a session |
//! | **Session index** | Per-agent `sessions.json` mapping key → session id |
//! | **Snapshot** | One fully-recomputed, timestamped aggregation result |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================
// Transcript wire types
// ============================================

/// Tag of a transcript record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A conversation message (user, assistant, or tool result)
    Message,
    /// The session switched backing models
    ModelChange,
    /// Anything else the runtime may emit; ignored by aggregation
    #[serde(other)]
    #[default]
    Unknown,
}

/// One parsed line of a transcript.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Record {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// ISO-8601 timestamp, when the runtime recorded one
    pub timestamp: Option<String>,
    /// Present on `message` records
    pub message: Option<MessagePayload>,
    /// Present on `model_change` records
    pub model_id: Option<String>,
}

impl Record {
    /// Parse the record's timestamp, if present and well-formed.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Role of a message author as the runtime writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    User,
    Assistant,
    ToolResult,
    #[serde(other)]
    #[default]
    Unknown,
}

/// Nested `message` object of a `message` record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessagePayload {
    pub role: Role,
    pub content: Option<Content>,
    /// Authoritative usage counters, when the runtime recorded them
    pub usage: Option<Usage>,
}

/// Message content: a plain string or an ordered list of typed blocks.
///
/// Anything else (numbers, objects) renders as empty text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Blocks(Vec<ContentBlock>),
    Other(serde_json::Value),
}

/// One typed content block within a structured message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    ToolCall {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        arguments: Option<serde_json::Value>,
    },
    ToolResult {
        #[serde(default)]
        content: Option<serde_json::Value>,
    },
    /// Unknown block kinds render as empty text
    #[serde(other)]
    Unknown,
}

/// Authoritative usage counters attached to an assistant message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Usage {
    pub input: u64,
    pub output: u64,
    pub cache_read: u64,
    pub cache_write: u64,
    pub total_tokens: u64,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api: Option<String>,
    /// USD cost as billed, when the runtime recorded it
    pub cost: Option<f64>,
}

// ============================================
// Liveness status
// ============================================

/// How many minutes since last activity still counts as `active`.
pub const ACTIVE_WINDOW_MINUTES: i64 = 2;

/// How many minutes since last activity still counts as `recent`.
pub const RECENT_WINDOW_MINUTES: i64 = 30;

/// Liveness of an agent, derived from time since last recorded activity.
///
/// Never stored; recomputed on every tick as a pure function of elapsed
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Activity within the last 2 minutes
    Active,
    /// 2-30 minutes since last activity
    Recent,
    /// 30 minutes or more since last activity
    Idle,
    /// No activity ever recorded
    Never,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Recent => "recent",
            AgentStatus::Idle => "idle",
            AgentStatus::Never => "never",
        }
    }

    /// Sort rank: `active < recent < idle < never`.
    pub fn rank(&self) -> u8 {
        match self {
            AgentStatus::Active => 0,
            AgentStatus::Recent => 1,
            AgentStatus::Idle => 2,
            AgentStatus::Never => 3,
        }
    }

    /// Compute status from last activity at a given reference time.
    pub fn from_last_activity(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(last) = last else {
            return AgentStatus::Never;
        };

        let minutes = now.signed_duration_since(last).num_minutes();

        if minutes < ACTIVE_WINDOW_MINUTES {
            AgentStatus::Active
        } else if minutes < RECENT_WINDOW_MINUTES {
            AgentStatus::Recent
        } else {
            AgentStatus::Idle
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Session aggregates
// ============================================

/// A capped recent-messages entry: assistant text with a short preview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePreview {
    /// First 200 characters, with a `…` marker when truncated
    pub preview: String,
    /// Full trimmed text
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One entry of the combined chronological activity log.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ActivityEntry {
    ToolCall {
        tool: String,
        /// Size-capped serialization of the call arguments
        arguments: String,
        /// Token estimate of the message carrying the call
        tokens: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    AssistantText {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    UserText {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
}

/// Per-session metrics, recomputed fully on every read.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    /// Last model seen on a `model_change` record, `"unknown"` otherwise
    pub model: String,
    /// Estimated tokens from user and tool-result messages
    pub input_tokens: u64,
    /// Estimated tokens from assistant messages
    pub output_tokens: u64,
    /// Number of assistant messages
    pub message_count: u64,
    /// Number of tool-call blocks across assistant messages
    pub tool_calls: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    /// Up to 10 latest assistant texts, newest first
    pub recent_messages: Vec<MessagePreview>,
    /// Up to 50 latest activity entries, newest first
    pub activity_log: Vec<ActivityEntry>,
}

impl SessionSummary {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

// ============================================
// Agent aggregates
// ============================================

/// Cumulative metrics for one agent directory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentOverview {
    pub name: String,
    pub status: AgentStatus,
    /// Most-recently-seen non-`"unknown"` model across sessions
    pub model: String,
    /// Session id of the index's first entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_session: Option<String>,
    /// Indexed sessions with a readable transcript
    pub session_count: usize,
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub message_count: u64,
    pub tool_calls: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    /// Recent view of the most-recently-active session
    pub recent_messages: Vec<MessagePreview>,
    pub activity_log: Vec<ActivityEntry>,
}

// ============================================
// Usage breakdowns
// ============================================

/// Tool-call counts keyed by tool name.
///
/// BTreeMap keeps key order stable so identical input produces an
/// identical serialized snapshot.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUsageBreakdown {
    /// Fleet-wide counts by tool name
    pub total: BTreeMap<String, u64>,
    /// Per-agent counts; agents with zero tool calls are omitted
    pub by_agent: BTreeMap<String, BTreeMap<String, u64>>,
}

/// Skill-read counts keyed by skill identifier.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillUsageBreakdown {
    pub total: BTreeMap<String, u64>,
    pub by_agent: BTreeMap<String, BTreeMap<String, u64>>,
}

/// Accumulated authoritative usage counters for one grouping key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageBucket {
    pub input: u64,
    pub output: u64,
    pub cache_read: u64,
    pub cache_write: u64,
    pub total_tokens: u64,
    /// Authoritative USD cost, 0 where the runtime recorded none
    pub cost: f64,
    /// Number of contributing messages
    pub messages: u64,
}

impl UsageBucket {
    /// Fold one message's usage counters into this bucket.
    pub fn add(&mut self, usage: &Usage) {
        self.input += usage.input;
        self.output += usage.output;
        self.cache_read += usage.cache_read;
        self.cache_write += usage.cache_write;
        self.total_tokens += usage.total_tokens;
        self.cost += usage.cost.unwrap_or(0.0);
        self.messages += 1;
    }
}

/// Authoritative usage grouped three independent ways.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUsageBreakdown {
    pub by_provider: BTreeMap<String, UsageBucket>,
    pub by_model: BTreeMap<String, UsageBucket>,
    pub by_api: BTreeMap<String, UsageBucket>,
    pub total: UsageBucket,
}

// ============================================
// Fleet summary and snapshot
// ============================================

/// System-wide totals reduced from all agent overviews.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_messages: u64,
    pub total_tool_calls: u64,
    /// Agents currently in status `active`
    pub active_agents: usize,
    pub agent_count: usize,
    /// Rough USD estimate from token counts and configured rates,
    /// rendered with 4 decimal places; not billing-accurate
    pub estimated_cost: String,
}

/// The root aggregate delivered to viewers once per tick.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub fleet: FleetSummary,
    /// Sorted by status rank, ties by encounter order
    pub agents: Vec<AgentOverview>,
    pub tool_usage: ToolUsageBreakdown,
    pub skill_usage: SkillUsageBreakdown,
    pub api_usage: ApiUsageBreakdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_thresholds() {
        let now = Utc::now();
        let at = |mins: i64| Some(now - Duration::minutes(mins));

        assert_eq!(
            AgentStatus::from_last_activity(at(0), now),
            AgentStatus::Active
        );
        assert_eq!(
            AgentStatus::from_last_activity(at(10), now),
            AgentStatus::Recent
        );
        assert_eq!(
            AgentStatus::from_last_activity(at(45), now),
            AgentStatus::Idle
        );
        assert_eq!(
            AgentStatus::from_last_activity(None, now),
            AgentStatus::Never
        );
    }

    #[test]
    fn test_status_boundaries() {
        let now = Utc::now();
        let at = |mins: i64| Some(now - Duration::minutes(mins));

        // Exactly 2 minutes is no longer active; exactly 30 is idle
        assert_eq!(
            AgentStatus::from_last_activity(at(2), now),
            AgentStatus::Recent
        );
        assert_eq!(
            AgentStatus::from_last_activity(at(30), now),
            AgentStatus::Idle
        );
    }

    #[test]
    fn test_status_rank_ordering() {
        assert!(AgentStatus::Active.rank() < AgentStatus::Recent.rank());
        assert!(AgentStatus::Recent.rank() < AgentStatus::Idle.rank());
        assert!(AgentStatus::Idle.rank() < AgentStatus::Never.rank());
    }

    #[test]
    fn test_record_unknown_kind_tolerated() {
        let record: Record =
            serde_json::from_str(r#"{"type":"file_snapshot","timestamp":"bogus"}"#).unwrap();
        assert_eq!(record.kind, RecordKind::Unknown);
        assert!(record.parsed_timestamp().is_none());
    }

    #[test]
    fn test_record_timestamp_parsing() {
        let record: Record =
            serde_json::from_str(r#"{"type":"message","timestamp":"2026-08-01T12:00:00Z"}"#)
                .unwrap();
        assert!(record.parsed_timestamp().is_some());
    }

    #[test]
    fn test_content_block_unknown_tag() {
        let block: ContentBlock = serde_json::from_str(r#"{"type":"image"}"#).unwrap();
        assert!(matches!(block, ContentBlock::Unknown));
    }

    #[test]
    fn test_role_wire_forms() {
        let payload: MessagePayload =
            serde_json::from_str(r#"{"role":"toolResult","content":"ok"}"#).unwrap();
        assert_eq!(payload.role, Role::ToolResult);

        let payload: MessagePayload = serde_json::from_str(r#"{"role":"observer"}"#).unwrap();
        assert_eq!(payload.role, Role::Unknown);
    }

    #[test]
    fn test_usage_bucket_add() {
        let mut bucket = UsageBucket::default();
        bucket.add(&Usage {
            input: 100,
            output: 50,
            cache_read: 10,
            cache_write: 5,
            total_tokens: 165,
            cost: Some(0.25),
            ..Default::default()
        });
        bucket.add(&Usage {
            input: 10,
            total_tokens: 10,
            ..Default::default()
        });

        assert_eq!(bucket.input, 110);
        assert_eq!(bucket.output, 50);
        assert_eq!(bucket.total_tokens, 175);
        assert_eq!(bucket.cost, 0.25);
        assert_eq!(bucket.messages, 2);
    }
}
