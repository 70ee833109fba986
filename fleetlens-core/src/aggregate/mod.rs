//! Snapshot aggregation
//!
//! Every pass recomputes the full picture from the transcripts on disk.
//! Nothing is cached between passes, so a snapshot can never go stale
//! and two passes over unchanged files produce identical output.

pub mod agents;
pub mod session;
pub mod usage;

use crate::config::{Config, PricingConfig};
use crate::error::Result;
use crate::types::{AgentOverview, AgentStatus, FleetSummary, Snapshot};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Reduce agent overviews into fleet-wide totals.
pub fn fleet_summary(agents: &[AgentOverview], pricing: &PricingConfig) -> FleetSummary {
    let mut fleet = FleetSummary {
        agent_count: agents.len(),
        ..Default::default()
    };

    for agent in agents {
        fleet.total_tokens += agent.total_tokens;
        fleet.input_tokens += agent.input_tokens;
        fleet.output_tokens += agent.output_tokens;
        fleet.total_messages += agent.message_count;
        fleet.total_tool_calls += agent.tool_calls;
        if agent.status == AgentStatus::Active {
            fleet.active_agents += 1;
        }
    }

    let cost = fleet.input_tokens as f64 / 1_000_000.0 * pricing.input_per_mtok
        + fleet.output_tokens as f64 / 1_000_000.0 * pricing.output_per_mtok;
    fleet.estimated_cost = format!("{:.4}", cost);

    fleet
}

/// Produces complete fleet snapshots from the on-disk agent tree.
///
/// Stateless by design: each [`snapshot`](Aggregator::snapshot) call
/// re-reads everything under the agents root.
pub struct Aggregator {
    agents_root: PathBuf,
    pricing: PricingConfig,
    file_read_tool: String,
}

impl Aggregator {
    pub fn new(agents_root: PathBuf, pricing: PricingConfig, file_read_tool: String) -> Self {
        Self {
            agents_root,
            pricing,
            file_read_tool,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.agents_root(),
            config.pricing,
            config.skills.file_read_tool.clone(),
        )
    }

    /// Recompute a full snapshot at the current wall-clock time.
    pub fn snapshot(&self) -> Result<Snapshot> {
        self.snapshot_at(Utc::now())
    }

    /// Recompute a full snapshot against an explicit reference time.
    ///
    /// Status derivation depends only on `now`, so the same tree and
    /// the same `now` always yield the same snapshot.
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> Result<Snapshot> {
        let agents = agents::agents_overview(&self.agents_root, now);
        let fleet = fleet_summary(&agents, &self.pricing);

        Ok(Snapshot {
            timestamp: now,
            fleet,
            agents,
            tool_usage: usage::tool_usage(&self.agents_root),
            skill_usage: usage::skill_usage(&self.agents_root, &self.file_read_tool),
            api_usage: usage::api_usage(&self.agents_root),
        })
    }
}
