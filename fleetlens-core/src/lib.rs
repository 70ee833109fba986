//! # fleetlens-core
//!
//! Core library for fleetlens - a log-aggregation engine for fleets of
//! AI agents.
//!
//! This library provides:
//! - Lenient wire types for agent transcripts (JSONL)
//! - Session, agent, and fleet-wide aggregation
//! - Tool, skill, and API usage breakdowns
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Everything is recomputed from disk on every pass:
//! - **Ingest:** read session indexes and transcripts, drop bad lines
//! - **Aggregate:** fold records into per-session, per-agent, and
//!   fleet-wide summaries
//! - **Monitor:** drive the poll loop, skipping passes with no viewers
//!
//! ## Example
//!
//! ```rust,no_run
//! use fleetlens_core::{Aggregator, Config};
//!
//! let config = Config::load().expect("failed to load config");
//! let aggregator = Aggregator::from_config(&config);
//! let snapshot = aggregator.snapshot().expect("failed to aggregate");
//! println!("{} agents", snapshot.fleet.agent_count);
//! ```

// Re-export commonly used items at the crate root
pub use aggregate::Aggregator;
pub use config::Config;
pub use error::{Error, Result};
pub use monitor::{Monitor, TickOutcome, ViewerGuard, ViewerRegistry};
pub use types::*;

// Public modules
pub mod aggregate;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod monitor;
pub mod types;
