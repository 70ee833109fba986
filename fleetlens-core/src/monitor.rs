//! Poll loop driver
//!
//! The monitor owns an [`Aggregator`] and a [`ViewerRegistry`]. On each
//! tick it recomputes a snapshot, unless nobody is watching, in which
//! case the pass is skipped entirely and the disk stays untouched.

use crate::aggregate::Aggregator;
use crate::types::Snapshot;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Tracks how many viewers are currently connected.
///
/// Cloneable and thread-safe so a delivery layer can register viewers
/// from its own threads while the poll loop reads the count.
#[derive(Debug, Clone, Default)]
pub struct ViewerRegistry {
    count: Arc<AtomicUsize>,
}

impl ViewerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a viewer. The returned guard deregisters on drop.
    pub fn connect(&self) -> ViewerGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        ViewerGuard {
            count: Arc::clone(&self.count),
        }
    }

    pub fn viewer_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// RAII handle for one connected viewer.
#[derive(Debug)]
pub struct ViewerGuard {
    count: Arc<AtomicUsize>,
}

impl Drop for ViewerGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Result of one poll tick.
#[derive(Debug)]
pub enum TickOutcome {
    /// No viewers connected, no recomputation performed
    Skipped,
    /// A fresh snapshot was produced
    Snapshot(Box<Snapshot>),
    /// The recomputation pass failed; the loop keeps running
    Failed(String),
}

/// Drives periodic snapshot recomputation.
pub struct Monitor {
    aggregator: Aggregator,
    viewers: ViewerRegistry,
}

impl Monitor {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            aggregator,
            viewers: ViewerRegistry::new(),
        }
    }

    /// Registry handle for the delivery layer to register viewers on.
    pub fn viewers(&self) -> ViewerRegistry {
        self.viewers.clone()
    }

    /// Run one tick: skip when nobody is watching, otherwise recompute.
    ///
    /// A failed pass is reported, never propagated; the next tick
    /// starts clean.
    pub fn tick(&self) -> TickOutcome {
        if self.viewers.viewer_count() == 0 {
            tracing::trace!("No viewers connected, skipping tick");
            return TickOutcome::Skipped;
        }

        match self.aggregator.snapshot() {
            Ok(snapshot) => {
                tracing::debug!(
                    agents = snapshot.agents.len(),
                    total_tokens = snapshot.fleet.total_tokens,
                    "Snapshot recomputed"
                );
                TickOutcome::Snapshot(Box::new(snapshot))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Snapshot pass failed");
                TickOutcome::Failed(e.to_string())
            }
        }
    }

    /// Recompute once regardless of viewer count.
    pub fn force_snapshot(&self) -> crate::error::Result<Snapshot> {
        self.aggregator.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PricingConfig;
    use std::path::PathBuf;

    fn monitor() -> Monitor {
        Monitor::new(Aggregator::new(
            PathBuf::from("/nonexistent/fleet"),
            PricingConfig::default(),
            "read".to_string(),
        ))
    }

    #[test]
    fn test_viewer_guard_decrements_on_drop() {
        let registry = ViewerRegistry::new();
        assert_eq!(registry.viewer_count(), 0);

        let g1 = registry.connect();
        let g2 = registry.connect();
        assert_eq!(registry.viewer_count(), 2);

        drop(g1);
        assert_eq!(registry.viewer_count(), 1);
        drop(g2);
        assert_eq!(registry.viewer_count(), 0);
    }

    #[test]
    fn test_tick_skipped_without_viewers() {
        let monitor = monitor();
        assert!(matches!(monitor.tick(), TickOutcome::Skipped));
    }

    #[test]
    fn test_tick_with_viewer_produces_snapshot() {
        let monitor = monitor();
        let _guard = monitor.viewers().connect();

        // Missing root is degraded data, not a failure
        match monitor.tick() {
            TickOutcome::Snapshot(snapshot) => {
                assert!(snapshot.agents.is_empty());
                assert_eq!(snapshot.fleet.agent_count, 0);
            }
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[test]
    fn test_force_snapshot_ignores_viewers() {
        let monitor = monitor();
        let snapshot = monitor.force_snapshot().unwrap();
        assert!(snapshot.agents.is_empty());
    }
}
