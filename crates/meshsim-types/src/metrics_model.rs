//! # meshsim-types::metrics_model
//!
//! The shapes that flow out of the simulation: per-node and per-link
//! cumulative counters, and the periodic `Snapshot` built from them for
//! export or live viewing.

use serde::{Deserialize, Serialize};

use crate::id::{LinkKey, NodeId};
use crate::time::SimTime;

/// Cumulative, monotonic per-node counters. Reset only on node recreation
/// by default; a scenario may opt into reset-on-restart (see `DESIGN.md`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub start_time: SimTime,
}

/// Running latency statistics for one directional link.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatencyStats {
    pub min_ms: u64,
    pub max_ms: u64,
    pub running_mean_ms: f64,
    samples: u64,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self {
            min_ms: u64::MAX,
            max_ms: 0,
            running_mean_ms: 0.0,
            samples: 0,
        }
    }
}

impl LatencyStats {
    pub fn record(&mut self, sample_ms: u64) {
        self.min_ms = self.min_ms.min(sample_ms);
        self.max_ms = self.max_ms.max(sample_ms);
        self.samples += 1;
        self.running_mean_ms += (sample_ms as f64 - self.running_mean_ms) / self.samples as f64;
    }

    pub fn min(&self) -> u64 {
        if self.samples == 0 { 0 } else { self.min_ms }
    }
}

/// Per-directional-link cumulative counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LinkStats {
    pub messages_sent: u64,
    pub messages_delivered: u64,
    pub messages_dropped_loss: u64,
    pub messages_throttled_bandwidth: u64,
    pub messages_blocked_partition: u64,
    pub messages_blocked_unknown: u64,
    pub messages_undeliverable_at_delivery: u64,
    pub latency: LatencyStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub alias: String,
    pub running: bool,
    pub partition_id: u32,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSnapshot {
    pub from: NodeId,
    pub to: NodeId,
    pub messages_sent: u64,
    pub messages_delivered: u64,
    pub messages_dropped_loss: u64,
    pub messages_throttled_bandwidth: u64,
    pub messages_blocked_partition: u64,
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,
    pub latency_mean_ms: f64,
}

impl LinkSnapshot {
    pub fn from_key_and_stats(key: LinkKey, stats: &LinkStats) -> Self {
        Self {
            from: key.from,
            to: key.to,
            messages_sent: stats.messages_sent,
            messages_delivered: stats.messages_delivered,
            messages_dropped_loss: stats.messages_dropped_loss,
            messages_throttled_bandwidth: stats.messages_throttled_bandwidth,
            messages_blocked_partition: stats.messages_blocked_partition,
            latency_min_ms: stats.latency.min(),
            latency_max_ms: stats.latency.max_ms,
            latency_mean_ms: stats.latency.running_mean_ms,
        }
    }
}

/// One point-in-time view of the whole simulation, produced periodically
/// per `metrics.interval_s` and once more at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub sim_time: SimTime,
    pub nodes: Vec<NodeSnapshot>,
    pub links: Vec<LinkSnapshot>,
}
