//! # meshsim-types::metrics
//!
//! Constants for `metrics` crate recorder names and labels. Centralizing
//! these prevents typos and keeps the engine (which emits them) and any
//! external dashboard (which scrapes them) in agreement.

pub const MET_NET_MSG_SENT: &str = "meshsim_net_messages_sent_total";
pub const MET_NET_MSG_DELIVERED: &str = "meshsim_net_messages_delivered_total";
pub const MET_NET_MSG_DROPPED_LOSS: &str = "meshsim_net_messages_dropped_loss_total";
pub const MET_NET_MSG_THROTTLED: &str = "meshsim_net_messages_throttled_bandwidth_total";
pub const MET_NET_MSG_BLOCKED_PARTITION: &str = "meshsim_net_messages_blocked_partition_total";
pub const MET_NET_MSG_BLOCKED_UNKNOWN: &str = "meshsim_net_messages_blocked_unknown_total";
pub const MET_NODE_STARTED: &str = "meshsim_node_started_total";
pub const MET_NODE_STOPPED: &str = "meshsim_node_stopped_total";
pub const MET_NODE_CRASHED: &str = "meshsim_node_crashed_total";
pub const MET_NODE_RESTARTED: &str = "meshsim_node_restarted_total";
pub const MET_LATENCY_HISTO: &str = "meshsim_net_latency_ms";
pub const MET_NODES_UP_GAUGE: &str = "meshsim_nodes_up";
pub const MET_LINKS_PARTITIONED_GAUGE: &str = "meshsim_links_partitioned";

pub const LBL_NODE: &str = "node";
pub const LBL_SRC: &str = "src";
pub const LBL_DST: &str = "dst";
pub const LBL_REASON: &str = "reason";
