//! # meshsim-cli::export
//!
//! Writes periodic `Snapshot`s to disk in the formats a scenario's
//! `metrics.export` list names: CSV
//! (one row per node/link per sample), JSON Lines (one `Snapshot` per
//! line), and Graphviz (the latest topology, rewritten each sample since a
//! `.dot` graph has no notion of a time series).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use meshsim_types::metrics_model::Snapshot;
use meshsim_types::scenario::ExportFormat;

pub struct Exporter {
    dir: PathBuf,
    formats: Vec<ExportFormat>,
    node_csv: Option<csv::Writer<File>>,
    link_csv: Option<csv::Writer<File>>,
    json_lines: Option<File>,
}

#[derive(serde::Serialize)]
struct NodeRow<'a> {
    sim_time: u64,
    id: u32,
    alias: &'a str,
    running: bool,
    partition_id: u32,
    messages_sent: u64,
    messages_received: u64,
    bytes_sent: u64,
    bytes_received: u64,
}

#[derive(serde::Serialize)]
struct LinkRow {
    sim_time: u64,
    from: u32,
    to: u32,
    messages_sent: u64,
    messages_delivered: u64,
    messages_dropped_loss: u64,
    messages_throttled_bandwidth: u64,
    messages_blocked_partition: u64,
    latency_min_ms: u64,
    latency_max_ms: u64,
    latency_mean_ms: f64,
}

impl Exporter {
    pub fn new(dir: &Path, formats: Vec<ExportFormat>) -> Result<Self> {
        std::fs::create_dir_all(dir).with_context(|| format!("creating output directory {}", dir.display()))?;

        let node_csv = if formats.iter().any(|f| matches!(f, ExportFormat::Csv)) {
            Some(csv::Writer::from_path(dir.join("nodes.csv"))?)
        } else {
            None
        };
        let link_csv = if formats.iter().any(|f| matches!(f, ExportFormat::Csv)) {
            Some(csv::Writer::from_path(dir.join("links.csv"))?)
        } else {
            None
        };
        let json_lines = if formats.iter().any(|f| matches!(f, ExportFormat::Json)) {
            Some(
                OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(dir.join("snapshots.jsonl"))?,
            )
        } else {
            None
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            formats,
            node_csv,
            link_csv,
            json_lines,
        })
    }

    pub fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        if let Some(writer) = &mut self.node_csv {
            for node in &snapshot.nodes {
                writer.serialize(NodeRow {
                    sim_time: snapshot.sim_time,
                    id: node.id.get(),
                    alias: &node.alias,
                    running: node.running,
                    partition_id: node.partition_id,
                    messages_sent: node.messages_sent,
                    messages_received: node.messages_received,
                    bytes_sent: node.bytes_sent,
                    bytes_received: node.bytes_received,
                })?;
            }
            writer.flush()?;
        }

        if let Some(writer) = &mut self.link_csv {
            for link in &snapshot.links {
                writer.serialize(LinkRow {
                    sim_time: snapshot.sim_time,
                    from: link.from.get(),
                    to: link.to.get(),
                    messages_sent: link.messages_sent,
                    messages_delivered: link.messages_delivered,
                    messages_dropped_loss: link.messages_dropped_loss,
                    messages_throttled_bandwidth: link.messages_throttled_bandwidth,
                    messages_blocked_partition: link.messages_blocked_partition,
                    latency_min_ms: link.latency_min_ms,
                    latency_max_ms: link.latency_max_ms,
                    latency_mean_ms: link.latency_mean_ms,
                })?;
            }
            writer.flush()?;
        }

        if let Some(file) = &mut self.json_lines {
            serde_json::to_writer(&mut *file, snapshot)?;
            writeln!(file)?;
        }

        if self.formats.iter().any(|f| matches!(f, ExportFormat::Graphviz)) {
            self.write_graphviz(snapshot)?;
        }

        Ok(())
    }

    fn write_graphviz(&self, snapshot: &Snapshot) -> Result<()> {
        let mut out = String::from("digraph mesh {\n");
        for node in &snapshot.nodes {
            let color = if node.running { "black" } else { "gray" };
            out.push_str(&format!(
                "  n{} [label=\"{} ({})\", color={}];\n",
                node.id.get(),
                node.alias,
                node.id.get(),
                color
            ));
        }
        for link in &snapshot.links {
            out.push_str(&format!(
                "  n{} -> n{} [label=\"{:.1}ms\"];\n",
                link.from.get(),
                link.to.get(),
                link.latency_mean_ms
            ));
        }
        out.push_str("}\n");
        std::fs::write(self.dir.join("topology.dot"), out)?;
        Ok(())
    }
}
