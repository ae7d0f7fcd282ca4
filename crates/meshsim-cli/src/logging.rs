//! # meshsim-cli::logging
//!
//! Enhanced logging formatters for better visualization of simulation
//! activity. The simulation clock is millisecond-granular logical time
//! carried on events as a `simulation_time` field, so formatting reads
//! that field directly instead of a wall-clock
//! `Instant`.

use std::fmt;
use tracing::field::Field;
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    fmt::{format::Writer, FormatEvent, FormatFields},
    registry::LookupSpan,
};

fn format_sim_time(sim_time_ms: u64) -> String {
    if sim_time_ms < 1_000 {
        format!("{}ms", sim_time_ms)
    } else {
        format!("{:.3}s", sim_time_ms as f64 / 1_000.0)
    }
}

#[derive(Default)]
struct EventFields {
    node_id: Option<u32>,
    sim_time: Option<u64>,
}

impl tracing::field::Visit for EventFields {
    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "node_id" => self.node_id = Some(value as u32),
            "simulation_time" => self.sim_time = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if value < 0 {
            return;
        }
        match field.name() {
            "node_id" => self.node_id = Some(value as u32),
            "simulation_time" => self.sim_time = Some(value as u64),
            _ => {}
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn fmt::Debug) {}
    fn record_str(&mut self, _field: &Field, _value: &str) {}
    fn record_bool(&mut self, _field: &Field, _value: bool) {}
    fn record_error(&mut self, _field: &Field, _value: &(dyn std::error::Error + 'static)) {}
}

fn extract_fields(event: &Event) -> EventFields {
    let mut visitor = EventFields::default();
    event.record(&mut visitor);
    visitor
}

/// A custom formatter that provides enhanced visualization for simulation events.
pub struct SimulationFormatter;

impl<S, N> FormatEvent<S, N> for SimulationFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let fields = extract_fields(event);

        if let Some(st) = fields.sim_time {
            write!(writer, "\x1b[36m[{}]\x1b[0m ", format_sim_time(st))?;
        }

        let level = metadata.level();
        let level_color = match *level {
            tracing::Level::ERROR => "\x1b[31m", // Red
            tracing::Level::WARN => "\x1b[33m",  // Yellow
            tracing::Level::INFO => "\x1b[32m",  // Green
            tracing::Level::DEBUG => "\x1b[34m", // Blue
            tracing::Level::TRACE => "\x1b[90m", // Gray
        };
        write!(writer, "{}[{:>5}]\x1b[0m ", level_color, level)?;

        if let Some(nid) = fields.node_id {
            write!(writer, "\x1b[35m[N{}]\x1b[0m ", nid)?;
        }

        let target = metadata.target();
        if target != "events" && !target.starts_with(env!("CARGO_PKG_NAME")) {
            write!(writer, "\x1b[90m[{}]\x1b[0m ", target)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// A simpler formatter for headless mode that emphasizes simulation events.
pub struct HeadlessFormatter;

impl<S, N> FormatEvent<S, N> for HeadlessFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        if matches!(*metadata.level(), tracing::Level::DEBUG | tracing::Level::TRACE) {
            return Ok(());
        }

        let fields = extract_fields(event);
        if let Some(st) = fields.sim_time {
            write!(writer, "[{}] ", format_sim_time(st))?;
        }
        match fields.node_id {
            Some(nid) => write!(writer, "N{} ", nid)?,
            None => write!(writer, "--- ")?,
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
