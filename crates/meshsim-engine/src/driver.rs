//! # meshsim-engine::driver
//!
//! The tick loop: advance the clock by one `tick_delta_ms` step, dispatch
//! every event now due, deliver every packet now ready, tick every running
//! node, then optionally sleep to pace real time.
//! `World`'s arena (`NodeRegistry::take`/`put_back`) gives the Driver
//! disjoint borrows into node state without `unsafe`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use meshsim_types::time::SimTime;

use crate::control::{ControlMsg, DriverState};
use crate::events::Event;
use crate::telemetry::{self, TelemetryBus};
use crate::world::World;

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Simulated milliseconds advanced per loop iteration.
    pub tick_delta_ms: SimTime,
    /// `None` means unbounded (run until shutdown); matches a scenario's
    /// `duration_s == 0`.
    pub duration_ms: Option<SimTime>,
    /// 0 = as fast as possible, 1.0 = real time, >1.0 = accelerated.
    pub time_scale: f64,
    /// How often (simulated ms) to build and emit a telemetry `Snapshot`.
    /// `None` disables periodic snapshots entirely.
    pub metrics_interval_ms: Option<SimTime>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_delta_ms: 10,
            duration_ms: None,
            time_scale: 1.0,
            metrics_interval_ms: None,
        }
    }
}

/// Owns one `World` and drives it tick by tick. The only other thread this
/// ever talks to is an optional TUI, over `control_rx` (operator intent in)
/// and `telemetry` (snapshots out) — both bounded `crossbeam_channel`s in a
/// single-writer model.
pub struct Driver {
    world: World,
    config: DriverConfig,
    state: DriverState,
    control_rx: Option<Receiver<ControlMsg>>,
    telemetry: Option<TelemetryBus>,
    shutdown: Option<Arc<AtomicBool>>,
    next_metrics_at: SimTime,
}

impl Driver {
    pub fn new(world: World, config: DriverConfig) -> Self {
        Self {
            world,
            config,
            state: DriverState::Running,
            control_rx: None,
            telemetry: None,
            shutdown: None,
            next_metrics_at: 0,
        }
    }

    pub fn set_control_channel(&mut self, rx: Receiver<ControlMsg>) {
        self.control_rx = Some(rx);
    }

    pub fn set_telemetry(&mut self, bus: TelemetryBus) {
        self.telemetry = Some(bus);
    }

    /// Installs the flag a SIGINT handler sets; the Driver checks it at
    /// every tick boundary.
    pub fn set_shutdown_flag(&mut self, flag: Arc<AtomicBool>) {
        self.shutdown = Some(flag);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn now(&self) -> SimTime {
        self.world.clock.now()
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().map(|f| f.load(Ordering::Relaxed)).unwrap_or(false)
    }

    /// Drains and applies every queued control message. A control message
    /// expresses "do this now"; most variants translate into an `Event`
    /// scheduled at the current clock time, so operator-driven and
    /// scenario-driven state changes go through the identical, logged path.
    fn process_control_messages(&mut self) {
        let Some(rx) = &self.control_rx else { return };
        let messages: Vec<ControlMsg> = rx.try_iter().collect();
        for msg in messages {
            self.handle_control_message(msg);
        }
    }

    fn handle_control_message(&mut self, msg: ControlMsg) {
        let now = self.world.clock.now();
        match msg {
            ControlMsg::Pause => {
                tracing::info!(simulation_time = now, "paused by operator");
                self.state = DriverState::Paused;
            }
            ControlMsg::Resume => {
                tracing::info!(simulation_time = now, "resumed by operator");
                self.state = DriverState::Running;
            }
            ControlMsg::Step => {
                self.state = DriverState::Stepping;
            }
            ControlMsg::KillNode(id) => {
                self.world.scheduler.schedule(now, Event::NodeCrash(id), &mut self.world.ids);
            }
            ControlMsg::RestartNode(id) => {
                self.world.scheduler.schedule(now, Event::NodeRestart(id), &mut self.world.ids);
            }
            ControlMsg::InjectPartition { groups } => {
                self.world
                    .scheduler
                    .schedule(now, Event::NetworkPartition { groups }, &mut self.world.ids);
            }
            ControlMsg::HealPartition => {
                self.world.scheduler.schedule(now, Event::NetworkHeal, &mut self.world.ids);
            }
            ControlMsg::SetSpeed(scale) => {
                self.config.time_scale = scale.max(0.0);
            }
            ControlMsg::Shutdown => {
                self.state = DriverState::Completed;
            }
        }
    }

    /// Applies every event due `at`, logging and skipping whichever ones
    /// fail rather than aborting the run.
    fn dispatch_due(&mut self, at: SimTime) {
        for event in self.world.scheduler.drain_due(at) {
            if let Err(err) = self.world.apply_event(event) {
                tracing::warn!(simulation_time = at, component = "scheduler", error = %err, "event skipped");
            }
        }
    }

    fn maybe_emit_snapshot(&mut self, now: SimTime) {
        let Some(interval) = self.config.metrics_interval_ms else { return };
        if interval == 0 || now < self.next_metrics_at {
            return;
        }
        if let Some(bus) = &self.telemetry {
            let snapshot = telemetry::build(&self.world, now);
            bus.send_snapshot(snapshot);
        }
        self.next_metrics_at = now + interval;
    }

    fn sleep_for_tick(&self) {
        if self.config.time_scale > 0.0 {
            let scaled = (self.config.tick_delta_ms as f64 / self.config.time_scale).round().max(0.0) as u64;
            if scaled > 0 {
                std::thread::sleep(Duration::from_millis(scaled));
            }
        }
    }

    /// One iteration of the loop: advance → dispatch due events → deliver
    /// ready packets → tick every running node. Does not itself sleep or
    /// check stop conditions — `run` wraps this with pacing and the
    /// duration/shutdown checks.
    pub fn tick(&mut self) {
        let target = self.world.clock.now() + self.config.tick_delta_ms;
        self.world.clock.advance_to(target);
        let now = self.world.clock.now();
        self.dispatch_due(now);
        self.world.deliver_ready();
        self.world.tick_all();
        self.maybe_emit_snapshot(now);
    }

    fn duration_reached(&self) -> bool {
        match self.config.duration_ms {
            Some(d) if d > 0 => self.world.clock.now() >= d,
            _ => false,
        }
    }

    /// Runs to completion: until the scenario's duration elapses, an
    /// operator requests shutdown, or the OS signals one via the shutdown
    /// flag. Blocks on `Paused`; pauses itself again after one `Stepping`
    /// tick.
    pub fn run(&mut self) {
        loop {
            self.process_control_messages();

            if self.shutdown_requested() {
                self.state = DriverState::Completed;
            }
            if self.state == DriverState::Completed {
                break;
            }
            if self.state == DriverState::Paused {
                std::thread::sleep(Duration::from_millis(50));
                continue;
            }

            self.tick();
            self.sleep_for_tick();

            if self.state == DriverState::Stepping {
                self.state = DriverState::Paused;
            }
            if self.duration_reached() {
                self.state = DriverState::Completed;
                break;
            }
        }
        if let Some(bus) = &self.telemetry {
            bus.send_snapshot(telemetry::build(&self.world, self.world.clock.now()));
        }
        tracing::info!(simulation_time = self.world.clock.now(), "simulation finished");
    }

    /// Runs until simulated time reaches `stop_at`, honoring pause/step the
    /// same way `run` does. Used by tests that want a bounded run without a
    /// scenario-level duration.
    pub fn run_until(&mut self, stop_at: SimTime) {
        loop {
            self.process_control_messages();

            if self.shutdown_requested() || self.state == DriverState::Completed {
                break;
            }
            if self.state == DriverState::Paused {
                std::thread::sleep(Duration::from_millis(50));
                continue;
            }
            if self.world.clock.now() >= stop_at {
                break;
            }

            self.tick();
            self.sleep_for_tick();

            if self.state == DriverState::Stepping {
                self.state = DriverState::Paused;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxhash::FxHashMap;
    use meshsim_proto::FirmwareFactory;
    use meshsim_types::node_config::{MeshGroupConfig, NodeConfig};

    fn echo_factory() -> FxHashMap<String, FirmwareFactory> {
        fn make_echo() -> Box<dyn meshsim_proto::Firmware> {
            Box::new(meshsim_proto::firmware::echo::Echo::default())
        }
        let mut m: FxHashMap<String, FirmwareFactory> = FxHashMap::default();
        m.insert("echo".to_string(), make_echo);
        m
    }

    fn node(alias: &str) -> NodeConfig {
        NodeConfig {
            alias: alias.into(),
            mesh_group: MeshGroupConfig {
                prefix: "mesh".into(),
                password: "secret".into(),
                port: 4403,
            },
            firmware: None,
            firmware_params: Default::default(),
            partition_id: 0,
        }
    }

    #[test]
    fn tick_advances_clock_by_tick_delta() {
        let mut world = World::new(10, 1, echo_factory());
        world.spawn_node(node("a"), None).unwrap();
        let mut driver = Driver::new(world, DriverConfig { tick_delta_ms: 10, ..Default::default() });
        driver.tick();
        assert_eq!(driver.now(), 10);
        driver.tick();
        assert_eq!(driver.now(), 20);
    }

    #[test]
    fn run_until_stops_at_target_time_without_overshoot_by_more_than_one_tick() {
        let mut world = World::new(10, 1, echo_factory());
        world.spawn_node(node("a"), None).unwrap();
        let mut driver = Driver::new(
            world,
            DriverConfig {
                tick_delta_ms: 10,
                time_scale: 0.0,
                ..Default::default()
            },
        );
        driver.run_until(95);
        assert!(driver.now() >= 95);
        assert!(driver.now() < 105);
    }

    #[test]
    fn shutdown_flag_stops_the_run_loop() {
        let mut world = World::new(10, 1, echo_factory());
        world.spawn_node(node("a"), None).unwrap();
        let mut driver = Driver::new(
            world,
            DriverConfig {
                tick_delta_ms: 10,
                time_scale: 0.0,
                ..Default::default()
            },
        );
        let flag = Arc::new(AtomicBool::new(true));
        driver.set_shutdown_flag(flag);
        driver.run();
        assert_eq!(driver.state(), DriverState::Completed);
    }
}
