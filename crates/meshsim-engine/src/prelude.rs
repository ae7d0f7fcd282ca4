//! # meshsim-engine::prelude
//!
//! A convenience module that re-exports the most commonly used types from
//! the engine and its dependencies, so downstream crates don't have to
//! chase individual submodule paths.

pub use crate::{
    clock::Clock,
    control::{ControlMsg, DriverState},
    driver::{Driver, DriverConfig},
    errors::EngineError,
    events::{Event, EventScheduler, Queued},
    ids::IdGen,
    net::{LinkState, NetworkPlane, SendOutcome},
    node::{NodeRegistry, VirtualNode},
    rng::Rng,
    scenario_runtime::build_world,
    telemetry::TelemetryBus,
    world::{NodeTemplate, World},
};

pub use meshsim_types::{
    self, config::*, envelope::*, errors::*, id::*, metrics::*, metrics_model::*, node_config::*,
    scenario::*, time::*, topology::*,
};

pub use meshsim_proto::{self, api::*, ctx_ext::*, FirmwareFactory};
