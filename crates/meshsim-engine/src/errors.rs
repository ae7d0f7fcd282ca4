//! # meshsim-engine::errors
//!
//! The runtime error taxonomy. Validation errors
//! (`ScenarioError`, `ConfigError`) live in `meshsim-types` and are fatal
//! before a simulation starts; everything here is a runtime outcome the
//! Driver either propagates to its caller (lifecycle/registry failures on
//! the direct API) or logs and skips (malformed scenario events, per §7's
//! "scenarios must not abort a long simulation over one malformed event").

use meshsim_types::id::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("node {0} is already running")]
    AlreadyRunning(NodeId),
    #[error("node {0} is not running")]
    NotRunning(NodeId),
    #[error("duplicate node id/alias: {0}")]
    DuplicateId(String),
    #[error("population cap exceeded: {current} + {requested} > {cap}")]
    CapExceeded {
        current: usize,
        requested: usize,
        cap: usize,
    },
    #[error("node not found: {0}")]
    NotFound(String),
    #[error("malformed event: {0}")]
    InvalidEvent(String),
    #[error("no firmware registered under name '{requested}'; known: {known:?}")]
    UnknownFirmware { requested: String, known: Vec<String> },
}
