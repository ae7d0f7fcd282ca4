//! # meshsim-types::errors
//!
//! Error types shared across the workspace. Using `thiserror` keeps every
//! variant a plain data value with a deterministic `Display` impl, which
//! matters for error messages that end up in logs compared across runs.

use thiserror::Error;

use crate::time::SimTime;

/// Errors that can occur while manipulating core simulation values
/// (time arithmetic, identifier construction) independent of any one crate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    #[error("simulation time overflow: {base} + {offset}")]
    TimeOverflow { base: SimTime, offset: SimTime },
    #[error("simulation time underflow: {base} - {offset}")]
    TimeUnderflow { base: SimTime, offset: SimTime },
    #[error("node identifier must be non-zero")]
    ZeroNodeId,
}

/// Errors raised while loading or validating a scenario document.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("I/O error reading scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported scenario file extension (expected .yaml, .yml, or .toml)")]
    UnsupportedExtension,
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Carries every validation violation found, not just the first, so a
    /// scenario author sees the whole list in one pass.
    #[error("scenario '{name}' failed validation:\n{}", .violations.join("\n"))]
    Invalid { name: String, violations: Vec<String> },
}

/// Configuration-level invariant violations for the per-link impairment
/// configs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("latency config: min_ms ({min_ms}) must be <= max_ms ({max_ms})")]
    LatencyRange { min_ms: u64, max_ms: u64 },
    #[error("packet loss probability {0} is out of range [0,1]")]
    LossProbabilityRange(String),
    #[error("packet loss burst_length must be > 0 when burst_mode is enabled")]
    ZeroBurstLength,
    #[error("bandwidth rate must be non-negative")]
    NegativeBandwidthRate,
}
