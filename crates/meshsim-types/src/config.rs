//! # meshsim-types::config
//!
//! Strongly-typed per-link impairment configuration, mirroring the
//! `network` section of a scenario document. The exact
//! sampling/admission formulas that consume these structs live in
//! `meshsim-engine::net`; this module only owns the data and its
//! validation rules.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// How a link's delivery delay is drawn from `[min_ms, max_ms]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyDistribution {
    Uniform,
    Normal,
    Exponential,
}

/// {min_ms, max_ms, distribution}. Invariant: `min_ms <= max_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyConfig {
    pub min_ms: u64,
    pub max_ms: u64,
    pub distribution: LatencyDistribution,
}

impl LatencyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_ms > self.max_ms {
            return Err(ConfigError::LatencyRange {
                min_ms: self.min_ms,
                max_ms: self.max_ms,
            });
        }
        Ok(())
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            min_ms: 10,
            max_ms: 50,
            distribution: LatencyDistribution::Uniform,
        }
    }
}

/// {probability, burst_mode, burst_length}. Drives the idle/bursting loss
/// state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacketLossConfig {
    pub probability: f64,
    #[serde(default)]
    pub burst_mode: bool,
    #[serde(default = "default_burst_length")]
    pub burst_length: u32,
}

fn default_burst_length() -> u32 {
    1
}

impl PacketLossConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(ConfigError::LossProbabilityRange(self.probability.to_string()));
        }
        if self.burst_mode && self.burst_length == 0 {
            return Err(ConfigError::ZeroBurstLength);
        }
        Ok(())
    }
}

impl Default for PacketLossConfig {
    fn default() -> Self {
        Self {
            probability: 0.0,
            burst_mode: false,
            burst_length: 1,
        }
    }
}

/// {max_bytes_per_sec, max_messages_per_sec, bucket_size}. A rate of zero
/// in either dimension means that dimension is unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandwidthConfig {
    pub max_bytes_per_sec: f64,
    pub max_messages_per_sec: f64,
    pub bucket_size: f64,
}

impl BandwidthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes_per_sec < 0.0
            || self.max_messages_per_sec < 0.0
            || self.bucket_size < 0.0
        {
            return Err(ConfigError::NegativeBandwidthRate);
        }
        Ok(())
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_bytes_per_sec == 0.0 && self.max_messages_per_sec == 0.0
    }
}

impl Default for BandwidthConfig {
    fn default() -> Self {
        Self {
            max_bytes_per_sec: 0.0,
            max_messages_per_sec: 0.0,
            bucket_size: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_rejects_inverted_range() {
        let cfg = LatencyConfig {
            min_ms: 100,
            max_ms: 10,
            distribution: LatencyDistribution::Uniform,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn loss_rejects_out_of_range_probability() {
        let cfg = PacketLossConfig {
            probability: 1.5,
            burst_mode: false,
            burst_length: 1,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn loss_rejects_zero_burst_length_when_bursting() {
        let cfg = PacketLossConfig {
            probability: 0.1,
            burst_mode: true,
            burst_length: 0,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bandwidth_zero_rate_is_unlimited() {
        let cfg = BandwidthConfig {
            max_bytes_per_sec: 0.0,
            max_messages_per_sec: 0.0,
            bucket_size: 0.0,
        };
        assert!(cfg.is_unlimited());
    }
}
