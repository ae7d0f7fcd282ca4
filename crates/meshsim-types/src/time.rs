//! # meshsim-types::time
//!
//! Representation of simulated time. All simulation time is a monotonic
//! logical millisecond counter — it has no relationship to
//! wall-clock time beyond the Driver's optional pacing sleep.

use serde::Deserializer;

use crate::errors::SimError;

/// The fundamental unit of time in the simulation, measured in milliseconds.
pub type SimTime = u64;

/// The start of simulation time.
pub const SIM_EPOCH: SimTime = 0;

/// Converts whole seconds (as used in scenario documents) to milliseconds.
/// Scenario documents use second granularity; the engine stores everything
/// in milliseconds internally.
pub fn sim_from_secs(secs: u64) -> SimTime {
    secs.saturating_mul(1_000)
}

/// Converts fractional seconds to milliseconds, rounding to the nearest ms.
pub fn sim_from_secs_f64(secs: f64) -> SimTime {
    (secs * 1_000.0).round().max(0.0) as SimTime
}

pub fn checked_add(base: SimTime, offset: SimTime) -> Result<SimTime, SimError> {
    base.checked_add(offset)
        .ok_or(SimError::TimeOverflow { base, offset })
}

pub fn checked_sub(base: SimTime, offset: SimTime) -> Result<SimTime, SimError> {
    base.checked_sub(offset)
        .ok_or(SimError::TimeUnderflow { base, offset })
}

/// Custom deserializer accepting either an integer count of whole seconds or
/// a fractional-seconds float from a scenario document, always producing a
/// millisecond `SimTime`. TOML and YAML both happily hand us either shape
/// depending on how a scenario author wrote the duration.
pub fn deserialize_sim_time_secs<'de, D>(deserializer: D) -> Result<SimTime, D::Error>
where
    D: Deserializer<'de>,
{
    struct SecsVisitor;

    impl<'de> serde::de::Visitor<'de> for SecsVisitor {
        type Value = SimTime;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a non-negative number of seconds")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(sim_from_secs(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value < 0 {
                return Err(E::custom("duration cannot be negative"));
            }
            Ok(sim_from_secs(value as u64))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value < 0.0 {
                return Err(E::custom("duration cannot be negative"));
            }
            Ok(sim_from_secs_f64(value))
        }
    }

    deserializer.deserialize_any(SecsVisitor)
}
