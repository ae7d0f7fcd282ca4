//! # meshsim-engine::net::link
//!
//! `LinkState`: the scenario-wide default impairment
//! configuration plus per-directional overrides, the hard-drop set, and
//! the cumulative per-link stats. `NetworkPlane` consults this on every
//! `send`; nothing here mutates the pending-delivery queue itself.

use fxhash::{FxHashMap, FxHashSet};
use meshsim_types::config::{BandwidthConfig, LatencyConfig, LatencyDistribution, PacketLossConfig};
use meshsim_types::errors::ConfigError;
use meshsim_types::id::LinkKey;
use meshsim_types::metrics_model::LinkStats;

#[derive(Debug, Clone, Default)]
pub struct LinkOverrides {
    pub latency: Option<LatencyConfig>,
    pub loss: Option<PacketLossConfig>,
    pub bandwidth: Option<BandwidthConfig>,
}

pub struct LinkState {
    default_latency: LatencyConfig,
    default_loss: PacketLossConfig,
    default_bandwidth: BandwidthConfig,
    overrides: FxHashMap<LinkKey, LinkOverrides>,
    dropped: FxHashSet<LinkKey>,
    stats: FxHashMap<LinkKey, LinkStats>,
}

impl Default for LinkState {
    fn default() -> Self {
        Self {
            default_latency: LatencyConfig::default(),
            default_loss: PacketLossConfig::default(),
            default_bandwidth: BandwidthConfig::default(),
            overrides: FxHashMap::default(),
            dropped: FxHashSet::default(),
            stats: FxHashMap::default(),
        }
    }
}

impl LinkState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_latency_set(&mut self, cfg: LatencyConfig) -> Result<(), ConfigError> {
        cfg.validate()?;
        self.default_latency = cfg;
        Ok(())
    }

    pub fn default_loss_set(&mut self, cfg: PacketLossConfig) -> Result<(), ConfigError> {
        cfg.validate()?;
        self.default_loss = cfg;
        Ok(())
    }

    pub fn default_bandwidth_set(&mut self, cfg: BandwidthConfig) -> Result<(), ConfigError> {
        cfg.validate()?;
        self.default_bandwidth = cfg;
        Ok(())
    }

    pub fn override_latency(&mut self, key: LinkKey, cfg: LatencyConfig) -> Result<(), ConfigError> {
        cfg.validate()?;
        self.overrides.entry(key).or_default().latency = Some(cfg);
        Ok(())
    }

    pub fn override_loss(&mut self, key: LinkKey, cfg: PacketLossConfig) -> Result<(), ConfigError> {
        cfg.validate()?;
        self.overrides.entry(key).or_default().loss = Some(cfg);
        Ok(())
    }

    pub fn override_bandwidth(&mut self, key: LinkKey, cfg: BandwidthConfig) -> Result<(), ConfigError> {
        cfg.validate()?;
        self.overrides.entry(key).or_default().bandwidth = Some(cfg);
        Ok(())
    }

    pub fn resolve_latency(&self, key: LinkKey) -> LatencyConfig {
        self.overrides
            .get(&key)
            .and_then(|o| o.latency)
            .unwrap_or(self.default_latency)
    }

    pub fn resolve_loss(&self, key: LinkKey) -> PacketLossConfig {
        self.overrides
            .get(&key)
            .and_then(|o| o.loss)
            .unwrap_or(self.default_loss)
    }

    pub fn resolve_bandwidth(&self, key: LinkKey) -> BandwidthConfig {
        self.overrides
            .get(&key)
            .and_then(|o| o.bandwidth)
            .unwrap_or(self.default_bandwidth)
    }

    /// Atomically toggles the hard-drop flag for this direction. Both
    /// directions of a bidirectional cut must be dropped independently
    /// — `ConnectionDrop` does this by calling `drop`
    /// twice, once per `LinkKey` direction.
    pub fn drop(&mut self, key: LinkKey) {
        self.dropped.insert(key);
    }

    pub fn restore(&mut self, key: LinkKey) {
        self.dropped.remove(&key);
    }

    pub fn is_dropped(&self, key: LinkKey) -> bool {
        self.dropped.contains(&key)
    }

    /// Clears every hard-drop flag scenario-wide. Invoked only by
    /// `NetworkHeal`.
    pub fn restore_all(&mut self) {
        self.dropped.clear();
    }

    pub fn stats(&self, key: LinkKey) -> LinkStats {
        self.stats.get(&key).copied().unwrap_or_default()
    }

    pub fn stats_mut(&mut self, key: LinkKey) -> &mut LinkStats {
        self.stats.entry(key).or_default()
    }

    pub fn active_links(&self) -> impl Iterator<Item = (LinkKey, &LinkStats)> {
        self.stats.iter().map(|(k, v)| (*k, v))
    }
}

/// `SetNetworkQuality`'s exact quality→config mapping:
/// latency scales linearly between `(5, 15)` ms at `quality=1` and
/// `(500, 2000)` ms at `quality=0`; loss scales linearly from `0` to `0.5`.
pub fn quality_to_configs(quality: f64) -> (LatencyConfig, PacketLossConfig) {
    let q = quality.clamp(0.0, 1.0);
    let min_ms = lerp(500.0, 5.0, q).round() as u64;
    let max_ms = lerp(2000.0, 15.0, q).round() as u64;
    let probability = lerp(0.5, 0.0, q);
    (
        LatencyConfig {
            min_ms,
            max_ms,
            distribution: LatencyDistribution::Uniform,
        },
        PacketLossConfig {
            probability,
            burst_mode: false,
            burst_length: 1,
        },
    )
}

fn lerp(from_q0: f64, to_q1: f64, q: f64) -> f64 {
    from_q0 + (to_q1 - from_q0) * q
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshsim_types::id::NodeId;

    fn key() -> LinkKey {
        LinkKey::new(NodeId::new(1).unwrap(), NodeId::new(2).unwrap())
    }

    #[test]
    fn override_shadows_default() {
        let mut ls = LinkState::new();
        let k = key();
        assert_eq!(ls.resolve_latency(k), LatencyConfig::default());
        ls.override_latency(
            k,
            LatencyConfig {
                min_ms: 1,
                max_ms: 2,
                distribution: LatencyDistribution::Uniform,
            },
        )
        .unwrap();
        assert_eq!(ls.resolve_latency(k).min_ms, 1);
        // The reverse direction is unaffected — overrides are directional.
        assert_eq!(ls.resolve_latency(k.reverse()).min_ms, ls.default_latency.min_ms);
    }

    #[test]
    fn drop_then_restore_round_trips() {
        let mut ls = LinkState::new();
        let k = key();
        assert!(!ls.is_dropped(k));
        ls.drop(k);
        assert!(ls.is_dropped(k));
        ls.restore(k);
        assert!(!ls.is_dropped(k));
    }

    #[test]
    fn restore_all_clears_every_drop() {
        let mut ls = LinkState::new();
        let a = key();
        let b = a.reverse();
        ls.drop(a);
        ls.drop(b);
        ls.restore_all();
        assert!(!ls.is_dropped(a) && !ls.is_dropped(b));
    }

    #[test]
    fn quality_one_is_near_perfect() {
        let (lat, loss) = quality_to_configs(1.0);
        assert_eq!(lat.min_ms, 5);
        assert_eq!(lat.max_ms, 15);
        assert_eq!(loss.probability, 0.0);
    }

    #[test]
    fn quality_zero_is_near_unusable() {
        let (lat, loss) = quality_to_configs(0.0);
        assert_eq!(lat.min_ms, 500);
        assert_eq!(lat.max_ms, 2000);
        assert_eq!(loss.probability, 0.5);
    }

    #[test]
    fn rejects_invalid_override() {
        let mut ls = LinkState::new();
        let err = ls.override_latency(
            key(),
            LatencyConfig {
                min_ms: 10,
                max_ms: 1,
                distribution: LatencyDistribution::Uniform,
            },
        );
        assert!(err.is_err());
    }
}
