//! # meshsim-engine::net::distribution
//!
//! Latency sampling against exact per-distribution formulas. These are
//! hand-rolled against `[min_ms, max_ms]` rather than built from a
//! general-purpose distribution crate, because the target mean/stddev/
//! clamping behavior is pinned down precisely enough that a
//! library's own parameterization would have to be fought back into shape
//! anyway.

use meshsim_types::config::{LatencyConfig, LatencyDistribution};
use meshsim_types::time::SimTime;
use rand::Rng;
use rand_chacha::ChaCha20Rng;

/// Draws one delay sample in `[min_ms, max_ms]` per `cfg.distribution`.
pub fn sample_latency(rng: &mut ChaCha20Rng, cfg: &LatencyConfig) -> SimTime {
    if cfg.min_ms == cfg.max_ms {
        return cfg.min_ms;
    }
    match cfg.distribution {
        LatencyDistribution::Uniform => rng.gen_range(cfg.min_ms..=cfg.max_ms),
        LatencyDistribution::Normal => sample_normal_clamped(rng, cfg),
        LatencyDistribution::Exponential => sample_exponential_clamped(rng, cfg),
    }
}

/// mean = (min+max)/2, std = (max-min)/6 (the ±3σ rule covers ~99.7% of the
/// range), clamped back into `[min, max]` to absorb the tail.
fn sample_normal_clamped(rng: &mut ChaCha20Rng, cfg: &LatencyConfig) -> SimTime {
    let min = cfg.min_ms as f64;
    let max = cfg.max_ms as f64;
    let mean = (min + max) / 2.0;
    let std = (max - min) / 6.0;

    // Box-Muller: turn two uniform draws into one standard-normal sample.
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();

    let sample = mean + z * std;
    sample.clamp(min, max).round() as SimTime
}

/// rate chosen so the mean sits at `min + (max-min)/4`, clamped to
/// `[min, max]`.
fn sample_exponential_clamped(rng: &mut ChaCha20Rng, cfg: &LatencyConfig) -> SimTime {
    let min = cfg.min_ms as f64;
    let max = cfg.max_ms as f64;
    let mean = min + (max - min) / 4.0;
    let rate = if mean > 0.0 { 1.0 / mean } else { 1.0 };

    let u: f64 = rng.gen_range(f64::EPSILON..1.0);
    let sample = min + (-u.ln() / rate);
    sample.clamp(min, max).round() as SimTime
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn cfg(dist: LatencyDistribution) -> LatencyConfig {
        LatencyConfig {
            min_ms: 10,
            max_ms: 100,
            distribution: dist,
        }
    }

    #[test]
    fn uniform_respects_bounds() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for _ in 0..500 {
            let s = sample_latency(&mut rng, &cfg(LatencyDistribution::Uniform));
            assert!((10..=100).contains(&s));
        }
    }

    #[test]
    fn normal_respects_bounds() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        for _ in 0..500 {
            let s = sample_latency(&mut rng, &cfg(LatencyDistribution::Normal));
            assert!((10..=100).contains(&s));
        }
    }

    #[test]
    fn exponential_respects_bounds() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        for _ in 0..500 {
            let s = sample_latency(&mut rng, &cfg(LatencyDistribution::Exponential));
            assert!((10..=100).contains(&s));
        }
    }

    #[test]
    fn equal_min_max_is_degenerate() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let cfg = LatencyConfig {
            min_ms: 50,
            max_ms: 50,
            distribution: LatencyDistribution::Normal,
        };
        assert_eq!(sample_latency(&mut rng, &cfg), 50);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let mut a = ChaCha20Rng::seed_from_u64(42);
        let mut b = ChaCha20Rng::seed_from_u64(42);
        let cfg = cfg(LatencyDistribution::Normal);
        let seq_a: Vec<_> = (0..20).map(|_| sample_latency(&mut a, &cfg)).collect();
        let seq_b: Vec<_> = (0..20).map(|_| sample_latency(&mut b, &cfg)).collect();
        assert_eq!(seq_a, seq_b);
    }
}
