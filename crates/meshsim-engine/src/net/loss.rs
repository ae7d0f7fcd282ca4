//! # meshsim-engine::net::loss
//!
//! The per-link packet-loss state machine: *idle* rolls a Bernoulli trial per packet, *bursting* drops
//! unconditionally until its counter runs out. A burst may re-trigger
//! immediately on the very next packet — this is implemented simply by
//! never special-casing the idle roll that follows a burst's end.

use meshsim_types::config::PacketLossConfig;
use rand::Rng;
use rand_chacha::ChaCha20Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Bursting { remaining: u32 },
}

#[derive(Debug, Clone)]
pub struct LossState {
    state: State,
}

impl Default for LossState {
    fn default() -> Self {
        Self { state: State::Idle }
    }
}

impl LossState {
    /// Evaluates one packet against `cfg`, advancing the state machine.
    /// Returns `true` if the packet should be dropped.
    pub fn roll(&mut self, rng: &mut ChaCha20Rng, cfg: &PacketLossConfig) -> bool {
        match self.state {
            State::Bursting { remaining } => {
                let next = remaining - 1;
                self.state = if next == 0 {
                    State::Idle
                } else {
                    State::Bursting { remaining: next }
                };
                true
            }
            State::Idle => {
                let hit = rng.gen_bool(cfg.probability.clamp(0.0, 1.0));
                if hit {
                    if cfg.burst_mode && cfg.burst_length > 0 {
                        self.state = State::Bursting {
                            remaining: cfg.burst_length,
                        };
                    }
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn zero_probability_never_drops_outside_a_burst() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut state = LossState::default();
        let cfg = PacketLossConfig {
            probability: 0.0,
            burst_mode: false,
            burst_length: 1,
        };
        for _ in 0..1000 {
            assert!(!state.roll(&mut rng, &cfg));
        }
    }

    #[test]
    fn certain_probability_always_drops() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let mut state = LossState::default();
        let cfg = PacketLossConfig {
            probability: 1.0,
            burst_mode: false,
            burst_length: 1,
        };
        for _ in 0..10 {
            assert!(state.roll(&mut rng, &cfg));
        }
    }

    #[test]
    fn burst_drops_burst_length_packets_after_the_trigger() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let mut state = LossState::default();
        let cfg = PacketLossConfig {
            probability: 1.0,
            burst_mode: true,
            burst_length: 5,
        };
        // The triggering idle-roll hit is itself dropped and arms the burst
        // counter; it does not count against burst_length.
        assert!(state.roll(&mut rng, &cfg));
        // The burst_length packets that follow, all dropped while bursting.
        for _ in 0..5 {
            assert!(state.roll(&mut rng, &cfg));
        }
        assert_eq!(state.state, State::Idle);
    }

    #[test]
    fn a_forced_burst_drops_exactly_burst_length_packets() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let mut state = LossState {
            state: State::Bursting { remaining: 5 },
        };
        let cfg = PacketLossConfig {
            probability: 0.0001,
            burst_mode: true,
            burst_length: 5,
        };
        for _ in 0..5 {
            assert!(state.roll(&mut rng, &cfg));
        }
        assert_eq!(state.state, State::Idle);
    }
}
