//! Staggered per-agent timers for throttling expensive rescans.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A periodic trigger with an optional randomized initial phase.
///
/// The jitter spreads each agent's expensive work across frames instead of
/// having the whole crew rescan on the same tick. Once expired, the timer
/// resets to exactly its interval, so individual agents keep a steady cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaggeredTimer {
    remaining: f32,
    interval: f32,
}

impl StaggeredTimer {
    /// A timer that first fires after one full interval, with no jitter
    pub fn new(interval: f32) -> Self {
        Self {
            remaining: interval,
            interval,
        }
    }

    /// A timer with a randomized initial phase in [0, interval)
    pub fn jittered(interval: f32, rng: &mut impl Rng) -> Self {
        Self {
            remaining: rng.gen_range(0.0..interval),
            interval,
        }
    }

    /// Advance the timer. Returns true when it expires this tick.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining > 0.0 {
            self.remaining = (self.remaining - dt).max(0.0);
            false
        } else {
            self.remaining = self.interval;
            true
        }
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_jittered_phase_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let timer = StaggeredTimer::jittered(1.0, &mut rng);
            assert!(timer.remaining() >= 0.0);
            assert!(timer.remaining() < 1.0);
        }
    }

    #[test]
    fn test_resets_to_exact_interval() {
        let mut timer = StaggeredTimer::new(1.0);
        // Overshoot past zero, then expire
        assert!(!timer.tick(0.7));
        assert!(!timer.tick(0.7));
        assert_eq!(timer.remaining(), 0.0);
        assert!(timer.tick(0.016));
        assert_eq!(timer.remaining(), 1.0);
    }

    #[test]
    fn test_never_negative() {
        let mut timer = StaggeredTimer::new(0.5);
        for _ in 0..50 {
            timer.tick(0.3);
            assert!(timer.remaining() >= 0.0);
        }
    }
}
