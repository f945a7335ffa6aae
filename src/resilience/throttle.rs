//! Request pacing and client identity rotation.
//!
//! Every live upstream call is preceded by a random delay and carries a
//! randomly chosen client identity. This decorrelates timing and fingerprint
//! to make upstream blocking less likely; nothing depends on it for
//! correctness.

use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};

use crate::config::ThrottleConfig;

/// Randomized delay and identity source.
pub struct Throttle {
    min_delay: Duration,
    max_delay: Duration,
    identities: Vec<String>,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl Throttle {
    /// Build a throttle seeded from OS entropy.
    pub fn new(config: &ThrottleConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Build a throttle over a caller-supplied random source.
    pub fn with_rng<R>(config: &ThrottleConfig, rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        Self {
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            identities: config.identities.clone(),
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// Delay drawn uniformly from `[min_delay, max_delay]`.
    pub fn next_delay(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        if max <= min {
            return self.min_delay;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        Duration::from_millis(rng.gen_range(min..=max))
    }

    /// Identity drawn uniformly from the pool; repeats are allowed.
    ///
    /// Returns `None` only for an empty pool, which validation rejects.
    pub fn next_identity(&self) -> Option<String> {
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        self.identities.choose(&mut *rng).cloned()
    }

    pub fn delay_bounds(&self) -> (Duration, Duration) {
        (self.min_delay, self.max_delay)
    }

    pub fn identities(&self) -> &[String] {
        &self.identities
    }
}

impl std::fmt::Debug for Throttle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle")
            .field("min_delay", &self.min_delay)
            .field("max_delay", &self.max_delay)
            .field("identities", &self.identities.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use std::collections::HashSet;

    fn config(min: u64, max: u64, identities: &[&str]) -> ThrottleConfig {
        ThrottleConfig {
            min_delay_ms: min,
            max_delay_ms: max,
            identities: identities.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_delay_within_bounds() {
        let throttle = Throttle::with_rng(&config(5_000, 15_000, &["a"]), StdRng::seed_from_u64(7));
        for _ in 0..1_000 {
            let delay = throttle.next_delay();
            assert!(delay >= Duration::from_millis(5_000));
            assert!(delay <= Duration::from_millis(15_000));
        }
    }

    #[test]
    fn test_fixed_delay_when_bounds_equal() {
        let throttle = Throttle::new(&config(250, 250, &["a"]));
        assert_eq!(throttle.next_delay(), Duration::from_millis(250));
        let zero = Throttle::new(&config(0, 0, &["a"]));
        assert_eq!(zero.next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_seeded_sequences_are_reproducible() {
        let cfg = config(0, 10_000, &["a", "b", "c"]);
        let first = Throttle::with_rng(&cfg, StdRng::seed_from_u64(42));
        let second = Throttle::with_rng(&cfg, StdRng::seed_from_u64(42));

        for _ in 0..20 {
            assert_eq!(first.next_delay(), second.next_delay());
            assert_eq!(first.next_identity(), second.next_identity());
        }
    }

    #[test]
    fn test_constant_source_repeats_identity() {
        let throttle = Throttle::with_rng(&config(0, 0, &["a", "b", "c"]), StepRng::new(0, 0));
        let picks: Vec<_> = (0..5).map(|_| throttle.next_identity().unwrap()).collect();
        assert!(picks.iter().all(|p| p == &picks[0]));
    }

    #[test]
    fn test_identities_cover_pool() {
        let pool = ["a", "b", "c", "d", "e"];
        let throttle = Throttle::with_rng(&config(0, 0, &pool), StdRng::seed_from_u64(1));
        let seen: HashSet<String> = (0..500).filter_map(|_| throttle.next_identity()).collect();
        assert_eq!(seen.len(), pool.len());
    }

    #[test]
    fn test_empty_pool_yields_none() {
        let throttle = Throttle::new(&config(0, 0, &[]));
        assert_eq!(throttle.next_identity(), None);
    }
}
