//! Deterministic run-scoped RNG.
//!
//! The configured `random_seed` is expanded into per-symbol sub-seeds via
//! BLAKE3 hashing. Because derivation is hash-based rather than
//! order-dependent, the same seed produces identical sub-streams regardless
//! of the order in which symbols first appear, which keeps multi-symbol runs
//! byte-identical. No ambient `thread_rng` is used anywhere in the engine.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Run-scoped RNG root.
#[derive(Debug, Clone)]
pub struct RunRng {
    master_seed: u64,
}

impl RunRng {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive the deterministic sub-seed for a symbol.
    pub fn sub_seed(&self, symbol: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        let hash = hasher.finalize();
        u64::from_le_bytes(hash.as_bytes()[..8].try_into().unwrap())
    }

    /// Create the seeded per-symbol generator.
    pub fn rng_for(&self, symbol: &str) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn sub_seeds_are_deterministic() {
        let rng = RunRng::new(42);
        assert_eq!(rng.sub_seed("BTCUSD"), rng.sub_seed("BTCUSD"));
    }

    #[test]
    fn different_symbols_different_seeds() {
        let rng = RunRng::new(42);
        assert_ne!(rng.sub_seed("BTCUSD"), rng.sub_seed("ETHUSD"));
    }

    #[test]
    fn different_master_seeds_different_output() {
        assert_ne!(
            RunRng::new(42).sub_seed("BTCUSD"),
            RunRng::new(43).sub_seed("BTCUSD")
        );
    }

    #[test]
    fn derived_generators_replay_identically() {
        let root = RunRng::new(7);
        let a: Vec<f64> = {
            let mut g = root.rng_for("BTCUSD");
            (0..8).map(|_| g.gen_range(0.0..1.0)).collect()
        };
        let b: Vec<f64> = {
            let mut g = root.rng_for("BTCUSD");
            (0..8).map(|_| g.gen_range(0.0..1.0)).collect()
        };
        assert_eq!(a, b);
    }
}
