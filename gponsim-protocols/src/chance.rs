//! Pluggable success-probability source for simulated command outcomes

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of pass/fail trials for probabilistic protocol outcomes
///
/// The engine draws exactly one trial per OMCI command. Injecting a seeded
/// or fixed implementation makes outcomes reproducible in tests.
pub trait SuccessModel: Send + Sync {
    /// Draw one trial; returns true with the given probability
    fn trial(&self, probability: f64) -> bool;
}

/// Default model backed by the thread-local RNG
#[derive(Debug, Default)]
pub struct RandomSuccessModel;

impl SuccessModel for RandomSuccessModel {
    fn trial(&self, probability: f64) -> bool {
        rand::thread_rng().gen::<f64>() < probability
    }
}

/// Deterministic model seeded from a fixed value
pub struct SeededSuccessModel {
    rng: Mutex<StdRng>,
}

impl SeededSuccessModel {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl SuccessModel for SeededSuccessModel {
    fn trial(&self, probability: f64) -> bool {
        self.rng.lock().gen::<f64>() < probability
    }
}

/// Model that always returns the same outcome, for tests
#[derive(Debug, Clone, Copy)]
pub struct FixedSuccessModel(pub bool);

impl SuccessModel for FixedSuccessModel {
    fn trial(&self, _probability: f64) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_model_ignores_probability() {
        assert!(FixedSuccessModel(true).trial(0.0));
        assert!(!FixedSuccessModel(false).trial(1.0));
    }

    #[test]
    fn seeded_model_is_reproducible() {
        let a = SeededSuccessModel::new(42);
        let b = SeededSuccessModel::new(42);

        let trials_a: Vec<bool> = (0..32).map(|_| a.trial(0.5)).collect();
        let trials_b: Vec<bool> = (0..32).map(|_| b.trial(0.5)).collect();
        assert_eq!(trials_a, trials_b);
    }

    #[test]
    fn probability_extremes() {
        let model = RandomSuccessModel;
        assert!(model.trial(1.1));
        assert!(!model.trial(0.0));
    }
}
