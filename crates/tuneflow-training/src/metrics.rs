//! Synthetic per-step training metrics.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    pub loss: f64,
    pub accuracy: f64,
}

/// Source of the loss/accuracy pair reported in the training log.
pub trait MetricGenerator: Send + Sync {
    fn next_metric(&self, step: u64) -> StepMetrics;
}

/// Loss in `[0.1, 0.6)` and accuracy in `[0.8, 1.0)`, uniformly random.
#[derive(Debug)]
pub struct RandomMetricGenerator {
    rng: Mutex<StdRng>,
}

impl RandomMetricGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }
}

impl Default for RandomMetricGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricGenerator for RandomMetricGenerator {
    fn next_metric(&self, _step: u64) -> StepMetrics {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        StepMetrics { loss: rng.gen_range(0.1..0.6), accuracy: rng.gen_range(0.8..1.0) }
    }
}

/// Always reports the same metrics.
#[derive(Debug, Clone, Copy)]
pub struct FixedMetricGenerator(pub StepMetrics);

impl MetricGenerator for FixedMetricGenerator {
    fn next_metric(&self, _step: u64) -> StepMetrics {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_metrics_in_range() {
        let generator = RandomMetricGenerator::new();
        for step in 0..1000 {
            let m = generator.next_metric(step);
            assert!((0.1..0.6).contains(&m.loss));
            assert!((0.8..1.0).contains(&m.accuracy));
        }
    }

    #[test]
    fn test_seeded_generator_is_deterministic() {
        let a = RandomMetricGenerator::seeded(42);
        let b = RandomMetricGenerator::seeded(42);
        for step in 0..10 {
            assert_eq!(a.next_metric(step), b.next_metric(step));
        }
    }
}
