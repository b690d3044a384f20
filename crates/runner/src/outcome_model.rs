//! Outcome Model - classifies one task attempt
//!
//! One uniform draw `r` in [0, 1) is mapped onto three fixed bands:
//!
//! ```text
//! 0 ──── missing_data_prob ──── missing_data_prob + failure_prob ──── 1
//!   MISSING_DATA          FAILURE                            SUCCESS
//! ```
//!
//! Missing data is checked first. The failure band keeps its full width
//! `failure_prob`; it is never resampled.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use stress_core::{ConfigResult, OutcomeKind, SimulationConfig, validate_probabilities};

/// Probabilistic outcome model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeModel {
    missing_data_prob: f64,
    failure_prob: f64,
}

impl OutcomeModel {
    /// Create a model; fails if a probability is outside [0, 1] or the two
    /// bands together exceed 1.
    pub fn new(missing_data_prob: f64, failure_prob: f64) -> ConfigResult<Self> {
        validate_probabilities(missing_data_prob, failure_prob)?;
        Ok(Self {
            missing_data_prob,
            failure_prob,
        })
    }

    pub fn from_config(config: &SimulationConfig) -> ConfigResult<Self> {
        Self::new(config.missing_data_prob, config.failure_prob)
    }

    pub fn missing_data_prob(&self) -> f64 {
        self.missing_data_prob
    }

    pub fn failure_prob(&self) -> f64 {
        self.failure_prob
    }

    /// Map a uniform value in [0, 1) onto an outcome
    pub fn classify(&self, r: f64) -> OutcomeKind {
        if r < self.missing_data_prob {
            OutcomeKind::MissingData
        } else if r < self.missing_data_prob + self.failure_prob {
            OutcomeKind::Failure
        } else {
            OutcomeKind::Success
        }
    }

    /// Draw one outcome from the given generator
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> OutcomeKind {
        let r: f64 = rng.r#gen();
        self.classify(r)
    }
}

/// Seed of worker `index` derived from the run seed
///
/// SplitMix64 finalizer over the run seed and index, so neighbouring workers
/// get unrelated streams.
pub fn worker_seed(run_seed: u64, index: usize) -> u64 {
    let mut z = run_seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Independent generator for worker `index`
///
/// Seeded deterministically when a run seed is configured, from entropy
/// otherwise.
pub fn worker_rng(run_seed: Option<u64>, index: usize) -> StdRng {
    match run_seed {
        Some(seed) => StdRng::seed_from_u64(worker_seed(seed, index)),
        None => StdRng::from_entropy(),
    }
}
