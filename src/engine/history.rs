//! engine::history — serializable records of a sequential-training run.

use serde::{Deserialize, Serialize};

/// Why a sequential-training run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Every scheduled population ran.
    Exhausted,
    /// Patience ran out after the named population (zero-based).
    EarlyStopped { population: usize },
}

/// One population's worth of bookkeeping, written to
/// `population_NNN.json` when a results directory is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    /// Zero-based population index; the initial prior population is 0.
    pub population: usize,
    /// Total simulations accumulated after this population.
    pub n_total_sims: usize,
    /// Stacked validation loss after fitting on this population.
    pub val_loss: f64,
    /// Per-member validation losses as `(member index, loss)` pairs, in
    /// active order.
    pub member_val_losses: Vec<(usize, f64)>,
    /// Stacking weights over active members, in active order.
    pub weights: Vec<f64>,
    /// Number of members still active.
    pub n_active: usize,
}

/// Full run record returned by
/// [`sequential_training`](crate::engine::Delfi::sequential_training).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub populations: Vec<PopulationRecord>,
    pub termination: Termination,
}

impl TrainingHistory {
    /// Stacked validation losses per population, in run order.
    pub fn val_losses(&self) -> Vec<f64> {
        self.populations.iter().map(|p| p.val_loss).collect()
    }

    /// Total simulations consumed by the run.
    pub fn n_total_sims(&self) -> usize {
        self.populations.last().map(|p| p.n_total_sims).unwrap_or(0)
    }
}
