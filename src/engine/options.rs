//! engine::options — validated configuration for the inference engine.
//!
//! Purpose
//! -------
//! Collect every tunable of the sequential training loop and the analytic
//! pretraining pass into validated option structs, so the engine itself can
//! assume its configuration is well-formed.
//!
//! Conventions
//! -----------
//! - Counts are validated strictly positive where a zero would make the
//!   loop degenerate; violations surface as
//!   [`DelfiError::InvalidOption`](crate::engine::errors::DelfiError) at
//!   construction, never mid-run.

use crate::{
    engine::errors::{DelfiError, DelfiResult},
    ensemble::stack::TrainOptions,
};

/// Input normalization applied to parameters and summaries before they
/// reach the estimator ensemble.
///
/// - `Fisher`: parameters are centered on the fiducial point and scaled by
///   `sqrt(diag F̄)`; summaries are mapped to pseudo-MLE space and scaled
///   the same way, so both inputs live on comparable scales.
/// - `None`: raw parameters and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputNorm {
    Fisher,
    None,
}

/// Configuration of [`sequential_training`](crate::engine::Delfi::sequential_training).
///
/// Fields
/// ------
/// - `n_initial`: prior-drawn simulations before the first fit.
/// - `n_batch`: simulations added per subsequent population.
/// - `n_populations`: maximum number of proposal populations.
/// - `patience`: populations without stacked-validation-loss improvement
///   tolerated before early stopping.
/// - `proposal_tries`: bounded attempts at drawing an in-support posterior
///   proposal before falling back to the prior.
/// - `train`: per-fit options forwarded to the ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct SequentialOptions {
    pub n_initial: usize,
    pub n_batch: usize,
    pub n_populations: usize,
    pub patience: usize,
    pub proposal_tries: usize,
    pub train: TrainOptions,
}

impl SequentialOptions {
    /// Construct validated sequential-training options.
    ///
    /// # Errors
    /// [`DelfiError::InvalidOption`] when any count is zero.
    pub fn new(
        n_initial: usize, n_batch: usize, n_populations: usize, patience: usize,
        proposal_tries: usize, train: TrainOptions,
    ) -> DelfiResult<Self> {
        if n_initial == 0 {
            return Err(DelfiError::InvalidOption {
                name: "n_initial",
                reason: "The initial population must contain at least one simulation.",
            });
        }
        if n_batch == 0 {
            return Err(DelfiError::InvalidOption {
                name: "n_batch",
                reason: "Each population must contain at least one simulation.",
            });
        }
        if n_populations == 0 {
            return Err(DelfiError::InvalidOption {
                name: "n_populations",
                reason: "At least one population is required.",
            });
        }
        if patience == 0 {
            return Err(DelfiError::InvalidOption {
                name: "patience",
                reason: "Patience must be at least one population.",
            });
        }
        if proposal_tries == 0 {
            return Err(DelfiError::InvalidOption {
                name: "proposal_tries",
                reason: "At least one proposal attempt is required.",
            });
        }
        Ok(Self { n_initial, n_batch, n_populations, patience, proposal_tries, train })
    }
}

impl Default for SequentialOptions {
    fn default() -> Self {
        Self {
            n_initial: 100,
            n_batch: 100,
            n_populations: 10,
            patience: 10,
            proposal_tries: 1000,
            train: TrainOptions::default(),
        }
    }
}

/// Configuration of the analytic Fisher pretraining pass.
///
/// `n_draws` fiducial-region pairs are synthesized from the hardened Fisher
/// matrix and fitted with `train` before any real simulation runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PretrainOptions {
    pub n_draws: usize,
    pub train: TrainOptions,
}

impl PretrainOptions {
    /// # Errors
    /// [`DelfiError::InvalidOption`] when `n_draws < 2` (a split needs at
    /// least two rows).
    pub fn new(n_draws: usize, train: TrainOptions) -> DelfiResult<Self> {
        if n_draws < 2 {
            return Err(DelfiError::InvalidOption {
                name: "n_draws",
                reason: "Pretraining needs at least two synthetic draws.",
            });
        }
        Ok(Self { n_draws, train })
    }
}

impl Default for PretrainOptions {
    fn default() -> Self {
        Self { n_draws: 2000, train: TrainOptions::default() }
    }
}
