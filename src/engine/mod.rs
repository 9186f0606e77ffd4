//! engine — the sequential likelihood-free inference loop.
//!
//! Purpose
//! -------
//! Tie priors, simulators, compression, and the estimator ensemble into
//! the full analysis driver:
//!
//! - [`options`]: validated run configuration ([`SequentialOptions`],
//!   [`PretrainOptions`], [`InputNorm`]).
//! - [`history`]: serializable per-population records and the run-level
//!   [`TrainingHistory`].
//! - [`delfi`]: the [`Delfi`] engine itself — Fisher pretraining,
//!   sequential population training with early stopping, posterior
//!   evaluation and sampling, and JSON persistence of run artifacts.

pub mod delfi;
pub mod errors;
pub mod history;
pub mod options;

pub use delfi::Delfi;
pub use errors::{DelfiError, DelfiResult};
pub use history::{PopulationRecord, Termination, TrainingHistory};
pub use options::{InputNorm, PretrainOptions, SequentialOptions};
