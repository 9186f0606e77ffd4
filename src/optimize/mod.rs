//! optimize — generic maximum-likelihood machinery on top of `argmin`.
//!
//! The estimator ensemble trains its members by maximizing per-member
//! training log-likelihoods; this module owns that seam. See
//! [`mle`] for the [`LogLikelihood`] trait, solver options, and the
//! [`maximize`] entry point.

pub mod errors;
pub mod mle;

pub use errors::{OptError, OptResult};
pub use mle::{
    maximize, Cost, Grad, LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Theta,
    Tolerances, DEFAULT_LBFGS_MEM,
};
