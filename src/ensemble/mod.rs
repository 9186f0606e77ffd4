//! ensemble — conditional density estimators and their validation-weighted
//! stack.
//!
//! Purpose
//! -------
//! Learn the posterior-shaped conditional density `p(θ | t)` from simulated
//! `(θ, t)` pairs. Three layers:
//!
//! - [`estimator`]: the object-safe [`ConditionalDensityEstimator`] seam,
//!   the serializable [`EstimatorSpec`], and summary [`FeatureMap`]s.
//! - [`gaussian`]: the shipped member, a conditional Gaussian with affine
//!   mean over expanded features and Cholesky covariance.
//! - [`stack`]: the [`TrainingSet`], per-fit options, and the [`Ensemble`]
//!   that trains members, drops failures, and mixes survivors with
//!   `softmax(-validation_loss)` weights.

pub mod errors;
pub mod estimator;
pub mod gaussian;
pub mod stack;

pub use errors::{NdeError, NdeResult};
pub use estimator::{ConditionalDensityEstimator, EstimatorSpec, FeatureMap};
pub use gaussian::{build_estimator, GaussianLinearEstimator};
pub use stack::{Ensemble, EnsembleState, FitReport, MemberState, TrainOptions, TrainingSet};
