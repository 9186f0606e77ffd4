//! compression — Fisher matrices and nuisance-hardened score compression.
//!
//! Purpose
//! -------
//! Turn raw data vectors into low-dimensional summary statistics that
//! preserve information about the interesting parameters while projecting
//! out linear sensitivity to nuisance parameters. Two layers:
//!
//! - [`fisher`]: parameter partitions, Fisher-matrix assembly from a mean
//!   Jacobian and inverse covariance, and the hardened (Schur-complement)
//!   blocks with their inverse.
//! - [`score`]: the [`MeanModel`] and [`Compressor`] seams plus the
//!   concrete [`ScoreCompressor`] implementing hardened Gaussian score
//!   compression and the pseudo-MLE map.
//!
//! Downstream usage
//! ----------------
//! - The engine consumes a boxed [`Compressor`] for per-simulation
//!   summaries and borrows the [`FisherMatrix`] for input normalization and
//!   pretraining draws.

pub mod errors;
pub mod fisher;
pub mod score;

pub use errors::{CompressionError, CompressionResult};
pub use fisher::{FisherMatrix, Partition, EIGEN_EPS};
pub use score::{Compressor, CompressorArgs, MeanModel, ScoreCompressor};
