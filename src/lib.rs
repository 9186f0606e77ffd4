//! rust_delfi — sequential likelihood-free inference with score-compressed
//! summaries.
//!
//! Purpose
//! -------
//! Serve as the crate root for a density-estimation likelihood-free
//! inference (DELFI) pipeline: compress high-dimensional data into
//! score summaries hardened against nuisance parameters, learn the
//! posterior-shaped conditional density `p(θ | t)` with an ensemble of
//! estimators, and drive simulations sequentially so each population is
//! spent where the current posterior approximation says it matters.
//!
//! Key behaviors
//! -------------
//! - Re-export the core modules as the public crate surface: [`priors`],
//!   [`compression`], [`simulate`], [`optimize`], [`ensemble`], and
//!   [`engine`].
//! - Keep every stochastic step seedable: a single engine seed expands
//!   deterministically into per-simulation and per-fit seeds, so any run
//!   can be replayed bit for bit.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameter vectors, summaries, and data vectors are `ndarray`
//!   containers over `f64` with dimensions fixed at construction; every
//!   module validates its inputs at its boundary and returns a
//!   domain-specific error rather than panicking.
//! - Summaries carry the dimension of the interesting parameters, so the
//!   estimator ensemble always conditions on a vector the size of `θ`.
//!
//! Conventions
//! -----------
//! - Seams are traits ([`priors::Prior`], [`simulate::Simulator`],
//!   [`compression::Compressor`],
//!   [`ensemble::ConditionalDensityEstimator`]); shipped implementations
//!   cover the reference pipeline and users swap in their own at any seam.
//! - RNGs are supplied by the caller as `&mut dyn RngCore`; no component
//!   owns hidden random state.
//!
//! Downstream usage
//! ----------------
//! - A typical analysis builds a [`compression::ScoreCompressor`] from a
//!   mean model, compresses the observed data once, constructs an
//!   [`engine::Delfi`] with a prior and an [`ensemble::Ensemble`], and
//!   calls `fisher_pretraining` followed by `sequential_training`.
//!
//! Testing notes
//! -------------
//! - Each module carries unit tests next to the code; the end-to-end
//!   pipeline at realistic population sizes is exercised by the
//!   integration tests.

pub mod compression;
pub mod engine;
pub mod ensemble;
pub mod optimize;
pub mod priors;
pub mod simulate;
pub mod utils;
