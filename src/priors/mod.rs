//! priors — parameter priors for likelihood-free inference.
//!
//! Purpose
//! -------
//! Provide the prior densities the inference engine and the
//! nuisance-marginalized simulator draw from: a uniform box prior over a
//! bounded support and a truncated multivariate Gaussian. Both implement the
//! [`Prior`] trait, the seam consumed by the engine's proposal logic and by
//! `simulate::NuisanceMarginalized`.
//!
//! Key behaviors
//! -------------
//! - Validate bound vectors on construction: equal lengths, finite values,
//!   and `lower[i] < upper[i]` for every coordinate. Degenerate supports are
//!   rejected up front rather than surfacing later as zero-width sampling.
//! - Draw single samples or batches from an externally supplied RNG; no
//!   prior owns random state of its own.
//! - Evaluate log-densities, returning `-inf` outside the support.
//!
//! Invariants & assumptions
//! ------------------------
//! - All parameter vectors are `ndarray::Array1<f64>` with a fixed length
//!   equal to [`Prior::dim`]; evaluation with a mismatched length is a
//!   [`PriorError::DimMismatch`], never silent truncation.
//! - Samples returned by [`Prior::sample`] always lie inside the support.
//!
//! Conventions
//! -----------
//! - RNGs are passed as `&mut dyn RngCore` so priors stay object safe and
//!   callers keep ownership of their seed streams.
//! - The truncated Gaussian log-density is unnormalized with respect to the
//!   truncation constant; ratios and support checks are unaffected.
//!
//! Downstream usage
//! ----------------
//! - The engine holds the interesting-parameter prior and uses it for the
//!   initial population, proposal fallbacks, and support checks.
//! - `simulate::NuisanceMarginalized` holds the nuisance prior and draws one
//!   nuisance vector per simulated batch row.
//!
//! Testing notes
//! -------------
//! - Unit tests cover bound validation, componentwise containment of
//!   samples, log-density values inside/outside the support, and the
//!   rejection-sampling retry cap of the truncated Gaussian.

pub mod errors;
pub mod truncated_gaussian;
pub mod uniform;

pub use self::errors::{PriorError, PriorResult};
pub use self::truncated_gaussian::TruncatedGaussian;
pub use self::uniform::BoxUniform;

use ndarray::{Array1, Array2, ArrayView1};
use rand::RngCore;

/// Prior density over a parameter block.
///
/// Implementors must keep [`dim`](Prior::dim) fixed for their lifetime: the
/// engine and simulator size buffers from it once.
///
/// Required:
/// - `dim() -> usize`: dimension of the parameter block.
/// - `sample(&mut dyn RngCore) -> PriorResult<Array1<f64>>`: draw one vector
///   lying inside the support.
/// - `log_prob(&ArrayView1) -> PriorResult<f64>`: log-density; `-inf`
///   outside the support, an error on dimension mismatch.
///
/// Provided:
/// - `sample_batch`: stack `n` draws into an `(n, dim)` array.
/// - `contains`: support membership via the log-density.
pub trait Prior {
    fn dim(&self) -> usize;
    fn sample(&self, rng: &mut dyn RngCore) -> PriorResult<Array1<f64>>;
    fn log_prob(&self, theta: &ArrayView1<f64>) -> PriorResult<f64>;

    /// Stack `n` independent draws into an `(n, dim)` array.
    fn sample_batch(&self, rng: &mut dyn RngCore, n: usize) -> PriorResult<Array2<f64>> {
        let mut out = Array2::zeros((n, self.dim()));
        for i in 0..n {
            let draw = self.sample(rng)?;
            out.row_mut(i).assign(&draw);
        }
        Ok(out)
    }

    /// Support membership: `true` when the log-density is finite.
    fn contains(&self, theta: &ArrayView1<f64>) -> bool {
        self.log_prob(theta).map(|lp| lp.is_finite()).unwrap_or(false)
    }
}

/// Validate a `(lower, upper)` bound pair shared by both priors.
///
/// # Rules
/// - Both vectors must be non-empty and of equal length.
/// - All entries must be finite.
/// - `lower[i] < upper[i]` strictly, for every `i`.
///
/// # Errors
/// - [`PriorError::EmptyBounds`], [`PriorError::BoundLengthMismatch`],
///   [`PriorError::NonFiniteBound`], or [`PriorError::DegenerateBound`].
pub(crate) fn validate_bounds(lower: &Array1<f64>, upper: &Array1<f64>) -> PriorResult<()> {
    if lower.is_empty() || upper.is_empty() {
        return Err(PriorError::EmptyBounds);
    }
    if lower.len() != upper.len() {
        return Err(PriorError::BoundLengthMismatch { lower: lower.len(), upper: upper.len() });
    }
    for (i, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
        if !lo.is_finite() {
            return Err(PriorError::NonFiniteBound { index: i, value: lo });
        }
        if !hi.is_finite() {
            return Err(PriorError::NonFiniteBound { index: i, value: hi });
        }
        if lo >= hi {
            return Err(PriorError::DegenerateBound { index: i, lower: lo, upper: hi });
        }
    }
    Ok(())
}

/// Validate a parameter vector against an expected dimension.
pub(crate) fn validate_theta(theta: &ArrayView1<f64>, dim: usize) -> PriorResult<()> {
    if theta.len() != dim {
        return Err(PriorError::DimMismatch { expected: dim, actual: theta.len() });
    }
    for (i, &v) in theta.iter().enumerate() {
        if !v.is_finite() {
            return Err(PriorError::NonFiniteParameter { index: i, value: v });
        }
    }
    Ok(())
}
