//! priors::uniform — uniform box prior over a bounded support.
//!
//! Purpose
//! -------
//! Implement the uniform prior used for the interesting-parameter block and,
//! in the nuisance-marginalized configuration, for the nuisance block: a
//! product of independent `U(lower[i], upper[i])` coordinates with a constant
//! log-density inside the box and `-inf` outside.
//!
//! Conventions
//! -----------
//! - Support membership is half-open per `rand::distributions::Uniform`
//!   sampling (`[lower, upper)`), but the density treats the closed box as
//!   the support; the distinction is measure zero and irrelevant downstream.
//! - The constant inside-density `-Σ ln(upper[i] − lower[i])` is precomputed
//!   at construction.
//!
//! Testing notes
//! -------------
//! - Unit tests cover bound validation, containment of samples, and the
//!   inside/outside log-density split.

use crate::priors::{errors::PriorResult, validate_bounds, validate_theta, Prior};
use ndarray::{Array1, ArrayView1};
use rand::{distributions::Uniform, Rng, RngCore};

/// Uniform box prior `θ_i ~ U(lower[i], upper[i])`, independent per
/// coordinate.
///
/// Fields
/// ------
/// - `lower`, `upper`: validated bound vectors of equal length.
/// - `log_volume`: cached `Σ ln(upper[i] − lower[i])`, so the inside
///   log-density is `-log_volume`.
///
/// Invariants
/// ----------
/// - `lower[i] < upper[i]` and both finite for all `i`; enforced by
///   [`BoxUniform::new`] and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxUniform {
    lower: Array1<f64>,
    upper: Array1<f64>,
    log_volume: f64,
}

impl BoxUniform {
    /// Construct a validated box prior.
    ///
    /// # Errors
    /// Any violation reported by bound validation: empty bounds, length
    /// mismatch, non-finite entries, or `lower[i] >= upper[i]`.
    pub fn new(lower: Array1<f64>, upper: Array1<f64>) -> PriorResult<Self> {
        validate_bounds(&lower, &upper)?;
        let log_volume = lower
            .iter()
            .zip(upper.iter())
            .map(|(&lo, &hi)| (hi - lo).ln())
            .sum();
        Ok(Self { lower, upper, log_volume })
    }

    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }
}

impl Prior for BoxUniform {
    fn dim(&self) -> usize {
        self.lower.len()
    }

    fn sample(&self, rng: &mut dyn RngCore) -> PriorResult<Array1<f64>> {
        let draw = self
            .lower
            .iter()
            .zip(self.upper.iter())
            .map(|(&lo, &hi)| rng.sample(Uniform::new(lo, hi)))
            .collect();
        Ok(draw)
    }

    fn log_prob(&self, theta: &ArrayView1<f64>) -> PriorResult<f64> {
        validate_theta(theta, self.dim())?;
        let inside = theta
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(&v, (&lo, &hi))| v >= lo && v <= hi);
        if inside {
            Ok(-self.log_volume)
        } else {
            Ok(f64::NEG_INFINITY)
        }
    }
}
