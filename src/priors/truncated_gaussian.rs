//! priors::truncated_gaussian — multivariate Gaussian prior truncated to a box.
//!
//! Purpose
//! -------
//! Implement a multivariate normal prior restricted to a rectangular
//! support. Sampling is by rejection from the unrestricted Gaussian; the
//! log-density is the Gaussian log-pdf inside the box and `-inf` outside,
//! unnormalized with respect to the truncation constant.
//!
//! Invariants & assumptions
//! ------------------------
//! - The covariance must be accepted by the distribution backend
//!   (symmetric positive definite); failures surface as
//!   [`PriorError::InvalidCovariance`] at construction.
//! - Rejection sampling is bounded by [`MAX_REJECTION_TRIES`]; a support so
//!   far into the Gaussian tail that no draw lands inside within the cap is
//!   reported as [`PriorError::RejectionExhausted`] rather than looping.
//!
//! Downstream usage
//! ----------------
//! - Typically used as the nuisance prior handed to
//!   `simulate::NuisanceMarginalized` when the nuisance block carries an
//!   informative (rather than flat) prior.

use crate::priors::{
    errors::{PriorError, PriorResult},
    validate_bounds, validate_theta, Prior,
};
use nalgebra::DVector;
use ndarray::{Array1, ArrayView1};
use rand::{distributions::Distribution, RngCore};
use statrs::distribution::{Continuous, MultivariateNormal};

/// Upper bound on rejection-sampling attempts per draw.
pub const MAX_REJECTION_TRIES: usize = 10_000;

/// Multivariate Gaussian prior truncated to `[lower, upper]`.
///
/// Fields
/// ------
/// - `inner`: the unrestricted `MultivariateNormal` used for both sampling
///   and density evaluation.
/// - `lower`, `upper`: validated box bounds defining the support.
///
/// Invariants
/// ----------
/// - `mean.len() == lower.len() == upper.len()`; covariance is
///   `dim × dim` and positive definite. All enforced at construction.
#[derive(Debug, Clone)]
pub struct TruncatedGaussian {
    inner: MultivariateNormal,
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl TruncatedGaussian {
    /// Construct a validated truncated Gaussian prior.
    ///
    /// # Parameters
    /// - `mean`: Gaussian mean, length `dim`.
    /// - `covariance`: row-major `dim × dim` covariance entries.
    /// - `lower`, `upper`: box bounds, length `dim`, `lower[i] < upper[i]`.
    ///
    /// # Errors
    /// - Bound validation errors as in [`crate::priors::BoxUniform::new`].
    /// - [`PriorError::MeanLengthMismatch`] when the mean disagrees with the
    ///   bound dimension.
    /// - [`PriorError::InvalidCovariance`] when the backend rejects the
    ///   covariance (wrong size, asymmetric, or not positive definite).
    pub fn new(
        mean: Array1<f64>, covariance: Vec<f64>, lower: Array1<f64>, upper: Array1<f64>,
    ) -> PriorResult<Self> {
        validate_bounds(&lower, &upper)?;
        if mean.len() != lower.len() {
            return Err(PriorError::MeanLengthMismatch {
                expected: lower.len(),
                actual: mean.len(),
            });
        }
        let inner = MultivariateNormal::new(mean.to_vec(), covariance)
            .map_err(|e| PriorError::InvalidCovariance { text: e.to_string() })?;
        Ok(Self { inner, lower, upper })
    }

    fn inside(&self, theta: &ArrayView1<f64>) -> bool {
        theta
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }
}

impl Prior for TruncatedGaussian {
    fn dim(&self) -> usize {
        self.lower.len()
    }

    fn sample(&self, rng: &mut dyn RngCore) -> PriorResult<Array1<f64>> {
        for _ in 0..MAX_REJECTION_TRIES {
            let draw: DVector<f64> = self.inner.sample(rng);
            let candidate = Array1::from_iter(draw.iter().cloned());
            if self.inside(&candidate.view()) {
                return Ok(candidate);
            }
        }
        Err(PriorError::RejectionExhausted { tries: MAX_REJECTION_TRIES })
    }

    fn log_prob(&self, theta: &ArrayView1<f64>) -> PriorResult<f64> {
        validate_theta(theta, self.dim())?;
        if !self.inside(theta) {
            return Ok(f64::NEG_INFINITY);
        }
        let point = DVector::from_iterator(theta.len(), theta.iter().cloned());
        Ok(self.inner.ln_pdf(&point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction validation for mean/covariance/bound mismatches.
    // - Rejection samples landing inside the box.
    // - Gaussian log-density inside the support and -inf outside.
    //
    // They intentionally DO NOT cover:
    // - Tail supports that exhaust the rejection cap (slow by construction).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify constructor validation of the mean length and covariance.
    //
    // Given
    // -----
    // - 2-D bounds with a 1-element mean, then a non-PD covariance.
    //
    // Expect
    // ------
    // - MeanLengthMismatch and InvalidCovariance respectively.
    fn new_rejects_bad_mean_and_covariance() {
        // Arrange
        let lower = array![-1.0, -1.0];
        let upper = array![1.0, 1.0];

        // Act
        let bad_mean = TruncatedGaussian::new(
            array![0.0],
            vec![1.0, 0.0, 0.0, 1.0],
            lower.clone(),
            upper.clone(),
        );
        let bad_cov = TruncatedGaussian::new(
            array![0.0, 0.0],
            vec![1.0, 2.0, 2.0, 1.0],
            lower,
            upper,
        );

        // Assert
        match bad_mean.expect_err("short mean must be rejected") {
            PriorError::MeanLengthMismatch { expected: 2, actual: 1 } => {}
            other => panic!("Expected MeanLengthMismatch, got {other:?}"),
        }
        match bad_cov.expect_err("non-PD covariance must be rejected") {
            PriorError::InvalidCovariance { .. } => {}
            other => panic!("Expected InvalidCovariance, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Check that rejection sampling only returns points inside the box.
    //
    // Given
    // -----
    // - A standard 2-D Gaussian truncated to [-0.5, 0.5]².
    //
    // Expect
    // ------
    // - 100 draws all lie inside the box.
    fn samples_respect_truncation() {
        // Arrange
        let prior = TruncatedGaussian::new(
            array![0.0, 0.0],
            vec![1.0, 0.0, 0.0, 1.0],
            array![-0.5, -0.5],
            array![0.5, 0.5],
        )
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        // Act / Assert
        for _ in 0..100 {
            let draw = prior.sample(&mut rng).unwrap();
            assert!(draw.iter().all(|v| v.abs() <= 0.5));
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the log-density equals the Gaussian log-pdf inside the box and
    // is -inf outside.
    //
    // Given
    // -----
    // - A standard 2-D Gaussian truncated to [-2, 2]².
    //
    // Expect
    // ------
    // - At the origin the log-density equals -ln(2π); outside it is -inf.
    fn log_prob_matches_gaussian_inside_support() {
        // Arrange
        let prior = TruncatedGaussian::new(
            array![0.0, 0.0],
            vec![1.0, 0.0, 0.0, 1.0],
            array![-2.0, -2.0],
            array![2.0, 2.0],
        )
        .unwrap();

        // Act
        let at_origin = prior.log_prob(&array![0.0, 0.0].view()).unwrap();
        let outside = prior.log_prob(&array![3.0, 0.0].view()).unwrap();

        // Assert
        let expected = -(2.0 * std::f64::consts::PI).ln();
        assert!((at_origin - expected).abs() < 1e-10);
        assert!(outside.is_infinite() && outside < 0.0);
    }
}
