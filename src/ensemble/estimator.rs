//! ensemble::estimator — the conditional-density-estimator seam.
//!
//! Purpose
//! -------
//! Define the object-safe trait every ensemble member implements, plus the
//! serializable [`EstimatorSpec`] describing a member's architecture so a
//! persisted ensemble can be rebuilt without live objects.
//!
//! Key behaviors
//! -------------
//! - Members model the conditional density `p(θ | t)` of parameters given a
//!   summary, with a flat trainable-parameter vector so a generic optimizer
//!   can drive training.
//! - [`ConditionalDensityEstimator::log_prob_with`] evaluates under a
//!   candidate parameter vector without mutating the member; training and
//!   validation scoring both go through it.
//!
//! Invariants & assumptions
//! ------------------------
//! - `params().len() == n_trainable()` always; `set_params` validates
//!   length and finiteness before accepting.
//! - `log_prob` may return `-inf` for degenerate inputs but never NaN.

use crate::ensemble::errors::{NdeError, NdeResult};
use ndarray::{Array1, ArrayView1};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Feature expansion applied to the conditional (summary) vector before the
/// linear mean map.
///
/// `Linear` passes the summary through unchanged; `Quadratic` appends all
/// upper-triangle pairwise products `t_i t_j, i <= j`, giving members with
/// different specs genuinely different model classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureMap {
    Linear,
    Quadratic,
}

impl FeatureMap {
    /// Length of the expanded feature vector for a `q`-dimensional summary.
    pub fn feature_len(&self, q: usize) -> usize {
        match self {
            FeatureMap::Linear => q,
            FeatureMap::Quadratic => q + q * (q + 1) / 2,
        }
    }

    /// Expand a summary vector into features.
    pub fn apply(&self, t: &ArrayView1<f64>) -> Array1<f64> {
        match self {
            FeatureMap::Linear => t.to_owned(),
            FeatureMap::Quadratic => {
                let q = t.len();
                let mut out = Array1::zeros(self.feature_len(q));
                for (i, &v) in t.iter().enumerate() {
                    out[i] = v;
                }
                let mut k = q;
                for i in 0..q {
                    for j in i..q {
                        out[k] = t[i] * t[j];
                        k += 1;
                    }
                }
                out
            }
        }
    }
}

/// Architecture of an ensemble member, serializable for persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimatorSpec {
    GaussianLinear { n_parameters: usize, n_conditionals: usize, feature_map: FeatureMap },
}

/// Object-safe conditional density estimator `p(θ | t)`.
///
/// Members expose their trainable parameters as one flat vector so the
/// optimizer layer can treat every architecture uniformly; the layout of
/// the vector is private to the implementation.
pub trait ConditionalDensityEstimator {
    /// Dimension of the target vector `θ`.
    fn n_parameters(&self) -> usize;

    /// Dimension of the conditional (summary) vector `t`.
    fn n_conditionals(&self) -> usize;

    /// Number of trainable parameters.
    fn n_trainable(&self) -> usize;

    /// Current trainable-parameter vector, length [`Self::n_trainable`].
    fn params(&self) -> Array1<f64>;

    /// Replace the trainable parameters.
    ///
    /// # Errors
    /// - [`NdeError::ParamLengthMismatch`] for a wrong-length vector.
    /// - [`NdeError::NonFiniteParam`] for NaN/infinite entries.
    fn set_params(&mut self, params: &ArrayView1<f64>) -> NdeResult<()>;

    /// Log-density `log p(θ | t)` under a candidate parameter vector,
    /// leaving the member's own parameters untouched.
    fn log_prob_with(
        &self, params: &ArrayView1<f64>, theta: &ArrayView1<f64>, conditional: &ArrayView1<f64>,
    ) -> NdeResult<f64>;

    /// Log-density under the member's current parameters.
    fn log_prob(&self, theta: &ArrayView1<f64>, conditional: &ArrayView1<f64>) -> NdeResult<f64> {
        self.log_prob_with(&self.params().view(), theta, conditional)
    }

    /// Draw `θ ~ p(· | t)` under the member's current parameters.
    fn sample(
        &self, rng: &mut dyn RngCore, conditional: &ArrayView1<f64>,
    ) -> NdeResult<Array1<f64>>;

    /// Serializable description of this member's architecture.
    fn spec(&self) -> EstimatorSpec;
}

pub(crate) fn validate_params(params: &ArrayView1<f64>, expected: usize) -> NdeResult<()> {
    if params.len() != expected {
        return Err(NdeError::ParamLengthMismatch { expected, actual: params.len() });
    }
    for (index, &value) in params.iter().enumerate() {
        if !value.is_finite() {
            return Err(NdeError::NonFiniteParam { index, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Feature-map lengths and the quadratic expansion layout.
    // - Flat-parameter validation.
    //
    // They intentionally DO NOT cover:
    // - Concrete estimator densities (tested in ensemble::gaussian).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify the quadratic feature map appends upper-triangle products in
    // row order after the linear block.
    //
    // Given
    // -----
    // - Summary t = [2, 3].
    //
    // Expect
    // ------
    // - Features [2, 3, 4, 6, 9] with length q + q(q+1)/2 = 5.
    fn quadratic_features_layout() {
        // Arrange
        let t = array![2.0, 3.0];

        // Act
        let features = FeatureMap::Quadratic.apply(&t.view());

        // Assert
        assert_eq!(FeatureMap::Quadratic.feature_len(2), 5);
        assert_eq!(features, array![2.0, 3.0, 4.0, 6.0, 9.0]);
        assert_eq!(FeatureMap::Linear.apply(&t.view()), t);
    }

    #[test]
    // Purpose
    // -------
    // Pin flat-parameter validation errors.
    //
    // Given
    // -----
    // - A wrong-length vector and one containing NaN.
    //
    // Expect
    // ------
    // - ParamLengthMismatch and NonFiniteParam respectively.
    fn validate_params_rejects_bad_vectors() {
        // Act / Assert
        match validate_params(&array![1.0, 2.0].view(), 3) {
            Err(NdeError::ParamLengthMismatch { expected: 3, actual: 2 }) => {}
            other => panic!("Expected ParamLengthMismatch, got {other:?}"),
        }
        match validate_params(&array![1.0, f64::NAN, 0.0].view(), 3) {
            Err(NdeError::NonFiniteParam { index: 1, .. }) => {}
            other => panic!("Expected NonFiniteParam, got {other:?}"),
        }
    }
}
