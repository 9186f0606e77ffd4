//! ensemble::gaussian — conditional Gaussian estimator with a linear mean
//! map over expanded summary features.
//!
//! Purpose
//! -------
//! Model `θ | t ~ N(a + B φ(t), L Lᵀ)` where `φ` is the member's
//! [`FeatureMap`], `a` and `B` form an affine mean map, and `L` is a lower
//! triangular Cholesky factor with log-parameterized diagonal. Everything
//! is packed into one flat trainable vector so the generic L-BFGS layer can
//! fit members without knowing the architecture.
//!
//! Key behaviors
//! -------------
//! - Flat layout: `[a (p), B (p×f, row-major), log_diag (p),
//!   offdiag (p(p-1)/2, rows in order)]` with `f = φ.feature_len(q)`.
//! - The log-density is evaluated by forward substitution against `L`, so
//!   no covariance matrix is ever formed or inverted.
//! - Sampling draws `z ~ N(0, I)` and returns `a + B φ(t) + L z`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `exp(log_diag)` keeps `L` nonsingular for any finite parameter vector,
//!   so every finite flat vector is a valid model.
//!
//! Testing notes
//! -------------
//! - Unit tests pin the freshly initialized density against the standard
//!   normal closed form, the mean map under both feature maps, and
//!   parameter-vector validation.

use crate::ensemble::{
    errors::{NdeError, NdeResult},
    estimator::{validate_params, ConditionalDensityEstimator, EstimatorSpec, FeatureMap},
};
use ndarray::{Array1, ArrayView1};
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};

const LN_2PI: f64 = 1.8378770664093453;

/// Conditional Gaussian `p(θ | t)` with affine mean and Cholesky
/// covariance.
///
/// Fields
/// ------
/// - `n_parameters` (`p`), `n_conditionals` (`q`): target and summary
///   dimensions.
/// - `feature_map`: summary expansion shared by mean evaluation and
///   training.
/// - `params`: the flat trainable vector (see module docs for the layout).
#[derive(Debug, Clone)]
pub struct GaussianLinearEstimator {
    n_parameters: usize,
    n_conditionals: usize,
    feature_map: FeatureMap,
    params: Array1<f64>,
}

impl GaussianLinearEstimator {
    /// Construct a member with identity-like initialization: zero offsets,
    /// `B` set to 1 on its leading diagonal (so the mean starts near the
    /// first summary coordinates), unit covariance.
    ///
    /// # Errors
    /// [`NdeError::ZeroDimEstimator`] when either dimension is zero; the
    /// flat layout needs at least one target and one summary coordinate.
    pub fn new(
        n_parameters: usize, n_conditionals: usize, feature_map: FeatureMap,
    ) -> NdeResult<Self> {
        if n_parameters == 0 || n_conditionals == 0 {
            return Err(NdeError::ZeroDimEstimator { n_parameters, n_conditionals });
        }
        let f = feature_map.feature_len(n_conditionals);
        let n_trainable = Self::trainable_len(n_parameters, f);
        let mut params = Array1::zeros(n_trainable);
        for i in 0..n_parameters.min(f) {
            params[n_parameters + i * f + i] = 1.0;
        }
        Ok(Self { n_parameters, n_conditionals, feature_map, params })
    }

    fn trainable_len(p: usize, f: usize) -> usize {
        p + p * f + p + p * (p - 1) / 2
    }

    fn feature_len(&self) -> usize {
        self.feature_map.feature_len(self.n_conditionals)
    }

    /// Conditional mean `a + B φ(t)` under a candidate parameter vector.
    fn mean(&self, params: &ArrayView1<f64>, features: &Array1<f64>) -> Array1<f64> {
        let p = self.n_parameters;
        let f = self.feature_len();
        let mut m = Array1::zeros(p);
        for i in 0..p {
            let mut acc = params[i];
            let row = p + i * f;
            for j in 0..f {
                acc += params[row + j] * features[j];
            }
            m[i] = acc;
        }
        m
    }

    /// Apply `L` to a vector: `(L z)_i = exp(log_diag_i) z_i + Σ_{j<i}
    /// offdiag[i, j] z_j`.
    fn l_apply(&self, params: &ArrayView1<f64>, z: &Array1<f64>) -> Array1<f64> {
        let p = self.n_parameters;
        let f = self.feature_len();
        let diag_base = p + p * f;
        let off_base = diag_base + p;
        let mut out = Array1::zeros(p);
        let mut k = 0;
        for i in 0..p {
            let mut acc = params[diag_base + i].exp() * z[i];
            for j in 0..i {
                acc += params[off_base + k] * z[j];
                k += 1;
            }
            out[i] = acc;
        }
        out
    }

    /// Solve `L u = r` by forward substitution.
    fn l_solve(&self, params: &ArrayView1<f64>, r: &Array1<f64>) -> Array1<f64> {
        let p = self.n_parameters;
        let f = self.feature_len();
        let diag_base = p + p * f;
        let off_base = diag_base + p;
        let mut u = Array1::zeros(p);
        let mut k = 0;
        for i in 0..p {
            let mut acc = r[i];
            for j in 0..i {
                acc -= params[off_base + k] * u[j];
                k += 1;
            }
            u[i] = acc / params[diag_base + i].exp();
        }
        u
    }

    fn validate_inputs(
        &self, theta: &ArrayView1<f64>, conditional: &ArrayView1<f64>,
    ) -> NdeResult<()> {
        if theta.len() != self.n_parameters {
            return Err(NdeError::ThetaDimMismatch {
                expected: self.n_parameters,
                actual: theta.len(),
            });
        }
        if conditional.len() != self.n_conditionals {
            return Err(NdeError::ConditionalDimMismatch {
                expected: self.n_conditionals,
                actual: conditional.len(),
            });
        }
        Ok(())
    }
}

impl ConditionalDensityEstimator for GaussianLinearEstimator {
    fn n_parameters(&self) -> usize {
        self.n_parameters
    }

    fn n_conditionals(&self) -> usize {
        self.n_conditionals
    }

    fn n_trainable(&self) -> usize {
        self.params.len()
    }

    fn params(&self) -> Array1<f64> {
        self.params.clone()
    }

    fn set_params(&mut self, params: &ArrayView1<f64>) -> NdeResult<()> {
        validate_params(params, self.params.len())?;
        self.params.assign(params);
        Ok(())
    }

    fn log_prob_with(
        &self, params: &ArrayView1<f64>, theta: &ArrayView1<f64>, conditional: &ArrayView1<f64>,
    ) -> NdeResult<f64> {
        validate_params(params, self.params.len())?;
        self.validate_inputs(theta, conditional)?;
        let p = self.n_parameters;
        let f = self.feature_len();
        let diag_base = p + p * f;

        let features = self.feature_map.apply(conditional);
        let residual = theta.to_owned() - self.mean(params, &features);
        let u = self.l_solve(params, &residual);

        let log_det: f64 = (0..p).map(|i| params[diag_base + i]).sum();
        Ok(-0.5 * (p as f64) * LN_2PI - log_det - 0.5 * u.dot(&u))
    }

    fn sample(
        &self, rng: &mut dyn RngCore, conditional: &ArrayView1<f64>,
    ) -> NdeResult<Array1<f64>> {
        if conditional.len() != self.n_conditionals {
            return Err(NdeError::ConditionalDimMismatch {
                expected: self.n_conditionals,
                actual: conditional.len(),
            });
        }
        let z: Array1<f64> =
            (0..self.n_parameters).map(|_| StandardNormal.sample(rng)).collect();
        let features = self.feature_map.apply(conditional);
        let params = self.params.view();
        Ok(self.mean(&params, &features) + self.l_apply(&params, &z))
    }

    fn spec(&self) -> EstimatorSpec {
        EstimatorSpec::GaussianLinear {
            n_parameters: self.n_parameters,
            n_conditionals: self.n_conditionals,
            feature_map: self.feature_map,
        }
    }
}

/// Instantiate a freshly initialized member from its architecture spec.
pub fn build_estimator(spec: &EstimatorSpec) -> NdeResult<Box<dyn ConditionalDensityEstimator>> {
    match spec {
        EstimatorSpec::GaussianLinear { n_parameters, n_conditionals, feature_map } => {
            let est =
                GaussianLinearEstimator::new(*n_parameters, *n_conditionals, *feature_map)?;
            Ok(Box::new(est))
        }
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
    // - The initialized density against the standard normal closed form.
    // - The Cholesky parameterization (log-diagonal and off-diagonal terms).
    // - log_prob_with leaving the member's own parameters untouched.
    // - Sampling determinism and mean behavior.
    //
    // They intentionally DO NOT cover:
    // - Training dynamics (tested in ensemble::stack).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify the freshly initialized member is N(Bφ(t), I) with B the
    // leading identity, against the standard-normal closed form.
    //
    // Given
    // -----
    // - p = q = 2, linear features, θ = t (zero residual) and θ = t + e₁.
    //
    // Expect
    // ------
    // - log p = -ln(2π) at zero residual and -ln(2π) - 1/2 one unit away.
    fn initial_density_is_standard_normal_around_identity_mean() {
        // Arrange
        let est = GaussianLinearEstimator::new(2, 2, FeatureMap::Linear).unwrap();
        let t = array![0.3, -0.4];

        // Act
        let at_mean = est.log_prob(&t.view(), &t.view()).unwrap();
        let shifted = est.log_prob(&array![1.3, -0.4].view(), &t.view()).unwrap();

        // Assert
        let ln_2pi = (2.0 * std::f64::consts::PI).ln();
        assert!((at_mean + ln_2pi).abs() < 1e-12);
        assert!((shifted + ln_2pi + 0.5).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Check the log-diagonal scales the covariance: doubling the diagonal
    // in log space shifts the normalizer and rescales the quadratic term.
    //
    // Given
    // -----
    // - p = 1, q = 1, parameters a = 0, B = 0, log_diag = ln(2), so
    //   θ | t ~ N(0, 4).
    //
    // Expect
    // ------
    // - log p(2 | t) = -½ln(2π) - ln 2 - ½ for any t.
    fn log_diagonal_scales_covariance() {
        // Arrange
        let mut est = GaussianLinearEstimator::new(1, 1, FeatureMap::Linear).unwrap();
        est.set_params(&array![0.0, 0.0, 2.0_f64.ln()].view()).unwrap();

        // Act
        let lp = est.log_prob(&array![2.0].view(), &array![5.0].view()).unwrap();

        // Assert
        let expected = -0.5 * (2.0 * std::f64::consts::PI).ln() - 2.0_f64.ln() - 0.5;
        assert!((lp - expected).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Ensure log_prob_with evaluates a candidate vector without mutating
    // the member.
    //
    // Given
    // -----
    // - An initialized member and a candidate with a shifted offset.
    //
    // Expect
    // ------
    // - The candidate evaluation differs from the member's own, and
    //   params() is unchanged afterwards.
    fn log_prob_with_does_not_mutate() {
        // Arrange
        let est = GaussianLinearEstimator::new(1, 1, FeatureMap::Linear).unwrap();
        let before = est.params();
        let mut candidate = before.clone();
        candidate[0] = 3.0;

        // Act
        let own = est.log_prob(&array![0.0].view(), &array![0.0].view()).unwrap();
        let other = est
            .log_prob_with(&candidate.view(), &array![0.0].view(), &array![0.0].view())
            .unwrap();

        // Assert
        assert!(own > other);
        assert_eq!(est.params(), before);
    }

    #[test]
    // Purpose
    // -------
    // Verify sampling is RNG-deterministic and centered on the conditional
    // mean.
    //
    // Given
    // -----
    // - The identity-mean member, conditional t = [0.5, 0.5], two RNGs with
    //   the same seed.
    //
    // Expect
    // ------
    // - Equal draws for equal seeds; the empirical mean of 2000 draws is
    //   within 0.1 of t per coordinate.
    fn sampling_is_deterministic_and_centered() {
        // Arrange
        let est = GaussianLinearEstimator::new(2, 2, FeatureMap::Linear).unwrap();
        let t = array![0.5, 0.5];
        let mut rng_a = ChaCha8Rng::seed_from_u64(5);
        let mut rng_b = ChaCha8Rng::seed_from_u64(5);

        // Act
        let draw_a = est.sample(&mut rng_a, &t.view()).unwrap();
        let draw_b = est.sample(&mut rng_b, &t.view()).unwrap();
        let mut mean = Array1::<f64>::zeros(2);
        for _ in 0..2000 {
            mean = mean + est.sample(&mut rng_a, &t.view()).unwrap();
        }
        mean /= 2000.0;

        // Assert
        assert_eq!(draw_a, draw_b);
        assert!((mean[0] - 0.5).abs() < 0.1);
        assert!((mean[1] - 0.5).abs() < 0.1);
    }

    #[test]
    // Purpose
    // -------
    // Ensure construction rejects degenerate architectures: a zero target
    // or summary dimension has no valid flat parameter layout.
    //
    // Given
    // -----
    // - Members requested with p = 0 and with q = 0.
    //
    // Expect
    // ------
    // - ZeroDimEstimator from both, carrying the offending dimensions.
    fn new_rejects_zero_dimensions() {
        // Act / Assert
        match GaussianLinearEstimator::new(0, 2, FeatureMap::Linear) {
            Err(NdeError::ZeroDimEstimator { n_parameters: 0, n_conditionals: 2 }) => {}
            other => panic!("Expected ZeroDimEstimator, got {:?}", other.map(|_| ())),
        }
        match GaussianLinearEstimator::new(2, 0, FeatureMap::Quadratic) {
            Err(NdeError::ZeroDimEstimator { n_parameters: 2, n_conditionals: 0 }) => {}
            other => panic!("Expected ZeroDimEstimator, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    // Purpose
    // -------
    // Pin input validation for wrong-length candidates, targets, and
    // conditionals.
    //
    // Given
    // -----
    // - A 2×2 member probed with mismatched vectors.
    //
    // Expect
    // ------
    // - ParamLengthMismatch, ThetaDimMismatch, ConditionalDimMismatch.
    fn input_validation_errors() {
        // Arrange
        let est = GaussianLinearEstimator::new(2, 2, FeatureMap::Linear).unwrap();
        let good_params = est.params();

        // Act / Assert
        match est.log_prob_with(
            &array![1.0].view(),
            &array![0.0, 0.0].view(),
            &array![0.0, 0.0].view(),
        ) {
            Err(NdeError::ParamLengthMismatch { .. }) => {}
            other => panic!("Expected ParamLengthMismatch, got {other:?}"),
        }
        match est.log_prob_with(
            &good_params.view(),
            &array![0.0].view(),
            &array![0.0, 0.0].view(),
        ) {
            Err(NdeError::ThetaDimMismatch { expected: 2, actual: 1 }) => {}
            other => panic!("Expected ThetaDimMismatch, got {other:?}"),
        }
        match est.log_prob_with(
            &good_params.view(),
            &array![0.0, 0.0].view(),
            &array![0.0].view(),
        ) {
            Err(NdeError::ConditionalDimMismatch { expected: 2, actual: 1 }) => {}
            other => panic!("Expected ConditionalDimMismatch, got {other:?}"),
        }
    }
}
