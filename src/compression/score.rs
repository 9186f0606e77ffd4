//! compression::score — nuisance-hardened Gaussian score compression.
//!
//! Purpose
//! -------
//! Map a raw simulated or observed data vector to a fixed-length summary
//! statistic: the gradient of the Gaussian log-likelihood at fiducial
//! parameters (the score), projected so that sensitivity to nuisance
//! parameters is removed. The projected summary
//! `t̄_θ = t_θ − F_θη F_ηη⁻¹ t_η` has length equal to the number of
//! interesting parameters, regardless of the data dimension or batch size.
//!
//! Key behaviors
//! -------------
//! - Precompute at construction: the fiducial mean `μ(θ_fid)`, the mean
//!   Jacobian `∂μ/∂θ` via central differences with caller-supplied step
//!   sizes, the Fisher matrix, and the hardening projector. Construction is
//!   the expensive step; [`ScoreCompressor::compress`] is two mat-vecs.
//! - Validate the caller-supplied nuisance partition on every call against
//!   the partition the Fisher matrix was built with.
//! - Expose the pseudo-MLE map `θ̂ = θ_fid,θ + F̄⁻¹ t̄`, the
//!   parameter-space form of a summary used by Fisher input normalization.
//!
//! Invariants & assumptions
//! ------------------------
//! - The data covariance is fixed (parameter-independent); only the mean
//!   carries parameter dependence. This is the Gaussian score-compression
//!   regime in which the summary is asymptotically sufficient.
//! - The Fisher matrix and projector are computed once and never mutated.
//!
//! Conventions
//! -----------
//! - The joint fiducial vector interleaves interesting and nuisance
//!   coordinates as the mean model expects; the partition says which is
//!   which. Summaries are ordered by ascending interesting index.
//!
//! Downstream usage
//! ----------------
//! - The engine compresses the observed dataset once before construction
//!   and hands the compressor to `sequential_training` for per-simulation
//!   summaries.
//!
//! Testing notes
//! -------------
//! - Unit tests pin the summary length, the zero-score property at the
//!   fiducial mean, call-time partition validation, batch mapping, and the
//!   finite-difference Jacobian of a nonlinear mean.

use crate::compression::{
    errors::{CompressionError, CompressionResult},
    fisher::{FisherMatrix, Partition},
};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Parameter-dependent mean of a fixed-covariance Gaussian data model.
///
/// Implementors provide the mean `μ(θ)` of the sampling distribution at a
/// joint (interesting + nuisance) parameter vector. The default Jacobian is
/// a central difference with per-parameter step sizes; models with analytic
/// derivatives should override it.
pub trait MeanModel {
    /// Dimension of the data vector returned by [`MeanModel::mean`].
    fn n_data(&self) -> usize;

    /// Dimension of the joint parameter vector.
    fn n_parameters(&self) -> usize;

    /// Model mean `μ(θ)` at the joint parameter vector.
    fn mean(&self, theta: &ArrayView1<f64>) -> CompressionResult<Array1<f64>>;

    /// Central-difference Jacobian `∂μ/∂θ`, shape `n_parameters × n_data`.
    ///
    /// `steps[i]` is the half-width used for coordinate `i`; every step must
    /// be finite and strictly positive.
    fn mean_jacobian(
        &self, theta: &ArrayView1<f64>, steps: &ArrayView1<f64>,
    ) -> CompressionResult<Array2<f64>> {
        let n_params = self.n_parameters();
        if steps.len() != n_params {
            return Err(CompressionError::StepLengthMismatch {
                expected: n_params,
                actual: steps.len(),
            });
        }
        for (i, &h) in steps.iter().enumerate() {
            if !h.is_finite() || h <= 0.0 {
                return Err(CompressionError::InvalidStep { index: i, value: h });
            }
        }
        let mut jac = Array2::zeros((n_params, self.n_data()));
        let mut shifted = theta.to_owned();
        for i in 0..n_params {
            let h = steps[i];
            shifted[i] = theta[i] + h;
            let upper = self.mean(&shifted.view())?;
            shifted[i] = theta[i] - h;
            let lower = self.mean(&shifted.view())?;
            shifted[i] = theta[i];
            let row = (&upper - &lower) / (2.0 * h);
            jac.row_mut(i).assign(&row);
        }
        for ((i, j), &v) in jac.indexed_iter() {
            if !v.is_finite() {
                return Err(CompressionError::NonFiniteJacobian { row: i, col: j, value: v });
            }
        }
        Ok(jac)
    }
}

/// Call-time arguments threaded through the engine to the compressor.
///
/// Carries the nuisance index set so the compressor can confirm the caller
/// agrees with the partition its Fisher matrix was built with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressorArgs {
    pub nuisance_indices: Vec<usize>,
}

/// Data-to-summary compression seam consumed by the inference engine.
pub trait Compressor {
    /// Length of the summary vector (number of interesting parameters).
    fn n_summaries(&self) -> usize;

    /// Expected length of a raw data vector.
    fn n_data(&self) -> usize;

    /// Compress one data vector into a summary statistic.
    fn compress(
        &self, data: &ArrayView1<f64>, args: &CompressorArgs,
    ) -> CompressionResult<Array1<f64>>;

    /// Compress each row of a `(batch, n_data)` array independently.
    fn compress_batch(
        &self, data: &Array2<f64>, args: &CompressorArgs,
    ) -> CompressionResult<Array2<f64>> {
        let mut out = Array2::zeros((data.nrows(), self.n_summaries()));
        for (i, row) in data.axis_iter(Axis(0)).enumerate() {
            let summary = self.compress(&row, args)?;
            out.row_mut(i).assign(&summary);
        }
        Ok(out)
    }
}

/// Nuisance-hardened score compressor for fixed-covariance Gaussian data.
///
/// Purpose
/// -------
/// Hold everything score compression needs, computed once: fiducial mean,
/// mean Jacobian, inverse covariance, Fisher matrix with its hardened
/// blocks, and the hardening projector. The struct does not retain the mean
/// model; the model is consulted only during construction.
///
/// Invariants
/// ----------
/// - `theta_fiducial.len() == jacobian.nrows()`; the partition indexes into
///   that joint vector and is frozen at construction.
/// - Summaries always have length `partition.interesting().len()`.
#[derive(Debug, Clone)]
pub struct ScoreCompressor {
    theta_fiducial: Array1<f64>,
    mu_fiducial: Array1<f64>,
    jacobian: Array2<f64>,
    inv_covariance: Array2<f64>,
    fisher: FisherMatrix,
}

impl ScoreCompressor {
    /// Precompute the compression operators from a mean model.
    ///
    /// # Parameters
    /// - `model`: mean model evaluated at and around `theta_fiducial`.
    /// - `theta_fiducial`: joint fiducial parameter vector.
    /// - `steps`: central-difference half-widths, one per joint parameter.
    /// - `inv_covariance`: inverse data covariance `C⁻¹`.
    /// - `nuisance_indices`: joint-vector coordinates to harden away.
    ///
    /// # Errors
    /// - Fiducial/step/covariance validation errors.
    /// - Jacobian evaluation failures from the model.
    /// - Fisher assembly errors, including `SingularFisher`.
    pub fn new<M: MeanModel>(
        model: &M, theta_fiducial: Array1<f64>, steps: Array1<f64>, inv_covariance: Array2<f64>,
        nuisance_indices: &[usize],
    ) -> CompressionResult<Self> {
        for (i, &v) in theta_fiducial.iter().enumerate() {
            if !v.is_finite() {
                return Err(CompressionError::InvalidFiducial { index: i, value: v });
            }
        }
        let n_data = model.n_data();
        if inv_covariance.dim() != (n_data, n_data) {
            return Err(CompressionError::CovarianceShapeMismatch {
                expected: n_data,
                found: inv_covariance.dim(),
            });
        }
        let mu_fiducial = model.mean(&theta_fiducial.view())?;
        if mu_fiducial.len() != n_data {
            return Err(CompressionError::MeanLengthMismatch {
                expected: n_data,
                actual: mu_fiducial.len(),
            });
        }
        let jacobian = model.mean_jacobian(&theta_fiducial.view(), &steps.view())?;
        let fisher = FisherMatrix::from_jacobian(&jacobian, &inv_covariance, nuisance_indices)?;
        Ok(Self { theta_fiducial, mu_fiducial, jacobian, inv_covariance, fisher })
    }

    /// The cached Fisher matrix (full, blocks, hardened inverse).
    pub fn fisher(&self) -> &FisherMatrix {
        &self.fisher
    }

    /// Fiducial values of the interesting coordinates, in summary order.
    pub fn theta_fiducial_interesting(&self) -> Array1<f64> {
        Partition::gather(&self.theta_fiducial, self.fisher.partition().interesting())
    }

    /// Map a summary to pseudo-MLE parameter space:
    /// `θ̂ = θ_fid,θ + F̄⁻¹ t̄`.
    pub fn pseudo_mle(&self, summary: &ArrayView1<f64>) -> Array1<f64> {
        self.theta_fiducial_interesting() + self.fisher.hardened_inverse().dot(summary)
    }
}

impl Compressor for ScoreCompressor {
    fn n_summaries(&self) -> usize {
        self.fisher.partition().interesting().len()
    }

    fn n_data(&self) -> usize {
        self.mu_fiducial.len()
    }

    fn compress(
        &self, data: &ArrayView1<f64>, args: &CompressorArgs,
    ) -> CompressionResult<Array1<f64>> {
        self.fisher.partition().validate_call(&args.nuisance_indices)?;
        if data.len() != self.mu_fiducial.len() {
            return Err(CompressionError::DataLengthMismatch {
                expected: self.mu_fiducial.len(),
                actual: data.len(),
            });
        }
        let residual = data.to_owned() - &self.mu_fiducial;
        let weighted = self.inv_covariance.dot(&residual);
        let score = self.jacobian.dot(&weighted);

        let partition = self.fisher.partition();
        let t_interesting = Partition::gather(&score, partition.interesting());
        let summary = if partition.nuisance().is_empty() {
            t_interesting
        } else {
            let t_nuisance = Partition::gather(&score, partition.nuisance());
            t_interesting - self.fisher.projection().dot(&t_nuisance)
        };
        for (i, &v) in summary.iter().enumerate() {
            if !v.is_finite() {
                return Err(CompressionError::NonFiniteSummary { index: i, value: v });
            }
        }
        Ok(summary)
    }
}
