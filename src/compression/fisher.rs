//! compression::fisher — Fisher information matrix and nuisance partition.
//!
//! Purpose
//! -------
//! Build, partition, and invert the Fisher information matrix used by score
//! compression and by the engine's analytic pretraining. The matrix is
//! computed once from the mean-model Jacobian and the inverse data
//! covariance, then cached together with its interesting/nuisance blocks and
//! the nuisance-hardened Fisher `F̄ = F_θθ − F_θη F_ηη⁻¹ F_ηθ`.
//!
//! Key behaviors
//! -------------
//! - Assemble `F = (∂μ/∂θ) C⁻¹ (∂μ/∂θ)ᵀ` and symmetrize it in place.
//! - Validate and freeze the nuisance partition at construction.
//! - Invert symmetric blocks via `nalgebra` eigendecomposition; any
//!   eigenvalue at or below [`EIGEN_EPS`] is a hard
//!   [`CompressionError::SingularFisher`], never a silent pseudo-inverse.
//!
//! Invariants & assumptions
//! ------------------------
//! - The Jacobian is `n_params × n_data`; the inverse covariance is
//!   `n_data × n_data` and treated as symmetric.
//! - The partition is immutable after construction; score compression
//!   re-validates the caller-supplied partition against it on every call.
//!
//! Conventions
//! -----------
//! - `ndarray` carries all public matrices; `nalgebra::DMatrix` appears only
//!   inside the eigendecomposition bridge, copied column-major.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the analytic Fisher of a linear-Gaussian model,
//!   singularity detection, partition validation, and the hardened-block
//!   identity for block-diagonal Fisher matrices.

use crate::compression::errors::{CompressionError, CompressionResult};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Eigenvalue floor below which a Fisher block is treated as singular.
pub const EIGEN_EPS: f64 = 1e-12;

/// Interesting/nuisance split of the joint parameter vector.
///
/// Holds sorted, deduplicated index sets over `0..dim`. The nuisance set may
/// be empty (no hardening); the interesting set may not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    dim: usize,
    interesting: Vec<usize>,
    nuisance: Vec<usize>,
}

impl Partition {
    /// Build a validated partition from the nuisance index set.
    ///
    /// # Errors
    /// - [`CompressionError::NuisanceIndexOutOfRange`] for indices `>= dim`.
    /// - [`CompressionError::DuplicateNuisanceIndex`] for repeated indices.
    /// - [`CompressionError::NoInterestingParameters`] when every coordinate
    ///   is nuisance.
    pub fn new(dim: usize, nuisance_indices: &[usize]) -> CompressionResult<Self> {
        let mut nuisance: Vec<usize> = nuisance_indices.to_vec();
        nuisance.sort_unstable();
        for pair in nuisance.windows(2) {
            if pair[0] == pair[1] {
                return Err(CompressionError::DuplicateNuisanceIndex { index: pair[0] });
            }
        }
        if let Some(&max) = nuisance.last() {
            if max >= dim {
                return Err(CompressionError::NuisanceIndexOutOfRange { index: max, dim });
            }
        }
        let interesting: Vec<usize> =
            (0..dim).filter(|i| nuisance.binary_search(i).is_err()).collect();
        if interesting.is_empty() {
            return Err(CompressionError::NoInterestingParameters);
        }
        Ok(Self { dim, interesting, nuisance })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn interesting(&self) -> &[usize] {
        &self.interesting
    }

    pub fn nuisance(&self) -> &[usize] {
        &self.nuisance
    }

    /// Validate a caller-supplied nuisance index set against this partition.
    ///
    /// Order-insensitive; any difference in the index *set* is a
    /// [`CompressionError::PartitionMismatch`].
    pub fn validate_call(&self, nuisance_indices: &[usize]) -> CompressionResult<()> {
        let mut sorted = nuisance_indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted != self.nuisance {
            return Err(CompressionError::PartitionMismatch {
                expected: self.nuisance.clone(),
                actual: sorted,
            });
        }
        Ok(())
    }

    /// Gather the listed coordinates of `v` into a new vector.
    pub fn gather(v: &Array1<f64>, indices: &[usize]) -> Array1<f64> {
        indices.iter().map(|&i| v[i]).collect()
    }

    fn gather_block(m: &Array2<f64>, rows: &[usize], cols: &[usize]) -> Array2<f64> {
        let mut out = Array2::zeros((rows.len(), cols.len()));
        for (i, &r) in rows.iter().enumerate() {
            for (j, &c) in cols.iter().enumerate() {
                out[[i, j]] = m[[r, c]];
            }
        }
        out
    }
}

/// Fisher information matrix with cached partition blocks.
///
/// Fields (all computed once at construction, read-only afterwards):
/// - `full`: the joint `n_params × n_params` Fisher matrix.
/// - `hardened`: nuisance-hardened interesting block `F̄`.
/// - `hardened_inverse`: `F̄⁻¹`.
/// - `projection`: `F_θη F_ηη⁻¹`, the hardening projector applied to the
///   nuisance score block (empty when there are no nuisance parameters).
#[derive(Debug, Clone)]
pub struct FisherMatrix {
    full: Array2<f64>,
    partition: Partition,
    hardened: Array2<f64>,
    hardened_inverse: Array2<f64>,
    projection: Array2<f64>,
}

impl FisherMatrix {
    /// Assemble the Fisher matrix from a mean Jacobian and inverse data
    /// covariance, then cache its partitioned blocks.
    ///
    /// # Parameters
    /// - `jacobian`: `∂μ/∂θ`, shape `n_params × n_data`.
    /// - `inv_covariance`: `C⁻¹`, shape `n_data × n_data`.
    /// - `nuisance_indices`: coordinates of the joint vector to harden away.
    ///
    /// # Errors
    /// - Shape errors for a non-conforming inverse covariance.
    /// - Partition validation errors (see [`Partition::new`]).
    /// - [`CompressionError::SingularFisher`] when `F_ηη` or `F̄` has an
    ///   eigenvalue at or below [`EIGEN_EPS`].
    /// - [`CompressionError::NonFiniteFisher`] for NaN/infinite entries.
    pub fn from_jacobian(
        jacobian: &Array2<f64>, inv_covariance: &Array2<f64>, nuisance_indices: &[usize],
    ) -> CompressionResult<Self> {
        let (n_params, n_data) = jacobian.dim();
        if inv_covariance.dim() != (n_data, n_data) {
            return Err(CompressionError::CovarianceShapeMismatch {
                expected: n_data,
                found: inv_covariance.dim(),
            });
        }
        let partition = Partition::new(n_params, nuisance_indices)?;

        let mut full = jacobian.dot(inv_covariance).dot(&jacobian.t());
        symmetrize(&mut full);
        validate_finite(&full)?;

        let f_tt = Partition::gather_block(&full, partition.interesting(), partition.interesting());
        let (hardened, projection) = if partition.nuisance().is_empty() {
            (f_tt, Array2::zeros((partition.interesting().len(), 0)))
        } else {
            let f_tn =
                Partition::gather_block(&full, partition.interesting(), partition.nuisance());
            let f_nn = Partition::gather_block(&full, partition.nuisance(), partition.nuisance());
            let f_nn_inv = invert_symmetric(&f_nn)?;
            let projection = f_tn.dot(&f_nn_inv);
            let mut hardened = &f_tt - &projection.dot(&f_tn.t());
            symmetrize(&mut hardened);
            (hardened, projection)
        };
        let hardened_inverse = invert_symmetric(&hardened)?;
        Ok(Self { full, partition, hardened, hardened_inverse, projection })
    }

    pub fn full(&self) -> &Array2<f64> {
        &self.full
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Nuisance-hardened interesting-block Fisher `F̄`.
    pub fn hardened(&self) -> &Array2<f64> {
        &self.hardened
    }

    /// Inverse of the hardened Fisher, `F̄⁻¹`.
    pub fn hardened_inverse(&self) -> &Array2<f64> {
        &self.hardened_inverse
    }

    /// The hardening projector `F_θη F_ηη⁻¹` (shape `n_interesting × 0`
    /// when there is no nuisance block).
    pub fn projection(&self) -> &Array2<f64> {
        &self.projection
    }
}

/// Invert a symmetric matrix by eigendecomposition.
///
/// Eigenvalues at or below [`EIGEN_EPS`] are a
/// [`CompressionError::SingularFisher`]; the inverse is reconstructed as
/// `Q Λ⁻¹ Qᵀ`.
pub(crate) fn invert_symmetric(m: &Array2<f64>) -> CompressionResult<Array2<f64>> {
    let n = m.nrows();
    let mut dm = DMatrix::<f64>::zeros(n, n);
    for j in 0..n {
        for i in 0..n {
            dm[(i, j)] = m[[i, j]];
        }
    }
    let eigen = dm.symmetric_eigen();
    let q = eigen.eigenvectors;
    let lambda = eigen.eigenvalues;
    for &l in lambda.iter() {
        if l <= EIGEN_EPS {
            return Err(CompressionError::SingularFisher { eigenvalue: l });
        }
    }
    let mut inv = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            let mut acc = 0.0;
            for k in 0..n {
                acc += q[(i, k)] * q[(j, k)] / lambda[k];
            }
            inv[[i, j]] = acc;
        }
    }
    Ok(inv)
}

/// Lower Cholesky factor of a symmetric positive-definite matrix.
///
/// Used by the engine to draw from `N(θ, F̄⁻¹)` during Fisher pretraining.
pub fn cholesky_lower(m: &Array2<f64>) -> CompressionResult<Array2<f64>> {
    let n = m.nrows();
    let mut dm = DMatrix::<f64>::zeros(n, n);
    for j in 0..n {
        for i in 0..n {
            dm[(i, j)] = m[[i, j]];
        }
    }
    let chol = dm
        .cholesky()
        .ok_or(CompressionError::SingularFisher { eigenvalue: 0.0 })?;
    let l = chol.l();
    let mut out = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            out[[i, j]] = l[(i, j)];
        }
    }
    Ok(out)
}

fn symmetrize(m: &mut Array2<f64>) {
    for i in 0..m.nrows() {
        for j in 0..i {
            let avg = 0.5 * (m[[i, j]] + m[[j, i]]);
            m[[i, j]] = avg;
            m[[j, i]] = avg;
        }
    }
}

fn validate_finite(m: &Array2<f64>) -> CompressionResult<()> {
    for ((i, j), &v) in m.indexed_iter() {
        if !v.is_finite() {
            return Err(CompressionError::NonFiniteFisher { row: i, col: j, value: v });
        }
    }
    Ok(())
}
