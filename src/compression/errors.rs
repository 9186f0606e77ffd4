/// Crate-wide result alias for compression operations.
pub type CompressionResult<T> = Result<T, CompressionError>;

#[derive(Debug, Clone, PartialEq)]
pub enum CompressionError {
    // ---- Construction ----
    /// Fiducial parameter vector must be non-empty and finite.
    InvalidFiducial { index: usize, value: f64 },

    /// Finite-difference step vector length must match the parameter count.
    StepLengthMismatch { expected: usize, actual: usize },

    /// Finite-difference steps must be finite and strictly positive.
    InvalidStep { index: usize, value: f64 },

    /// Inverse covariance must be square with side `n_data`.
    CovarianceShapeMismatch { expected: usize, found: (usize, usize) },

    /// Mean function output length must equal `n_data`.
    MeanLengthMismatch { expected: usize, actual: usize },

    /// Jacobian entries must be finite.
    NonFiniteJacobian { row: usize, col: usize, value: f64 },

    // ---- Partition ----
    /// Nuisance index beyond the joint parameter dimension.
    NuisanceIndexOutOfRange { index: usize, dim: usize },

    /// Nuisance index listed more than once.
    DuplicateNuisanceIndex { index: usize },

    /// Every parameter was marked nuisance; nothing left to infer.
    NoInterestingParameters,

    /// Call-time nuisance partition differs from the one fixed at
    /// Fisher-matrix construction.
    PartitionMismatch { expected: Vec<usize>, actual: Vec<usize> },

    // ---- Fisher ----
    /// Fisher (sub)matrix is numerically singular.
    SingularFisher { eigenvalue: f64 },

    /// Fisher matrix entries must be finite.
    NonFiniteFisher { row: usize, col: usize, value: f64 },

    // ---- Compression ----
    /// Data vector length must equal `n_data`.
    DataLengthMismatch { expected: usize, actual: usize },

    /// Summary entries must be finite.
    NonFiniteSummary { index: usize, value: f64 },

    /// Forwarded failure from a user-supplied mean model.
    Model { text: String },
}

impl std::error::Error for CompressionError {}

impl std::fmt::Display for CompressionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionError::InvalidFiducial { index, value } => {
                write!(f, "Invalid fiducial parameter at index {index}: {value}")
            }
            CompressionError::StepLengthMismatch { expected, actual } => {
                write!(f, "Step vector length mismatch: expected {expected}, actual {actual}")
            }
            CompressionError::InvalidStep { index, value } => {
                write!(f, "Invalid finite-difference step at index {index}: {value}, must be finite and > 0")
            }
            CompressionError::CovarianceShapeMismatch { expected, found } => {
                write!(
                    f,
                    "Inverse covariance shape mismatch: expected ({expected}, {expected}), found {found:?}"
                )
            }
            CompressionError::MeanLengthMismatch { expected, actual } => {
                write!(f, "Mean function output length mismatch: expected {expected}, actual {actual}")
            }
            CompressionError::NonFiniteJacobian { row, col, value } => {
                write!(f, "Non-finite Jacobian entry at ({row}, {col}): {value}")
            }
            CompressionError::NuisanceIndexOutOfRange { index, dim } => {
                write!(f, "Nuisance index {index} out of range for dimension {dim}")
            }
            CompressionError::DuplicateNuisanceIndex { index } => {
                write!(f, "Duplicate nuisance index {index}")
            }
            CompressionError::NoInterestingParameters => {
                write!(f, "All parameters marked nuisance; no interesting parameters remain")
            }
            CompressionError::PartitionMismatch { expected, actual } => {
                write!(
                    f,
                    "Nuisance partition mismatch: Fisher matrix built with {expected:?}, called with {actual:?}"
                )
            }
            CompressionError::SingularFisher { eigenvalue } => {
                write!(f, "Singular Fisher matrix: eigenvalue {eigenvalue} at or below the floor")
            }
            CompressionError::NonFiniteFisher { row, col, value } => {
                write!(f, "Non-finite Fisher entry at ({row}, {col}): {value}")
            }
            CompressionError::DataLengthMismatch { expected, actual } => {
                write!(f, "Data vector length mismatch: expected {expected}, actual {actual}")
            }
            CompressionError::NonFiniteSummary { index, value } => {
                write!(f, "Non-finite summary entry at index {index}: {value}")
            }
            CompressionError::Model { text } => {
                write!(f, "Mean model failure: {text}")
            }
        }
    }
}
