/// Crate-wide result alias for prior operations.
pub type PriorResult<T> = Result<T, PriorError>;

#[derive(Debug, Clone, PartialEq)]
pub enum PriorError {
    // ---- Bounds ----
    /// Bound vectors must be non-empty.
    EmptyBounds,

    /// Lower and upper bound vectors must have the same length.
    BoundLengthMismatch { lower: usize, upper: usize },

    /// Bounds must be finite.
    NonFiniteBound { index: usize, value: f64 },

    /// Each lower bound must be strictly below its upper bound.
    DegenerateBound { index: usize, lower: f64, upper: f64 },

    // ---- Evaluation ----
    /// Parameter vector length does not match the prior dimension.
    DimMismatch { expected: usize, actual: usize },

    /// Parameter vector entries must be finite.
    NonFiniteParameter { index: usize, value: f64 },

    // ---- Gaussian ----
    /// Mean vector length does not match the bound dimension.
    MeanLengthMismatch { expected: usize, actual: usize },

    /// Covariance matrix rejected by the distribution backend.
    InvalidCovariance { text: String },

    /// Rejection sampling failed to land inside the support.
    RejectionExhausted { tries: usize },
}

impl std::error::Error for PriorError {}

impl std::fmt::Display for PriorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorError::EmptyBounds => {
                write!(f, "Bound vectors must be non-empty")
            }
            PriorError::BoundLengthMismatch { lower, upper } => {
                write!(f, "Bound length mismatch: lower has {lower}, upper has {upper}")
            }
            PriorError::NonFiniteBound { index, value } => {
                write!(f, "Non-finite bound at index {index}: {value}")
            }
            PriorError::DegenerateBound { index, lower, upper } => {
                write!(
                    f,
                    "Degenerate bound at index {index}: lower {lower} must be strictly below upper {upper}"
                )
            }
            PriorError::DimMismatch { expected, actual } => {
                write!(f, "Parameter dimension mismatch: expected {expected}, actual {actual}")
            }
            PriorError::NonFiniteParameter { index, value } => {
                write!(f, "Non-finite parameter at index {index}: {value}")
            }
            PriorError::MeanLengthMismatch { expected, actual } => {
                write!(f, "Mean length mismatch: expected {expected}, actual {actual}")
            }
            PriorError::InvalidCovariance { text } => {
                write!(f, "Invalid covariance matrix: {text}")
            }
            PriorError::RejectionExhausted { tries } => {
                write!(f, "Rejection sampling exhausted after {tries} tries")
            }
        }
    }
}
