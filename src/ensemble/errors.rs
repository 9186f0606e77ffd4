use crate::optimize::errors::OptError;

/// Crate-wide result alias for estimator-ensemble operations.
pub type NdeResult<T> = Result<T, NdeError>;

#[derive(Debug, Clone, PartialEq)]
pub enum NdeError {
    // ---- Estimator parameters ----
    /// Trainable-parameter vector length must match the estimator layout.
    ParamLengthMismatch { expected: usize, actual: usize },

    /// Trainable parameters must be finite.
    NonFiniteParam { index: usize, value: f64 },

    /// Estimator target and conditional dimensions must be nonzero.
    ZeroDimEstimator { n_parameters: usize, n_conditionals: usize },

    // ---- Evaluation ----
    /// Target vector length must equal the estimator's parameter dimension.
    ThetaDimMismatch { expected: usize, actual: usize },

    /// Conditional vector length must equal the estimator's conditional
    /// dimension.
    ConditionalDimMismatch { expected: usize, actual: usize },

    // ---- Training data ----
    /// Training sets must contain at least one row.
    EmptyTrainingSet,

    /// Parameter and summary tables must have the same row count.
    RowCountMismatch { params: usize, summaries: usize },

    /// Pushed rows must match the table widths fixed at construction.
    RowLengthMismatch { expected: usize, actual: usize },

    /// Validation fraction must lie in [0, 1).
    InvalidValidationFraction { value: f64 },

    // ---- Ensemble ----
    /// Ensembles must hold at least one member.
    NoMembers,

    /// Member dimensions must agree across the ensemble.
    MemberShapeMismatch { member: usize },

    /// Every remaining member failed to train this round.
    AllMembersFailed,

    /// Validation losses must be finite to weight the stack.
    NonFiniteLoss { member: usize, value: f64 },

    /// A persisted state does not match the live ensemble layout.
    StateMismatch { text: String },

    /// Forwarded optimizer failure (carried per member, fatal only when
    /// every member fails).
    Opt(OptError),
}

impl From<OptError> for NdeError {
    fn from(err: OptError) -> Self {
        NdeError::Opt(err)
    }
}

impl std::error::Error for NdeError {}

impl std::fmt::Display for NdeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NdeError::ParamLengthMismatch { expected, actual } => {
                write!(f, "Trainable parameter length mismatch: expected {expected}, actual {actual}")
            }
            NdeError::NonFiniteParam { index, value } => {
                write!(f, "Non-finite trainable parameter at index {index}: {value}")
            }
            NdeError::ZeroDimEstimator { n_parameters, n_conditionals } => {
                write!(f, "Estimator dimensions must be nonzero: {n_parameters} parameters, {n_conditionals} conditionals")
            }
            NdeError::ThetaDimMismatch { expected, actual } => {
                write!(f, "Target dimension mismatch: expected {expected}, actual {actual}")
            }
            NdeError::ConditionalDimMismatch { expected, actual } => {
                write!(f, "Conditional dimension mismatch: expected {expected}, actual {actual}")
            }
            NdeError::EmptyTrainingSet => {
                write!(f, "Training set is empty")
            }
            NdeError::RowCountMismatch { params, summaries } => {
                write!(f, "Row count mismatch: {params} parameter rows, {summaries} summary rows")
            }
            NdeError::RowLengthMismatch { expected, actual } => {
                write!(f, "Row length mismatch: expected {expected}, actual {actual}")
            }
            NdeError::InvalidValidationFraction { value } => {
                write!(f, "Invalid validation fraction {value}: must lie in [0, 1)")
            }
            NdeError::NoMembers => {
                write!(f, "Ensemble has no members")
            }
            NdeError::MemberShapeMismatch { member } => {
                write!(f, "Member {member} disagrees with the ensemble dimensions")
            }
            NdeError::AllMembersFailed => {
                write!(f, "Every remaining ensemble member failed to train")
            }
            NdeError::NonFiniteLoss { member, value } => {
                write!(f, "Non-finite validation loss for member {member}: {value}")
            }
            NdeError::StateMismatch { text } => {
                write!(f, "Persisted ensemble state mismatch: {text}")
            }
            NdeError::Opt(err) => {
                write!(f, "Optimizer failure: {err}")
            }
        }
    }
}
