use crate::{compression::errors::CompressionError, priors::errors::PriorError};

/// Crate-wide result alias for simulator operations.
pub type SimResult<T> = Result<T, SimulationError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Parameter vector length must match the simulator's expectation.
    ThetaDimMismatch { expected: usize, actual: usize },

    /// Parameter entries handed to a simulator must be finite.
    NonFiniteTheta { index: usize, value: f64 },

    /// Batch size must be at least one.
    EmptyBatch,

    /// Simulator output shape must be `(batch, n_data)`.
    OutputShapeMismatch { expected: (usize, usize), found: (usize, usize) },

    /// Nuisance-prior failure while marginalizing.
    NuisanceDraw(PriorError),

    /// Invalid nuisance partition for the wrapped simulator.
    Partition(CompressionError),

    /// Forwarded failure from a user-supplied simulator backend.
    Backend { text: String },
}

impl From<PriorError> for SimulationError {
    fn from(err: PriorError) -> Self {
        SimulationError::NuisanceDraw(err)
    }
}

impl From<CompressionError> for SimulationError {
    fn from(err: CompressionError) -> Self {
        SimulationError::Partition(err)
    }
}

impl std::error::Error for SimulationError {}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::ThetaDimMismatch { expected, actual } => {
                write!(f, "Simulator parameter length mismatch: expected {expected}, actual {actual}")
            }
            SimulationError::NonFiniteTheta { index, value } => {
                write!(f, "Non-finite simulator parameter at index {index}: {value}")
            }
            SimulationError::EmptyBatch => {
                write!(f, "Simulation batch size must be at least one")
            }
            SimulationError::OutputShapeMismatch { expected, found } => {
                write!(f, "Simulator output shape mismatch: expected {expected:?}, found {found:?}")
            }
            SimulationError::NuisanceDraw(err) => {
                write!(f, "Nuisance prior draw failed: {err}")
            }
            SimulationError::Partition(err) => {
                write!(f, "Invalid nuisance partition: {err}")
            }
            SimulationError::Backend { text } => {
                write!(f, "Simulator backend failure: {text}")
            }
        }
    }
}
