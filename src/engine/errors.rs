use crate::{
    compression::errors::CompressionError, ensemble::errors::NdeError,
    optimize::errors::OptError, priors::errors::PriorError, simulate::errors::SimulationError,
};

/// Crate-wide result alias for engine operations.
pub type DelfiResult<T> = Result<T, DelfiError>;

#[derive(Debug, Clone, PartialEq)]
pub enum DelfiError {
    // ---- Configuration ----
    /// A dimension handed to the engine disagrees with the rest of the
    /// setup.
    DimMismatch { what: &'static str, expected: usize, actual: usize },

    /// An option value violates its constraint.
    InvalidOption { name: &'static str, reason: &'static str },

    // ---- Forwarded layers ----
    Prior(PriorError),
    Compression(CompressionError),
    Simulation(SimulationError),
    Nde(NdeError),
    Opt(OptError),

    // ---- Persistence ----
    /// Filesystem failure while writing results.
    Io { text: String },

    /// Serialization failure while writing results.
    Serialization { text: String },
}

impl From<PriorError> for DelfiError {
    fn from(err: PriorError) -> Self {
        DelfiError::Prior(err)
    }
}

impl From<CompressionError> for DelfiError {
    fn from(err: CompressionError) -> Self {
        DelfiError::Compression(err)
    }
}

impl From<SimulationError> for DelfiError {
    fn from(err: SimulationError) -> Self {
        DelfiError::Simulation(err)
    }
}

impl From<NdeError> for DelfiError {
    fn from(err: NdeError) -> Self {
        DelfiError::Nde(err)
    }
}

impl From<OptError> for DelfiError {
    fn from(err: OptError) -> Self {
        DelfiError::Opt(err)
    }
}

impl From<std::io::Error> for DelfiError {
    fn from(err: std::io::Error) -> Self {
        DelfiError::Io { text: err.to_string() }
    }
}

impl From<serde_json::Error> for DelfiError {
    fn from(err: serde_json::Error) -> Self {
        DelfiError::Serialization { text: err.to_string() }
    }
}

impl std::error::Error for DelfiError {}

impl std::fmt::Display for DelfiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DelfiError::DimMismatch { what, expected, actual } => {
                write!(f, "Dimension mismatch for {what}: expected {expected}, actual {actual}")
            }
            DelfiError::InvalidOption { name, reason } => {
                write!(f, "Invalid option '{name}': {reason}")
            }
            DelfiError::Prior(err) => write!(f, "Prior failure: {err}"),
            DelfiError::Compression(err) => write!(f, "Compression failure: {err}"),
            DelfiError::Simulation(err) => write!(f, "Simulation failure: {err}"),
            DelfiError::Nde(err) => write!(f, "Density estimation failure: {err}"),
            DelfiError::Opt(err) => write!(f, "Optimization failure: {err}"),
            DelfiError::Io { text } => write!(f, "I/O failure: {text}"),
            DelfiError::Serialization { text } => write!(f, "Serialization failure: {text}"),
        }
    }
}
