use crate::data::DataError;

/// Reasons the builder refuses to produce a problem
#[derive(Debug, thiserror::Error)]
pub enum FormulationError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Infeasible specification: {0}")]
    InfeasibleSpec(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
