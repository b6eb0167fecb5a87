//! Error types for equilibrium solver operations.

use eq_chem::ChemError;
use eq_core::EqError;
use thiserror::Error;

/// Configuration errors detected before iterating.
///
/// Non-convergence is not an error: it is reported through
/// [`EquilibriumResult`](crate::EquilibriumResult).
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Missing condition value for input '{name}'")]
    MissingCondition { name: String },

    #[error("Unknown input '{name}'")]
    UnknownInput { name: String },

    #[error("Infeasible bounds for species '{species}': lower {lower} > upper {upper}")]
    InfeasibleBounds {
        species: String,
        lower: f64,
        upper: f64,
    },

    #[error("Invalid options: {what}")]
    InvalidOptions { what: String },

    #[error("Options parse error: {0}")]
    OptionsParse(#[from] serde_yaml::Error),

    #[error("Chemical system error: {0}")]
    Chem(#[from] ChemError),

    #[error("Core error: {0}")]
    Core(#[from] EqError),

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for EqError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::Core(inner) => inner,
            SolverError::Chem(inner) => inner.into(),
            SolverError::Numeric { what } => EqError::Invariant { what },
            other => EqError::InvalidArg {
                what: other.to_string(),
            },
        }
    }
}
