//! Chemical system errors.

use eq_core::EqError;
use thiserror::Error;

/// Result type for chemical system operations.
pub type ChemResult<T> = Result<T, ChemError>;

/// Errors raised while building chemical systems or evaluating their properties.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChemError {
    /// A chemical formula string could not be parsed.
    #[error("Invalid formula '{formula}': {reason}")]
    InvalidFormula { formula: String, reason: String },

    /// Element symbol missing from the element table.
    #[error("Unknown element '{symbol}'")]
    UnknownElement { symbol: String },

    /// Species lookup by name failed.
    #[error("Species '{name}' not found")]
    SpeciesNotFound { name: String },

    /// Species index past the end of the species list.
    #[error("Species index {index} out of range (species count {len})")]
    SpeciesIndex { index: usize, len: usize },

    /// Two species share a name.
    #[error("Duplicate species name '{name}'")]
    DuplicateSpecies { name: String },

    /// Non-physical values (negative amounts, temperatures, ...).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    /// Property evaluation produced a non-finite or inconsistent result.
    #[error("Model evaluation failed: {what}")]
    Evaluation { what: String },
}

impl From<ChemError> for EqError {
    fn from(err: ChemError) -> Self {
        match err {
            ChemError::NonPhysical { what } => EqError::Invariant {
                what: format!("Non-physical chemical value: {what}"),
            },
            ChemError::Evaluation { what } => EqError::Invariant {
                what: format!("Model evaluation failed: {what}"),
            },
            other => EqError::InvalidArg {
                what: other.to_string(),
            },
        }
    }
}
