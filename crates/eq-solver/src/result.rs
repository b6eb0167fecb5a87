//! Outcome of one equilibrium solve.

use std::fmt;

/// Why a solve did not succeed.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// `max_iterations` exhausted before the residual dropped below tolerance.
    MaxIterations,
    /// The Newton system could not be factorized.
    SingularSystem,
    /// The property model failed or returned non-finite values after every
    /// allowed step reduction.
    Evaluation(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxIterations => write!(f, "maximum iterations reached"),
            Self::SingularSystem => write!(f, "singular Newton system"),
            Self::Evaluation(what) => write!(f, "model evaluation failed: {what}"),
        }
    }
}

/// Summary of one solve.
#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumResult {
    /// Convergence test passed within `max_iterations`.
    pub succeeded: bool,
    /// Completed Newton steps.
    pub iterations: usize,
    /// Final infinity-norm of the combined KKT residual.
    pub residual_norm: f64,
    /// Set when `succeeded` is false.
    pub failure: Option<FailureReason>,
}

impl EquilibriumResult {
    pub(crate) fn converged(iterations: usize, residual_norm: f64) -> Self {
        Self {
            succeeded: true,
            iterations,
            residual_norm,
            failure: None,
        }
    }

    pub(crate) fn failed(iterations: usize, residual_norm: f64, reason: FailureReason) -> Self {
        Self {
            succeeded: false,
            iterations,
            residual_norm,
            failure: Some(reason),
        }
    }
}

/// Diagnostics of one Newton step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    /// 1-based step number.
    pub iteration: usize,
    /// Residual norm after the step.
    pub residual_norm: f64,
    /// Primal step length.
    pub alpha_primal: f64,
    /// Dual step length.
    pub alpha_dual: f64,
    /// Barrier parameter used for the step.
    pub barrier: f64,
}
