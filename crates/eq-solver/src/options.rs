//! Numerical options for the equilibrium solver.

use crate::error::{SolverError, SolverResult};
use serde::{Deserialize, Serialize};

/// Convergence criteria, iteration limits and interior-point tuning.
///
/// Every field has a default, so a YAML document only needs the keys it
/// overrides:
///
/// ```yaml
/// tolerance: 1.0e-10
/// max_iterations: 100
/// epsilon: 1.0e-40
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquilibriumOptions {
    /// Infinity-norm threshold on the combined KKT residual.
    pub tolerance: f64,
    /// Maximum number of Newton steps.
    pub max_iterations: usize,
    /// Amount floor [mol] below which a species is treated as absent.
    pub epsilon: f64,
    /// Fraction-to-the-boundary factor in (0, 1).
    pub fraction_to_boundary: f64,
    /// Barrier parameter of a cold start. A start from the record of a
    /// previous solve uses that solve's complementarity instead.
    pub initial_barrier: f64,
    /// Geometric reduction factor of the barrier parameter per iteration.
    pub barrier_reduction: f64,
    /// Step halvings allowed when an evaluation fails after a step.
    pub max_backtracks: usize,
    /// Relative step of the finite-difference constraint Jacobian.
    pub finite_difference_step: f64,
}

impl Default for EquilibriumOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 200,
            epsilon: 1e-16,
            fraction_to_boundary: 0.995,
            initial_barrier: 1e-16,
            barrier_reduction: 0.5,
            max_backtracks: 10,
            finite_difference_step: 1e-6,
        }
    }
}

impl EquilibriumOptions {
    /// Parse options from YAML; missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> SolverResult<Self> {
        let options: Self = serde_yaml::from_str(yaml)?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_yaml_string(&self) -> SolverResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check that every knob is in its admissible range.
    pub fn validate(&self) -> SolverResult<()> {
        let positive = [
            ("tolerance", self.tolerance),
            ("epsilon", self.epsilon),
            ("initial_barrier", self.initial_barrier),
            ("finite_difference_step", self.finite_difference_step),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SolverError::InvalidOptions {
                    what: format!("{name} must be positive and finite, got {value}"),
                });
            }
        }

        let unit_interval = [
            ("fraction_to_boundary", self.fraction_to_boundary),
            ("barrier_reduction", self.barrier_reduction),
        ];
        for (name, value) in unit_interval {
            if !(value > 0.0 && value < 1.0) {
                return Err(SolverError::InvalidOptions {
                    what: format!("{name} must lie in (0, 1), got {value}"),
                });
            }
        }

        if self.max_iterations == 0 {
            return Err(SolverError::InvalidOptions {
                what: "max_iterations must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
