//! Chemical species definitions.

use crate::error::ChemResult;
use crate::formula::ChemicalFormula;
use crate::param::Param;
use std::fmt;
use std::sync::Arc;

/// Physical aggregate state of a species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateState {
    Aqueous,
    Gas,
    Liquid,
    Solid,
}

/// Standard molar Gibbs energy G°(T, P) of a species [J/mol].
#[derive(Clone)]
pub enum StandardGibbs {
    /// Same value at every T and P.
    Constant(f64),
    /// Value read from a shared parameter cell.
    Param(Param),
    /// Arbitrary function of (T [K], P [Pa]).
    Function(Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>),
}

impl StandardGibbs {
    /// G° at (t, p).
    pub fn value(&self, t: f64, p: f64) -> f64 {
        match self {
            Self::Constant(g) => *g,
            Self::Param(param) => param.value(),
            Self::Function(f) => f(t, p),
        }
    }

    /// (∂G°/∂T, ∂G°/∂P) at (t, p).
    ///
    /// Constants and parameters are T/P-independent; functions are
    /// differentiated by central differences with relative steps.
    pub fn derivatives(&self, t: f64, p: f64) -> (f64, f64) {
        match self {
            Self::Constant(_) | Self::Param(_) => (0.0, 0.0),
            Self::Function(f) => {
                let ht = 1e-6 * t.abs().max(1.0);
                let hp = 1e-6 * p.abs().max(1.0);
                let dgdt = (f(t + ht, p) - f(t - ht, p)) / (2.0 * ht);
                let dgdp = (f(t, p + hp) - f(t, p - hp)) / (2.0 * hp);
                (dgdt, dgdp)
            }
        }
    }

    /// Parameter cell backing this model, if any.
    pub fn param(&self) -> Option<&Param> {
        match self {
            Self::Param(param) => Some(param),
            _ => None,
        }
    }
}

impl fmt::Debug for StandardGibbs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(g) => f.debug_tuple("Constant").field(g).finish(),
            Self::Param(p) => f.debug_tuple("Param").field(&p.value()).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// A chemical species: name, formula, aggregate state and G° model.
#[derive(Debug, Clone)]
pub struct Species {
    name: String,
    formula: ChemicalFormula,
    aggregate_state: AggregateState,
    standard_gibbs: StandardGibbs,
}

impl Species {
    /// Create a species from a formula string.
    ///
    /// The name defaults to the formula text. The aggregate state comes from a
    /// `(g)`/`(s)`/`(aq)`/... suffix and defaults to aqueous.
    pub fn new(formula: &str) -> ChemResult<Self> {
        let formula = ChemicalFormula::parse(formula)?;
        Ok(Self {
            name: formula.text().to_string(),
            aggregate_state: formula.state_suffix().unwrap_or(AggregateState::Aqueous),
            formula,
            standard_gibbs: StandardGibbs::Constant(0.0),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_aggregate_state(mut self, state: AggregateState) -> Self {
        self.aggregate_state = state;
        self
    }

    /// Use a constant standard Gibbs energy [J/mol].
    pub fn with_standard_gibbs_energy(mut self, g0: f64) -> Self {
        self.standard_gibbs = StandardGibbs::Constant(g0);
        self
    }

    /// Read the standard Gibbs energy from a shared parameter.
    pub fn with_standard_gibbs_param(mut self, param: Param) -> Self {
        self.standard_gibbs = StandardGibbs::Param(param);
        self
    }

    /// Compute the standard Gibbs energy from a function of (T [K], P [Pa]).
    pub fn with_standard_gibbs_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        self.standard_gibbs = StandardGibbs::Function(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn formula(&self) -> &ChemicalFormula {
        &self.formula
    }

    pub fn charge(&self) -> f64 {
        self.formula.charge()
    }

    pub fn aggregate_state(&self) -> AggregateState {
        self.aggregate_state
    }

    pub fn standard_gibbs(&self) -> &StandardGibbs {
        &self.standard_gibbs
    }

    /// Molar mass [kg/mol].
    pub fn molar_mass(&self) -> f64 {
        self.formula.molar_mass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_defaults_to_formula() {
        let s = Species::new("HCO3-").unwrap();
        assert_eq!(s.name(), "HCO3-");
        assert_eq!(s.charge(), -1.0);
        assert_eq!(s.aggregate_state(), AggregateState::Aqueous);
    }

    #[test]
    fn mineral_with_custom_name() {
        let s = Species::new("NaCl(s)")
            .unwrap()
            .with_name("Halite")
            .with_standard_gibbs_energy(-384_120.49);
        assert_eq!(s.name(), "Halite");
        assert_eq!(s.aggregate_state(), AggregateState::Solid);
        assert_eq!(s.standard_gibbs().value(298.15, 1e5), -384_120.49);
        assert_eq!(s.standard_gibbs().derivatives(298.15, 1e5), (0.0, 0.0));
    }

    #[test]
    fn function_gibbs_derivatives() {
        let s = Species::new("CO2(g)")
            .unwrap()
            .with_standard_gibbs_fn(|t, p| -394_000.0 - 200.0 * t + 1e-5 * p);
        let (dt, dp) = s.standard_gibbs().derivatives(300.0, 1e5);
        assert!((dt + 200.0).abs() < 1e-4);
        assert!((dp - 1e-5).abs() < 1e-9);
    }

    #[test]
    fn param_gibbs_tracks_updates() {
        let g0 = Param::new(-100.0);
        let s = Species::new("H2O").unwrap().with_standard_gibbs_param(g0.clone());
        g0.set(-200.0);
        assert_eq!(s.standard_gibbs().value(300.0, 1e5), -200.0);
        assert!(s.standard_gibbs().param().is_some());
    }
}
