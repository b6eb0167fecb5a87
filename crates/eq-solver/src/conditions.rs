//! Values of the declared inputs for one solve.

use crate::error::{SolverError, SolverResult};
use crate::specs::{EquilibriumSpecs, Input, PH, PRESSURE, TEMPERATURE};
use eq_core::convert_to_si;
use eq_core::units::{Pressure, Temperature, kelvin_of, pascal_of};

/// Target values for every input of an [`EquilibriumSpecs`].
#[derive(Debug, Clone)]
pub struct EquilibriumConditions {
    inputs: Vec<Input>,
    values: Vec<Option<f64>>,
}

impl EquilibriumConditions {
    pub fn new(specs: &EquilibriumSpecs) -> Self {
        let inputs = specs.inputs().to_vec();
        let values = vec![None; inputs.len()];
        Self { inputs, values }
    }

    /// Set an input from a value and a unit string (`celsius`, `bar`, `mmol`, ...).
    pub fn set(&mut self, name: &str, value: f64, unit: &str) -> SolverResult<()> {
        let k = self.position(name)?;
        let si = convert_to_si(value, unit, self.inputs[k].quantity)?;
        self.values[k] = Some(si);
        Ok(())
    }

    pub fn temperature(&mut self, t: Temperature) -> SolverResult<()> {
        self.set(TEMPERATURE, kelvin_of(t), "K")
    }

    pub fn pressure(&mut self, p: Pressure) -> SolverResult<()> {
        self.set(PRESSURE, pascal_of(p), "Pa")
    }

    pub fn ph(&mut self, value: f64) -> SolverResult<()> {
        self.set(PH, value, "")
    }

    /// Value of an input in SI units, if set.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.inputs
            .iter()
            .position(|i| i.name == name)
            .and_then(|k| self.values[k])
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// Every input value, in declaration order. Fails on the first unset input.
    pub fn values(&self) -> SolverResult<Vec<f64>> {
        self.inputs
            .iter()
            .zip(&self.values)
            .map(|(input, value)| {
                value.ok_or_else(|| SolverError::MissingCondition {
                    name: input.name.clone(),
                })
            })
            .collect()
    }

    fn position(&self, name: &str) -> SolverResult<usize> {
        self.inputs
            .iter()
            .position(|i| i.name == name)
            .ok_or_else(|| SolverError::UnknownInput {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eq_chem::{ChemicalSystem, Phase, Species};
    use eq_core::units::{bar, celsius};

    fn specs() -> EquilibriumSpecs {
        let system = ChemicalSystem::new(vec![Phase::aqueous(vec![
            Species::new("H2O").unwrap(),
            Species::new("H+").unwrap(),
            Species::new("OH-").unwrap(),
        ])])
        .unwrap();
        let mut specs = EquilibriumSpecs::tp(&system);
        specs.ph().unwrap();
        specs
    }

    #[test]
    fn unit_strings_convert_to_si() {
        let mut c = EquilibriumConditions::new(&specs());
        c.set("T", 50.0, "celsius").unwrap();
        c.set("P", 80.0, "bar").unwrap();
        c.ph(3.0).unwrap();
        assert!((c.get("T").unwrap() - 323.15).abs() < 1e-9);
        assert_eq!(c.get("P").unwrap(), 8.0e6);
        assert_eq!(c.values().unwrap().len(), 3);
    }

    #[test]
    fn typed_setters() {
        let mut c = EquilibriumConditions::new(&specs());
        c.temperature(celsius(60.0)).unwrap();
        c.pressure(bar(100.0)).unwrap();
        assert!((c.get("T").unwrap() - 333.15).abs() < 1e-9);
        assert!((c.get("P").unwrap() - 1e7).abs() < 1e-6);
    }

    #[test]
    fn missing_value_is_an_error() {
        let mut c = EquilibriumConditions::new(&specs());
        c.temperature(celsius(60.0)).unwrap();
        c.pressure(bar(100.0)).unwrap();
        assert!(matches!(
            c.values(),
            Err(SolverError::MissingCondition { name }) if name == "pH"
        ));
    }

    #[test]
    fn unknown_input_and_unit_rejected() {
        let mut c = EquilibriumConditions::new(&specs());
        assert!(matches!(
            c.set("V", 1.0, ""),
            Err(SolverError::UnknownInput { .. })
        ));
        assert!(matches!(c.set("T", 1.0, "bar"), Err(SolverError::Core(_))));
    }

    #[test]
    fn last_value_wins() {
        let mut c = EquilibriumConditions::new(&specs());
        c.ph(7.0).unwrap();
        c.ph(3.0).unwrap();
        assert_eq!(c.get("pH"), Some(3.0));
    }
}
