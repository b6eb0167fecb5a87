//! Chemical state: temperature, pressure and species amounts.

use crate::error::{ChemError, ChemResult};
use crate::system::{ChemicalSystem, SpeciesRef};
use eq_core::units::{Amount, Pressure, Temperature, k, kelvin_of, mol, pa, pascal_of};
use eq_core::{Quantity, convert_to_si};
use nalgebra::DVector;

/// Slacks and multipliers left by the last equilibrium solve of a state.
///
/// Species vectors span the whole system; entries of species the solve held
/// fixed are zero. An infinite upper slack marks an unbounded species. A
/// solver may start from these values when the state has not changed since.
#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumRecord {
    /// Temperature [K] of the solve.
    pub temperature: f64,
    /// Pressure [Pa] of the solve.
    pub pressure: f64,
    /// Mass-balance multipliers per element, in units of RT.
    pub element_potentials: DVector<f64>,
    /// Distances n − l to the lower bounds [mol].
    pub lower_slacks: DVector<f64>,
    /// Distances u − n to the upper bounds [mol].
    pub upper_slacks: DVector<f64>,
    /// Lower-bound multipliers, in units of RT.
    pub lower_duals: DVector<f64>,
    /// Upper-bound multipliers, in units of RT.
    pub upper_duals: DVector<f64>,
}

/// Mutable state of a [`ChemicalSystem`].
///
/// Created once per system and updated in place by equilibrium solves.
#[derive(Debug, Clone)]
pub struct ChemicalState {
    system: ChemicalSystem,
    t: Temperature,
    p: Pressure,
    n: DVector<f64>,
    record: Option<EquilibriumRecord>,
}

impl ChemicalState {
    /// State at 298.15 K, 1 bar, with all amounts zero.
    pub fn new(system: &ChemicalSystem) -> Self {
        Self {
            system: system.clone(),
            t: k(298.15),
            p: pa(1.0e5),
            n: DVector::zeros(system.num_species()),
            record: None,
        }
    }

    pub fn system(&self) -> &ChemicalSystem {
        &self.system
    }

    pub fn temperature(&self) -> Temperature {
        self.t
    }

    pub fn pressure(&self) -> Pressure {
        self.p
    }

    /// Temperature in kelvin.
    pub fn temperature_k(&self) -> f64 {
        kelvin_of(self.t)
    }

    /// Pressure in pascal.
    pub fn pressure_pa(&self) -> f64 {
        pascal_of(self.p)
    }

    pub fn set_temperature(&mut self, t: Temperature) -> ChemResult<()> {
        let value = kelvin_of(t);
        if !value.is_finite() || value <= 0.0 {
            return Err(ChemError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        self.t = t;
        Ok(())
    }

    pub fn set_pressure(&mut self, p: Pressure) -> ChemResult<()> {
        let value = pascal_of(p);
        if !value.is_finite() || value <= 0.0 {
            return Err(ChemError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        self.p = p;
        Ok(())
    }

    /// Set the amount of one species from a value and unit string (`mol`, `mmol`, ...).
    pub fn set_species_amount<'a>(
        &mut self,
        species: impl Into<SpeciesRef<'a>>,
        value: f64,
        unit: &str,
    ) -> ChemResult<()> {
        let i = self.system.species_index(species)?;
        let amount = convert_to_si(value, unit, Quantity::Amount).map_err(|e| {
            ChemError::InvalidArg {
                what: e.to_string(),
            }
        })?;
        self.n[i] = amount;
        self.record = None;
        Ok(())
    }

    /// Replace all amounts [mol].
    pub fn set_species_amounts(&mut self, n: DVector<f64>) -> ChemResult<()> {
        if n.len() != self.system.num_species() {
            return Err(ChemError::InvalidArg {
                what: format!(
                    "expected {} species amounts, got {}",
                    self.system.num_species(),
                    n.len()
                ),
            });
        }
        if n.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ChemError::NonPhysical {
                what: "species amounts must be finite and non-negative",
            });
        }
        self.n = n;
        self.record = None;
        Ok(())
    }

    /// Amount of one species.
    pub fn species_amount<'a>(&self, species: impl Into<SpeciesRef<'a>>) -> ChemResult<Amount> {
        let i = self.system.species_index(species)?;
        Ok(mol(self.n[i]))
    }

    /// All amounts [mol].
    pub fn species_amounts(&self) -> &DVector<f64> {
        &self.n
    }

    /// Element/charge amounts A·n [mol].
    pub fn element_amounts(&self) -> DVector<f64> {
        self.system.element_amounts(&self.n)
    }

    /// Record of the last equilibrium solve; cleared whenever amounts are set.
    pub fn equilibrium_record(&self) -> Option<&EquilibriumRecord> {
        self.record.as_ref()
    }

    /// Attach a solve record to the current amounts.
    pub fn set_equilibrium_record(&mut self, record: EquilibriumRecord) -> ChemResult<()> {
        let ns = self.system.num_species();
        let species = [
            &record.lower_slacks,
            &record.upper_slacks,
            &record.lower_duals,
            &record.upper_duals,
        ];
        if species.iter().any(|v| v.len() != ns)
            || record.element_potentials.len() != self.system.num_elements()
        {
            return Err(ChemError::InvalidArg {
                what: "equilibrium record does not match the system".to_string(),
            });
        }
        self.record = Some(record);
        Ok(())
    }
}
