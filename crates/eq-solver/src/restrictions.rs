//! Per-species amount bounds layered over the `epsilon` floor.

use crate::error::{SolverError, SolverResult};
use eq_chem::{ChemicalSystem, SpeciesRef};
use eq_core::{Quantity, convert_to_si};
use nalgebra::DVector;

/// One side of a species interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Fixed amount [mol].
    Amount(f64),
    /// Amount of the species in the state passed to the solver.
    Initial,
}

impl Bound {
    fn resolve(self, initial: f64) -> f64 {
        match self {
            Bound::Amount(value) => value,
            Bound::Initial => initial,
        }
    }
}

/// Restrictions on how much each species may react in one solve.
///
/// The last call for a given species and side wins.
#[derive(Debug, Clone)]
pub struct EquilibriumRestrictions {
    system: ChemicalSystem,
    lower: Vec<Option<Bound>>,
    upper: Vec<Option<Bound>>,
}

/// Resolved box bounds over all species.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesBounds {
    pub lower: DVector<f64>,
    pub upper: DVector<f64>,
}

impl EquilibriumRestrictions {
    pub fn new(system: &ChemicalSystem) -> Self {
        let n = system.num_species();
        Self {
            system: system.clone(),
            lower: vec![None; n],
            upper: vec![None; n],
        }
    }

    /// Upper bound on a species amount.
    pub fn cannot_increase_above<'a>(
        &mut self,
        species: impl Into<SpeciesRef<'a>>,
        value: f64,
        unit: &str,
    ) -> SolverResult<()> {
        let i = self.system.species_index(species)?;
        let amount = convert_to_si(value, unit, Quantity::Amount)?;
        self.upper[i] = Some(Bound::Amount(amount));
        Ok(())
    }

    /// Lower bound on a species amount.
    pub fn cannot_decrease_below<'a>(
        &mut self,
        species: impl Into<SpeciesRef<'a>>,
        value: f64,
        unit: &str,
    ) -> SolverResult<()> {
        let i = self.system.species_index(species)?;
        let amount = convert_to_si(value, unit, Quantity::Amount)?;
        self.lower[i] = Some(Bound::Amount(amount));
        Ok(())
    }

    /// Pin the species at its amount in the state passed to the solver.
    pub fn cannot_react<'a>(&mut self, species: impl Into<SpeciesRef<'a>>) -> SolverResult<()> {
        let i = self.system.species_index(species)?;
        self.lower[i] = Some(Bound::Initial);
        self.upper[i] = Some(Bound::Initial);
        Ok(())
    }

    /// The species may not grow beyond its initial amount.
    pub fn cannot_increase<'a>(&mut self, species: impl Into<SpeciesRef<'a>>) -> SolverResult<()> {
        let i = self.system.species_index(species)?;
        self.upper[i] = Some(Bound::Initial);
        Ok(())
    }

    /// The species may not shrink below its initial amount.
    pub fn cannot_decrease<'a>(&mut self, species: impl Into<SpeciesRef<'a>>) -> SolverResult<()> {
        let i = self.system.species_index(species)?;
        self.lower[i] = Some(Bound::Initial);
        Ok(())
    }

    /// Drop every restriction on the species.
    pub fn can_react_freely<'a>(&mut self, species: impl Into<SpeciesRef<'a>>) -> SolverResult<()> {
        let i = self.system.species_index(species)?;
        self.lower[i] = None;
        self.upper[i] = None;
        Ok(())
    }

    pub fn lower(&self, i: usize) -> Option<Bound> {
        self.lower.get(i).copied().flatten()
    }

    pub fn upper(&self, i: usize) -> Option<Bound> {
        self.upper.get(i).copied().flatten()
    }

    /// Resolve bounds against the initial amounts `n0`.
    ///
    /// Both sides are floored at `epsilon`; an empty interval is an error.
    pub fn bounds(&self, n0: &DVector<f64>, epsilon: f64) -> SolverResult<SpeciesBounds> {
        resolve_bounds(&self.system, Some(self), n0, epsilon)
    }
}

/// Bounds for a solve with optional restrictions.
pub(crate) fn resolve_bounds(
    system: &ChemicalSystem,
    restrictions: Option<&EquilibriumRestrictions>,
    n0: &DVector<f64>,
    epsilon: f64,
) -> SolverResult<SpeciesBounds> {
    let num = system.num_species();
    let mut lower = DVector::from_element(num, epsilon);
    let mut upper = DVector::from_element(num, f64::INFINITY);

    if let Some(r) = restrictions {
        for i in 0..num {
            let initial = n0[i].max(epsilon);
            if let Some(bound) = r.lower(i) {
                lower[i] = bound.resolve(initial).max(epsilon);
            }
            if let Some(bound) = r.upper(i) {
                upper[i] = bound.resolve(initial).max(epsilon);
            }
            if lower[i] > upper[i] {
                return Err(SolverError::InfeasibleBounds {
                    species: system.species()[i].name().to_string(),
                    lower: lower[i],
                    upper: upper[i],
                });
            }
        }
    }

    Ok(SpeciesBounds { lower, upper })
}
