//! Problem setup: one equilibrium solve reduced to free variables.
//!
//! Species whose bounds leave no room (restriction-pinned) or whose elements
//! have no inventory (degenerate) are fixed and removed from the Newton
//! system. Linearly dependent mass-balance rows are dropped.

use crate::conditions::EquilibriumConditions;
use crate::error::{SolverError, SolverResult};
use crate::restrictions::{EquilibriumRestrictions, resolve_bounds};
use crate::specs::{EquilibriumSpecs, PRESSURE, TEMPERATURE};
use eq_chem::ChemicalState;
use nalgebra::{DMatrix, DVector};
use std::ops::Range;
use tracing::debug;

/// Position of the extra unknowns inside the `p` vector.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UnknownLayout {
    pub temperature: Option<usize>,
    pub pressure: Option<usize>,
    pub titrants: Range<usize>,
}

impl UnknownLayout {
    fn new(specs: &EquilibriumSpecs) -> Self {
        let mut next = 0;
        let mut slot = |present: bool| {
            present.then(|| {
                next += 1;
                next - 1
            })
        };
        let temperature = slot(!specs.is_temperature_input());
        let pressure = slot(!specs.is_pressure_input());
        let titrants = next..next + specs.titrants().len();
        Self {
            temperature,
            pressure,
            titrants,
        }
    }

    pub fn len(&self) -> usize {
        self.titrants.end
    }
}

/// A solve reduced to free species, extra unknowns and independent rows.
#[derive(Debug, Clone)]
pub(crate) struct Problem {
    /// Free species indices (into the system species list).
    pub free: Vec<usize>,
    /// Full amount vector with fixed species at their pinned values.
    pub template: DVector<f64>,
    /// Lower bounds of free species.
    pub lower: DVector<f64>,
    /// Upper bounds of free species (may be infinite).
    pub upper: DVector<f64>,
    /// Independent element rows kept in the mass balance.
    pub rows: Vec<usize>,
    /// Formula matrix restricted to kept rows and free species.
    pub a_free: DMatrix<f64>,
    /// Mass-balance coefficients of the extra unknowns (kept rows).
    pub a_unknowns: DMatrix<f64>,
    /// Element amounts available to free species and titrants (kept rows).
    pub b: DVector<f64>,
    pub layout: UnknownLayout,
    /// Temperature [K] used when T is an input.
    pub t_input: f64,
    /// Pressure [Pa] used when P is an input.
    pub p_input: f64,
    /// Input values in declaration order.
    pub input_values: Vec<f64>,
    /// Strictly interior starting amounts of free species.
    pub n_start: DVector<f64>,
    /// Amounts of free species as found in the state.
    pub n_state: DVector<f64>,
    /// Starting extra unknowns (T, P from the state; titrants at zero).
    pub p_start: DVector<f64>,
}

impl Problem {
    pub fn setup(
        specs: &EquilibriumSpecs,
        state: &ChemicalState,
        conditions: Option<&EquilibriumConditions>,
        restrictions: Option<&EquilibriumRestrictions>,
        epsilon: f64,
    ) -> SolverResult<Self> {
        let system = specs.system();
        let num_species = system.num_species();
        if state.system().num_species() != num_species {
            return Err(SolverError::ProblemSetup {
                what: "chemical state belongs to a different system".to_string(),
            });
        }

        let input_values = input_values(specs, state, conditions)?;
        let input = |name: &str| {
            specs
                .inputs()
                .iter()
                .position(|i| i.name == name)
                .map(|k| input_values[k])
        };
        let t_input = input(TEMPERATURE).unwrap_or_else(|| state.temperature_k());
        let p_input = input(PRESSURE).unwrap_or_else(|| state.pressure_pa());

        let n0 = state.species_amounts();
        let bounds = resolve_bounds(system, restrictions, n0, epsilon)?;
        let a = system.formula_matrix();
        let b_all = a * n0;
        let num_elements = system.num_elements();

        // Restriction-pinned species.
        let mut pinned: Vec<bool> = (0..num_species)
            .map(|i| bounds.upper[i] - bounds.lower[i] <= epsilon)
            .collect();
        let mut template = DVector::from_fn(num_species, |i, _| {
            if pinned[i] { bounds.lower[i] } else { 0.0 }
        });

        // Degenerate elements: no inventory, one-signed coefficients, no titrant.
        let titrant_rows: Vec<bool> = (0..num_elements)
            .map(|e| specs.titrants().iter().any(|t| t.column[e] != 0.0))
            .collect();
        let mut degenerate = vec![false; num_elements];
        loop {
            let mut changed = false;
            for e in 0..num_elements {
                if degenerate[e] || titrant_rows[e] {
                    continue;
                }
                let row = a.row(e);
                let available = b_all[e]
                    - (0..num_species)
                        .filter(|&i| pinned[i])
                        .map(|i| row[i] * template[i])
                        .sum::<f64>();
                let scale: f64 = row.iter().map(|c| c.abs()).sum();
                if available.abs() > 10.0 * epsilon * scale.max(1.0) {
                    continue;
                }
                let carriers: Vec<usize> = (0..num_species)
                    .filter(|&i| !pinned[i] && row[i] != 0.0)
                    .collect();
                if carriers.is_empty() {
                    continue;
                }
                let positive = carriers.iter().all(|&i| row[i] > 0.0);
                let negative = carriers.iter().all(|&i| row[i] < 0.0);
                if !(positive || negative) {
                    continue;
                }
                for &i in &carriers {
                    if bounds.lower[i] > epsilon {
                        return Err(SolverError::ProblemSetup {
                            what: format!(
                                "species '{}' has a lower bound but element '{}' has no inventory",
                                system.species()[i].name(),
                                system.elements()[e]
                            ),
                        });
                    }
                    pinned[i] = true;
                    template[i] = bounds.lower[i];
                }
                debug!(
                    element = %system.elements()[e],
                    species = carriers.len(),
                    "element without inventory; pinning its species"
                );
                degenerate[e] = true;
                changed = true;
            }
            if !changed {
                break;
            }
        }

        let free: Vec<usize> = (0..num_species).filter(|&i| !pinned[i]).collect();
        let layout = UnknownLayout::new(specs);
        let num_unknowns = layout.len();
        if free.is_empty() && num_unknowns > 0 {
            return Err(SolverError::ProblemSetup {
                what: "no free species left to satisfy the auxiliary constraints".to_string(),
            });
        }

        // Mass balance over free species and titrants.
        let mut extended = DMatrix::zeros(num_elements, free.len() + num_unknowns);
        for (k, &i) in free.iter().enumerate() {
            extended.set_column(k, &a.column(i));
        }
        for (k, titrant) in specs.titrants().iter().enumerate() {
            extended.set_column(free.len() + layout.titrants.start + k, &titrant.column);
        }
        let candidates: Vec<usize> = (0..num_elements).filter(|&e| !degenerate[e]).collect();
        let rows = independent_rows(&extended, &candidates);

        let b_fixed = a * &template;
        let b = DVector::from_iterator(rows.len(), rows.iter().map(|&e| b_all[e] - b_fixed[e]));
        let a_free = DMatrix::from_fn(rows.len(), free.len(), |r, k| extended[(rows[r], k)]);
        let a_unknowns = DMatrix::from_fn(rows.len(), num_unknowns, |r, k| {
            extended[(rows[r], free.len() + k)]
        });

        let lower = DVector::from_iterator(free.len(), free.iter().map(|&i| bounds.lower[i]));
        let upper = DVector::from_iterator(free.len(), free.iter().map(|&i| bounds.upper[i]));
        let n_state = DVector::from_iterator(free.len(), free.iter().map(|&i| n0[i]));
        let n_start = DVector::from_fn(free.len(), |k, _| {
            interior_start(n_state[k], lower[k], upper[k], epsilon)
        });

        let mut p_start = DVector::zeros(num_unknowns);
        if let Some(k) = layout.temperature {
            p_start[k] = state.temperature_k();
        }
        if let Some(k) = layout.pressure {
            p_start[k] = state.pressure_pa();
        }

        debug!(
            free = free.len(),
            fixed = num_species - free.len(),
            rows = rows.len(),
            unknowns = num_unknowns,
            "equilibrium problem set up"
        );

        Ok(Self {
            free,
            template,
            lower,
            upper,
            rows,
            a_free,
            a_unknowns,
            b,
            layout,
            t_input,
            p_input,
            input_values,
            n_start,
            n_state,
            p_start,
        })
    }

    pub fn num_free(&self) -> usize {
        self.free.len()
    }

    pub fn num_unknowns(&self) -> usize {
        self.layout.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Full amount vector from free amounts.
    pub fn full_amounts(&self, n_free: &DVector<f64>) -> DVector<f64> {
        let mut n = self.template.clone();
        for (k, &i) in self.free.iter().enumerate() {
            n[i] = n_free[k];
        }
        n
    }

    pub fn temperature(&self, p: &DVector<f64>) -> f64 {
        self.layout.temperature.map_or(self.t_input, |k| p[k])
    }

    pub fn pressure(&self, p: &DVector<f64>) -> f64 {
        self.layout.pressure.map_or(self.p_input, |k| p[k])
    }

    pub fn titrant_amounts<'a>(&self, p: &'a DVector<f64>) -> &'a [f64] {
        &p.as_slice()[self.layout.titrants.clone()]
    }
}

fn input_values(
    specs: &EquilibriumSpecs,
    state: &ChemicalState,
    conditions: Option<&EquilibriumConditions>,
) -> SolverResult<Vec<f64>> {
    match conditions {
        Some(c) => {
            let same = c.inputs().len() == specs.inputs().len()
                && c.inputs().iter().zip(specs.inputs()).all(|(a, b)| a.name == b.name);
            if !same {
                return Err(SolverError::ProblemSetup {
                    what: "conditions were built for a different specification".to_string(),
                });
            }
            c.values()
        }
        None => specs
            .inputs()
            .iter()
            .map(|input| match input.name.as_str() {
                TEMPERATURE => Ok(state.temperature_k()),
                PRESSURE => Ok(state.pressure_pa()),
                other => Err(SolverError::MissingCondition {
                    name: other.to_string(),
                }),
            })
            .collect(),
    }
}

/// Lift an amount strictly inside (lower, upper).
fn interior_start(n0: f64, lower: f64, upper: f64, epsilon: f64) -> f64 {
    let margin = if upper.is_finite() {
        epsilon.min(0.25 * (upper - lower))
    } else {
        epsilon
    };
    let lifted = n0.max(lower + margin);
    if upper.is_finite() {
        lifted.min(upper - margin)
    } else {
        lifted
    }
}

/// Rows of `m` (among `candidates`, in order) that are linearly independent,
/// by modified Gram–Schmidt with one reorthogonalization pass.
pub(crate) fn independent_rows(m: &DMatrix<f64>, candidates: &[usize]) -> Vec<usize> {
    let mut basis: Vec<DVector<f64>> = Vec::new();
    let mut kept = Vec::new();
    for &r in candidates {
        let original = m.row(r).transpose();
        let norm0 = original.norm();
        if norm0 == 0.0 {
            continue;
        }
        let mut v = original;
        for _ in 0..2 {
            for q in &basis {
                let proj = q.dot(&v);
                v.axpy(-proj, q, 1.0);
            }
        }
        let norm = v.norm();
        if norm > 1e-10 * norm0 {
            basis.push(v / norm);
            kept.push(r);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use eq_chem::{ChemicalSystem, Phase, Species};
    use eq_core::units::{bar, celsius};

    fn water_state(extra: &[&str]) -> ChemicalState {
        let mut species = vec![
            Species::new("H2O").unwrap(),
            Species::new("H+").unwrap(),
            Species::new("OH-").unwrap(),
        ];
        species.extend(extra.iter().map(|f| Species::new(f).unwrap()));
        let system = ChemicalSystem::new(vec![Phase::aqueous(species)]).unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_temperature(celsius(60.0)).unwrap();
        state.set_pressure(bar(100.0)).unwrap();
        state.set_species_amount("H2O", 55.0, "mol").unwrap();
        state
    }

    #[test]
    fn charge_row_of_pure_water_is_dependent() {
        let state = water_state(&[]);
        let specs = EquilibriumSpecs::tp(state.system());
        let problem = Problem::setup(&specs, &state, None, None, 1e-16).unwrap();
        assert_eq!(problem.rows, vec![0, 1]);
        assert_eq!(problem.num_free(), 3);
        assert_eq!(problem.b.as_slice(), &[110.0, 55.0]);
        assert!((problem.t_input - 333.15).abs() < 1e-9);
    }

    #[test]
    fn zero_inventory_elements_pin_their_species() {
        let state = water_state(&["Na+", "Cl-", "NaCl", "CO2", "HCO3-"]);
        let specs = EquilibriumSpecs::tp(state.system());
        let problem = Problem::setup(&specs, &state, None, None, 1e-16).unwrap();
        assert_eq!(problem.free, vec![0, 1, 2]);
        for i in 3..8 {
            assert_eq!(problem.template[i], 1e-16);
        }
        // Only H and O survive as independent rows.
        assert_eq!(problem.num_rows(), 2);
    }

    #[test]
    fn cannot_react_pins_and_removes_inventory() {
        let mut state = water_state(&["Na+", "Cl-"]);
        state.set_species_amount("Na+", 0.1, "mol").unwrap();
        state.set_species_amount("Cl-", 0.1, "mol").unwrap();
        let specs = EquilibriumSpecs::tp(state.system());
        let mut r = EquilibriumRestrictions::new(state.system());
        r.cannot_react("Na+").unwrap();
        let problem = Problem::setup(&specs, &state, None, Some(&r), 1e-16).unwrap();
        assert!(!problem.free.contains(&3));
        assert_eq!(problem.template[3], 0.1);
        // Cl- is free and still carries its own inventory.
        assert!(problem.free.contains(&4));
    }

    #[test]
    fn titrant_layout_and_missing_condition() {
        let state = water_state(&[]);
        let mut specs = EquilibriumSpecs::tp(state.system());
        specs.ph().unwrap();
        assert!(matches!(
            Problem::setup(&specs, &state, None, None, 1e-16),
            Err(SolverError::MissingCondition { .. })
        ));

        let mut c = EquilibriumConditions::new(&specs);
        c.temperature(celsius(50.0)).unwrap();
        c.pressure(bar(80.0)).unwrap();
        c.ph(3.0).unwrap();
        let problem = Problem::setup(&specs, &state, Some(&c), None, 1e-16).unwrap();
        assert_eq!(problem.num_unknowns(), 1);
        assert_eq!(problem.layout.titrants, 0..1);
        // H+ carries H and charge together, so the charge row stays dependent.
        assert_eq!(problem.num_rows(), 2);
        assert_eq!(problem.a_unknowns.column(0).as_slice(), &[1.0, 0.0]);
        assert!((problem.t_input - 323.15).abs() < 1e-9);
    }

    #[test]
    fn starting_point_is_interior() {
        assert_eq!(interior_start(0.0, 1e-16, f64::INFINITY, 1e-16), 2e-16);
        assert_eq!(interior_start(5.0, 1e-16, f64::INFINITY, 1e-16), 5.0);
        let n = interior_start(0.0, 1e-16, 0.007, 1e-16);
        assert!(n > 1e-16 && n < 0.007);
        let n = interior_start(1.0, 1e-16, 0.007, 1e-16);
        assert!(n < 0.007);
    }

    #[test]
    fn gram_schmidt_drops_combinations() {
        let m = DMatrix::from_row_slice(3, 3, &[2.0, 1.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, -1.0]);
        assert_eq!(independent_rows(&m, &[0, 1, 2]), vec![0, 1]);
        assert_eq!(independent_rows(&m, &[2, 0]), vec![2, 0]);
    }
}
