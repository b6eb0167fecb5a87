//! Immutable chemical system description.

use crate::element::CHARGE_SYMBOL;
use crate::error::{ChemError, ChemResult};
use crate::formula::ChemicalFormula;
use crate::phase::{ActivityModel, Phase};
use crate::species::Species;
use nalgebra::{DMatrix, DVector};
use std::ops::Range;
use std::sync::Arc;

/// Species reference by name or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeciesRef<'a> {
    Name(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for SpeciesRef<'a> {
    fn from(name: &'a str) -> Self {
        SpeciesRef::Name(name)
    }
}

impl<'a> From<&'a String> for SpeciesRef<'a> {
    fn from(name: &'a String) -> Self {
        SpeciesRef::Name(name.as_str())
    }
}

impl From<usize> for SpeciesRef<'_> {
    fn from(index: usize) -> Self {
        SpeciesRef::Index(index)
    }
}

/// Phase metadata kept by the system: name, model and species index range.
#[derive(Debug, Clone)]
pub struct PhaseInfo {
    pub name: String,
    pub model: ActivityModel,
    pub species: Range<usize>,
}

#[derive(Debug)]
struct SystemData {
    species: Vec<Species>,
    phases: Vec<PhaseInfo>,
    phase_of: Vec<usize>,
    elements: Vec<String>,
    formula_matrix: DMatrix<f64>,
}

/// Species grouped into phases plus the derived element/charge inventory.
///
/// Cloning is cheap; clones share the same immutable data.
#[derive(Debug, Clone)]
pub struct ChemicalSystem {
    data: Arc<SystemData>,
}

impl ChemicalSystem {
    /// Build a system from phases, in order.
    ///
    /// Elements are listed in order of first appearance; the charge
    /// pseudo-element `Z` is always the last row of the formula matrix.
    pub fn new(phases: Vec<Phase>) -> ChemResult<Self> {
        let mut species = Vec::new();
        let mut infos = Vec::with_capacity(phases.len());
        let mut phase_of = Vec::new();

        for (iphase, phase) in phases.into_iter().enumerate() {
            if phase.species().is_empty() {
                return Err(ChemError::InvalidArg {
                    what: format!("phase '{}' has no species", phase.name()),
                });
            }
            let start = species.len();
            for s in phase.species() {
                if species.iter().any(|o: &Species| o.name() == s.name()) {
                    return Err(ChemError::DuplicateSpecies {
                        name: s.name().to_string(),
                    });
                }
                species.push(s.clone());
                phase_of.push(iphase);
            }
            infos.push(PhaseInfo {
                name: phase.name().to_string(),
                model: phase.model(),
                species: start..species.len(),
            });
        }

        if species.is_empty() {
            return Err(ChemError::InvalidArg {
                what: "chemical system has no species".to_string(),
            });
        }

        let mut elements: Vec<String> = Vec::new();
        for s in &species {
            for (symbol, _) in s.formula().elements() {
                if !elements.iter().any(|e| e == symbol) {
                    elements.push(symbol.clone());
                }
            }
        }
        elements.push(CHARGE_SYMBOL.to_string());

        let formula_matrix = DMatrix::from_fn(elements.len(), species.len(), |e, i| {
            let symbol = &elements[e];
            if symbol == CHARGE_SYMBOL {
                species[i].charge()
            } else {
                species[i].formula().coefficient(symbol)
            }
        });

        Ok(Self {
            data: Arc::new(SystemData {
                species,
                phases: infos,
                phase_of,
                elements,
                formula_matrix,
            }),
        })
    }

    pub fn species(&self) -> &[Species] {
        &self.data.species
    }

    pub fn num_species(&self) -> usize {
        self.data.species.len()
    }

    pub fn phases(&self) -> &[PhaseInfo] {
        &self.data.phases
    }

    /// Index of the phase containing species `i`.
    pub fn phase_of(&self, i: usize) -> usize {
        self.data.phase_of[i]
    }

    /// Element symbols, charge (`Z`) last.
    pub fn elements(&self) -> &[String] {
        &self.data.elements
    }

    pub fn num_elements(&self) -> usize {
        self.data.elements.len()
    }

    /// Formula matrix A (elements × species).
    pub fn formula_matrix(&self) -> &DMatrix<f64> {
        &self.data.formula_matrix
    }

    pub fn element_index(&self, symbol: &str) -> Option<usize> {
        self.data.elements.iter().position(|e| e == symbol)
    }

    /// Resolve a species reference to its index.
    pub fn species_index<'a>(&self, species: impl Into<SpeciesRef<'a>>) -> ChemResult<usize> {
        match species.into() {
            SpeciesRef::Name(name) => self
                .data
                .species
                .iter()
                .position(|s| s.name() == name)
                .ok_or_else(|| ChemError::SpeciesNotFound {
                    name: name.to_string(),
                }),
            SpeciesRef::Index(index) if index < self.num_species() => Ok(index),
            SpeciesRef::Index(index) => Err(ChemError::SpeciesIndex {
                index,
                len: self.num_species(),
            }),
        }
    }

    /// Column of the formula matrix for an arbitrary formula (titrants).
    ///
    /// Fails if the formula contains an element absent from the system.
    pub fn formula_vector(&self, formula: &ChemicalFormula) -> ChemResult<DVector<f64>> {
        let mut column = DVector::zeros(self.num_elements());
        for (symbol, coeff) in formula.elements() {
            let e = self
                .element_index(symbol)
                .ok_or_else(|| ChemError::UnknownElement {
                    symbol: symbol.clone(),
                })?;
            column[e] += coeff;
        }
        let z = self.num_elements() - 1;
        column[z] = formula.charge();
        Ok(column)
    }

    /// Element/charge amounts b = A·n.
    pub fn element_amounts(&self, n: &DVector<f64>) -> DVector<f64> {
        &self.data.formula_matrix * n
    }
}
