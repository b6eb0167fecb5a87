//! Phases: named groups of species sharing an activity model.

use crate::species::Species;

/// Activity model family used by the reference property evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityModel {
    /// Water solvent with molality-based solute activities.
    IdealAqueous,
    /// Ideal gas mixture: a = x·P/P°.
    IdealGas,
    /// Ideal solution: a = x.
    IdealSolution,
    /// Pure condensed phase: a = 1.
    Pure,
}

#[derive(Debug, Clone)]
pub struct Phase {
    name: String,
    model: ActivityModel,
    species: Vec<Species>,
}

impl Phase {
    pub fn new(name: impl Into<String>, model: ActivityModel, species: Vec<Species>) -> Self {
        Self {
            name: name.into(),
            model,
            species,
        }
    }

    /// Aqueous phase. The solvent is the species named `H2O` (or `H2O(l)`).
    pub fn aqueous(species: Vec<Species>) -> Self {
        Self::new("AqueousPhase", ActivityModel::IdealAqueous, species)
    }

    pub fn gaseous(species: Vec<Species>) -> Self {
        Self::new("GaseousPhase", ActivityModel::IdealGas, species)
    }

    /// Single pure mineral, named after the species.
    pub fn mineral(species: Species) -> Self {
        Self::new(species.name().to_string(), ActivityModel::Pure, vec![species])
    }

    /// One pure phase per mineral.
    pub fn minerals(species: Vec<Species>) -> Vec<Self> {
        species.into_iter().map(Self::mineral).collect()
    }

    pub fn with_model(mut self, model: ActivityModel) -> Self {
        self.model = model;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> ActivityModel {
        self.model
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }
}
