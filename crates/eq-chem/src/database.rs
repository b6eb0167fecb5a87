//! In-memory species database.

use crate::error::{ChemError, ChemResult};
use crate::species::{AggregateState, Species};

/// Named collection of species from which phases are assembled.
#[derive(Debug, Clone, Default)]
pub struct Database {
    species: Vec<Species>,
}

impl Database {
    pub fn new(species: Vec<Species>) -> ChemResult<Self> {
        let mut db = Self::default();
        for s in species {
            db.add(s)?;
        }
        Ok(db)
    }

    pub fn add(&mut self, species: Species) -> ChemResult<()> {
        if self.species.iter().any(|s| s.name() == species.name()) {
            return Err(ChemError::DuplicateSpecies {
                name: species.name().to_string(),
            });
        }
        self.species.push(species);
        Ok(())
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Species by name.
    pub fn get(&self, name: &str) -> ChemResult<Species> {
        self.species
            .iter()
            .find(|s| s.name() == name)
            .cloned()
            .ok_or_else(|| ChemError::SpeciesNotFound {
                name: name.to_string(),
            })
    }

    /// Several species by name, in the given order.
    pub fn get_all(&self, names: &[&str]) -> ChemResult<Vec<Species>> {
        names.iter().map(|name| self.get(name)).collect()
    }

    /// Every species of `state` made only of the elements in `symbols`.
    ///
    /// The charge pseudo-element never restricts the selection.
    pub fn speciate(&self, symbols: &[&str], state: AggregateState) -> Vec<Species> {
        self.species
            .iter()
            .filter(|s| s.aggregate_state() == state)
            .filter(|s| {
                s.formula()
                    .elements()
                    .iter()
                    .all(|(e, _)| symbols.contains(&e.as_str()))
            })
            .cloned()
            .collect()
    }
}
