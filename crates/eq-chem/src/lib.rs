//! eq-chem: chemical systems and property models for equilibrium calculations.
//!
//! Provides:
//! - Formula parsing and species definitions (elements, charge, aggregate state)
//! - Phases and the immutable `ChemicalSystem` (formula matrix, element inventory)
//! - `ChemicalState` (T, P, species amounts, last solve record) mutated by equilibrium solves
//! - `ChemicalModel` trait for chemical potentials and their derivatives
//! - Model chaining, memoization and shared `Param` cells
//! - Reference ideal models (aqueous, gas, solution, pure)
//!
//! # Example
//!
//! ```no_run
//! use eq_chem::{ChemicalModel, ChemicalProps, ChemicalState, ChemicalSystem, Phase, Species, ideal_model};
//!
//! let system = ChemicalSystem::new(vec![Phase::aqueous(vec![
//!     Species::new("H2O").unwrap().with_standard_gibbs_energy(-237_181.72),
//!     Species::new("H+").unwrap(),
//!     Species::new("OH-").unwrap().with_standard_gibbs_energy(-157_297.48),
//! ])])
//! .unwrap();
//! let model = ideal_model(&system).unwrap();
//!
//! let mut state = ChemicalState::new(&system);
//! state.set_species_amount("H2O", 55.0, "mol").unwrap();
//! state.set_species_amount("H+", 1e-7, "mol").unwrap();
//! state.set_species_amount("OH-", 1e-7, "mol").unwrap();
//!
//! let mut props = ChemicalProps::zeros(system.num_species());
//! model
//!     .compute(&mut props, state.temperature_k(), state.pressure_pa(), state.species_amounts())
//!     .unwrap();
//! println!("mu(H2O) = {} J/mol", props.mu[0]);
//! ```

pub mod database;
pub mod element;
pub mod error;
pub mod formula;
pub mod ideal;
pub mod model;
pub mod param;
pub mod phase;
pub mod species;
pub mod state;
pub mod system;

// Re-exports for ergonomics
pub use database::Database;
pub use error::{ChemError, ChemResult};
pub use formula::ChemicalFormula;
pub use ideal::{IdealActivityModel, StandardGibbsModel, ideal_model};
pub use model::{Chain, ChemicalModel, ChemicalProps, Memoized, chain, with_memoization};
pub use param::Param;
pub use phase::{ActivityModel, Phase};
pub use species::{AggregateState, Species, StandardGibbs};
pub use state::{ChemicalState, EquilibriumRecord};
pub use system::{ChemicalSystem, PhaseInfo, SpeciesRef};
