//! Chemical equilibrium solver.
//!
//! Minimizes the Gibbs energy of a multiphase system subject to mass and
//! charge balance, species amount bounds and optional auxiliary constraints
//! (pH, activities, chemical potentials, user equations). The unknowns are
//! species amounts plus, depending on the specs, temperature, pressure and
//! the amounts of titrants the system is open to.
//!
//! The method is a primal-dual interior-point Newton iteration on the KKT
//! conditions, with fraction-to-the-boundary steps and a geometrically
//! reduced barrier parameter. A converged solve leaves its slacks and
//! multipliers on the state, and re-solving an unchanged state restarts
//! from them.
//!
//! # Example
//!
//! ```no_run
//! use eq_chem::{ChemicalState, ChemicalSystem, Phase, Species, ideal_model};
//! use eq_solver::{EquilibriumSolver, EquilibriumSpecs};
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
//!
//! let specs = EquilibriumSpecs::tp(&system);
//! let mut solver = EquilibriumSolver::new(&model, &specs).unwrap();
//! let result = solver.solve(&mut state).unwrap();
//! assert!(result.succeeded);
//! ```

pub mod conditions;
pub mod error;
pub mod jacobian;
pub mod options;
pub mod restrictions;
pub mod result;
pub mod solver;
pub mod specs;

mod ipm;
mod kkt;
mod problem;

pub use conditions::EquilibriumConditions;
pub use error::{SolverError, SolverResult};
pub use options::EquilibriumOptions;
pub use restrictions::{Bound, EquilibriumRestrictions, SpeciesBounds};
pub use result::{EquilibriumResult, FailureReason, IterationRecord};
pub use solver::EquilibriumSolver;
pub use specs::{ConstraintArgs, EquationConstraint, EquilibriumSpecs, Input, Titrant};
