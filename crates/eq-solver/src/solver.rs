//! Equilibrium solver entry points.

use crate::conditions::EquilibriumConditions;
use crate::error::{SolverError, SolverResult};
use crate::ipm;
use crate::kkt::Evaluator;
use crate::options::EquilibriumOptions;
use crate::problem::Problem;
use crate::restrictions::EquilibriumRestrictions;
use crate::result::{EquilibriumResult, IterationRecord};
use crate::specs::EquilibriumSpecs;
use eq_chem::{ChemicalModel, ChemicalState};
use eq_core::units::{k, pa};
use tracing::debug;

/// Computes equilibrium states of one chemical system.
///
/// The solver borrows its property model and owns a copy of the specs, so
/// one instance can be reused for many states. Configuration problems are
/// returned as errors; non-convergence is reported in [`EquilibriumResult`]
/// and the state still receives the last iterate.
pub struct EquilibriumSolver<'m> {
    model: &'m dyn ChemicalModel,
    specs: EquilibriumSpecs,
    options: EquilibriumOptions,
    history: Vec<IterationRecord>,
}

impl<'m> EquilibriumSolver<'m> {
    /// Solver for `specs` using `model` for chemical properties.
    ///
    /// Fails when the specs declare a different number of constraints than
    /// extra unknowns.
    pub fn new(model: &'m dyn ChemicalModel, specs: &EquilibriumSpecs) -> SolverResult<Self> {
        specs.validate()?;
        Ok(Self {
            model,
            specs: specs.clone(),
            options: EquilibriumOptions::default(),
            history: Vec::new(),
        })
    }

    pub fn with_options(mut self, options: EquilibriumOptions) -> SolverResult<Self> {
        self.set_options(options)?;
        Ok(self)
    }

    pub fn set_options(&mut self, options: EquilibriumOptions) -> SolverResult<()> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    pub fn options(&self) -> &EquilibriumOptions {
        &self.options
    }

    pub fn specs(&self) -> &EquilibriumSpecs {
        &self.specs
    }

    /// Per-step diagnostics of the last solve.
    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    /// Equilibrate `state` at its own temperature and pressure.
    pub fn solve(&mut self, state: &mut ChemicalState) -> SolverResult<EquilibriumResult> {
        self.solve_with(state, None, None)
    }

    pub fn solve_with_conditions(
        &mut self,
        state: &mut ChemicalState,
        conditions: &EquilibriumConditions,
    ) -> SolverResult<EquilibriumResult> {
        self.solve_with(state, Some(conditions), None)
    }

    pub fn solve_with_restrictions(
        &mut self,
        state: &mut ChemicalState,
        restrictions: &EquilibriumRestrictions,
    ) -> SolverResult<EquilibriumResult> {
        self.solve_with(state, None, Some(restrictions))
    }

    /// Equilibrate `state` in place.
    ///
    /// Without conditions, temperature and pressure inputs take the state's
    /// values and any other input is reported missing. The state receives
    /// the final amounts, temperature and pressure whether or not the solve
    /// converged; a converged solve also leaves its record on the state, from
    /// which the next solve of the unchanged state restarts.
    pub fn solve_with(
        &mut self,
        state: &mut ChemicalState,
        conditions: Option<&EquilibriumConditions>,
        restrictions: Option<&EquilibriumRestrictions>,
    ) -> SolverResult<EquilibriumResult> {
        self.history.clear();
        self.specs.validate()?;
        if state.system().num_species() != self.specs.system().num_species()
            || state.system().elements() != self.specs.system().elements()
        {
            return Err(SolverError::ProblemSetup {
                what: "chemical state belongs to a different system".to_string(),
            });
        }

        let problem = Problem::setup(
            &self.specs,
            state,
            conditions,
            restrictions,
            self.options.epsilon,
        )?;
        debug!(
            model = self.model.name(),
            species = state.system().num_species(),
            "starting equilibrium solve"
        );

        let record = state.equilibrium_record().cloned();
        let eval = Evaluator::new(&problem, &self.specs, self.model);
        let outcome = ipm::run(&eval, &self.options, record.as_ref());

        let iterate = &outcome.iterate;
        let n = problem.full_amounts(&iterate.bounded_amounts(&problem));
        let t = problem.temperature(&iterate.p);
        let p = problem.pressure(&iterate.p);
        if t.is_finite() && t > 0.0 {
            state.set_temperature(k(t))?;
        }
        if p.is_finite() && p > 0.0 {
            state.set_pressure(pa(p))?;
        }
        state.set_species_amounts(n)?;
        if outcome.result.succeeded {
            let record = iterate.record(
                &problem,
                state.system().num_elements(),
                state.temperature_k(),
                state.pressure_pa(),
            );
            state.set_equilibrium_record(record)?;
        }

        self.history = outcome.history;
        Ok(outcome.result)
    }
}
