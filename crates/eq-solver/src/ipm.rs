//! Primal-dual interior-point iteration.
//!
//! Each pass walks the stages Initialize → CheckConvergence →
//! AssembleResidual → FactorAndSolve → LineSearch → CheckConvergence, and
//! leaves through Terminate.
//!
//! A cold start begins on the central path of the configured initial
//! barrier. A state carrying the record of an earlier solve at the same
//! conditions restarts from that record, with the barrier at its mean
//! complementarity, and needs no step when nothing has changed.

use crate::kkt::{Evaluator, Iterate, Point, Residuals, Step, assemble, kkt_error, solve_step};
use crate::options::EquilibriumOptions;
use crate::problem::Problem;
use crate::result::{EquilibriumResult, FailureReason, IterationRecord};
use eq_chem::EquilibriumRecord;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, info, warn};

/// Lower clamp on bound duals relative to the central-path value τ/s.
const DUAL_SAFEGUARD: f64 = 1e10;

/// Barrier floor relative to min(τ0, tolerance).
const BARRIER_FLOOR: f64 = 1e-6;

/// Smallest barrier a warm start may begin from.
const MIN_WARM_BARRIER: f64 = 1e-300;

enum Stage {
    Initialize,
    CheckConvergence,
    AssembleResidual,
    FactorAndSolve(DMatrix<f64>, DVector<f64>),
    LineSearch(Step),
    Terminate(EquilibriumResult),
}

/// Final iterate and outcome of one run.
pub(crate) struct Outcome {
    pub result: EquilibriumResult,
    /// Last accepted free amounts and extra unknowns.
    pub iterate: Iterate,
    pub history: Vec<IterationRecord>,
}

struct Run<'a> {
    eval: &'a Evaluator<'a>,
    options: &'a EquilibriumOptions,
    record: Option<&'a EquilibriumRecord>,
    iterate: Iterate,
    point: Option<Point>,
    residuals: Option<Residuals>,
    tau: f64,
    tau_min: f64,
    error: f64,
    iterations: usize,
    history: Vec<IterationRecord>,
}

pub(crate) fn run<'a>(
    eval: &'a Evaluator<'a>,
    options: &'a EquilibriumOptions,
    record: Option<&'a EquilibriumRecord>,
) -> Outcome {
    let tau0 = options.initial_barrier;
    let mut run = Run {
        eval,
        options,
        record,
        iterate: Iterate::start(eval.problem, tau0),
        point: None,
        residuals: None,
        tau: tau0,
        tau_min: BARRIER_FLOOR * tau0.min(options.tolerance),
        error: f64::INFINITY,
        iterations: 0,
        history: Vec::new(),
    };

    let mut stage = Stage::Initialize;
    let result = loop {
        stage = match stage {
            Stage::Initialize => run.initialize(),
            Stage::CheckConvergence => run.check_convergence(),
            Stage::AssembleResidual => run.assemble_residual(),
            Stage::FactorAndSolve(k, rhs) => run.factor_and_solve(k, &rhs),
            Stage::LineSearch(step) => run.line_search(&step),
            Stage::Terminate(result) => break result,
        };
    };

    Outcome {
        result,
        iterate: run.iterate,
        history: run.history,
    }
}

impl<'a> Run<'a> {
    fn problem(&self) -> &'a Problem {
        self.eval.problem
    }

    fn fail(&self, reason: FailureReason) -> Stage {
        warn!(
            iterations = self.iterations,
            residual = self.error,
            %reason,
            "equilibrium solve failed"
        );
        Stage::Terminate(EquilibriumResult::failed(self.iterations, self.error, reason))
    }

    fn initialize(&mut self) -> Stage {
        let problem = self.problem();
        let warm = self
            .record
            .and_then(|record| Iterate::from_record(problem, record))
            .and_then(|it| match self.eval.point(&it.n, &it.p) {
                Ok(point) => Some((it, point)),
                Err(e) => {
                    debug!(error = %e, "recorded iterate not usable; starting cold");
                    None
                }
            });

        match warm {
            Some((iterate, point)) => {
                self.tau = iterate.mean_complementarity().max(MIN_WARM_BARRIER);
                self.iterate = iterate;
                self.point = Some(point);
                debug!(barrier = self.tau, "restarting from the recorded iterate");
            }
            None => match self.eval.point(&self.iterate.n, &self.iterate.p) {
                Ok(point) => {
                    self.iterate.raise_duals(problem, &point);
                    self.point = Some(point);
                }
                Err(e) => return self.fail(FailureReason::Evaluation(e.to_string())),
            },
        }
        self.tau_min = BARRIER_FLOOR * self.tau.min(self.options.tolerance);

        let Some(point) = self.point.as_ref() else {
            return self.fail(FailureReason::Evaluation("no evaluated point".to_string()));
        };
        self.error = kkt_error(problem, &self.iterate, point);
        debug!(residual = self.error, barrier = self.tau, "initial point");
        Stage::CheckConvergence
    }

    fn check_convergence(&mut self) -> Stage {
        if self.error < self.options.tolerance {
            info!(
                iterations = self.iterations,
                residual = self.error,
                "equilibrium converged"
            );
            return Stage::Terminate(EquilibriumResult::converged(self.iterations, self.error));
        }
        if self.iterations >= self.options.max_iterations {
            return self.fail(FailureReason::MaxIterations);
        }
        Stage::AssembleResidual
    }

    fn assemble_residual(&mut self) -> Stage {
        let Some(point) = self.point.as_ref() else {
            return self.fail(FailureReason::Evaluation("no evaluated point".to_string()));
        };
        let problem = self.problem();
        let jac_v = if problem.num_unknowns() > 0 {
            match self.eval.constraint_jacobian(
                point,
                &self.iterate.n,
                &self.iterate.p,
                self.options.finite_difference_step,
                self.options.epsilon,
            ) {
                Ok(j) => j,
                Err(e) => return self.fail(FailureReason::Evaluation(e.to_string())),
            }
        } else {
            DMatrix::zeros(0, problem.num_free())
        };
        let residuals = Residuals::new(problem, &self.iterate, point, self.tau);
        let (k, rhs) = assemble(problem, &self.iterate, point, &residuals, &jac_v);
        self.residuals = Some(residuals);
        Stage::FactorAndSolve(k, rhs)
    }

    fn factor_and_solve(&mut self, k: DMatrix<f64>, rhs: &DVector<f64>) -> Stage {
        let Some(residuals) = self.residuals.as_ref() else {
            return self.fail(FailureReason::SingularSystem);
        };
        match solve_step(self.problem(), &self.iterate, residuals, k, rhs) {
            Some(step) => Stage::LineSearch(step),
            None => self.fail(FailureReason::SingularSystem),
        }
    }

    fn line_search(&mut self, step: &Step) -> Stage {
        let ftb = self.options.fraction_to_boundary;
        let it = &self.iterate;

        let mut alpha_p = 1.0_f64;
        let mut alpha_d = 1.0_f64;
        for k in 0..it.n.len() {
            let dn = step.dn[k];
            if dn < 0.0 {
                alpha_p = alpha_p.min(-ftb * it.s[k] / dn);
            } else if dn > 0.0 && it.t[k].is_finite() {
                alpha_p = alpha_p.min(ftb * it.t[k] / dn);
            }
            if step.dz[k] < 0.0 {
                alpha_d = alpha_d.min(-ftb * it.z[k] / step.dz[k]);
            }
            if it.t[k].is_finite() && step.dw[k] < 0.0 {
                alpha_d = alpha_d.min(-ftb * it.w[k] / step.dw[k]);
            }
        }

        let mut last_error = String::new();
        for attempt in 0..=self.options.max_backtracks {
            let trial = self.iterate.advanced(step, alpha_p, alpha_d);
            match self.eval.point(&trial.n, &trial.p) {
                Ok(point) => {
                    self.accept(trial, point, alpha_p, alpha_d);
                    return Stage::CheckConvergence;
                }
                Err(e) => {
                    debug!(attempt, alpha_p, error = %e, "step rejected; backtracking");
                    last_error = e.to_string();
                    alpha_p *= 0.5;
                    alpha_d *= 0.5;
                }
            }
        }
        self.fail(FailureReason::Evaluation(last_error))
    }

    fn accept(&mut self, mut iterate: Iterate, point: Point, alpha_p: f64, alpha_d: f64) {
        let barrier = self.tau;
        self.tau = (self.tau * self.options.barrier_reduction).max(self.tau_min);

        for k in 0..iterate.n.len() {
            let (s, t) = (iterate.s[k], iterate.t[k]);
            if s > 0.0 {
                iterate.z[k] = iterate.z[k].max(self.tau / (DUAL_SAFEGUARD * s));
            }
            if t.is_finite() && t > 0.0 {
                iterate.w[k] = iterate.w[k].max(self.tau / (DUAL_SAFEGUARD * t));
            }
        }

        self.error = kkt_error(self.problem(), &iterate, &point);
        self.iterate = iterate;
        self.point = Some(point);
        self.iterations += 1;

        debug!(
            iteration = self.iterations,
            residual = self.error,
            alpha_p,
            alpha_d,
            barrier,
            "newton step"
        );
        self.history.push(IterationRecord {
            iteration: self.iterations,
            residual_norm: self.error,
            alpha_primal: alpha_p,
            alpha_dual: alpha_d,
            barrier,
        });
    }
}
