//! KKT residuals and the reduced Newton system of the barrier problem.
//!
//! Stationarity is scaled by RT. The slacks s = n − l and t = u − n are
//! carried with the iterate and updated by the same steps as n, so they stay
//! positive when n sits within rounding distance of a bound. The
//! complementarity rows are s·z = τ and t·w = τ; their duals are eliminated
//! and recovered after the solve.

use crate::error::{SolverError, SolverResult};
use crate::jacobian::central_difference_jacobian;
use crate::problem::Problem;
use crate::specs::{ConstraintArgs, EquilibriumSpecs};
use eq_chem::{ChemicalModel, ChemicalProps, EquilibriumRecord};
use eq_core::units::constants::R_J_PER_MOL_K;
use eq_core::{compensated_sum, ensure_all_finite, ensure_finite, inf_norm};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Negative shift on the multiplier block, used only when the plain
/// factorization is singular.
const FALLBACK_REGULARIZATION: f64 = 1e-12;

/// Primal-dual iterate over the free variables.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Iterate {
    /// Free species amounts.
    pub n: DVector<f64>,
    /// Extra unknowns (T, P, titrant amounts).
    pub p: DVector<f64>,
    /// Mass-balance multipliers.
    pub y: DVector<f64>,
    /// Lower-bound duals.
    pub z: DVector<f64>,
    /// Upper-bound duals (zero where the upper bound is infinite).
    pub w: DVector<f64>,
    /// Distances to the lower bounds.
    pub s: DVector<f64>,
    /// Distances to the upper bounds (infinite where unbounded).
    pub t: DVector<f64>,
}

impl Iterate {
    /// Interior starting iterate with duals on the central path of `tau`.
    pub fn start(problem: &Problem, tau: f64) -> Self {
        let n = problem.n_start.clone();
        let s = &n - &problem.lower;
        let t = &problem.upper - &n;
        let z = DVector::from_fn(n.len(), |k, _| tau / s[k]);
        let w = DVector::from_fn(n.len(), |k, _| {
            if t[k].is_finite() { tau / t[k] } else { 0.0 }
        });
        Self {
            n,
            p: problem.p_start.clone(),
            y: DVector::zeros(problem.num_rows()),
            z,
            w,
            s,
            t,
        }
    }

    /// Raise the bound duals to the sign-split potentials μ/RT at `point`:
    /// species pushed down get a lower dual, species pushed up an upper one.
    pub fn raise_duals(&mut self, problem: &Problem, point: &Point) {
        let rt = point.rt();
        for (k, &i) in problem.free.iter().enumerate() {
            let g = point.props.mu[i] / rt;
            self.z[k] = self.z[k].max(g);
            if self.t[k].is_finite() {
                self.w[k] = self.w[k].max(-g);
            }
        }
    }

    /// Iterate rebuilt from the record of a previous solve of the same state.
    ///
    /// Amounts are taken as stored. A recorded slack is reused only when it
    /// reproduces the stored amount exactly; otherwise it is recomputed.
    /// `None` when the record was taken at other conditions or leaves a
    /// slack or dual that is not strictly positive.
    pub fn from_record(problem: &Problem, record: &EquilibriumRecord) -> Option<Self> {
        let same_conditions = record.temperature == problem.temperature(&problem.p_start)
            && record.pressure == problem.pressure(&problem.p_start);
        let shaped = record.lower_slacks.len() == problem.template.len()
            && problem.rows.iter().all(|&e| e < record.element_potentials.len());
        if !same_conditions || !shaped {
            return None;
        }

        let nf = problem.num_free();
        let n = problem.n_state.clone();
        let mut s: DVector<f64> = DVector::zeros(nf);
        let mut t: DVector<f64> = DVector::zeros(nf);
        let mut z: DVector<f64> = DVector::zeros(nf);
        let mut w: DVector<f64> = DVector::zeros(nf);
        for (k, &i) in problem.free.iter().enumerate() {
            let (l, u) = (problem.lower[k], problem.upper[k]);
            let rs = record.lower_slacks[i];
            s[k] = if rs > 0.0 && l + rs == n[k] { rs } else { n[k] - l };
            z[k] = record.lower_duals[i];
            if u.is_finite() {
                let rt = record.upper_slacks[i];
                t[k] = if rt > 0.0 && u - rt == n[k] { rt } else { u - n[k] };
                w[k] = record.upper_duals[i];
                if !(t[k] > 0.0 && w[k] > 0.0 && w[k].is_finite()) {
                    return None;
                }
            } else {
                t[k] = f64::INFINITY;
            }
            if !(s[k] > 0.0 && z[k] > 0.0 && z[k].is_finite()) {
                return None;
            }
        }
        let y = DVector::from_iterator(
            problem.num_rows(),
            problem.rows.iter().map(|&e| record.element_potentials[e]),
        );
        if y.iter().any(|v| !v.is_finite()) {
            return None;
        }

        Some(Self {
            n,
            p: problem.p_start.clone(),
            y,
            z,
            w,
            s,
            t,
        })
    }

    /// Mean of the complementarity products s·z and t·w.
    pub fn mean_complementarity(&self) -> f64 {
        let mut total = 0.0;
        let mut count = 0usize;
        for k in 0..self.n.len() {
            total += self.s[k] * self.z[k];
            count += 1;
            if self.t[k].is_finite() {
                total += self.t[k] * self.w[k];
                count += 1;
            }
        }
        if count == 0 { 0.0 } else { total / count as f64 }
    }

    /// Iterate after a step of lengths `alpha_p` (primal, multipliers) and
    /// `alpha_d` (bound duals).
    pub fn advanced(&self, step: &Step, alpha_p: f64, alpha_d: f64) -> Self {
        let t = DVector::from_fn(self.t.len(), |k, _| {
            if self.t[k].is_finite() {
                self.t[k] - alpha_p * step.dn[k]
            } else {
                f64::INFINITY
            }
        });
        Self {
            n: &self.n + &step.dn * alpha_p,
            p: &self.p + &step.dp * alpha_p,
            y: &self.y + &step.dy * alpha_p,
            z: &self.z + &step.dz * alpha_d,
            w: &self.w + &step.dw * alpha_d,
            s: &self.s + &step.dn * alpha_p,
            t,
        }
    }

    /// Free amounts measured from the nearer bound, so an amount at its
    /// bound lands on it exactly.
    pub fn bounded_amounts(&self, problem: &Problem) -> DVector<f64> {
        DVector::from_fn(self.n.len(), |k, _| {
            if self.t[k] < self.s[k] {
                problem.upper[k] - self.t[k]
            } else {
                problem.lower[k] + self.s[k]
            }
        })
    }

    /// Slacks and multipliers over the whole system, for the next solve.
    pub fn record(
        &self,
        problem: &Problem,
        num_elements: usize,
        temperature: f64,
        pressure: f64,
    ) -> EquilibriumRecord {
        let ns = problem.template.len();
        let mut element_potentials = DVector::zeros(num_elements);
        for (r, &e) in problem.rows.iter().enumerate() {
            element_potentials[e] = self.y[r];
        }
        let mut lower_slacks = DVector::zeros(ns);
        let mut upper_slacks = DVector::zeros(ns);
        let mut lower_duals = DVector::zeros(ns);
        let mut upper_duals = DVector::zeros(ns);
        for (k, &i) in problem.free.iter().enumerate() {
            lower_slacks[i] = self.s[k];
            upper_slacks[i] = self.t[k];
            lower_duals[i] = self.z[k];
            upper_duals[i] = self.w[k];
        }
        EquilibriumRecord {
            temperature,
            pressure,
            element_potentials,
            lower_slacks,
            upper_slacks,
            lower_duals,
            upper_duals,
        }
    }
}

/// Model and constraint values at one primal point.
#[derive(Debug, Clone)]
pub(crate) struct Point {
    /// Amounts of every species, fixed ones included.
    pub n_full: DVector<f64>,
    pub t: f64,
    pub p: f64,
    pub props: ChemicalProps,
    /// Auxiliary constraint residuals.
    pub v: DVector<f64>,
}

impl Point {
    pub fn rt(&self) -> f64 {
        R_J_PER_MOL_K * self.t
    }
}

/// Evaluates the model and the auxiliary constraints for one problem.
pub(crate) struct Evaluator<'a> {
    pub problem: &'a Problem,
    pub specs: &'a EquilibriumSpecs,
    pub model: &'a dyn ChemicalModel,
}

impl<'a> Evaluator<'a> {
    pub fn new(problem: &'a Problem, specs: &'a EquilibriumSpecs, model: &'a dyn ChemicalModel) -> Self {
        Self {
            problem,
            specs,
            model,
        }
    }

    /// Model properties and constraint residuals at (n_free, p).
    pub fn point(&self, n_free: &DVector<f64>, p: &DVector<f64>) -> SolverResult<Point> {
        let t = ensure_finite(self.problem.temperature(p), "temperature")?;
        let pressure = ensure_finite(self.problem.pressure(p), "pressure")?;
        if t <= 0.0 || pressure <= 0.0 {
            return Err(SolverError::Numeric {
                what: format!("temperature {t} K or pressure {pressure} Pa out of range"),
            });
        }
        ensure_all_finite(n_free.as_slice(), "species amounts")?;

        let n_full = self.problem.full_amounts(n_free);
        let mut props = ChemicalProps::zeros(n_full.len());
        self.model.compute(&mut props, t, pressure, &n_full)?;
        let mut point = Point {
            n_full,
            t,
            p: pressure,
            props,
            v: DVector::zeros(0),
        };
        point.v = self.constraints(&point, p)?;
        Ok(point)
    }

    fn args<'p>(&'p self, point: &'p Point, p: &'p DVector<f64>) -> ConstraintArgs<'p> {
        ConstraintArgs::new(
            point.t,
            point.p,
            &point.n_full,
            &point.props,
            self.problem.titrant_amounts(p),
            self.specs.inputs(),
            &self.problem.input_values,
        )
    }

    fn constraints(&self, point: &Point, p: &DVector<f64>) -> SolverResult<DVector<f64>> {
        let args = self.args(point, p);
        let v = DVector::from_iterator(
            self.specs.constraints().len(),
            self.specs.constraints().iter().map(|c| c.residual(&args)),
        );
        if let Some(k) = v.iter().position(|x| !x.is_finite()) {
            return Err(SolverError::Numeric {
                what: format!("constraint '{}' is not finite", self.specs.constraints()[k].name),
            });
        }
        Ok(v)
    }

    /// ∂v/∂(n_free, p) at `point`.
    ///
    /// Species columns come from the constraints' amount gradients; they are
    /// differenced only when some constraint has none. Columns of the extra
    /// unknowns are always central differences.
    pub fn constraint_jacobian(
        &self,
        point: &Point,
        n_free: &DVector<f64>,
        p: &DVector<f64>,
        step: f64,
        epsilon: f64,
    ) -> SolverResult<DMatrix<f64>> {
        let nf = n_free.len();
        let nr = p.len();
        let constraints = self.specs.constraints();

        let mut jac = if constraints.iter().all(|c| c.has_amount_gradient()) {
            let mut jac = DMatrix::zeros(constraints.len(), nf + nr);
            if nr > 0 {
                let f = |p: &DVector<f64>| -> SolverResult<DVector<f64>> {
                    Ok(self.point(n_free, p)?.v)
                };
                let jp = central_difference_jacobian(p, f, step, &vec![1.0; nr])?;
                jac.view_mut((0, nf), (constraints.len(), nr)).copy_from(&jp);
            }
            jac
        } else {
            let x = DVector::from_iterator(nf + nr, n_free.iter().chain(p.iter()).copied());
            let floors: Vec<f64> = (0..x.len())
                .map(|j| if j < nf { epsilon } else { 1.0 })
                .collect();
            let f = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
                let n = x.rows(0, nf).into_owned();
                let p = x.rows(nf, x.len() - nf).into_owned();
                Ok(self.point(&n, &p)?.v)
            };
            central_difference_jacobian(&x, f, step, &floors)?
        };

        let args = self.args(point, p);
        for (c, constraint) in constraints.iter().enumerate() {
            let Some(g) = constraint.amount_gradient(&args) else {
                continue;
            };
            if g.len() != point.n_full.len() {
                return Err(SolverError::Numeric {
                    what: format!(
                        "gradient of '{}' has {} entries for {} species",
                        constraint.name,
                        g.len(),
                        point.n_full.len()
                    ),
                });
            }
            for (k, &i) in self.problem.free.iter().enumerate() {
                jac[(c, k)] = g[i];
            }
        }
        ensure_all_finite(jac.as_slice(), "constraint jacobian")?;
        Ok(jac)
    }
}

/// KKT residual blocks at an iterate for barrier parameter `tau`.
#[derive(Debug, Clone)]
pub(crate) struct Residuals {
    pub rx: DVector<f64>,
    pub v: DVector<f64>,
    pub rb: DVector<f64>,
    pub rz: DVector<f64>,
    pub rw: DVector<f64>,
}

impl Residuals {
    pub fn new(problem: &Problem, it: &Iterate, point: &Point, tau: f64) -> Self {
        let rt = point.rt();
        let aty = problem.a_free.tr_mul(&it.y);
        let rx = DVector::from_fn(it.n.len(), |k, _| {
            point.props.mu[problem.free[k]] / rt + aty[k] - it.z[k] + it.w[k]
        });
        let rz = DVector::from_fn(it.n.len(), |k, _| it.s[k] * it.z[k] - tau);
        let rw = DVector::from_fn(it.n.len(), |k, _| {
            if it.t[k].is_finite() { it.t[k] * it.w[k] - tau } else { 0.0 }
        });
        Self {
            rx,
            v: point.v.clone(),
            rb: mass_balance_residual(problem, &it.n, &it.p),
            rz,
            rw,
        }
    }

    /// Infinity norm over every block.
    pub fn norm(&self) -> f64 {
        [&self.rx, &self.v, &self.rb, &self.rz, &self.rw]
            .iter()
            .map(|b| inf_norm(b.as_slice()))
            .fold(0.0, |acc: f64, v| {
                if acc.is_nan() || v.is_nan() { f64::NAN } else { acc.max(v) }
            })
    }
}

/// A·n + Ap·p − b, each row summed with compensation so that the residual
/// resolves amounts far below the inventory.
pub(crate) fn mass_balance_residual(problem: &Problem, n: &DVector<f64>, p: &DVector<f64>) -> DVector<f64> {
    DVector::from_fn(problem.num_rows(), |r, _| {
        let species = n.iter().enumerate().map(|(k, &x)| problem.a_free[(r, k)] * x);
        let unknowns = p.iter().enumerate().map(|(c, &x)| problem.a_unknowns[(r, c)] * x);
        compensated_sum(species.chain(unknowns).chain(std::iter::once(-problem.b[r])))
    })
}

/// Optimality error: the KKT residual with τ = 0.
pub(crate) fn kkt_error(problem: &Problem, it: &Iterate, point: &Point) -> f64 {
    Residuals::new(problem, it, point, 0.0).norm()
}

/// Newton direction for every block of the iterate.
#[derive(Debug, Clone)]
pub(crate) struct Step {
    pub dn: DVector<f64>,
    pub dp: DVector<f64>,
    pub dy: DVector<f64>,
    pub dz: DVector<f64>,
    pub dw: DVector<f64>,
}

/// Assemble the reduced system
///
/// ```text
/// [ H + Σ   Hxp   Aᵀ ] [Δn]   [ −r_x − r_z/s + r_w/t ]
/// [ Vn      Vp    0  ] [Δp] = [ −v                   ]
/// [ A       Ap    0  ] [Δy]   [ −r_b                 ]
/// ```
///
/// with Σ = diag(z/s + w/t).
pub(crate) fn assemble(
    problem: &Problem,
    it: &Iterate,
    point: &Point,
    res: &Residuals,
    jac_v: &DMatrix<f64>,
) -> (DMatrix<f64>, DVector<f64>) {
    let nf = problem.num_free();
    let nr = problem.num_unknowns();
    let m = problem.num_rows();
    let dim = nf + nr + m;
    let rt = point.rt();
    let (s, t) = (&it.s, &it.t);

    let mut k = DMatrix::zeros(dim, dim);
    let mut rhs = DVector::zeros(dim);

    for (a, &i) in problem.free.iter().enumerate() {
        for (b, &j) in problem.free.iter().enumerate() {
            k[(a, b)] = point.props.dmu_dn[(i, j)] / rt;
        }
        let upper = if t[a].is_finite() { it.w[a] / t[a] } else { 0.0 };
        k[(a, a)] += it.z[a] / s[a] + upper;

        if let Some(c) = problem.layout.temperature {
            k[(a, nf + c)] = (point.props.dmu_dt[i] - point.props.mu[i] / point.t) / rt;
        }
        if let Some(c) = problem.layout.pressure {
            k[(a, nf + c)] = point.props.dmu_dp[i] / rt;
        }

        let rw_term = if t[a].is_finite() { res.rw[a] / t[a] } else { 0.0 };
        rhs[a] = -res.rx[a] - res.rz[a] / s[a] + rw_term;
    }

    let aft = problem.a_free.transpose();
    k.view_mut((0, nf + nr), (nf, m)).copy_from(&aft);

    k.view_mut((nf, 0), (nr, nf + nr)).copy_from(jac_v);
    for c in 0..nr {
        rhs[nf + c] = -res.v[c];
    }

    k.view_mut((nf + nr, 0), (m, nf)).copy_from(&problem.a_free);
    k.view_mut((nf + nr, nf), (m, nr)).copy_from(&problem.a_unknowns);
    for r in 0..m {
        rhs[nf + nr + r] = -res.rb[r];
    }

    (k, rhs)
}

/// Solve the reduced system and recover the bound duals.
///
/// A singular matrix is retried once with a small negative shift on the
/// multiplier block. `None` when that fails too or the solution is not
/// finite.
pub(crate) fn solve_step(
    problem: &Problem,
    it: &Iterate,
    res: &Residuals,
    k: DMatrix<f64>,
    rhs: &DVector<f64>,
) -> Option<Step> {
    let nf = problem.num_free();
    let nr = problem.num_unknowns();
    let m = problem.num_rows();

    let finite = |sol: DVector<f64>| sol.iter().all(|v| v.is_finite()).then_some(sol);
    let sol = match k.clone().lu().solve(rhs).and_then(finite) {
        Some(sol) => sol,
        None => {
            debug!(shift = FALLBACK_REGULARIZATION, "singular Newton matrix; regularizing");
            let mut k = k;
            for r in 0..m {
                k[(nf + nr + r, nf + nr + r)] -= FALLBACK_REGULARIZATION;
            }
            k.lu().solve(rhs).and_then(finite)?
        }
    };

    let dn = sol.rows(0, nf).into_owned();
    let dp = sol.rows(nf, nr).into_owned();
    let dy = sol.rows(nf + nr, m).into_owned();

    let (s, t) = (&it.s, &it.t);
    let dz = DVector::from_fn(nf, |a, _| (-res.rz[a] - it.z[a] * dn[a]) / s[a]);
    let dw = DVector::from_fn(nf, |a, _| {
        if t[a].is_finite() {
            (-res.rw[a] + it.w[a] * dn[a]) / t[a]
        } else {
            0.0
        }
    });

    Some(Step { dn, dp, dy, dz, dw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restrictions::EquilibriumRestrictions;
    use eq_chem::{ChemicalState, ChemicalSystem, Phase, Species, ideal_model};
    use eq_core::units::{bar, celsius};

    fn setup() -> (EquilibriumSpecs, ChemicalState) {
        let system = ChemicalSystem::new(vec![Phase::aqueous(vec![
            Species::new("H2O").unwrap().with_standard_gibbs_energy(-237181.72),
            Species::new("H+").unwrap().with_standard_gibbs_energy(0.0),
            Species::new("OH-").unwrap().with_standard_gibbs_energy(-157297.48),
        ])])
        .unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_temperature(celsius(60.0)).unwrap();
        state.set_pressure(bar(100.0)).unwrap();
        state.set_species_amount("H2O", 55.0, "mol").unwrap();
        (EquilibriumSpecs::tp(&system), state)
    }

    #[test]
    fn starting_iterate_is_on_the_central_path() {
        let (specs, state) = setup();
        let problem = Problem::setup(&specs, &state, None, None, 1e-16).unwrap();
        let model = ideal_model(specs.system()).unwrap();
        let it = Iterate::start(&problem, 1e-16);
        let point = Evaluator::new(&problem, &specs, &model)
            .point(&it.n, &it.p)
            .unwrap();
        let res = Residuals::new(&problem, &it, &point, 1e-16);
        assert!(res.rz.iter().all(|v| v.abs() < 1e-30));
        // Mass balance is exact up to the interior lift.
        assert!(res.rb.amax() < 1e-12);
        assert!(kkt_error(&problem, &it, &point) > 1.0);
    }

    #[test]
    fn newton_step_satisfies_the_linearized_mass_balance() {
        let (specs, state) = setup();
        let problem = Problem::setup(&specs, &state, None, None, 1e-16).unwrap();
        let model = ideal_model(specs.system()).unwrap();
        let it = Iterate::start(&problem, 1e-16);
        let point = Evaluator::new(&problem, &specs, &model)
            .point(&it.n, &it.p)
            .unwrap();
        let res = Residuals::new(&problem, &it, &point, 1e-16);
        let jac = DMatrix::zeros(0, problem.num_free());
        let (k, rhs) = assemble(&problem, &it, &point, &res, &jac);
        assert_eq!(k.nrows(), 5);
        let step = solve_step(&problem, &it, &res, k, &rhs).unwrap();
        assert_eq!(step.dn.len(), 3);
        assert_eq!(step.dy.len(), 2);
        assert!(step.dp.is_empty());
        let change = &problem.a_free * &step.dn;
        for r in 0..problem.num_rows() {
            assert!((change[r] + res.rb[r]).abs() < 1e-6);
        }
    }

    #[test]
    fn singular_system_yields_none() {
        let (specs, state) = setup();
        let problem = Problem::setup(&specs, &state, None, None, 1e-16).unwrap();
        let it = Iterate::start(&problem, 1e-16);
        let res = Residuals {
            rx: DVector::zeros(3),
            v: DVector::zeros(0),
            rb: DVector::zeros(2),
            rz: DVector::zeros(3),
            rw: DVector::zeros(3),
        };
        let k = DMatrix::zeros(5, 5);
        let rhs = DVector::from_element(5, 1.0);
        assert!(solve_step(&problem, &it, &res, k, &rhs).is_none());
    }

    #[test]
    fn mass_balance_keeps_amounts_below_rounding_of_the_inventory() {
        let (specs, state) = setup();
        let problem = Problem::setup(&specs, &state, None, None, 1e-16).unwrap();
        let n = DVector::from_vec(vec![55.0, 1e-18, 1e-18]);
        let rb = mass_balance_residual(&problem, &n, &DVector::zeros(0));
        assert_eq!(rb.as_slice(), &[2e-18, 1e-18]);
    }

    #[test]
    fn upper_slack_stays_positive_next_to_a_cap() {
        let (specs, state) = setup();
        let mut r = EquilibriumRestrictions::new(state.system());
        r.cannot_increase_above("OH-", 0.007, "mol").unwrap();
        let problem = Problem::setup(&specs, &state, None, Some(&r), 1e-16).unwrap();
        assert_eq!(problem.upper[2], 0.007);

        let mut it = Iterate::start(&problem, 1e-16);
        it.n[2] = 0.007 - 1e-20;
        it.s[2] = it.n[2] - problem.lower[2];
        it.t[2] = 1e-20;
        assert_eq!(problem.upper[2] - it.n[2], 0.0);

        let step = Step {
            dn: DVector::from_vec(vec![0.0, 0.0, 5e-21]),
            dp: DVector::zeros(0),
            dy: DVector::zeros(2),
            dz: DVector::zeros(3),
            dw: DVector::zeros(3),
        };
        let next = it.advanced(&step, 1.0, 1.0);
        assert!(next.t[2] > 0.0 && next.t[2] < 1e-20);

        let model = ideal_model(specs.system()).unwrap();
        let point = Evaluator::new(&problem, &specs, &model)
            .point(&next.n, &next.p)
            .unwrap();
        let res = Residuals::new(&problem, &next, &point, 1e-16);
        assert!(res.norm().is_finite());
        let (k, rhs) = assemble(&problem, &next, &point, &res, &DMatrix::zeros(0, 3));
        assert!(k.iter().chain(rhs.iter()).all(|v| v.is_finite()));

        let amounts = next.bounded_amounts(&problem);
        assert_eq!(amounts[2], 0.007);
    }

    #[test]
    fn record_restores_the_iterate_of_an_unchanged_state() {
        let (specs, mut state) = setup();
        let problem = Problem::setup(&specs, &state, None, None, 1e-16).unwrap();
        let mut it = Iterate::start(&problem, 1e-16);
        it.y = DVector::from_vec(vec![-40.0, 10.0]);

        state
            .set_species_amounts(problem.full_amounts(&it.bounded_amounts(&problem)))
            .unwrap();
        let t = state.temperature_k();
        let p = state.pressure_pa();
        state
            .set_equilibrium_record(it.record(&problem, 3, t, p))
            .unwrap();

        let again = Problem::setup(&specs, &state, None, None, 1e-16).unwrap();
        let record = state.equilibrium_record().unwrap();
        let warm = Iterate::from_record(&again, record).unwrap();
        assert_eq!(warm.s, it.s);
        assert_eq!(warm.z, it.z);
        assert_eq!(warm.y, it.y);
        assert!(warm.mean_complementarity() > 0.0);

        let hotter = EquilibriumRecord {
            temperature: t + 1.0,
            ..record.clone()
        };
        assert!(Iterate::from_record(&again, &hotter).is_none());
    }
}
