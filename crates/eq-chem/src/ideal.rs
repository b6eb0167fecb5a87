//! Reference ideal property models.
//!
//! μᵢ = G°ᵢ(T, P) + RT ln aᵢ with
//! - aqueous solvent: a = x_w; aqueous solutes: a = mᵢ = nᵢ / (n_w M_w)
//! - ideal gas: a = xᵢ P / P°
//! - ideal solution: a = xᵢ
//! - pure condensed phase: a = 1
//!
//! Amounts must be strictly positive for species in non-pure phases.

use crate::error::{ChemError, ChemResult};
use crate::model::{Chain, ChemicalModel, ChemicalProps, chain};
use crate::param::Param;
use crate::phase::ActivityModel;
use crate::species::StandardGibbs;
use crate::system::ChemicalSystem;
use eq_core::units::constants::{P_REF_PA, R_J_PER_MOL_K, WATER_MOLAR_MASS_KG};
use nalgebra::DVector;
use std::ops::Range;

/// Standard Gibbs energy contribution G°ᵢ(T, P).
pub struct StandardGibbsModel {
    g0: Vec<StandardGibbs>,
}

impl StandardGibbsModel {
    pub fn new(system: &ChemicalSystem) -> Self {
        Self {
            g0: system
                .species()
                .iter()
                .map(|s| s.standard_gibbs().clone())
                .collect(),
        }
    }
}

impl ChemicalModel for StandardGibbsModel {
    fn name(&self) -> &str {
        "StandardGibbs"
    }

    fn evaluate(&self, props: &mut ChemicalProps, t: f64, p: f64, n: &DVector<f64>) -> ChemResult<()> {
        if n.len() != self.g0.len() {
            return Err(ChemError::InvalidArg {
                what: format!("expected {} amounts, got {}", self.g0.len(), n.len()),
            });
        }
        for (i, g0) in self.g0.iter().enumerate() {
            let (dgdt, dgdp) = g0.derivatives(t, p);
            props.mu[i] += g0.value(t, p);
            props.dmu_dt[i] += dgdt;
            props.dmu_dp[i] += dgdp;
        }
        Ok(())
    }

    fn params(&self) -> Vec<Param> {
        self.g0.iter().filter_map(|g| g.param().cloned()).collect()
    }
}

#[derive(Debug, Clone)]
enum PhaseActivity {
    Aqueous { range: Range<usize>, water: usize },
    Gas { range: Range<usize> },
    Solution { range: Range<usize> },
    Pure,
}

/// Ideal activity contribution RT ln aᵢ.
pub struct IdealActivityModel {
    phases: Vec<PhaseActivity>,
    num_species: usize,
}

impl IdealActivityModel {
    /// Build from the phase models recorded in `system`.
    ///
    /// Aqueous phases must contain a neutral `H2O` species as solvent.
    pub fn new(system: &ChemicalSystem) -> ChemResult<Self> {
        let mut phases = Vec::with_capacity(system.phases().len());
        for info in system.phases() {
            let range = info.species.clone();
            let activity = match info.model {
                ActivityModel::IdealAqueous => {
                    let water = range
                        .clone()
                        .find(|&i| is_water(system, i))
                        .ok_or_else(|| ChemError::InvalidArg {
                            what: format!("aqueous phase '{}' has no H2O solvent", info.name),
                        })?;
                    PhaseActivity::Aqueous { range, water }
                }
                ActivityModel::IdealGas => PhaseActivity::Gas { range },
                ActivityModel::IdealSolution => PhaseActivity::Solution { range },
                ActivityModel::Pure => PhaseActivity::Pure,
            };
            phases.push(activity);
        }
        Ok(Self {
            phases,
            num_species: system.num_species(),
        })
    }
}

fn is_water(system: &ChemicalSystem, i: usize) -> bool {
    let f = system.species()[i].formula();
    f.charge() == 0.0
        && f.elements().len() == 2
        && f.coefficient("H") == 2.0
        && f.coefficient("O") == 1.0
}

impl ChemicalModel for IdealActivityModel {
    fn name(&self) -> &str {
        "IdealActivity"
    }

    fn evaluate(&self, props: &mut ChemicalProps, t: f64, p: f64, n: &DVector<f64>) -> ChemResult<()> {
        if n.len() != self.num_species {
            return Err(ChemError::InvalidArg {
                what: format!("expected {} amounts, got {}", self.num_species, n.len()),
            });
        }
        let rt = R_J_PER_MOL_K * t;

        for phase in &self.phases {
            match phase {
                PhaseActivity::Aqueous { range, water } => {
                    let total: f64 = n.rows(range.start, range.len()).sum();
                    let nw = n[*water];
                    for i in range.clone() {
                        let ln_a = if i == *water {
                            (nw / total).ln()
                        } else {
                            (n[i] / (nw * WATER_MOLAR_MASS_KG)).ln()
                        };
                        add_activity(props, i, ln_a, rt);
                        for j in range.clone() {
                            let d = if i == *water {
                                delta(j, *water) / nw - 1.0 / total
                            } else {
                                delta(i, j) / n[i] - delta(j, *water) / nw
                            };
                            props.dmu_dn[(i, j)] += rt * d;
                        }
                    }
                }
                PhaseActivity::Gas { range } => {
                    let total: f64 = n.rows(range.start, range.len()).sum();
                    for i in range.clone() {
                        let ln_a = (n[i] / total).ln() + (p / P_REF_PA).ln();
                        add_activity(props, i, ln_a, rt);
                        props.dmu_dp[i] += rt / p;
                        for j in range.clone() {
                            props.dmu_dn[(i, j)] += rt * (delta(i, j) / n[i] - 1.0 / total);
                        }
                    }
                }
                PhaseActivity::Solution { range } => {
                    let total: f64 = n.rows(range.start, range.len()).sum();
                    for i in range.clone() {
                        add_activity(props, i, (n[i] / total).ln(), rt);
                        for j in range.clone() {
                            props.dmu_dn[(i, j)] += rt * (delta(i, j) / n[i] - 1.0 / total);
                        }
                    }
                }
                PhaseActivity::Pure => {}
            }
        }
        Ok(())
    }
}

fn add_activity(props: &mut ChemicalProps, i: usize, ln_a: f64, rt: f64) {
    props.ln_a[i] += ln_a;
    props.mu[i] += rt * ln_a;
    props.dmu_dt[i] += R_J_PER_MOL_K * ln_a;
}

#[inline]
fn delta(i: usize, j: usize) -> f64 {
    if i == j { 1.0 } else { 0.0 }
}

/// Standard Gibbs energies plus ideal activities for every phase of `system`.
pub fn ideal_model(system: &ChemicalSystem) -> ChemResult<Chain> {
    Ok(chain(vec![
        Box::new(StandardGibbsModel::new(system)),
        Box::new(IdealActivityModel::new(system)?),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;
    use crate::species::Species;

    fn system() -> ChemicalSystem {
        let aq = Phase::aqueous(vec![
            Species::new("H2O").unwrap().with_standard_gibbs_energy(-237_181.72),
            Species::new("H+").unwrap(),
            Species::new("OH-").unwrap().with_standard_gibbs_energy(-157_297.48),
        ]);
        let gas = Phase::gaseous(vec![
            Species::new("H2(g)").unwrap(),
            Species::new("O2(g)").unwrap(),
        ]);
        let mineral = Phase::mineral(
            Species::new("SiO2(s)")
                .unwrap()
                .with_name("Quartz")
                .with_standard_gibbs_energy(-856_238.86),
        );
        ChemicalSystem::new(vec![aq, gas, mineral]).unwrap()
    }

    fn amounts() -> DVector<f64> {
        DVector::from_vec(vec![55.0, 1e-3, 2e-3, 0.5, 1.5, 2.0])
    }

    fn evaluate(model: &dyn ChemicalModel, t: f64, p: f64, n: &DVector<f64>) -> ChemicalProps {
        let mut props = ChemicalProps::zeros(n.len());
        model.compute(&mut props, t, p, n).unwrap();
        props
    }

    #[test]
    fn activities_follow_ideal_laws() {
        let sys = system();
        let model = ideal_model(&sys).unwrap();
        let n = amounts();
        let props = evaluate(&model, 298.15, 2e5, &n);

        let xw: f64 = 55.0 / (55.0 + 3e-3);
        assert!((props.ln_a[0] - xw.ln()).abs() < 1e-12);
        let m_h = 1e-3 / (55.0 * WATER_MOLAR_MASS_KG);
        assert!((props.ln_a[1] - m_h.ln()).abs() < 1e-12);
        let a_h2: f64 = 0.25 * 2.0;
        assert!((props.ln_a[3] - a_h2.ln()).abs() < 1e-12);
        assert_eq!(props.ln_a[5], 0.0);
        assert_eq!(props.mu[5], -856_238.86);

        let rt = R_J_PER_MOL_K * 298.15;
        assert!((props.mu[2] - (-157_297.48 + rt * props.ln_a[2])).abs() < 1e-6);
    }

    #[test]
    fn amount_derivatives_match_finite_differences() {
        let sys = system();
        let model = IdealActivityModel::new(&sys).unwrap();
        let n = amounts();
        let props = evaluate(&model, 330.0, 1e6, &n);

        for j in 0..n.len() {
            let h = 1e-5 * n[j];
            let mut plus = n.clone();
            plus[j] += h;
            let mut minus = n.clone();
            minus[j] -= h;
            let mp = evaluate(&model, 330.0, 1e6, &plus).mu;
            let mm = evaluate(&model, 330.0, 1e6, &minus).mu;
            for i in 0..n.len() {
                let fd = (mp[i] - mm[i]) / (2.0 * h);
                let exact = props.dmu_dn[(i, j)];
                assert!(
                    (fd - exact).abs() <= 1e-4 * exact.abs().max(1.0),
                    "d mu[{i}]/d n[{j}]: fd={fd} exact={exact}"
                );
            }
        }
    }

    #[test]
    fn temperature_and_pressure_derivatives() {
        let sys = system();
        let model = ideal_model(&sys).unwrap();
        let n = amounts();
        let props = evaluate(&model, 330.0, 1e6, &n);

        let up = evaluate(&model, 330.01, 1e6, &n).mu;
        let dn = evaluate(&model, 329.99, 1e6, &n).mu;
        for i in 0..n.len() {
            let fd = (up[i] - dn[i]) / 0.02;
            assert!((fd - props.dmu_dt[i]).abs() < 1e-3, "dmu/dT[{i}]");
        }

        let up = evaluate(&model, 330.0, 1e6 + 1.0, &n).mu;
        let dn = evaluate(&model, 330.0, 1e6 - 1.0, &n).mu;
        for i in 0..n.len() {
            let fd = (up[i] - dn[i]) / 2.0;
            assert!((fd - props.dmu_dp[i]).abs() < 1e-6, "dmu/dP[{i}]");
        }
    }

    #[test]
    fn aqueous_phase_requires_water() {
        let sys = ChemicalSystem::new(vec![Phase::aqueous(vec![
            Species::new("Na+").unwrap(),
            Species::new("Cl-").unwrap(),
        ])])
        .unwrap();
        assert!(IdealActivityModel::new(&sys).is_err());
    }

    #[test]
    fn standard_gibbs_params_are_reported() {
        let g0 = Param::new(-1000.0);
        let sys = ChemicalSystem::new(vec![Phase::gaseous(vec![
            Species::new("CO2(g)").unwrap().with_standard_gibbs_param(g0.clone()),
            Species::new("CO(g)").unwrap(),
        ])])
        .unwrap();
        let model = ideal_model(&sys).unwrap();
        assert_eq!(model.params().len(), 1);
        assert!(model.params()[0].ptr_eq(&g0));
    }
}
