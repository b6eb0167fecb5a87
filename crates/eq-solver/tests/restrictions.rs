//! Species amount restrictions: pinned, capped and floored species.

mod common;

use common::{amount, aqueous_mineral_system, brine_system, database, state};
use eq_chem::ideal_model;
use eq_solver::{EquilibriumRestrictions, EquilibriumSolver, EquilibriumSpecs, SolverError};
use proptest::prelude::*;

#[test]
fn halite_that_cannot_react_keeps_its_amount() {
    let db = database();
    let system = aqueous_mineral_system(&db, &["H2O", "H+", "OH-", "Na+", "Cl-", "NaCl"], &["Halite"]);
    let model = ideal_model(&system).unwrap();
    let specs = EquilibriumSpecs::tp(&system);
    let mut solver = EquilibriumSolver::new(&model, &specs).unwrap();

    let mut s = state(
        &system,
        60.0,
        100.0,
        &[("H2O", 55.0), ("NaCl", 0.01), ("Halite", 0.03)],
    );
    let mut restrictions = EquilibriumRestrictions::new(&system);
    restrictions.cannot_react("Halite").unwrap();

    let result = solver.solve_with_restrictions(&mut s, &restrictions).unwrap();

    assert!(result.succeeded, "{result:?}");
    assert_eq!(amount(&s, "Halite"), 0.03);
    let sodium = amount(&s, "Na+") + amount(&s, "NaCl");
    assert!((sodium - 0.01).abs() < 1e-9);
}

#[test]
fn quartz_cap_is_active() {
    let db = database();
    let system = aqueous_mineral_system(&db, &["H2O", "H+", "OH-", "SiO2"], &["Quartz"]);
    let model = ideal_model(&system).unwrap();
    let specs = EquilibriumSpecs::tp(&system);
    let mut solver = EquilibriumSolver::new(&model, &specs).unwrap();

    // Without a cap almost all silica precipitates.
    let mut free = state(&system, 60.0, 100.0, &[("H2O", 55.0), ("SiO2", 0.01)]);
    let result = solver.solve(&mut free).unwrap();
    assert!(result.succeeded, "{result:?}");
    assert!(amount(&free, "Quartz") > 0.0095);

    let mut capped = state(&system, 60.0, 100.0, &[("H2O", 55.0), ("SiO2", 0.01)]);
    let mut restrictions = EquilibriumRestrictions::new(&system);
    restrictions
        .cannot_increase_above("Quartz", 0.007, "mol")
        .unwrap();
    let result = solver.solve_with_restrictions(&mut capped, &restrictions).unwrap();
    assert!(result.succeeded, "{result:?}");
    let quartz = amount(&capped, "Quartz");
    assert!(quartz <= 0.007);
    assert!((quartz - 0.007).abs() < 1e-8, "quartz = {quartz}");
    assert!((amount(&capped, "SiO2") - 0.003).abs() < 1e-8);
}

#[test]
fn brine_with_gas_and_minerals_honors_every_restriction() {
    let db = database();
    let system = brine_system(&db);
    let model = ideal_model(&system).unwrap();
    let specs = EquilibriumSpecs::tp(&system);
    let mut solver = EquilibriumSolver::new(&model, &specs).unwrap();

    let mut s = state(
        &system,
        60.0,
        100.0,
        &[
            ("H2O", 55.0),
            ("NaCl", 0.01),
            ("CO2", 10.0),
            ("CaCO3", 0.10),
            ("MgCO3", 0.20),
            ("SiO2", 0.01),
            ("Halite", 0.03),
        ],
    );
    let b0 = s.element_amounts();

    let mut restrictions = EquilibriumRestrictions::new(&system);
    restrictions
        .cannot_increase_above("Quartz", 0.007, "mol")
        .unwrap();
    restrictions
        .cannot_decrease_below("MgCO3", 0.10, "mol")
        .unwrap();
    restrictions.cannot_react("Halite").unwrap();

    let result = solver.solve_with_restrictions(&mut s, &restrictions).unwrap();

    assert!(result.succeeded, "{result:?}");
    assert!((amount(&s, "Quartz") - 0.007).abs() < 1e-6);
    assert!(amount(&s, "Quartz") <= 0.007);
    assert!(amount(&s, "MgCO3") >= 0.10);
    assert_eq!(amount(&s, "Halite"), 0.03);
    assert!((&s.element_amounts() - &b0).amax() < 1e-8);
}

#[test]
fn empty_interval_is_a_configuration_error() {
    let db = database();
    let system = aqueous_mineral_system(&db, &["H2O", "H+", "OH-", "SiO2"], &["Quartz"]);
    let model = ideal_model(&system).unwrap();
    let specs = EquilibriumSpecs::tp(&system);
    let mut solver = EquilibriumSolver::new(&model, &specs).unwrap();

    let mut s = state(&system, 60.0, 100.0, &[("H2O", 55.0), ("SiO2", 0.01)]);
    let before = s.species_amounts().clone();
    let mut restrictions = EquilibriumRestrictions::new(&system);
    restrictions.cannot_decrease_below("Quartz", 0.2, "mol").unwrap();
    restrictions.cannot_increase_above("Quartz", 0.1, "mol").unwrap();

    let err = solver
        .solve_with_restrictions(&mut s, &restrictions)
        .unwrap_err();
    assert!(matches!(err, SolverError::InfeasibleBounds { .. }));
    assert_eq!(s.species_amounts(), &before);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn capped_quartz_sits_on_its_cap(cap in 0.001f64..0.009) {
        let db = database();
        let system = aqueous_mineral_system(&db, &["H2O", "H+", "OH-", "SiO2"], &["Quartz"]);
        let model = ideal_model(&system).unwrap();
        let specs = EquilibriumSpecs::tp(&system);
        let mut solver = EquilibriumSolver::new(&model, &specs).unwrap();

        let mut s = state(&system, 60.0, 100.0, &[("H2O", 55.0), ("SiO2", 0.01)]);
        let mut restrictions = EquilibriumRestrictions::new(&system);
        restrictions.cannot_increase_above("Quartz", cap, "mol").unwrap();
        let result = solver.solve_with_restrictions(&mut s, &restrictions).unwrap();

        prop_assert!(result.succeeded);
        let quartz = amount(&s, "Quartz");
        prop_assert!(quartz <= cap);
        prop_assert!((quartz - cap).abs() < 1e-8);
    }

    #[test]
    fn a_cap_never_raises_the_capped_amount(cap in 0.0005f64..0.02) {
        let db = database();
        let system = aqueous_mineral_system(&db, &["H2O", "H+", "OH-", "SiO2"], &["Quartz"]);
        let model = ideal_model(&system).unwrap();
        let specs = EquilibriumSpecs::tp(&system);
        let mut solver = EquilibriumSolver::new(&model, &specs).unwrap();

        let mut free = state(&system, 60.0, 100.0, &[("H2O", 55.0), ("SiO2", 0.01)]);
        prop_assert!(solver.solve(&mut free).unwrap().succeeded);

        let mut capped = state(&system, 60.0, 100.0, &[("H2O", 55.0), ("SiO2", 0.01)]);
        let mut restrictions = EquilibriumRestrictions::new(&system);
        restrictions.cannot_increase_above("Quartz", cap, "mol").unwrap();
        let result = solver.solve_with_restrictions(&mut capped, &restrictions).unwrap();
        prop_assert!(result.succeeded, "{:?}", result);

        let n_free = amount(&free, "Quartz");
        let n_capped = amount(&capped, "Quartz");
        prop_assert!(n_capped <= cap);
        prop_assert!(n_capped <= n_free + 1e-12, "capped {} above free {}", n_capped, n_free);
    }
}
