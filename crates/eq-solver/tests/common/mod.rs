//! Shared fixtures: a small thermodynamic database and state builders.

#![allow(dead_code)]

use eq_chem::{
    AggregateState, ChemicalModel, ChemicalProps, ChemicalState, ChemicalSystem, Database, Phase,
    Species,
};
use eq_core::units::{bar, celsius};

/// Standard Gibbs energies [J/mol] at 25 °C. Species without a state suffix
/// are aqueous.
const ENTRIES: &[(&str, Option<&str>, f64)] = &[
    ("H2O", None, -237_181.72),
    ("H+", None, 0.0),
    ("OH-", None, -157_297.48),
    ("H2", None, 17_723.42),
    ("O2", None, 16_543.54),
    ("Na+", None, -261_880.74),
    ("Cl-", None, -131_289.74),
    ("NaCl", None, -388_735.44),
    ("HCl", None, -127_235.44),
    ("NaOH", None, -417_981.60),
    ("Ca++", None, -552_790.08),
    ("Mg++", None, -453_984.92),
    ("CH4", None, -34_451.06),
    ("CO2", None, -385_974.00),
    ("HCO3-", None, -586_939.89),
    ("CO3--", None, -527_983.14),
    ("CaCl2", None, -811_696.00),
    ("CaCO3", None, -1_099_764.40),
    ("MgCO3", None, -998_971.84),
    ("SiO2", None, -833_410.96),
    ("CO2(g)", None, -394_358.74),
    ("O2(g)", None, 0.0),
    ("H2(g)", None, 0.0),
    ("H2O(g)", None, -228_131.76),
    ("CH4(g)", None, -50_720.12),
    ("CO(g)", None, -137_168.26),
    ("NaCl(s)", Some("Halite"), -384_120.49),
    ("CaCO3(s)", Some("Calcite"), -1_129_177.92),
    ("MgCO3(s)", Some("Magnesite"), -1_027_833.07),
    ("CaMg(CO3)2(s)", Some("Dolomite"), -2_166_307.84),
    ("SiO2(s)", Some("Quartz"), -856_238.86),
];

pub fn database() -> Database {
    let species = ENTRIES
        .iter()
        .map(|(formula, name, g0)| {
            let s = Species::new(formula).unwrap().with_standard_gibbs_energy(*g0);
            match name {
                Some(name) => s.with_name(*name),
                None => s,
            }
        })
        .collect();
    Database::new(species).unwrap()
}

/// Aqueous-only system from named database species.
pub fn aqueous_system(db: &Database, names: &[&str]) -> ChemicalSystem {
    ChemicalSystem::new(vec![Phase::aqueous(db.get_all(names).unwrap())]).unwrap()
}

/// Aqueous phase plus one pure phase per mineral.
pub fn aqueous_mineral_system(db: &Database, aqueous: &[&str], minerals: &[&str]) -> ChemicalSystem {
    let mut phases = vec![Phase::aqueous(db.get_all(aqueous).unwrap())];
    phases.extend(Phase::minerals(db.get_all(minerals).unwrap()));
    ChemicalSystem::new(phases).unwrap()
}

/// Brine with gas and carbonate, silicate and halide minerals.
pub fn brine_system(db: &Database) -> ChemicalSystem {
    let aqueous = db.speciate(&["H", "O", "Na", "Cl", "C", "Ca", "Mg", "Si"], AggregateState::Aqueous);
    let gaseous = db.speciate(&["H", "O", "C"], AggregateState::Gas);
    let minerals = db
        .get_all(&["Halite", "Calcite", "Magnesite", "Dolomite", "Quartz"])
        .unwrap();

    let mut phases = vec![Phase::aqueous(aqueous), Phase::gaseous(gaseous)];
    phases.extend(Phase::minerals(minerals));
    ChemicalSystem::new(phases).unwrap()
}

/// State at `t_c` °C and `p_bar` bar with the given amounts [mol].
pub fn state(system: &ChemicalSystem, t_c: f64, p_bar: f64, amounts: &[(&str, f64)]) -> ChemicalState {
    let mut state = ChemicalState::new(system);
    state.set_temperature(celsius(t_c)).unwrap();
    state.set_pressure(bar(p_bar)).unwrap();
    for (name, n) in amounts {
        state.set_species_amount(*name, *n, "mol").unwrap();
    }
    state
}

pub fn amount(state: &ChemicalState, name: &str) -> f64 {
    let i = state.system().species_index(name).unwrap();
    state.species_amounts()[i]
}

/// Model properties at the state's conditions.
pub fn props(model: &dyn ChemicalModel, state: &ChemicalState) -> ChemicalProps {
    let mut props = ChemicalProps::zeros(state.system().num_species());
    model
        .compute(
            &mut props,
            state.temperature_k(),
            state.pressure_pa(),
            state.species_amounts(),
        )
        .unwrap();
    props
}
