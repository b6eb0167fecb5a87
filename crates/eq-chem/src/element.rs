//! Chemical element table.

/// Symbol of the synthetic charge pseudo-element appended to every system.
pub const CHARGE_SYMBOL: &str = "Z";

/// (symbol, molar mass [kg/mol]) for the elements the formula parser accepts.
const ELEMENTS: &[(&str, f64)] = &[
    ("H", 0.001_007_94),
    ("He", 0.004_002_602),
    ("Li", 0.006_941),
    ("Be", 0.009_012_182),
    ("B", 0.010_811),
    ("C", 0.012_010_7),
    ("N", 0.014_006_7),
    ("O", 0.015_999_4),
    ("F", 0.018_998_403_2),
    ("Ne", 0.020_179_7),
    ("Na", 0.022_989_77),
    ("Mg", 0.024_305),
    ("Al", 0.026_981_538),
    ("Si", 0.028_085_5),
    ("P", 0.030_973_761),
    ("S", 0.032_065),
    ("Cl", 0.035_453),
    ("Ar", 0.039_948),
    ("K", 0.039_098_3),
    ("Ca", 0.040_078),
    ("Ti", 0.047_867),
    ("Cr", 0.051_996_1),
    ("Mn", 0.054_938_049),
    ("Fe", 0.055_845),
    ("Co", 0.058_933_2),
    ("Ni", 0.058_693_4),
    ("Cu", 0.063_546),
    ("Zn", 0.065_409),
    ("Br", 0.079_904),
    ("Sr", 0.087_62),
    ("Ag", 0.107_868_2),
    ("Cd", 0.112_411),
    ("I", 0.126_904_47),
    ("Ba", 0.137_327),
    ("Hg", 0.200_59),
    ("Pb", 0.207_2),
    ("U", 0.238_028_91),
];

/// Molar mass [kg/mol] of an element, or `None` if the symbol is unknown.
pub fn molar_mass(symbol: &str) -> Option<f64> {
    ELEMENTS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, m)| *m)
}

/// Whether `symbol` is a known element.
pub fn is_element(symbol: &str) -> bool {
    molar_mass(symbol).is_some()
}
