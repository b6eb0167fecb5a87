//! Unit-aware conversion of scalar inputs into canonical SI values.
//!
//! Equilibrium conditions and restrictions arrive as `(value, unit)` pairs
//! (`60.0, "celsius"`, `100.0, "bar"`, `7.0, "mmol"`). Each declared input has
//! a [`Quantity`] family which decides the accepted unit tags and the
//! canonical unit the solver works in.

use crate::error::{EqError, EqResult};
use std::fmt;

/// Dimension/quantity family of a scalar input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    /// Temperature (canonical: K)
    Temperature,
    /// Absolute pressure (canonical: Pa)
    Pressure,
    /// Amount of substance (canonical: mol)
    Amount,
    /// Molar energy, e.g. a chemical potential (canonical: J/mol)
    MolarEnergy,
    /// Dimensionless (pH, ln activity, ...)
    Dimensionless,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "Temperature"),
            Self::Pressure => write!(f, "Pressure"),
            Self::Amount => write!(f, "Amount"),
            Self::MolarEnergy => write!(f, "Molar Energy"),
            Self::Dimensionless => write!(f, "Dimensionless"),
        }
    }
}

impl Quantity {
    fn label(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Pressure => "Pressure",
            Self::Amount => "Amount",
            Self::MolarEnergy => "Molar Energy",
            Self::Dimensionless => "Dimensionless",
        }
    }
}

/// Convert `value` expressed in `unit` into the canonical SI unit of `quantity`.
///
/// An empty unit means the value is already canonical.
pub fn convert_to_si(value: f64, unit: &str, quantity: Quantity) -> EqResult<f64> {
    if !value.is_finite() {
        return Err(EqError::NonFinite {
            what: quantity.label(),
            value,
        });
    }
    let unit = unit.trim();
    match quantity {
        Quantity::Temperature => convert_temperature(value, unit),
        Quantity::Pressure => convert_pressure(value, unit),
        Quantity::Amount => convert_amount(value, unit),
        Quantity::MolarEnergy => convert_molar_energy(value, unit),
        Quantity::Dimensionless => match unit {
            "" | "-" | "1" => Ok(value),
            _ => Err(unknown(unit, quantity)),
        },
    }
}

fn unknown(unit: &str, quantity: Quantity) -> EqError {
    EqError::UnknownUnit {
        unit: unit.to_string(),
        quantity: quantity.label(),
    }
}

/// Temperature in kelvin.
fn convert_temperature(value: f64, unit: &str) -> EqResult<f64> {
    let kelvin = match unit.to_lowercase().as_str() {
        "" | "k" | "kelvin" => value,
        "c" | "°c" | "degc" | "celsius" => value + 273.15,
        "f" | "°f" | "degf" | "fahrenheit" => (value + 459.67) * 5.0 / 9.0,
        "r" | "°r" | "rankine" => value * 5.0 / 9.0,
        _ => return Err(unknown(unit, Quantity::Temperature)),
    };

    if kelvin <= 0.0 {
        return Err(EqError::OutOfRange {
            value: kelvin,
            reason: "absolute temperature must be > 0 K",
        });
    }

    Ok(kelvin)
}

/// Absolute pressure in pascal.
fn convert_pressure(value: f64, unit: &str) -> EqResult<f64> {
    let pa = match unit.to_lowercase().as_str() {
        "" | "pa" | "pascal" => value,
        "kpa" => value * 1e3,
        "mpa" => value * 1e6,
        "gpa" => value * 1e9,
        "bar" => value * 1e5,
        "mbar" | "millibar" => value * 100.0,
        "atm" => value * 101_325.0,
        "torr" | "mmhg" => value * 133.322,
        "psia" => value * 6_894.76,
        _ => return Err(unknown(unit, Quantity::Pressure)),
    };

    if pa <= 0.0 {
        return Err(EqError::OutOfRange {
            value: pa,
            reason: "absolute pressure must be positive",
        });
    }

    Ok(pa)
}

/// Amount of substance in mole.
fn convert_amount(value: f64, unit: &str) -> EqResult<f64> {
    let mol = match unit {
        "" | "mol" | "mole" => value,
        "kmol" => value * 1e3,
        "mmol" => value * 1e-3,
        "umol" | "µmol" => value * 1e-6,
        "nmol" => value * 1e-9,
        _ => return Err(unknown(unit, Quantity::Amount)),
    };

    if mol < 0.0 {
        return Err(EqError::OutOfRange {
            value: mol,
            reason: "amount cannot be negative",
        });
    }

    Ok(mol)
}

/// Molar energy in J/mol.
fn convert_molar_energy(value: f64, unit: &str) -> EqResult<f64> {
    match unit.to_lowercase().as_str() {
        "" | "j/mol" => Ok(value),
        "kj/mol" => Ok(value * 1e3),
        "cal/mol" => Ok(value * 4.184),
        "kcal/mol" => Ok(value * 4_184.0),
        _ => Err(unknown(unit, Quantity::MolarEnergy)),
    }
}
