// eq-core/src/units.rs

use uom::si::f64::{
    AmountOfSubstance as UomAmountOfSubstance, MolarEnergy as UomMolarEnergy,
    Pressure as UomPressure, Ratio as UomRatio,
    ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type Amount = UomAmountOfSubstance;
pub type MolarEnergy = UomMolarEnergy;
pub type Pressure = UomPressure;
pub type Ratio = UomRatio;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn celsius(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn mol(v: f64) -> Amount {
    use uom::si::amount_of_substance::mole;
    Amount::new::<mole>(v)
}

#[inline]
pub fn j_per_mol(v: f64) -> MolarEnergy {
    use uom::si::molar_energy::joule_per_mole;
    MolarEnergy::new::<joule_per_mole>(v)
}

#[inline]
pub fn unitless(v: f64) -> Ratio {
    use uom::si::ratio::ratio;
    Ratio::new::<ratio>(v)
}

/// Temperature in kelvin.
#[inline]
pub fn kelvin_of(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    t.get::<kelvin>()
}

/// Pressure in pascal.
#[inline]
pub fn pascal_of(p: Pressure) -> f64 {
    use uom::si::pressure::pascal;
    p.get::<pascal>()
}

/// Amount in mole.
#[inline]
pub fn mole_of(n: Amount) -> f64 {
    use uom::si::amount_of_substance::mole;
    n.get::<mole>()
}

pub mod constants {
    use super::*;

    /// Universal gas constant [J/(mol·K)].
    pub const R_J_PER_MOL_K: f64 = 8.314_462_618;

    /// Standard-state reference pressure [Pa].
    pub const P_REF_PA: f64 = 1.0e5;

    /// Molar mass of water [kg/mol].
    pub const WATER_MOLAR_MASS_KG: f64 = 0.018_015_28;

    #[inline]
    pub fn p_ref() -> Pressure {
        pa(P_REF_PA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _p = pa(101_325.0);
        let _t = k(300.0);
        let _n = mol(55.0);
        let _g = j_per_mol(-237_181.72);
        let _r = unitless(0.5);
        let _p0 = constants::p_ref();
    }

    #[test]
    fn celsius_and_bar_convert_to_si() {
        assert!((kelvin_of(celsius(60.0)) - 333.15).abs() < 1e-9);
        assert!((pascal_of(bar(100.0)) - 1.0e7).abs() < 1e-6);
        assert!((mole_of(mol(2.5)) - 2.5).abs() < 1e-15);
    }
}
