//! Float helpers shared by the chemistry and solver crates.

use crate::EqError;

/// Floating point type used throughout the workspace.
pub type Real = f64;

/// Mixed tolerance: two values agree when they are within `abs` of each other
/// or within `rel` of the larger magnitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Tolerances {
    pub const fn new(abs: Real, rel: Real) -> Self {
        Self { abs, rel }
    }

    pub fn approx_eq(&self, a: Real, b: Real) -> bool {
        let diff = (a - b).abs();
        diff <= self.abs || diff <= self.rel * a.abs().max(b.abs())
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::new(1e-12, 1e-9)
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    tol.approx_eq(a, b)
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, EqError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EqError::NonFinite { what, value: v })
    }
}

/// Fails on the first non-finite entry.
pub fn ensure_all_finite(values: &[Real], what: &'static str) -> Result<(), EqError> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(&value) => Err(EqError::NonFinite { what, value }),
        None => Ok(()),
    }
}

/// Largest magnitude in `values`; 0 when empty, NaN if any entry is NaN.
pub fn inf_norm(values: &[Real]) -> Real {
    values.iter().try_fold(0.0, |acc: Real, v| {
        if v.is_nan() { None } else { Some(acc.max(v.abs())) }
    })
    .unwrap_or(Real::NAN)
}

/// Sum with Neumaier compensation.
///
/// Mass-balance residuals cancel terms of order 10² down to 10⁻¹⁶ and below;
/// a naive sum leaves rounding noise of the size of the smallest amounts.
pub fn compensated_sum<I>(values: I) -> Real
where
    I: IntoIterator<Item = Real>,
{
    let mut sum: Real = 0.0;
    let mut carry: Real = 0.0;
    for v in values {
        let t = sum + v;
        carry += if sum.abs() >= v.abs() {
            (sum - t) + v
        } else {
            (v - t) + sum
        };
        sum = t;
    }
    sum + carry
}
