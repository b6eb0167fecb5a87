//! Finite difference Jacobian computation.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

/// Compute Jacobian using central finite differences.
///
/// Column j perturbs x[j] by `step * max(|x[j]|, floors[j])`. Columns are
/// independent and evaluated in parallel; `f` must be deterministic, so the
/// result does not depend on scheduling.
pub fn central_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    step: f64,
    floors: &[f64],
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>> + Sync,
{
    let n = x.len();
    if floors.len() != n {
        return Err(SolverError::Numeric {
            what: format!("{} step floors for {n} variables", floors.len()),
        });
    }

    let columns = (0..n)
        .into_par_iter()
        .map(|j| {
            let dx = step * x[j].abs().max(floors[j]);

            let mut x_plus = x.clone();
            x_plus[j] += dx;
            let f_plus = f(&x_plus)?;

            let mut x_minus = x.clone();
            x_minus[j] -= dx;
            let f_minus = f(&x_minus)?;

            Ok((f_plus - f_minus) / (2.0 * dx))
        })
        .collect::<SolverResult<Vec<DVector<f64>>>>()?;

    let m = match columns.first() {
        Some(c) => c.len(),
        None => f(x)?.len(),
    };
    let mut jac = DMatrix::zeros(m, n);
    for (j, col) in columns.iter().enumerate() {
        if col.len() != m {
            return Err(SolverError::Numeric {
                what: format!("residual length changed from {m} to {}", col.len()),
            });
        }
        jac.set_column(j, col);
    }

    Ok(jac)
}
