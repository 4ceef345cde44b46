//! Finite-difference gradient checking.

use ndarray::{Array1, ArrayView1, Zip};

use crate::{Error, Result};

/// Central-difference estimate of `∇J(θ)`:
/// `(J(θ + ε e_i) - J(θ - ε e_i)) / 2ε` for every coordinate `i`.
pub fn numerical_grad<F>(mut cost: F, theta: ArrayView1<'_, f64>, eps: f64) -> Result<Array1<f64>>
where
    F: FnMut(ArrayView1<'_, f64>) -> Result<f64>,
{
    if !(eps.is_finite() && eps > 0.0) {
        return Err(Error::InvalidConfig(format!(
            "epsilon must be finite and > 0, got {eps}"
        )));
    }

    let mut probe = theta.to_owned();
    let mut grad = Array1::zeros(theta.len());
    for i in 0..theta.len() {
        let orig = probe[i];
        probe[i] = orig - eps;
        let minus = cost(probe.view())?;
        probe[i] = orig + eps;
        let plus = cost(probe.view())?;
        probe[i] = orig;
        grad[i] = (plus - minus) / (2.0 * eps);
    }
    Ok(grad)
}

/// `‖a - b‖ / ‖a + b‖`, or `0` when both vectors are zero.
pub fn relative_difference(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::InvalidShape(format!(
            "cannot compare vectors of length {} and {}",
            a.len(),
            b.len()
        )));
    }
    let (diff, sum) = Zip::from(&a)
        .and(&b)
        .fold((0.0, 0.0), |(d, s), &x, &y| {
            (d + (x - y) * (x - y), s + (x + y) * (x + y))
        });
    if sum == 0.0 {
        return Ok(if diff == 0.0 { 0.0 } else { f64::INFINITY });
    }
    Ok(diff.sqrt() / sum.sqrt())
}
