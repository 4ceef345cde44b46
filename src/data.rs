//! Dataset helpers.
//!
//! Small conversions between the layouts the two engines expect.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};

use crate::{Error, Result};

/// Prepend a constant-1 intercept column: `(m, n) -> (m, n + 1)`.
pub fn prepend_intercept(x: ArrayView2<'_, f64>) -> Array2<f64> {
    let (m, n) = x.dim();
    let mut out = Array2::ones((m, n + 1));
    out.slice_mut(s![.., 1..]).assign(&x);
    out
}

/// Z-score normalize each column of `x` (examples as rows).
///
/// Returns `(x_norm, mu, sigma)` where `sigma` is the sample standard deviation
/// (`ddof = 1`). A constant column has `sigma == 0` and normalizes to `NaN`.
pub fn feature_normalize(x: ArrayView2<'_, f64>) -> Result<(Array2<f64>, Array1<f64>, Array1<f64>)> {
    if x.nrows() < 2 {
        return Err(Error::InvalidData(format!(
            "feature normalization needs at least 2 examples, got {}",
            x.nrows()
        )));
    }

    let mu = x
        .mean_axis(Axis(0))
        .ok_or_else(|| Error::InvalidData("cannot normalize an empty matrix".to_owned()))?;
    let sigma = x.std_axis(Axis(0), 1.0);
    let x_norm = (&x - &mu) / &sigma;
    Ok((x_norm, mu, sigma))
}

/// Turn 0/1 labels into the `(1, m)` target row used by the separated form.
pub fn binary_targets(labels: ArrayView1<'_, usize>) -> Result<Array2<f64>> {
    if let Some((idx, &label)) = labels.indexed_iter().find(|(_, l)| **l > 1) {
        return Err(Error::InvalidData(format!(
            "binary label at index {idx} is {label}; expected 0 or 1"
        )));
    }
    let row = labels.mapv(|l| l as f64);
    Ok(row.insert_axis(Axis(0)))
}

/// Check that every label lies in `0..num_labels`.
pub fn validate_labels(labels: ArrayView1<'_, usize>, num_labels: usize) -> Result<()> {
    if let Some((idx, &label)) = labels.indexed_iter().find(|(_, l)| **l >= num_labels) {
        return Err(Error::InvalidData(format!(
            "label at index {idx} is {label}; expected a class in 0..{num_labels}"
        )));
    }
    Ok(())
}
