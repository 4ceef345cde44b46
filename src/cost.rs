//! Cost evaluation.
//!
//! Neither cost clips its inputs: an output that saturates to exactly 0 or 1
//! yields `inf` or `NaN`, which propagates to the caller unchanged.

use ndarray::{ArrayView1, ArrayView2, Zip, s};

use crate::data::{prepend_intercept, validate_labels};
use crate::forward::feed_forward;
use crate::{Error, Result, Theta};

/// Binary cross-entropy averaged over examples:
/// `-(1/m) * sum(Y * log(AL) + (1 - Y) * log(1 - AL))`.
///
/// `al` and `y` share the shape `(n_L, m)`; `m` is the column count.
pub fn compute_cost(al: ArrayView2<'_, f64>, y: ArrayView2<'_, f64>) -> Result<f64> {
    if al.dim() != y.dim() {
        return Err(Error::InvalidShape(format!(
            "prediction shape {:?} does not match target shape {:?}",
            al.dim(),
            y.dim()
        )));
    }
    let m = y.ncols();
    if m == 0 {
        return Err(Error::InvalidData("cost needs at least one example".to_owned()));
    }

    let sum = Zip::from(&y)
        .and(&al)
        .fold(0.0, |acc, &t, &a| acc + (t * a.ln() + (1.0 - t) * (1.0 - a).ln()));
    Ok(-(1.0 / m as f64) * sum)
}

/// `(lambda / 2m) * sum_l sum(Θ_l[:, 1:]^2)`.
///
/// Column 0 of every layer (the intercept weight) is excluded.
pub fn regularization_term(theta: &Theta, lambda: f64, m: usize) -> f64 {
    let squared: f64 = theta
        .layers()
        .iter()
        .map(|layer| layer.slice(s![.., 1..]).iter().map(|w| w * w).sum::<f64>())
        .sum();
    (lambda / (2.0 * m as f64)) * squared
}

/// One-vs-all cross-entropy with L2 regularization.
///
/// `x` is `(m, input_size)` without the intercept column; `labels` holds one
/// class index per row. For each class `c` the cost accumulates
/// `-(1/m) * sum[(1 - (y == c)) * log(1 - h_c) + (y == c) * log(h_c)]`, then the
/// [`regularization_term`] is added.
pub fn one_vs_all_cost(
    x: ArrayView2<'_, f64>,
    labels: ArrayView1<'_, usize>,
    theta: &Theta,
    lambda: f64,
) -> Result<f64> {
    let m = check_one_vs_all_inputs(x, labels, theta, lambda)?;

    let x = prepend_intercept(x);
    let (h, _caches) = feed_forward(x.view(), theta)?;

    let inv_m = 1.0 / m as f64;
    let mut cost = 0.0;
    for c in 0..theta.num_labels() {
        let h_c = h.column(c);
        let class_term = Zip::from(&labels).and(&h_c).fold(0.0, |acc, &label, &p| {
            let is_c = if label == c { 1.0 } else { 0.0 };
            acc + ((1.0 - is_c) * (1.0 - p).ln() + is_c * p.ln())
        });
        cost -= inv_m * class_term;
    }

    Ok(cost + regularization_term(theta, lambda, m))
}

/// Shared boundary checks for the one-vs-all cost and gradient. Returns `m`.
pub(crate) fn check_one_vs_all_inputs(
    x: ArrayView2<'_, f64>,
    labels: ArrayView1<'_, usize>,
    theta: &Theta,
    lambda: f64,
) -> Result<usize> {
    let m = x.nrows();
    if m == 0 {
        return Err(Error::InvalidData("dataset must not be empty".to_owned()));
    }
    if labels.len() != m {
        return Err(Error::InvalidShape(format!(
            "{} labels for {} examples",
            labels.len(),
            m
        )));
    }
    if x.ncols() != theta.input_size() {
        return Err(Error::InvalidShape(format!(
            "input has {} features, network expects {}",
            x.ncols(),
            theta.input_size()
        )));
    }
    if !(lambda.is_finite() && lambda >= 0.0) {
        return Err(Error::InvalidConfig(format!(
            "lambda must be finite and >= 0, got {lambda}"
        )));
    }
    validate_labels(labels, theta.num_labels())?;
    Ok(m)
}
