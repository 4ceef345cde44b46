//! Metrics.
//!
//! Evaluation helpers; they do not participate in backprop.

use ndarray::{ArrayView1, Zip};

use crate::{Error, Result};

/// Fraction of positions where `predicted` equals `expected`.
pub fn accuracy(predicted: ArrayView1<'_, usize>, expected: ArrayView1<'_, usize>) -> Result<f64> {
    if predicted.len() != expected.len() {
        return Err(Error::InvalidShape(format!(
            "{} predictions for {} labels",
            predicted.len(),
            expected.len()
        )));
    }
    if expected.is_empty() {
        return Err(Error::InvalidData("accuracy needs at least one label".to_owned()));
    }
    let correct = Zip::from(&predicted)
        .and(&expected)
        .fold(0usize, |acc, p, e| acc + usize::from(p == e));
    Ok(correct as f64 / expected.len() as f64)
}
