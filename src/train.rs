//! Optimization drivers.
//!
//! [`fit`] runs full-batch gradient descent on any [`Classifier`];
//! [`gradient_descent`] runs it over a flat parameter vector with a
//! caller-supplied gradient (typically [`one_vs_all_grad`](crate::one_vs_all_grad)).

use ndarray::{Array1, ArrayView1, ArrayView2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::classifier::Classifier;
use crate::params::check_learning_rate;
use crate::{Error, Result};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConfig {
    pub iterations: usize,
    pub learning_rate: f64,
    /// Emit a progress line every `log_every` iterations; `0` disables it.
    pub log_every: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            learning_rate: 0.1,
            log_every: 100,
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::InvalidConfig("iterations must be > 0".to_owned()));
        }
        check_learning_rate(self.learning_rate)
    }

    /// Parse a JSON config; missing fields take their default value.
    #[cfg(feature = "serde")]
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("invalid fit config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone)]
pub struct FitReport {
    /// Cost before each update, one entry per iteration.
    pub costs: Vec<f64>,
    /// Cost after the last update.
    pub final_cost: f64,
}

/// Train `model` for `cfg.iterations` full-batch gradient-descent steps.
///
/// `x` is `(m, n_features)`; `labels` holds one class index per row.
pub fn fit<C: Classifier + ?Sized>(
    model: &mut C,
    x: ArrayView2<'_, f64>,
    labels: ArrayView1<'_, usize>,
    cfg: &FitConfig,
) -> Result<FitReport> {
    cfg.validate()?;
    if x.nrows() == 0 {
        return Err(Error::InvalidData("train dataset must not be empty".to_owned()));
    }
    if labels.len() != x.nrows() {
        return Err(Error::InvalidShape(format!(
            "{} labels for {} examples",
            labels.len(),
            x.nrows()
        )));
    }

    let mut costs = Vec::with_capacity(cfg.iterations);
    let mut warned = false;
    for iter in 0..cfg.iterations {
        let cost = model.train_step(x, labels, cfg.learning_rate)?;
        if !cost.is_finite() && !warned {
            log::warn!("non-finite cost {cost} at iteration {iter}");
            warned = true;
        }
        if cfg.log_every > 0 && iter % cfg.log_every == 0 {
            log::debug!("iteration {iter}: cost {cost:.6}");
        }
        costs.push(cost);
    }

    let final_cost = model.cost(x, labels)?;
    log::info!(
        "finished {} iterations, final cost {final_cost:.6}",
        cfg.iterations
    );
    Ok(FitReport { costs, final_cost })
}

/// Repeat `θ ← θ - α · grad(θ)` for `iterations` steps.
///
/// `grad` must return a vector of the same length as `theta0`.
pub fn gradient_descent<F>(
    theta0: ArrayView1<'_, f64>,
    alpha: f64,
    iterations: usize,
    mut grad: F,
) -> Result<Array1<f64>>
where
    F: FnMut(ArrayView1<'_, f64>) -> Result<Array1<f64>>,
{
    check_learning_rate(alpha)?;

    let mut theta = theta0.to_owned();
    for iter in 0..iterations {
        let g = grad(theta.view())?;
        if g.len() != theta.len() {
            return Err(Error::InvalidShape(format!(
                "gradient has {} elements, parameters have {}",
                g.len(),
                theta.len()
            )));
        }
        theta.scaled_add(-alpha, &g);
        if iter % 100 == 0 {
            log::debug!("gradient descent iteration {iter}");
        }
    }
    log::info!("gradient descent finished after {iterations} iterations");
    Ok(theta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassifierBuilder, Topology};
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, arr2};

    #[test]
    fn gradient_descent_minimizes_quadratic() {
        // f(θ) = |θ - 3|^2, grad = 2 (θ - 3).
        let theta = gradient_descent(arr1(&[0.0, 10.0]).view(), 0.1, 200, |t| {
            Ok(t.mapv(|v| 2.0 * (v - 3.0)))
        })
        .unwrap();
        assert_abs_diff_eq!(theta[0], 3.0, epsilon = 1e-8);
        assert_abs_diff_eq!(theta[1], 3.0, epsilon = 1e-8);
    }

    #[test]
    fn gradient_descent_with_zero_iterations_returns_start() {
        let theta = gradient_descent(arr1(&[1.5]).view(), 0.1, 0, |_| {
            Err(Error::InvalidData("never called".to_owned()))
        })
        .unwrap();
        assert_eq!(theta, arr1(&[1.5]));
    }

    #[test]
    fn gradient_descent_rejects_wrong_gradient_length() {
        let res = gradient_descent(arr1(&[1.0, 2.0]).view(), 0.1, 1, |_| Ok(arr1(&[0.0])));
        assert!(matches!(res, Err(Error::InvalidShape(_))));
    }

    #[test]
    fn fit_config_validation() {
        assert!(FitConfig::default().validate().is_ok());
        let cfg = FitConfig {
            iterations: 0,
            ..FitConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
        let cfg = FitConfig {
            learning_rate: f64::NAN,
            ..FitConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn fit_records_one_cost_per_iteration() {
        let topology = Topology::new(2, 3, 2, 1).unwrap();
        let mut net = ClassifierBuilder::one_vs_all(topology)
            .unwrap()
            .build_with_seed(4)
            .unwrap();
        let x = arr2(&[[0.0, 1.0], [1.0, 0.0], [0.9, 0.1], [0.1, 0.8]]);
        let labels = arr1(&[0, 1, 1, 0]);
        let cfg = FitConfig {
            iterations: 25,
            learning_rate: 1.0,
            log_every: 5,
        };

        let report = fit(&mut net, x.view(), labels.view(), &cfg).unwrap();
        assert_eq!(report.costs.len(), 25);
        assert!(report.final_cost < report.costs[0]);
    }

    #[test]
    fn fit_rejects_label_count_mismatch() {
        let mut net = ClassifierBuilder::deep(&[2, 1]).unwrap().build_with_seed(0).unwrap();
        let x = arr2(&[[0.0, 1.0], [1.0, 0.0]]);
        let res = net.fit(x.view(), arr1(&[0]).view(), &FitConfig::default());
        assert!(matches!(res, Err(Error::InvalidShape(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn fit_config_from_json_fills_defaults() {
        let cfg = FitConfig::from_json_str(r#"{"iterations": 50}"#).unwrap();
        assert_eq!(cfg.iterations, 50);
        assert_eq!(cfg.learning_rate, FitConfig::default().learning_rate);

        assert!(matches!(
            FitConfig::from_json_str("{"),
            Err(Error::InvalidData(_))
        ));
        assert!(FitConfig::from_json_str(r#"{"learning_rate": -1.0}"#).is_err());
    }
}
