//! The `Classifier` capability and its two strategies.
//!
//! - [`DeepClassifier`]: separated weights/biases, ReLU hidden layers, sigmoid
//!   output, binary cross-entropy.
//! - [`OneVsAllClassifier`]: folded-intercept weights, sigmoid on every layer,
//!   one-vs-all cross-entropy with L2 regularization.
//!
//! The two differ in hidden activation, intercept handling and gradient
//! formulas, so they stay separate types. [`Network`] wraps whichever one a
//! [`ClassifierBuilder`](crate::ClassifierBuilder) produced.
//!
//! At this boundary inputs are always `(m, n_features)` with one example per
//! row, and targets are class indices.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::backward::{l_model_backward, one_vs_all_gradients};
use crate::cost::{compute_cost, one_vs_all_cost};
use crate::data::{binary_targets, prepend_intercept};
use crate::forward::{feed_forward, l_model_forward};
use crate::params::check_learning_rate;
use crate::train::{self, FitConfig, FitReport};
use crate::{Error, Params, Result, Theta};

/// Forward, cost, backward and update for one network strategy.
pub trait Classifier {
    /// Number of input features.
    fn input_dim(&self) -> usize;

    /// Number of classes the labels may take.
    fn num_classes(&self) -> usize;

    /// Output probabilities, one row per example.
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>>;

    /// Cost at the current parameters.
    fn cost(&self, x: ArrayView2<'_, f64>, labels: ArrayView1<'_, usize>) -> Result<f64>;

    /// One gradient-descent iteration: forward, cost, backward, update.
    ///
    /// Returns the cost measured before the update.
    fn train_step(
        &mut self,
        x: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, usize>,
        learning_rate: f64,
    ) -> Result<f64>;

    /// Predicted class index per example.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<usize>>;

    /// Run [`train::fit`] on this classifier.
    fn fit(
        &mut self,
        x: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, usize>,
        cfg: &FitConfig,
    ) -> Result<FitReport> {
        train::fit(self, x, labels, cfg)
    }
}

/// General L-layer binary classifier over separated parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DeepClassifier {
    params: Params,
}

impl DeepClassifier {
    /// Wrap parameters whose output layer has a single unit.
    pub fn new(params: Params) -> Result<Self> {
        if params.output_dim() != 1 {
            return Err(Error::InvalidConfig(format!(
                "binary classifier needs one output unit, got {}",
                params.output_dim()
            )));
        }
        Ok(Self { params })
    }

    #[inline]
    pub fn params(&self) -> &Params {
        &self.params
    }

    #[inline]
    pub fn into_params(self) -> Params {
        self.params
    }

    fn check_input(&self, x: ArrayView2<'_, f64>) -> Result<()> {
        if x.ncols() != self.params.input_dim() {
            return Err(Error::InvalidShape(format!(
                "input has {} features, network expects {}",
                x.ncols(),
                self.params.input_dim()
            )));
        }
        Ok(())
    }
}

impl Classifier for DeepClassifier {
    fn input_dim(&self) -> usize {
        self.params.input_dim()
    }

    fn num_classes(&self) -> usize {
        2
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_input(x)?;
        let (al, _caches) = l_model_forward(x.t(), &self.params)?;
        Ok(al.reversed_axes())
    }

    fn cost(&self, x: ArrayView2<'_, f64>, labels: ArrayView1<'_, usize>) -> Result<f64> {
        self.check_input(x)?;
        let y = binary_targets(labels)?;
        let (al, _caches) = l_model_forward(x.t(), &self.params)?;
        compute_cost(al.view(), y.view())
    }

    fn train_step(
        &mut self,
        x: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, usize>,
        learning_rate: f64,
    ) -> Result<f64> {
        self.check_input(x)?;
        check_learning_rate(learning_rate)?;
        let y = binary_targets(labels)?;

        let (al, caches) = l_model_forward(x.t(), &self.params)?;
        let cost = compute_cost(al.view(), y.view())?;
        let grads = l_model_backward(&al, y.view(), caches)?;
        self.params.update(&grads, learning_rate)?;
        Ok(cost)
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.column(0).mapv(|p| usize::from(p >= 0.5)))
    }
}

/// One-vs-all multi-class classifier over a folded-intercept [`Theta`].
#[derive(Debug, Clone, PartialEq)]
pub struct OneVsAllClassifier {
    theta: Theta,
    lambda: f64,
}

impl OneVsAllClassifier {
    /// `lambda` is the L2 regularization strength (`0` disables it).
    pub fn new(theta: Theta, lambda: f64) -> Result<Self> {
        if !(lambda.is_finite() && lambda >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "lambda must be finite and >= 0, got {lambda}"
            )));
        }
        Ok(Self { theta, lambda })
    }

    #[inline]
    pub fn theta(&self) -> &Theta {
        &self.theta
    }

    #[inline]
    pub fn into_theta(self) -> Theta {
        self.theta
    }

    #[inline]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

impl Classifier for OneVsAllClassifier {
    fn input_dim(&self) -> usize {
        self.theta.input_size()
    }

    fn num_classes(&self) -> usize {
        self.theta.num_labels()
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.theta.input_size() {
            return Err(Error::InvalidShape(format!(
                "input has {} features, network expects {}",
                x.ncols(),
                self.theta.input_size()
            )));
        }
        let x = prepend_intercept(x);
        let (hypothesis, _caches) = feed_forward(x.view(), &self.theta)?;
        Ok(hypothesis)
    }

    fn cost(&self, x: ArrayView2<'_, f64>, labels: ArrayView1<'_, usize>) -> Result<f64> {
        one_vs_all_cost(x, labels, &self.theta, self.lambda)
    }

    fn train_step(
        &mut self,
        x: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, usize>,
        learning_rate: f64,
    ) -> Result<f64> {
        check_learning_rate(learning_rate)?;
        let cost = one_vs_all_cost(x, labels, &self.theta, self.lambda)?;
        let grads = one_vs_all_gradients(x, labels, &self.theta, self.lambda)?;
        self.theta.sgd_step(&grads, learning_rate);
        Ok(cost)
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.map_axis(Axis(1), |row| argmax(row.iter().copied())))
    }
}

/// Either strategy, chosen when the network is built.
#[derive(Debug, Clone, PartialEq)]
pub enum Network {
    Deep(DeepClassifier),
    OneVsAll(OneVsAllClassifier),
}

impl Network {
    pub fn as_deep(&self) -> Option<&DeepClassifier> {
        match self {
            Network::Deep(c) => Some(c),
            Network::OneVsAll(_) => None,
        }
    }

    pub fn as_one_vs_all(&self) -> Option<&OneVsAllClassifier> {
        match self {
            Network::OneVsAll(c) => Some(c),
            Network::Deep(_) => None,
        }
    }
}

impl Classifier for Network {
    fn input_dim(&self) -> usize {
        match self {
            Network::Deep(c) => c.input_dim(),
            Network::OneVsAll(c) => c.input_dim(),
        }
    }

    fn num_classes(&self) -> usize {
        match self {
            Network::Deep(c) => c.num_classes(),
            Network::OneVsAll(c) => c.num_classes(),
        }
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        match self {
            Network::Deep(c) => c.predict_proba(x),
            Network::OneVsAll(c) => c.predict_proba(x),
        }
    }

    fn cost(&self, x: ArrayView2<'_, f64>, labels: ArrayView1<'_, usize>) -> Result<f64> {
        match self {
            Network::Deep(c) => c.cost(x, labels),
            Network::OneVsAll(c) => c.cost(x, labels),
        }
    }

    fn train_step(
        &mut self,
        x: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, usize>,
        learning_rate: f64,
    ) -> Result<f64> {
        match self {
            Network::Deep(c) => c.train_step(x, labels, learning_rate),
            Network::OneVsAll(c) => c.train_step(x, labels, learning_rate),
        }
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<usize>> {
        match self {
            Network::Deep(c) => c.predict(x),
            Network::OneVsAll(c) => c.predict(x),
        }
    }
}

// First maximum wins on ties.
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best_idx = 0;
    let mut best = f64::NEG_INFINITY;
    for (idx, v) in values.enumerate() {
        if v > best {
            best = v;
            best_idx = idx;
        }
    }
    best_idx
}
