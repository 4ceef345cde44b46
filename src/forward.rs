//! Forward propagation.
//!
//! Two engines share one cache format:
//!
//! - [`l_model_forward`]: separated form, examples as columns.
//!   `[LINEAR -> RELU] * (L-1) -> LINEAR -> SIGMOID`.
//! - [`feed_forward`]: folded-intercept form, examples as rows.
//!   Every layer (hidden and output) uses the sigmoid, and a constant-1 column
//!   is prepended to each hidden activation.
//!
//! Both are pure functions of `(input, parameters)`. The returned caches
//! borrow the weights they were computed with, so parameters cannot change
//! while a cache is alive; backpropagation consumes the caches.

use ndarray::{Array2, ArrayView2};

use crate::activation::{Activation, ActivationCache};
use crate::data::prepend_intercept;
use crate::{Error, Params, Result, Theta};

/// Inputs of one linear transform.
#[derive(Debug, Clone)]
pub struct LinearCache<'p> {
    a_prev: Array2<f64>,
    weights: ArrayView2<'p, f64>,
    biases: Option<ArrayView2<'p, f64>>,
}

impl<'p> LinearCache<'p> {
    /// Activation fed into the layer (with the intercept column in folded form).
    #[inline]
    pub fn a_prev(&self) -> &Array2<f64> {
        &self.a_prev
    }

    #[inline]
    pub fn weights(&self) -> ArrayView2<'p, f64> {
        self.weights
    }

    /// `None` in folded-intercept form.
    #[inline]
    pub fn biases(&self) -> Option<ArrayView2<'p, f64>> {
        self.biases
    }
}

/// Everything one layer's backward step needs:
/// `(input_activation, weight, bias_or_none, pre_activation)`.
#[derive(Debug, Clone)]
pub struct LayerCache<'p> {
    linear: LinearCache<'p>,
    activation: ActivationCache,
}

impl<'p> LayerCache<'p> {
    #[inline]
    pub fn linear(&self) -> &LinearCache<'p> {
        &self.linear
    }

    #[inline]
    pub fn activation(&self) -> &ActivationCache {
        &self.activation
    }

    #[inline]
    pub fn a_prev(&self) -> &Array2<f64> {
        &self.linear.a_prev
    }

    #[inline]
    pub fn weights(&self) -> ArrayView2<'p, f64> {
        self.linear.weights
    }

    #[inline]
    pub fn biases(&self) -> Option<ArrayView2<'p, f64>> {
        self.linear.biases
    }

    /// Pre-activation `Z` of this layer.
    #[inline]
    pub fn z(&self) -> &Array2<f64> {
        self.activation.z()
    }
}

/// `Z = W · A_prev + b`, with `b` broadcast across the example columns.
///
/// Shapes: `A_prev (n_prev, m)`, `W (n, n_prev)`, `b (n, 1)`, `Z (n, m)`.
pub fn linear_forward<'p>(
    a_prev: Array2<f64>,
    weights: ArrayView2<'p, f64>,
    biases: ArrayView2<'p, f64>,
) -> Result<(Array2<f64>, LinearCache<'p>)> {
    if weights.ncols() != a_prev.nrows() {
        return Err(Error::InvalidShape(format!(
            "weights {:?} cannot multiply activation {:?}",
            weights.dim(),
            a_prev.dim()
        )));
    }
    if biases.dim() != (weights.nrows(), 1) {
        return Err(Error::InvalidShape(format!(
            "bias shape {:?} does not match ({}, 1)",
            biases.dim(),
            weights.nrows()
        )));
    }

    let z = weights.dot(&a_prev) + &biases;
    let cache = LinearCache {
        a_prev,
        weights,
        biases: Some(biases),
    };
    Ok((z, cache))
}

/// One `LINEAR -> ACTIVATION` layer in separated form.
pub fn linear_activation_forward<'p>(
    a_prev: Array2<f64>,
    weights: ArrayView2<'p, f64>,
    biases: ArrayView2<'p, f64>,
    activation: Activation,
) -> Result<(Array2<f64>, LayerCache<'p>)> {
    let (z, linear) = linear_forward(a_prev, weights, biases)?;
    let (a, activation) = activation.forward(z);
    Ok((a, LayerCache { linear, activation }))
}

/// Forward pass of the general L-layer binary classifier.
///
/// `x` has shape `(n_0, m)`. Returns `AL` with shape `(n_L, m)` and one cache
/// per layer, in forward order.
pub fn l_model_forward<'p>(
    x: ArrayView2<'_, f64>,
    params: &'p Params,
) -> Result<(Array2<f64>, Vec<LayerCache<'p>>)> {
    if x.nrows() != params.input_dim() {
        return Err(Error::InvalidShape(format!(
            "input has {} features, network expects {}",
            x.nrows(),
            params.input_dim()
        )));
    }
    if x.ncols() == 0 {
        return Err(Error::InvalidData("input must contain at least one example".to_owned()));
    }

    let last = params.num_layers() - 1;
    let mut caches = Vec::with_capacity(params.num_layers());
    let mut a = x.to_owned();

    for (idx, layer) in params.layers().iter().enumerate() {
        let activation = if idx == last {
            Activation::Sigmoid
        } else {
            Activation::ReLU
        };
        let (next, cache) =
            linear_activation_forward(a, layer.weights().view(), layer.biases().view(), activation)?;
        caches.push(cache);
        a = next;
    }

    Ok((a, caches))
}

/// Forward pass of the folded-intercept one-vs-all network.
///
/// `x` has shape `(m, input_size + 1)` and must already carry the intercept
/// column (see [`prepend_intercept`]). Returns the hypothesis with shape
/// `(m, num_labels)` and one cache per layer.
pub fn feed_forward<'p>(
    x: ArrayView2<'_, f64>,
    theta: &'p Theta,
) -> Result<(Array2<f64>, Vec<LayerCache<'p>>)> {
    if x.ncols() != theta.input_size() + 1 {
        return Err(Error::InvalidShape(format!(
            "input has {} columns, expected input_size + intercept = {}",
            x.ncols(),
            theta.input_size() + 1
        )));
    }

    let last = theta.num_layers() - 1;
    let mut caches = Vec::with_capacity(theta.num_layers());
    let mut a = x.to_owned();

    for (idx, weights) in theta.layers().iter().enumerate() {
        let z = a.dot(&weights.t());
        let (activated, activation) = Activation::Sigmoid.forward(z);
        caches.push(LayerCache {
            linear: LinearCache {
                a_prev: a,
                weights: weights.view(),
                biases: None,
            },
            activation,
        });
        a = if idx == last {
            activated
        } else {
            prepend_intercept(activated.view())
        };
    }

    Ok((a, caches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::LayerParams;
    use approx::assert_abs_diff_eq;
    use ndarray::arr2;

    fn assert_all_close(actual: &Array2<f64>, expected: &Array2<f64>, atol: f64) {
        assert_eq!(actual.dim(), expected.dim());
        for (a, e) in actual.iter().zip(expected) {
            assert_abs_diff_eq!(*a, *e, epsilon = atol);
        }
    }

    #[test]
    fn linear_forward_matches_reference_values() {
        let a = arr2(&[
            [1.62434536, -0.61175641],
            [-0.52817175, -1.07296862],
            [0.86540763, -2.3015387],
        ]);
        let w = arr2(&[[1.74481176, -0.7612069, 0.3190391]]);
        let b = arr2(&[[-0.24937038]]);

        let (z, cache) = linear_forward(a.clone(), w.view(), b.view()).unwrap();
        assert_all_close(&z, &arr2(&[[3.26295, -1.23430]]), 1e-4);
        assert_eq!(cache.a_prev(), &a);
        assert_eq!(cache.weights(), w.view());
        assert_eq!(cache.biases(), Some(b.view()));
    }

    #[test]
    fn linear_forward_rejects_mismatched_shapes() {
        let a = Array2::zeros((3, 2));
        let w = Array2::zeros((1, 4));
        let b = Array2::zeros((1, 1));
        assert!(matches!(
            linear_forward(a.clone(), w.view(), b.view()),
            Err(Error::InvalidShape(_))
        ));

        let w = Array2::zeros((1, 3));
        let b = Array2::zeros((2, 1));
        assert!(matches!(
            linear_forward(a, w.view(), b.view()),
            Err(Error::InvalidShape(_))
        ));
    }

    #[test]
    fn l_model_forward_is_deterministic() {
        let params = crate::init_params(&[4, 3, 2, 1], 5).unwrap();
        let x = arr2(&[[0.1, -0.4], [0.7, 0.2], [-0.3, 0.9], [1.0, -1.0]]);

        let (al_a, caches_a) = l_model_forward(x.view(), &params).unwrap();
        let (al_b, caches_b) = l_model_forward(x.view(), &params).unwrap();
        assert_eq!(al_a, al_b);
        assert_eq!(caches_a.len(), 3);
        for (ca, cb) in caches_a.iter().zip(&caches_b) {
            assert_eq!(ca.a_prev(), cb.a_prev());
            assert_eq!(ca.z(), cb.z());
        }
    }

    #[test]
    fn l_model_forward_single_layer_is_logistic_regression() {
        let layer = LayerParams::from_parts(arr2(&[[2.0, -1.0]]), arr2(&[[0.5]])).unwrap();
        let params = Params::from_layers(vec![layer]).unwrap();
        let x = arr2(&[[1.0], [3.0]]);

        let (al, caches) = l_model_forward(x.view(), &params).unwrap();
        // z = 2 - 3 + 0.5 = -0.5
        assert_abs_diff_eq!(al[[0, 0]], 1.0 / (1.0 + 0.5_f64.exp()), epsilon = 1e-12);
        assert_eq!(caches.len(), 1);
    }

    #[test]
    fn feed_forward_prepends_intercept_to_hidden_activations() {
        let theta = Theta::from_layers(vec![
            arr2(&[[0.0, 1.0], [1.0, -1.0]]),
            arr2(&[[0.5, 1.0, -2.0]]),
        ])
        .unwrap();
        let x = arr2(&[[1.0, 2.0], [1.0, -1.0]]);

        let (h, caches) = feed_forward(x.view(), &theta).unwrap();
        assert_eq!(h.dim(), (2, 1));
        assert_eq!(caches.len(), 2);
        assert!(caches.iter().all(|c| c.biases().is_none()));

        let a1 = caches[1].a_prev();
        assert_eq!(a1.dim(), (2, 3));
        assert!(a1.column(0).iter().all(|&v| v == 1.0));

        // Row 0: z1 = [2, -1], a1 = [1, s(2), s(-1)], z2 = 0.5 + s(2) - 2 s(-1).
        let s = |v: f64| 1.0 / (1.0 + (-v).exp());
        assert_abs_diff_eq!(caches[0].z()[[0, 0]], 2.0, epsilon = 1e-12);
        let z2 = 0.5 + s(2.0) - 2.0 * s(-1.0);
        assert_abs_diff_eq!(h[[0, 0]], s(z2), epsilon = 1e-12);
    }

    #[test]
    fn feed_forward_requires_intercept_column() {
        let theta = Theta::from_layers(vec![Array2::zeros((2, 3))]).unwrap();
        let x = Array2::zeros((4, 2));
        assert!(matches!(
            feed_forward(x.view(), &theta),
            Err(Error::InvalidShape(_))
        ));
    }
}
