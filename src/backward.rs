//! Backpropagation.
//!
//! - [`l_model_backward`] differentiates the binary cross-entropy of the
//!   separated-form network, layer by layer from the sigmoid output down
//!   through the ReLU layers.
//! - [`one_vs_all_gradients`] differentiates the regularized one-vs-all cost
//!   of the folded-intercept network, one training example at a time.
//!
//! Both consume the caches produced by the matching forward engine.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};

use crate::activation::{Activation, sigmoid_grad};
use crate::cost::check_one_vs_all_inputs;
use crate::data::{prepend_intercept, validate_labels};
use crate::forward::{LayerCache, LinearCache, feed_forward};
use crate::theta::unravel_params;
use crate::{Error, Result, Theta, Topology};

/// Gradients of the separated-form network.
///
/// Layer indices are 0-based: `d_weights(0)` is `dW_1`. Intermediate
/// activation gradients `dA_l` are kept for `l = 1..L-1`; no gradient with
/// respect to the raw input is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    d_weights: Vec<Array2<f64>>,
    d_biases: Vec<Array2<f64>>,
    d_activations: Vec<Array2<f64>>,
}

impl Gradients {
    /// Assemble gradients for an `L`-layer network.
    ///
    /// `d_activations` holds `dA_1 .. dA_{L-1}` and therefore has `L - 1` entries.
    pub fn from_parts(
        d_weights: Vec<Array2<f64>>,
        d_biases: Vec<Array2<f64>>,
        d_activations: Vec<Array2<f64>>,
    ) -> Result<Self> {
        if d_weights.is_empty() || d_weights.len() != d_biases.len() {
            return Err(Error::InvalidShape(format!(
                "{} weight gradients and {} bias gradients; need the same non-zero count",
                d_weights.len(),
                d_biases.len()
            )));
        }
        if d_activations.len() + 1 != d_weights.len() {
            return Err(Error::InvalidShape(format!(
                "{} activation gradients for {} layers; expected {}",
                d_activations.len(),
                d_weights.len(),
                d_weights.len() - 1
            )));
        }
        Ok(Self {
            d_weights,
            d_biases,
            d_activations,
        })
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.d_weights.len()
    }

    #[inline]
    pub fn d_weights(&self, layer_idx: usize) -> &Array2<f64> {
        &self.d_weights[layer_idx]
    }

    #[inline]
    pub fn d_biases(&self, layer_idx: usize) -> &Array2<f64> {
        &self.d_biases[layer_idx]
    }

    /// `dA_l` for `1 <= l <= L - 1`; `None` outside that range.
    #[inline]
    pub fn d_activation(&self, l: usize) -> Option<&Array2<f64>> {
        l.checked_sub(1).and_then(|idx| self.d_activations.get(idx))
    }
}

/// Gradients of one linear transform given `dZ`:
///
/// - `dW = (1/m) dZ · A_prevᵀ`
/// - `db = (1/m) sum(dZ)` over examples, kept as a column
/// - `dA_prev = Wᵀ · dZ`
///
/// Returns `(dA_prev, dW, db)`.
pub fn linear_backward(
    d_z: &Array2<f64>,
    cache: &LinearCache<'_>,
) -> Result<(Array2<f64>, Array2<f64>, Array2<f64>)> {
    let a_prev = cache.a_prev();
    let weights = cache.weights();
    if d_z.dim() != (weights.nrows(), a_prev.ncols()) {
        return Err(Error::InvalidShape(format!(
            "dZ shape {:?} does not match ({}, {})",
            d_z.dim(),
            weights.nrows(),
            a_prev.ncols()
        )));
    }

    let inv_m = 1.0 / a_prev.ncols() as f64;
    let d_weights = d_z.dot(&a_prev.t()) * inv_m;
    let d_biases = d_z.sum_axis(Axis(1)).insert_axis(Axis(1)) * inv_m;
    let d_a_prev = weights.t().dot(d_z);
    Ok((d_a_prev, d_weights, d_biases))
}

/// Backward step through `ACTIVATION` then `LINEAR`. Returns `(dA_prev, dW, db)`.
pub fn linear_activation_backward(
    d_a: &Array2<f64>,
    cache: &LayerCache<'_>,
    activation: Activation,
) -> Result<(Array2<f64>, Array2<f64>, Array2<f64>)> {
    if d_a.dim() != cache.z().dim() {
        return Err(Error::InvalidShape(format!(
            "dA shape {:?} does not match cached Z shape {:?}",
            d_a.dim(),
            cache.z().dim()
        )));
    }
    let d_z = activation.backward(d_a, cache.activation());
    linear_backward(&d_z, cache.linear())
}

/// Backward pass of the general L-layer binary classifier.
///
/// `al` is the output of [`l_model_forward`](crate::forward::l_model_forward)
/// and `caches` its per-layer caches, consumed here. `y` must match `al` in shape.
pub fn l_model_backward(
    al: &Array2<f64>,
    y: ArrayView2<'_, f64>,
    caches: Vec<LayerCache<'_>>,
) -> Result<Gradients> {
    if y.dim() != al.dim() {
        return Err(Error::InvalidShape(format!(
            "target shape {:?} does not match output shape {:?}",
            y.dim(),
            al.dim()
        )));
    }
    let num_layers = caches.len();
    if num_layers == 0 {
        return Err(Error::InvalidConfig("no layer caches to backpropagate".to_owned()));
    }

    // dAL = -(Y / AL - (1 - Y) / (1 - AL))
    let mut d_a = -(&y / al - (1.0 - &y) / (1.0 - al));

    let mut d_weights = Vec::with_capacity(num_layers);
    let mut d_biases = Vec::with_capacity(num_layers);
    let mut d_activations = Vec::with_capacity(num_layers - 1);

    for (depth, cache) in caches.into_iter().rev().enumerate() {
        let activation = if depth == 0 {
            Activation::Sigmoid
        } else {
            Activation::ReLU
        };
        let (d_a_prev, d_w, d_b) = linear_activation_backward(&d_a, &cache, activation)?;
        d_weights.push(d_w);
        d_biases.push(d_b);

        // Layer 1 is terminal: its dA_prev would be the gradient w.r.t. the input.
        if depth + 1 < num_layers {
            d_activations.push(d_a_prev.clone());
        }
        d_a = d_a_prev;
    }

    d_weights.reverse();
    d_biases.reverse();
    d_activations.reverse();
    Gradients::from_parts(d_weights, d_biases, d_activations)
}

/// Error terms `δ_1 ..= δ_L` of the folded-intercept network for one forward pass.
///
/// `δ_L[:, c] = h[:, c] - (y == c)` and, walking down,
/// `δ_{l-1} = (δ_l · Θ_l)[:, 1:] * g'(Z_{l-1})`. The `[:, 1:]` slice drops the
/// contribution flowing into the intercept column. Index `0` of the result is `δ_1`.
pub fn back_propagation(
    caches: &[LayerCache<'_>],
    hypothesis: &Array2<f64>,
    labels: ArrayView1<'_, usize>,
) -> Result<Vec<Array2<f64>>> {
    let num_layers = caches.len();
    if num_layers == 0 {
        return Err(Error::InvalidConfig("no layer caches to backpropagate".to_owned()));
    }
    if hypothesis.nrows() != labels.len() {
        return Err(Error::InvalidShape(format!(
            "{} labels for {} hypothesis rows",
            labels.len(),
            hypothesis.nrows()
        )));
    }

    validate_labels(labels, hypothesis.ncols())?;

    let mut delta_out = hypothesis.clone();
    for (mut row, &label) in delta_out.rows_mut().into_iter().zip(labels) {
        row[label] -= 1.0;
    }

    let mut deltas = Vec::with_capacity(num_layers);
    deltas.push(delta_out);
    for l in (2..=num_layers).rev() {
        let delta_l = &deltas[deltas.len() - 1];
        let weights_l = caches[l - 1].weights();
        let back = delta_l.dot(&weights_l);
        let delta_prev = &back.slice(s![.., 1..]) * &sigmoid_grad(caches[l - 2].z());
        deltas.push(delta_prev);
    }
    deltas.reverse();
    Ok(deltas)
}

/// Per-layer gradient of [`one_vs_all_cost`](crate::cost::one_vs_all_cost).
///
/// Accumulates `δ_{l+1}ᵀ · a_l` over the examples one row at a time, divides by
/// `m`, then adds `(lambda / m) * Θ_l[:, 1:]` outside the intercept column.
pub fn one_vs_all_gradients(
    x: ArrayView2<'_, f64>,
    labels: ArrayView1<'_, usize>,
    theta: &Theta,
    lambda: f64,
) -> Result<Theta> {
    let m = check_one_vs_all_inputs(x, labels, theta, lambda)?;
    let x = prepend_intercept(x);

    let mut grads: Vec<Array2<f64>> = theta
        .layers()
        .iter()
        .map(|layer| Array2::zeros(layer.dim()))
        .collect();

    for t in 0..m {
        let row = x.slice(s![t..t + 1, ..]);
        let (hypothesis, caches) = feed_forward(row, theta)?;
        let deltas = back_propagation(&caches, &hypothesis, labels.slice(s![t..t + 1]))?;
        for ((grad, delta), cache) in grads.iter_mut().zip(&deltas).zip(&caches) {
            *grad += &delta.t().dot(cache.a_prev());
        }
    }

    let inv_m = 1.0 / m as f64;
    let reg = lambda / m as f64;
    for (grad, layer) in grads.iter_mut().zip(theta.layers()) {
        grad.mapv_inplace(|v| inv_m * v);
        grad.slice_mut(s![.., 1..])
            .scaled_add(reg, &layer.slice(s![.., 1..]));
    }

    Theta::from_layers(grads)
}

/// Flattened one-vs-all gradient for vector-based optimizers.
///
/// Unravels `flat` with `topology`, computes [`one_vs_all_gradients`] and
/// flattens the result with the same convention.
pub fn one_vs_all_grad(
    flat: ArrayView1<'_, f64>,
    x: ArrayView2<'_, f64>,
    labels: ArrayView1<'_, usize>,
    lambda: f64,
    topology: &Topology,
) -> Result<Array1<f64>> {
    let theta = unravel_params(flat, topology)?;
    Ok(one_vs_all_gradients(x, labels, &theta, lambda)?.flatten())
}
