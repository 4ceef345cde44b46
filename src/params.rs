//! Parameter store for the separated form.
//!
//! Every layer keeps its weight matrix `W_l` with shape `(n_l, n_{l-1})` and its
//! bias column `b_l` with shape `(n_l, 1)` side by side. Layers are addressed by
//! position: index `0` holds `W_1, b_1`.

use ndarray::{Array2, ArrayViewMut2};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::StandardNormal;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::backward::Gradients;
use crate::{Error, Result};

/// Scale applied to standard-normal draws by [`init_params`].
pub const INIT_SCALE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct LayerParams {
    /// Shape `(out_dim, in_dim)`.
    weights: Array2<f64>,
    /// Shape `(out_dim, 1)`.
    biases: Array2<f64>,
}

impl LayerParams {
    /// Build a layer from explicit parameters.
    ///
    /// `biases` must be a column with as many rows as `weights`.
    pub fn from_parts(weights: Array2<f64>, biases: Array2<f64>) -> Result<Self> {
        let (out_dim, in_dim) = weights.dim();
        if out_dim == 0 || in_dim == 0 {
            return Err(Error::InvalidShape(format!(
                "weight matrix must be non-empty, got ({out_dim}, {in_dim})"
            )));
        }
        if biases.dim() != (out_dim, 1) {
            return Err(Error::InvalidShape(format!(
                "bias shape {:?} does not match ({out_dim}, 1)",
                biases.dim()
            )));
        }
        Ok(Self { weights, biases })
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.weights.ncols()
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.weights.nrows()
    }

    #[inline]
    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &Array2<f64> {
        &self.biases
    }

    /// Mutable view of the weights; the shape stays fixed.
    #[inline]
    pub fn weights_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.weights.view_mut()
    }

    #[inline]
    pub fn biases_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.biases.view_mut()
    }

    #[inline]
    fn sgd_step(&mut self, d_weights: &Array2<f64>, d_biases: &Array2<f64>, lr: f64) {
        self.weights.scaled_add(-lr, d_weights);
        self.biases.scaled_add(-lr, d_biases);
    }
}

/// Ordered weight/bias pairs of an L-layer network.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    layers: Vec<LayerParams>,
}

impl Params {
    /// Assemble a store from layers, checking that consecutive layers chain.
    pub fn from_layers(layers: Vec<LayerParams>) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::InvalidConfig(
                "network must have at least one layer".to_owned(),
            ));
        }
        for (idx, pair) in layers.windows(2).enumerate() {
            if pair[1].in_dim() != pair[0].out_dim() {
                return Err(Error::InvalidShape(format!(
                    "layer {} in_dim {} does not match layer {} out_dim {}",
                    idx + 2,
                    pair[1].in_dim(),
                    idx + 1,
                    pair[0].out_dim()
                )));
            }
        }
        Ok(Self { layers })
    }

    /// Number of weight/bias pairs (`L`).
    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.layers[0].in_dim()
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].out_dim()
    }

    /// `[n_0, n_1, ..., n_L]`.
    pub fn layer_dims(&self) -> Vec<usize> {
        let mut dims = Vec::with_capacity(self.layers.len() + 1);
        dims.push(self.input_dim());
        dims.extend(self.layers.iter().map(LayerParams::out_dim));
        dims
    }

    #[inline]
    pub fn layers(&self) -> &[LayerParams] {
        &self.layers
    }

    /// Layer `idx` (0-based, so `layer(0)` holds `W_1, b_1`).
    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&LayerParams> {
        self.layers.get(idx)
    }

    #[inline]
    pub fn layer_mut(&mut self, idx: usize) -> Option<&mut LayerParams> {
        self.layers.get_mut(idx)
    }

    /// Plain gradient descent: `W_l -= lr * dW_l`, `b_l -= lr * db_l`, in place.
    pub fn update(&mut self, grads: &Gradients, learning_rate: f64) -> Result<()> {
        check_learning_rate(learning_rate)?;
        if grads.num_layers() != self.layers.len() {
            return Err(Error::InvalidShape(format!(
                "gradients cover {} layers, parameters have {}",
                grads.num_layers(),
                self.layers.len()
            )));
        }
        for (idx, layer) in self.layers.iter().enumerate() {
            let (d_w, d_b) = (grads.d_weights(idx), grads.d_biases(idx));
            if d_w.dim() != layer.weights.dim() || d_b.dim() != layer.biases.dim() {
                return Err(Error::InvalidShape(format!(
                    "layer {} gradient shapes {:?}/{:?} do not match parameters {:?}/{:?}",
                    idx + 1,
                    d_w.dim(),
                    d_b.dim(),
                    layer.weights.dim(),
                    layer.biases.dim()
                )));
            }
        }

        for (idx, layer) in self.layers.iter_mut().enumerate() {
            layer.sgd_step(grads.d_weights(idx), grads.d_biases(idx), learning_rate);
        }
        Ok(())
    }
}

/// Initialize an L-layer network from `[n_0, ..., n_L]` with a deterministic seed.
///
/// `W_l` is drawn from a standard normal scaled by [`INIT_SCALE`]; `b_l` is zero.
pub fn init_params(layer_dims: &[usize], seed: u64) -> Result<Params> {
    let mut rng = StdRng::seed_from_u64(seed);
    init_params_with_rng(layer_dims, &mut rng)
}

/// Same as [`init_params`], drawing from the provided RNG.
pub fn init_params_with_rng<R: Rng + ?Sized>(layer_dims: &[usize], rng: &mut R) -> Result<Params> {
    validate_layer_dims(layer_dims)?;

    let mut layers = Vec::with_capacity(layer_dims.len() - 1);
    for w in layer_dims.windows(2) {
        let (in_dim, out_dim) = (w[0], w[1]);
        let weights = Array2::<f64>::random_using((out_dim, in_dim), StandardNormal, rng) * INIT_SCALE;
        let biases = Array2::zeros((out_dim, 1));
        layers.push(LayerParams { weights, biases });
    }
    Ok(Params { layers })
}

pub(crate) fn check_learning_rate(learning_rate: f64) -> Result<()> {
    if !(learning_rate.is_finite() && learning_rate > 0.0) {
        return Err(Error::InvalidConfig(format!(
            "learning rate must be finite and > 0, got {learning_rate}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_layer_dims(layer_dims: &[usize]) -> Result<()> {
    if layer_dims.len() < 2 {
        return Err(Error::InvalidConfig(
            "layer_dims must include input and output dims".to_owned(),
        ));
    }
    if layer_dims.contains(&0) {
        return Err(Error::InvalidConfig(
            "all layer sizes must be > 0".to_owned(),
        ));
    }
    Ok(())
}
