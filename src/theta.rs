//! Parameter store for the folded-intercept form.
//!
//! Each layer is a single matrix `Θ_l` of shape `(n_l, n_{l-1} + 1)`: column 0
//! multiplies the constant-1 intercept feature, the remaining columns multiply
//! the previous layer's activations.
//!
//! A [`Theta`] can be flattened into one vector (row-major, layer after layer)
//! and rebuilt from such a vector given its [`Topology`]. The two operations
//! are exact inverses.

use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut2, s};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Layer sizes of a one-vs-all network.
///
/// The network has `n_hidden_layers` hidden layers of `hidden_size` units each.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    pub input_size: usize,
    pub hidden_size: usize,
    pub num_labels: usize,
    pub n_hidden_layers: usize,
}

impl Topology {
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        num_labels: usize,
        n_hidden_layers: usize,
    ) -> Result<Self> {
        let topology = Self {
            input_size,
            hidden_size,
            num_labels,
            n_hidden_layers,
        };
        topology.validate()?;
        Ok(topology)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(Error::InvalidConfig("input_size must be > 0".to_owned()));
        }
        if self.num_labels == 0 {
            return Err(Error::InvalidConfig("num_labels must be > 0".to_owned()));
        }
        if self.n_hidden_layers > 0 && self.hidden_size == 0 {
            return Err(Error::InvalidConfig(
                "hidden_size must be > 0 when there are hidden layers".to_owned(),
            ));
        }
        Ok(())
    }

    /// Number of weight matrices (`n_hidden_layers + 1`).
    #[inline]
    pub fn num_layers(&self) -> usize {
        self.n_hidden_layers + 1
    }

    /// Shape of every `Θ_l`, in layer order.
    ///
    /// With no hidden layers this is the single `(num_labels, input_size + 1)` block.
    pub fn layer_shapes(&self) -> Vec<(usize, usize)> {
        if self.n_hidden_layers == 0 {
            return vec![(self.num_labels, self.input_size + 1)];
        }

        let mut shapes = Vec::with_capacity(self.num_layers());
        shapes.push((self.hidden_size, self.input_size + 1));
        for _ in 1..self.n_hidden_layers {
            shapes.push((self.hidden_size, self.hidden_size + 1));
        }
        shapes.push((self.num_labels, self.hidden_size + 1));
        shapes
    }

    /// Length of the flattened parameter vector.
    pub fn param_count(&self) -> usize {
        self.layer_shapes().iter().map(|(r, c)| r * c).sum()
    }
}

/// Folded-intercept weight matrices, one per layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Theta {
    layers: Vec<Array2<f64>>,
}

impl Theta {
    /// Assemble from explicit matrices.
    ///
    /// Each matrix needs one column more than the previous matrix has rows.
    pub fn from_layers(layers: Vec<Array2<f64>>) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::InvalidConfig(
                "network must have at least one layer".to_owned(),
            ));
        }
        for (idx, layer) in layers.iter().enumerate() {
            if layer.nrows() == 0 || layer.ncols() < 2 {
                return Err(Error::InvalidShape(format!(
                    "layer {idx} has shape {:?}; need >= 1 row and an intercept plus >= 1 input column",
                    layer.dim()
                )));
            }
        }
        for (idx, pair) in layers.windows(2).enumerate() {
            if pair[1].ncols() != pair[0].nrows() + 1 {
                return Err(Error::InvalidShape(format!(
                    "layer {} has {} columns, expected {} (layer {} rows + intercept)",
                    idx + 1,
                    pair[1].ncols(),
                    pair[0].nrows() + 1,
                    idx
                )));
            }
        }
        Ok(Self { layers })
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Number of input features, excluding the intercept.
    #[inline]
    pub fn input_size(&self) -> usize {
        self.layers[0].ncols() - 1
    }

    #[inline]
    pub fn num_labels(&self) -> usize {
        self.layers[self.layers.len() - 1].nrows()
    }

    #[inline]
    pub fn layers(&self) -> &[Array2<f64>] {
        &self.layers
    }

    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&Array2<f64>> {
        self.layers.get(idx)
    }

    #[inline]
    pub fn layer_mut(&mut self, idx: usize) -> Option<ArrayViewMut2<'_, f64>> {
        self.layers.get_mut(idx).map(|layer| layer.view_mut())
    }

    /// Concatenate every matrix's row-major elements in layer order.
    pub fn flatten(&self) -> Array1<f64> {
        let len = self.layers.iter().map(Array2::len).sum();
        let mut flat = Vec::with_capacity(len);
        for layer in &self.layers {
            // `iter` walks logical row-major order regardless of memory layout.
            flat.extend(layer.iter().copied());
        }
        Array1::from(flat)
    }

    /// `Θ_l -= lr * grad_l` for every layer.
    ///
    /// Shape contract: `grads` must have the same layer shapes as `self`.
    pub(crate) fn sgd_step(&mut self, grads: &Theta, learning_rate: f64) {
        assert_eq!(
            self.layers.len(),
            grads.layers.len(),
            "grads has {} layers, theta has {}",
            grads.layers.len(),
            self.layers.len()
        );
        for (layer, grad) in self.layers.iter_mut().zip(&grads.layers) {
            layer.scaled_add(-learning_rate, grad);
        }
    }
}

/// Symmetry-breaking bound `sqrt(6) / sqrt(l_in + l_out + 1)`.
#[inline]
pub fn init_epsilon(l_in: usize, l_out: usize) -> f64 {
    6.0_f64.sqrt() / ((l_in + l_out + 1) as f64).sqrt()
}

/// Draw a `(l_out, l_in + 1)` matrix uniformly from `[-ε, ε)`, see [`init_epsilon`].
pub fn rand_init_weights<R: Rng + ?Sized>(l_in: usize, l_out: usize, rng: &mut R) -> Array2<f64> {
    let epsilon = init_epsilon(l_in, l_out);
    Array2::random_using((l_out, l_in + 1), Uniform::new(-epsilon, epsilon), rng)
}

/// Initialize every layer of `topology` with [`rand_init_weights`].
pub fn init_nn_weights<R: Rng + ?Sized>(topology: &Topology, rng: &mut R) -> Result<Theta> {
    topology.validate()?;
    let layers = topology
        .layer_shapes()
        .into_iter()
        .map(|(rows, cols)| rand_init_weights(cols - 1, rows, rng))
        .collect();
    Ok(Theta { layers })
}

/// Split a flat parameter vector into the matrices described by `topology`.
///
/// The first block is `hidden_size * (input_size + 1)` values, each further
/// hidden block `hidden_size * (hidden_size + 1)` values and the rest forms the
/// `(num_labels, hidden_size + 1)` output block. The vector length must match
/// [`Topology::param_count`] exactly.
pub fn unravel_params(flat: ArrayView1<'_, f64>, topology: &Topology) -> Result<Theta> {
    topology.validate()?;

    let expected = topology.param_count();
    if flat.len() != expected {
        return Err(Error::InvalidShape(format!(
            "flat parameter vector has {} elements, topology {:?} needs {}",
            flat.len(),
            topology,
            expected
        )));
    }

    let mut layers = Vec::with_capacity(topology.num_layers());
    let mut start = 0;
    for (rows, cols) in topology.layer_shapes() {
        let end = start + rows * cols;
        let block = flat.slice(s![start..end]).to_vec();
        layers.push(Array2::from_shape_vec((rows, cols), block)?);
        start = end;
    }
    Ok(Theta { layers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, arr2};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn layer_shapes_follow_block_arithmetic() {
        let t = Topology::new(4, 3, 2, 2).unwrap();
        assert_eq!(t.layer_shapes(), vec![(3, 5), (3, 4), (2, 4)]);
        assert_eq!(t.param_count(), 15 + 12 + 8);

        let single = Topology::new(4, 3, 2, 1).unwrap();
        assert_eq!(single.layer_shapes(), vec![(3, 5), (2, 4)]);
    }

    #[test]
    fn zero_hidden_layers_is_a_single_block() {
        let t = Topology::new(4, 0, 3, 0).unwrap();
        assert_eq!(t.layer_shapes(), vec![(3, 5)]);
        assert_eq!(t.param_count(), 15);
    }

    #[test]
    fn unravel_reshapes_row_major() {
        let t = Topology::new(1, 1, 1, 1).unwrap();
        let flat = Array1::from(vec![1.0, 2.0, 3.0, 4.0]);
        let theta = unravel_params(flat.view(), &t).unwrap();
        assert_eq!(theta.layer(0).unwrap(), &arr2(&[[1.0, 2.0]]));
        assert_eq!(theta.layer(1).unwrap(), &arr2(&[[3.0, 4.0]]));
        assert_eq!(theta.flatten(), flat);
    }

    #[test]
    fn unravel_rejects_wrong_length() {
        let t = Topology::new(2, 2, 2, 1).unwrap();
        let short = Array1::zeros(t.param_count() - 1);
        let long = Array1::zeros(t.param_count() + 1);
        assert!(matches!(unravel_params(short.view(), &t), Err(Error::InvalidShape(_))));
        assert!(matches!(unravel_params(long.view(), &t), Err(Error::InvalidShape(_))));
    }

    #[test]
    fn rand_init_weights_respects_bound_and_shape() {
        let mut rng = StdRng::seed_from_u64(0);
        let w = rand_init_weights(400, 25, &mut rng);
        assert_eq!(w.dim(), (25, 401));

        let eps = init_epsilon(400, 25);
        assert!((eps - 6.0_f64.sqrt() / 426.0_f64.sqrt()).abs() < 1e-15);
        assert!(w.iter().all(|v| (-eps..eps).contains(v)));
    }

    #[test]
    fn init_nn_weights_matches_topology() {
        let t = Topology::new(3, 5, 4, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let theta = init_nn_weights(&t, &mut rng).unwrap();
        let shapes: Vec<_> = theta.layers().iter().map(Array2::dim).collect();
        assert_eq!(shapes, t.layer_shapes());
        assert_eq!(theta.input_size(), 3);
        assert_eq!(theta.num_labels(), 4);
    }

    #[test]
    fn from_layers_checks_intercept_columns() {
        let ok = Theta::from_layers(vec![Array2::zeros((3, 3)), Array2::zeros((2, 4))]);
        assert!(ok.is_ok());

        let bad = Theta::from_layers(vec![Array2::zeros((3, 3)), Array2::zeros((2, 3))]);
        assert!(matches!(bad, Err(Error::InvalidShape(_))));
    }

    #[test]
    fn invalid_topology_is_rejected() {
        assert!(Topology::new(0, 2, 2, 1).is_err());
        assert!(Topology::new(2, 2, 0, 1).is_err());
        assert!(Topology::new(2, 0, 2, 1).is_err());
    }
}
