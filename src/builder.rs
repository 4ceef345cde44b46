//! Classifier builder.
//!
//! `ClassifierBuilder` picks the training strategy up front and initializes
//! its parameters:
//!
//! - `deep`: separated weights/biases from `init_params` (scaled standard normal)
//! - `one_vs_all`: folded-intercept weights from `init_nn_weights` (symmetric uniform)

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::classifier::{DeepClassifier, Network, OneVsAllClassifier};
use crate::params::{init_params_with_rng, validate_layer_dims};
use crate::theta::init_nn_weights;
use crate::{Error, Result, Topology};

#[derive(Debug, Clone)]
enum Strategy {
    Deep { layer_dims: Vec<usize> },
    OneVsAll { topology: Topology, lambda: f64 },
}

#[derive(Debug, Clone)]
/// Builder for a [`Network`].
///
/// Example:
///
/// ```rust
/// use rust_fcnet::{Classifier, ClassifierBuilder, Topology};
///
/// # fn main() -> rust_fcnet::Result<()> {
/// let deep = ClassifierBuilder::deep(&[4, 8, 1])?.build_with_seed(1)?;
/// assert_eq!(deep.input_dim(), 4);
///
/// let topology = Topology::new(4, 6, 3, 1)?;
/// let ova = ClassifierBuilder::one_vs_all(topology)?
///     .lambda(1.0)?
///     .build_with_seed(1)?;
/// assert_eq!(ova.num_classes(), 3);
/// # Ok(())
/// # }
/// ```
pub struct ClassifierBuilder {
    strategy: Strategy,
}

impl ClassifierBuilder {
    /// General L-layer binary classifier with sizes `[n_0, ..., n_L]`, `n_L == 1`.
    pub fn deep(layer_dims: &[usize]) -> Result<Self> {
        validate_layer_dims(layer_dims)?;
        if layer_dims.last() != Some(&1) {
            return Err(Error::InvalidConfig(format!(
                "binary classifier needs an output size of 1, got {:?}",
                layer_dims.last()
            )));
        }
        Ok(Self {
            strategy: Strategy::Deep {
                layer_dims: layer_dims.to_vec(),
            },
        })
    }

    /// One-vs-all classifier over `topology`, unregularized until [`lambda`](Self::lambda) is set.
    pub fn one_vs_all(topology: Topology) -> Result<Self> {
        topology.validate()?;
        Ok(Self {
            strategy: Strategy::OneVsAll {
                topology,
                lambda: 0.0,
            },
        })
    }

    /// Set the L2 regularization strength.
    ///
    /// Only the one-vs-all strategy is regularized.
    pub fn lambda(mut self, lambda: f64) -> Result<Self> {
        if !(lambda.is_finite() && lambda >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "lambda must be finite and >= 0, got {lambda}"
            )));
        }
        match &mut self.strategy {
            Strategy::OneVsAll { lambda: slot, .. } => *slot = lambda,
            Strategy::Deep { .. } => {
                return Err(Error::InvalidConfig(
                    "the deep binary classifier is not regularized".to_owned(),
                ));
            }
        }
        Ok(self)
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, seed: u64) -> Result<Network> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.build_with_rng(&mut rng)
    }

    /// Build using the provided RNG.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Network> {
        match self.strategy {
            Strategy::Deep { layer_dims } => {
                let params = init_params_with_rng(&layer_dims, rng)?;
                log::debug!("built deep binary classifier with layer dims {layer_dims:?}");
                Ok(Network::Deep(DeepClassifier::new(params)?))
            }
            Strategy::OneVsAll { topology, lambda } => {
                let theta = init_nn_weights(&topology, rng)?;
                log::debug!(
                    "built one-vs-all classifier: layers {:?}, {} parameters, lambda {}",
                    topology.layer_shapes(),
                    topology.param_count(),
                    lambda
                );
                Ok(Network::OneVsAll(OneVsAllClassifier::new(theta, lambda)?))
            }
        }
    }
}
