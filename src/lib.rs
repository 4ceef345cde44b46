//! A small fully-connected neural network crate.
//!
//! `rust-fcnet` implements forward propagation, cost evaluation and
//! backpropagation for two feed-forward network forms, plus the gradient
//! descent drivers and gradient checking needed to train and verify them.
//!
//! # Network forms
//!
//! - **Separated form** ([`Params`]): every layer has a weight matrix `W_l` of
//!   shape `(n_l, n_{l-1})` and a bias column `b_l` of shape `(n_l, 1)`.
//!   Hidden layers use ReLU and the output layer uses the sigmoid, trained with
//!   binary cross-entropy. Examples are **columns**: `X` is `(n_0, m)`.
//! - **Folded-intercept form** ([`Theta`]): every layer is one matrix `Θ_l` of
//!   shape `(n_l, n_{l-1} + 1)` whose column 0 multiplies a constant-1 feature.
//!   Every layer uses the sigmoid, trained with one-vs-all cross-entropy and L2
//!   regularization that skips column 0. Examples are **rows**: `X` is `(m, n_0)`.
//!
//! Both forms are plain functions over owned parameters ([`l_model_forward`],
//! [`l_model_backward`], [`feed_forward`], [`back_propagation`]), and both are
//! wrapped behind the [`Classifier`] trait, which always takes one example
//! per row.
//!
//! # Panics vs `Result`
//!
//! Public operations validate shapes, labels and hyper-parameters and return
//! [`Result`]. Numeric saturation is not guarded: a sigmoid output of exactly
//! `0` or `1` makes the cost `inf` or `NaN`, and that value is returned as-is.
//!
//! # Quick start
//!
//! ```rust
//! use ndarray::{arr1, arr2};
//! use rust_fcnet::{Classifier, ClassifierBuilder, FitConfig, Topology};
//!
//! # fn main() -> rust_fcnet::Result<()> {
//! let x = arr2(&[[0.0, 0.1], [0.1, 0.0], [0.9, 1.0], [1.0, 0.9]]);
//! let labels = arr1(&[0, 0, 1, 1]);
//!
//! let topology = Topology::new(2, 4, 2, 1)?;
//! let mut net = ClassifierBuilder::one_vs_all(topology)?
//!     .lambda(0.01)?
//!     .build_with_seed(0)?;
//!
//! let report = net.fit(
//!     x.view(),
//!     labels.view(),
//!     &FitConfig {
//!         iterations: 200,
//!         learning_rate: 1.0,
//!         log_every: 50,
//!     },
//! )?;
//! assert!(report.final_cost < report.costs[0]);
//! let _predicted = net.predict(x.view())?;
//! # Ok(())
//! # }
//! ```
//!
//! # Driving a flat parameter vector
//!
//! The folded form can also be trained over its flattened parameters, which is
//! what gradient checking operates on:
//!
//! ```rust
//! use ndarray::{arr1, arr2};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use rust_fcnet::{Topology, gradient_descent, init_nn_weights, one_vs_all_grad};
//!
//! # fn main() -> rust_fcnet::Result<()> {
//! let x = arr2(&[[0.2, 0.4], [0.8, 0.6]]);
//! let labels = arr1(&[0, 1]);
//! let topology = Topology::new(2, 3, 2, 1)?;
//!
//! let theta0 = init_nn_weights(&topology, &mut StdRng::seed_from_u64(0))?.flatten();
//! let _theta = gradient_descent(theta0.view(), 0.5, 10, |t| {
//!     one_vs_all_grad(t, x.view(), labels.view(), 0.0, &topology)
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod backward;
pub mod builder;
pub mod classifier;
pub mod cost;
pub mod data;
pub mod error;
pub mod forward;
pub mod gradcheck;
pub mod metrics;
pub mod params;
pub mod theta;
pub mod train;

pub use activation::{Activation, ActivationCache};
pub use backward::{
    Gradients, back_propagation, l_model_backward, linear_activation_backward, linear_backward,
    one_vs_all_grad, one_vs_all_gradients,
};
pub use builder::ClassifierBuilder;
pub use classifier::{Classifier, DeepClassifier, Network, OneVsAllClassifier};
pub use cost::{compute_cost, one_vs_all_cost, regularization_term};
pub use data::{feature_normalize, prepend_intercept};
pub use error::{Error, Result};
pub use forward::{
    LayerCache, LinearCache, feed_forward, l_model_forward, linear_activation_forward,
    linear_forward,
};
pub use gradcheck::{numerical_grad, relative_difference};
pub use params::{LayerParams, Params, init_params, init_params_with_rng};
pub use theta::{Theta, Topology, init_nn_weights, rand_init_weights, unravel_params};
pub use train::{FitConfig, FitReport, fit, gradient_descent};
