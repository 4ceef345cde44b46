//! Activation functions.
//!
//! A layer computes a pre-activation `Z = W A_prev + b` and then applies an
//! activation element-wise: `A = g(Z)`.
//!
//! Forward functions hand back an [`ActivationCache`] holding `Z`. The matching
//! backward function turns an upstream gradient `dA` into `dZ = dA * g'(Z)`
//! using only that cache.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, Zip};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Element-wise activation function.
pub enum Activation {
    Sigmoid,
    ReLU,
    Tanh,
    /// `g(z) = z`. Parsed from `"linear"` or `"identity"`.
    Identity,
}

/// Values retained by an activation's forward pass.
///
/// Holds the pre-activation `Z` the activation was applied to.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationCache {
    z: Array2<f64>,
}

impl ActivationCache {
    #[inline]
    pub fn new(z: Array2<f64>) -> Self {
        Self { z }
    }

    /// The pre-activation `Z`.
    #[inline]
    pub fn z(&self) -> &Array2<f64> {
        &self.z
    }

    #[inline]
    pub fn into_z(self) -> Array2<f64> {
        self.z
    }
}

impl Activation {
    pub fn name(self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::ReLU => "relu",
            Activation::Tanh => "tanh",
            Activation::Identity => "linear",
        }
    }

    #[inline]
    pub(crate) fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => sigmoid_scalar(x),
            Activation::ReLU => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Identity => x,
        }
    }

    /// Derivative `g'(z)` evaluated at the pre-activation.
    #[inline]
    pub(crate) fn grad(self, z: f64) -> f64 {
        match self {
            Activation::Sigmoid => {
                let s = sigmoid_scalar(z);
                s * (1.0 - s)
            }
            Activation::ReLU => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Tanh => {
                let t = z.tanh();
                1.0 - t * t
            }
            Activation::Identity => 1.0,
        }
    }

    /// Apply the activation to `z`, consuming it into the returned cache.
    pub fn forward(self, z: Array2<f64>) -> (Array2<f64>, ActivationCache) {
        let a = z.mapv(|v| self.apply(v));
        (a, ActivationCache::new(z))
    }

    /// Compute `dZ = dA * g'(Z)`.
    ///
    /// Shape contract: `d_a.dim() == cache.z().dim()`. Panics otherwise.
    pub fn backward(self, d_a: &Array2<f64>, cache: &ActivationCache) -> Array2<f64> {
        assert_eq!(
            d_a.dim(),
            cache.z.dim(),
            "dA shape {:?} does not match cached Z shape {:?}",
            d_a.dim(),
            cache.z.dim()
        );

        match self {
            // dZ = 0 wherever Z <= 0, including Z == 0.
            Activation::ReLU => Zip::from(d_a)
                .and(&cache.z)
                .map_collect(|&da, &z| if z <= 0.0 { 0.0 } else { da }),
            _ => Zip::from(d_a)
                .and(&cache.z)
                .map_collect(|&da, &z| da * self.grad(z)),
        }
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sigmoid" => Ok(Activation::Sigmoid),
            "relu" => Ok(Activation::ReLU),
            "tanh" => Ok(Activation::Tanh),
            "linear" | "identity" => Ok(Activation::Identity),
            other => Err(Error::InvalidConfig(format!(
                "unknown activation {other:?}; expected one of sigmoid, relu, tanh, linear"
            ))),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `A = 1 / (1 + exp(-Z))`.
pub fn sigmoid(z: &Array2<f64>) -> (Array2<f64>, ActivationCache) {
    Activation::Sigmoid.forward(z.clone())
}

/// `A = max(0, Z)`.
pub fn relu(z: &Array2<f64>) -> (Array2<f64>, ActivationCache) {
    Activation::ReLU.forward(z.clone())
}

pub fn sigmoid_backward(d_a: &Array2<f64>, cache: &ActivationCache) -> Array2<f64> {
    Activation::Sigmoid.backward(d_a, cache)
}

pub fn relu_backward(d_a: &Array2<f64>, cache: &ActivationCache) -> Array2<f64> {
    Activation::ReLU.backward(d_a, cache)
}

/// Element-wise `g(z) * (1 - g(z))` for the sigmoid `g`.
pub fn sigmoid_grad(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|v| Activation::Sigmoid.grad(v))
}

#[inline]
fn sigmoid_scalar(x: f64) -> f64 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}
