//! Feed-forward goal classifier
//!
//! Architecture: Input(schema width) → Hidden1(16) → ReLU
//!                                   → Hidden2(8)  → ReLU
//!                                   → Output(1)   → sigmoid

use burn::module::{Module, Param};
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation::{relu, sigmoid};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Configuration for the classifier
#[derive(Debug, Clone)]
pub struct KickNetConfig {
    /// Input dimension (canonical schema width)
    pub input_dim: usize,
    /// Hidden layer dimensions
    pub hidden_dims: Vec<usize>,
}

impl KickNetConfig {
    pub fn new(input_dim: usize, hidden_dims: Vec<usize>) -> Self {
        KickNetConfig {
            input_dim,
            hidden_dims,
        }
    }
}

/// A single hidden layer block: Linear → ReLU
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        relu(self.linear.forward(x))
    }
}

/// Multi-layer perceptron producing a goal logit
#[derive(Module, Debug)]
pub struct KickNet<B: Backend> {
    hidden: Vec<HiddenBlock<B>>,
    output: Linear<B>,
}

impl<B: Backend> KickNet<B> {
    /// Create a model initialized by the backend RNG
    pub fn new(device: &B::Device, config: &KickNetConfig) -> Self {
        Self::build(config, |d_in, d_out| LinearConfig::new(d_in, d_out).init(device))
    }

    /// Create a model with Glorot-uniform weights drawn from a seeded RNG
    ///
    /// Biases start at zero. Two models built with the same seed and config
    /// are identical.
    pub fn seeded(device: &B::Device, config: &KickNetConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::build(config, |d_in, d_out| {
            glorot_linear(device, d_in, d_out, &mut rng)
        })
    }

    fn build(config: &KickNetConfig, mut layer: impl FnMut(usize, usize) -> Linear<B>) -> Self {
        let mut hidden = Vec::with_capacity(config.hidden_dims.len());
        let mut d_in = config.input_dim;
        for &d_out in &config.hidden_dims {
            hidden.push(HiddenBlock {
                linear: layer(d_in, d_out),
            });
            d_in = d_out;
        }

        KickNet {
            hidden,
            output: layer(d_in, 1),
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `features` - Standardized features [batch, input_dim]
    ///
    /// # Returns
    /// Goal logits [batch, 1]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = features;
        for block in &self.hidden {
            x = block.forward(x);
        }
        self.output.forward(x)
    }

    /// Goal probabilities [batch, 1]
    pub fn predict_proba(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        sigmoid(self.forward(features))
    }
}

fn glorot_linear<B: Backend>(
    device: &B::Device,
    d_in: usize,
    d_out: usize,
    rng: &mut StdRng,
) -> Linear<B> {
    let limit = (6.0 / (d_in + d_out) as f32).sqrt();
    let weights: Vec<f32> = (0..d_in * d_out)
        .map(|_| rng.gen_range(-limit..limit))
        .collect();

    let mut linear = LinearConfig::new(d_in, d_out).init(device);
    linear.weight = Param::from_tensor(
        Tensor::<B, 1>::from_floats(weights.as_slice(), device).reshape([d_in, d_out]),
    );
    linear.bias = Some(Param::from_tensor(Tensor::zeros([d_out], device)));
    linear
}
