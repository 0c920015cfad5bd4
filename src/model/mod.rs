//! Neural network architecture
//!
//! A small multi-layer perceptron over the standardized kick features.

pub mod mlp;

pub use mlp::{KickNet, KickNetConfig};
