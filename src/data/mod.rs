//! Data ingestion
//!
//! CSV loading of labelled kicks and Burn datasets for mini-batch training.

pub mod dataset;
pub mod loader;

pub use dataset::{KickBatch, KickBatcher, KickDataset, KickSample, SplitIndices};
pub use loader::load;
