//! Prediction and inference
//!
//! Aligns single records with the trained schema and runs the classifier.

pub mod inference;

pub use inference::{format_prediction, join_prediction, reconcile, TrainedPipeline};
