//! Model training
//!
//! Training loop, loss function, metrics tracking and the end-to-end fit.

pub mod metrics;
pub mod pipeline;
pub mod trainer;

pub use metrics::{Metrics, TrainingHistory};
pub use pipeline::{fit_pipeline, TrainingReport};
