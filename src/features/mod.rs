//! Feature extraction and encoding
//!
//! Converts raw kick records into model-ready, standardized features.

pub mod encoding;
pub mod scaler;

pub use encoding::{CanonicalSchema, SchemaEncoder, SparseFeatures};
pub use scaler::ScalerParams;
