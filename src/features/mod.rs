//! Feature extraction and encoding
//!
//! Converts raw request fields into model-ready features.

pub mod assembler;
pub mod encoding;
pub mod scaling;

pub use assembler::{FeatureAssembler, FeatureVector};
pub use encoding::{CategoricalEncoder, Vocabulary};
pub use scaling::{ColumnRange, FeatureScaler, ScalerColumn};
