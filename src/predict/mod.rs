//! Prediction and inference
//!
//! Run raw requests through the loaded artifacts to real-world yields.

pub mod inference;

pub use inference::PredictionPipeline;
