//! Trained artifact storage
//!
//! Label encoders, scaler and model read from the artifact directory.

pub mod artifacts;

pub use artifacts::LoadedArtifacts;
