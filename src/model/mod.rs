//! Trained regression model
//!
//! - KNN: nearest-neighbor regressor over the normalized feature space

pub mod knn;

pub use knn::{KnnRegressor, Neighbor};
