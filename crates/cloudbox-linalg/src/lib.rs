#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Centroid and scatter matrices of 3D point sets.
pub mod covariance;

/// Eigen decomposition of symmetric 3x3 matrices.
pub mod eigen;

pub use covariance::scatter_matrix;
pub use eigen::{symmetric_eigen3, symmetric_eigen3_with, JacobiParams, Symmetric3, SymmetricEigen3};
