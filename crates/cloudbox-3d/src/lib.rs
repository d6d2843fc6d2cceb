#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Confirmed cuboid annotations.
pub mod annotation;

/// Pipeline configuration and the per-cloud context.
pub mod context;

/// Error types.
pub mod error;

/// Static kd-tree for nearest, radius and k-nearest queries.
pub mod kdtree;

/// Surface normal estimation.
pub mod normals;

/// Oriented bounding box fitting.
pub mod obb;

/// Operations on 3D points.
pub mod ops;

/// Point cloud container.
pub mod pointcloud;

/// Region growing segmentation.
pub mod segmentation;

/// Conversions between the raw sensor frame and the display frame.
pub mod transforms;

pub use error::GeometryError;
