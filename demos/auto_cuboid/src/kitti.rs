use std::path::Path;

use cloudbox::k3d::pointcloud::PointCloud;
use cloudbox::k3d::GeometryError;

/// Size in bytes of one velodyne record: x, y, z, intensity as little endian f32.
const RECORD_SIZE: usize = 16;

/// Error types for the KITTI reader.
#[derive(Debug, thiserror::Error)]
pub enum KittiError {
    /// Failed to read the scan.
    #[error("Failed to read KITTI scan")]
    Io(#[from] std::io::Error),

    /// The file is not a whole number of records.
    #[error("KITTI scan size {0} is not a multiple of {RECORD_SIZE} bytes")]
    InvalidLength(usize),

    /// The decoded buffer was rejected.
    #[error("Invalid point buffer: {0}")]
    Geometry(#[from] GeometryError),
}

/// Read a KITTI velodyne scan (`.bin`) with its intensities.
pub fn read_kitti_bin(path: impl AsRef<Path>) -> Result<PointCloud, KittiError> {
    let bytes = std::fs::read(path)?;
    parse_kitti_bin(&bytes)
}

/// Decode the raw bytes of a KITTI velodyne scan.
pub fn parse_kitti_bin(bytes: &[u8]) -> Result<PointCloud, KittiError> {
    if bytes.len() % RECORD_SIZE != 0 {
        return Err(KittiError::InvalidLength(bytes.len()));
    }

    let values: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    Ok(PointCloud::from_flat_with_stride(&values, 4)?)
}
