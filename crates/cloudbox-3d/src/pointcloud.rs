use crate::error::GeometryError;

/// A point cloud with positions and optional per-point intensities.
///
/// Point `i` is `points()[i]`, which is the record at offset `3 * i` of the flat
/// interleaved buffer returned by [`PointCloud::to_flat`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    // The positions, interleaved x, y, z.
    points: Vec<[f32; 3]>,
    // Per-point intensity as reported by the sensor.
    intensities: Option<Vec<f32>>,
}

impl PointCloud {
    /// Create a new point cloud from points and intensities (optional).
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::MismatchedLengths`] if the intensities do not match
    /// the points one to one.
    pub fn new(
        points: Vec<[f32; 3]>,
        intensities: Option<Vec<f32>>,
    ) -> Result<Self, GeometryError> {
        if let Some(intensities) = &intensities {
            if intensities.len() != points.len() {
                return Err(GeometryError::MismatchedLengths {
                    left_name: "points",
                    left_len: points.len(),
                    right_name: "intensities",
                    right_len: intensities.len(),
                });
            }
        }
        Ok(Self {
            points,
            intensities,
        })
    }

    /// Create a point cloud from a flat stride-3 buffer `[x0, y0, z0, x1, ...]`.
    pub fn from_flat(buffer: &[f32]) -> Result<Self, GeometryError> {
        Self::from_flat_with_stride(buffer, 3)
    }

    /// Create a point cloud from a flat buffer of fixed size records.
    ///
    /// The first three values of every record are x, y and z. With a stride of four
    /// or more the fourth value is read as the intensity, which is the layout of
    /// KITTI velodyne scans.
    ///
    /// # Arguments
    ///
    /// * `buffer` - The raw values.
    /// * `stride` - Number of values per point, at least 3.
    pub fn from_flat_with_stride(buffer: &[f32], stride: usize) -> Result<Self, GeometryError> {
        if stride < 3 {
            return Err(GeometryError::invalid(
                "stride",
                format!("must be at least 3, got {stride}"),
            ));
        }
        if buffer.len() % stride != 0 {
            return Err(GeometryError::invalid(
                "buffer",
                format!("length {} is not a multiple of {stride}", buffer.len()),
            ));
        }

        let records = buffer.chunks_exact(stride);
        let points = records.clone().map(|r| [r[0], r[1], r[2]]).collect();
        let intensities = (stride >= 4).then(|| records.map(|r| r[3]).collect());

        Ok(Self {
            points,
            intensities,
        })
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f32; 3]] {
        &self.points
    }

    /// Get as reference the intensities of the points, if any.
    pub fn intensities(&self) -> Option<&[f32]> {
        self.intensities.as_deref()
    }

    /// Get a single point.
    pub fn point(&self, index: usize) -> Result<[f32; 3], GeometryError> {
        self.points
            .get(index)
            .copied()
            .ok_or(GeometryError::IndexOutOfBounds {
                index,
                len: self.points.len(),
            })
    }

    /// Copy the positions into a flat stride-3 buffer.
    pub fn to_flat(&self) -> Vec<f32> {
        self.points.iter().flatten().copied().collect()
    }

    /// Get the minimum bound of the point cloud. Zero for an empty cloud.
    pub fn min_bound(&self) -> [f32; 3] {
        self.fold_bound(f32::min)
    }

    /// Get the maximum bound of the point cloud. Zero for an empty cloud.
    pub fn max_bound(&self) -> [f32; 3] {
        self.fold_bound(f32::max)
    }

    fn fold_bound(&self, pick: fn(f32, f32) -> f32) -> [f32; 3] {
        let Some(first) = self.points.first() else {
            return [0.0; 3];
        };
        self.points.iter().fold(*first, |acc, p| {
            [pick(acc[0], p[0]), pick(acc[1], p[1]), pick(acc[2], p[2])]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointcloud() -> Result<(), GeometryError> {
        let pointcloud = PointCloud::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            Some(vec![0.5, 0.25]),
        )?;

        assert_eq!(pointcloud.len(), 2);
        assert!(!pointcloud.is_empty());
        assert_eq!(pointcloud.point(1)?, [1.0, 0.0, 0.0]);
        assert_eq!(pointcloud.intensities(), Some(&[0.5, 0.25][..]));
        assert_eq!(
            pointcloud.point(2),
            Err(GeometryError::IndexOutOfBounds { index: 2, len: 2 })
        );
        Ok(())
    }

    #[test]
    fn test_pointcloud_mismatched_intensities() {
        let res = PointCloud::new(vec![[0.0, 0.0, 0.0]], Some(vec![]));
        assert!(matches!(res, Err(GeometryError::MismatchedLengths { .. })));
    }

    #[test]
    fn test_from_flat() -> Result<(), GeometryError> {
        let buffer = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let cloud = PointCloud::from_flat(&buffer)?;
        assert_eq!(cloud.points(), &[[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
        assert!(cloud.intensities().is_none());
        assert_eq!(cloud.to_flat(), buffer.to_vec());

        assert!(PointCloud::from_flat(&buffer[..5]).is_err());
        Ok(())
    }

    #[test]
    fn test_from_flat_with_intensity() -> Result<(), GeometryError> {
        let buffer = [0.0, 1.0, 2.0, 0.1, 3.0, 4.0, 5.0, 0.9];
        let cloud = PointCloud::from_flat_with_stride(&buffer, 4)?;
        assert_eq!(cloud.points(), &[[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
        assert_eq!(cloud.intensities(), Some(&[0.1, 0.9][..]));

        assert!(PointCloud::from_flat_with_stride(&buffer, 2).is_err());
        Ok(())
    }

    #[test]
    fn test_bounds() -> Result<(), GeometryError> {
        let cloud = PointCloud::new(
            vec![[1.0, -2.0, 0.5], [-1.0, 3.0, 0.0], [0.0, 0.0, 4.0]],
            None,
        )?;
        assert_eq!(cloud.min_bound(), [-1.0, -2.0, 0.0]);
        assert_eq!(cloud.max_bound(), [1.0, 3.0, 4.0]);

        let empty = PointCloud::default();
        assert_eq!(empty.min_bound(), [0.0; 3]);
        assert_eq!(empty.max_bound(), [0.0; 3]);
        Ok(())
    }
}
