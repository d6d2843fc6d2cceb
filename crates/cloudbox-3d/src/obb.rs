use cloudbox_linalg::{scatter_matrix, symmetric_eigen3};
use glam::DVec3;

use crate::error::GeometryError;
use crate::ops::to_dvec3;

/// An oriented bounding box.
///
/// The axes form a right-handed orthonormal frame. A point `p` of the box
/// satisfies `|(p - center) . axes[i]| <= half_extents[i]` for every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBoundingBox {
    /// Center of the box.
    pub center: DVec3,
    /// Unit axes of the box, ranked by decreasing spread of the fitted points.
    pub axes: [DVec3; 3],
    /// Half of the box size along each axis.
    pub half_extents: DVec3,
}

impl Default for OrientedBoundingBox {
    /// A zero-extent box at the origin aligned with the world axes.
    fn default() -> Self {
        Self {
            center: DVec3::ZERO,
            axes: [DVec3::X, DVec3::Y, DVec3::Z],
            half_extents: DVec3::ZERO,
        }
    }
}

impl OrientedBoundingBox {
    /// Express a point in the box frame, relative to its center.
    pub fn to_local(&self, point: DVec3) -> DVec3 {
        let d = point - self.center;
        DVec3::new(d.dot(self.axes[0]), d.dot(self.axes[1]), d.dot(self.axes[2]))
    }

    /// Express a point of the box frame in world coordinates.
    pub fn to_world(&self, local: DVec3) -> DVec3 {
        self.center + self.axes[0] * local.x + self.axes[1] * local.y + self.axes[2] * local.z
    }

    /// Check whether a point lies inside the box, enlarged by `tolerance` on every side.
    pub fn contains(&self, point: DVec3, tolerance: f64) -> bool {
        let local = self.to_local(point).abs();
        let limit = self.half_extents + DVec3::splat(tolerance);
        local.cmple(limit).all()
    }

    /// The 8 corners of the box.
    ///
    /// Corner `i` takes the positive extent along axis `j` when bit `j` of `i` is set.
    pub fn corners(&self) -> [DVec3; 8] {
        std::array::from_fn(|i| {
            let sign = |bit: usize| if i & (1 << bit) != 0 { 1.0 } else { -1.0 };
            self.to_world(DVec3::new(
                sign(0) * self.half_extents.x,
                sign(1) * self.half_extents.y,
                sign(2) * self.half_extents.z,
            ))
        })
    }

    /// Volume of the box.
    pub fn volume(&self) -> f64 {
        8.0 * self.half_extents.x * self.half_extents.y * self.half_extents.z
    }
}

/// Fit an oriented bounding box to a subset of points with PCA.
///
/// The axes are the eigenvectors of the covariance of the selected points, sorted
/// by decreasing eigenvalue. The third axis is flipped when needed so that the
/// frame is right-handed. The box is the tightest one in that frame, which is not
/// necessarily the minimum volume box.
///
/// An empty selection yields [`OrientedBoundingBox::default`].
///
/// # Arguments
///
/// * `indices` - Indices of the selected points.
/// * `points` - The point set the indices refer to.
///
/// Example:
///
/// ```
/// use cloudbox_3d::obb::fit_obb;
///
/// let points = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [2.0, 1.0, 0.0]];
/// let obb = fit_obb(&[0, 1, 2, 3], &points).unwrap();
/// assert!((obb.half_extents.x - 1.0).abs() < 1e-9);
/// assert!((obb.half_extents.y - 0.5).abs() < 1e-9);
/// ```
pub fn fit_obb(
    indices: &[usize],
    points: &[[f32; 3]],
) -> Result<OrientedBoundingBox, GeometryError> {
    if let Some(&index) = indices.iter().find(|&&i| i >= points.len()) {
        return Err(GeometryError::IndexOutOfBounds {
            index,
            len: points.len(),
        });
    }

    let selected = indices.iter().map(|&i| to_dvec3(&points[i]));
    let Some((centroid, scatter, n)) = scatter_matrix(selected.clone()) else {
        return Ok(OrientedBoundingBox::default());
    };

    let eig = symmetric_eigen3(&scatter.scale(1.0 / n as f64));
    if !eig.converged {
        log::warn!(
            "covariance eigen decomposition of {} points did not converge, box axes are approximate",
            n
        );
    }

    let [a0, a1, a2] = eig.vectors;
    let axes = if a0.cross(a1).dot(a2) >= 0.0 {
        [a0, a1, a2]
    } else {
        [a0, a1, -a2]
    };

    let mut min = DVec3::splat(f64::INFINITY);
    let mut max = DVec3::splat(f64::NEG_INFINITY);
    for p in selected {
        let d = p - centroid;
        let proj = DVec3::new(d.dot(axes[0]), d.dot(axes[1]), d.dot(axes[2]));
        min = min.min(proj);
        max = max.max(proj);
    }

    // the centroid is the box center only for symmetric distributions
    let mid = (min + max) * 0.5;
    let center = centroid + axes[0] * mid.x + axes[1] * mid.y + axes[2] * mid.z;

    Ok(OrientedBoundingBox {
        center,
        axes,
        half_extents: (max - min) * 0.5,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_right_handed(obb: &OrientedBoundingBox) {
        let [a0, a1, a2] = obb.axes;
        assert!(a0.cross(a1).dot(a2) >= 0.0);
        assert_relative_eq!(a0.cross(a1).dot(a2), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_selection() -> Result<(), GeometryError> {
        let obb = fit_obb(&[], &[[1.0, 2.0, 3.0]])?;
        assert_eq!(obb, OrientedBoundingBox::default());
        assert_eq!(obb.volume(), 0.0);
        Ok(())
    }

    #[test]
    fn test_out_of_bounds() {
        assert_eq!(
            fit_obb(&[0, 3], &[[0.0; 3]; 2]),
            Err(GeometryError::IndexOutOfBounds { index: 3, len: 2 })
        );
    }

    #[test]
    fn test_axis_aligned_box() -> Result<(), GeometryError> {
        // corners of a 4 x 2 x 1 box centered at (1, 1, 1)
        let mut points = Vec::new();
        for x in [-1.0, 3.0] {
            for y in [0.0, 2.0] {
                for z in [0.5, 1.5] {
                    points.push([x, y, z]);
                }
            }
        }
        let indices: Vec<usize> = (0..points.len()).collect();
        let obb = fit_obb(&indices, &points)?;

        assert_right_handed(&obb);
        assert_relative_eq!(obb.center.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(obb.center.y, 1.0, epsilon = 1e-9);
        assert_relative_eq!(obb.center.z, 1.0, epsilon = 1e-9);
        assert_relative_eq!(obb.half_extents.x, 2.0, epsilon = 1e-9);
        assert_relative_eq!(obb.half_extents.y, 1.0, epsilon = 1e-9);
        assert_relative_eq!(obb.half_extents.z, 0.5, epsilon = 1e-9);
        assert_relative_eq!(obb.axes[0].x.abs(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(obb.volume(), 8.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_center_is_not_centroid() -> Result<(), GeometryError> {
        // many points at one end of a segment pull the centroid away from the middle
        let mut points = vec![[0.0, 0.0, 0.0]; 9];
        points.push([10.0, 0.0, 0.0]);
        points.push([0.0, 1.0, 0.0]);
        let indices: Vec<usize> = (0..points.len()).collect();
        let obb = fit_obb(&indices, &points)?;

        for p in &points {
            assert!(obb.contains(to_dvec3(p), 1e-9));
        }
        // the box still spans the whole segment
        assert!(obb.half_extents.x.max(obb.half_extents.y) > 4.9);
        Ok(())
    }

    #[test]
    fn test_corners_and_contains() -> Result<(), GeometryError> {
        let points = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [2.0, 1.0, 0.5]];
        let obb = fit_obb(&[0, 1, 2, 3], &points)?;
        for corner in obb.corners() {
            assert!(obb.contains(corner, 1e-9));
            let local = obb.to_local(corner).abs();
            assert_relative_eq!(local.x, obb.half_extents.x, epsilon = 1e-9);
        }
        assert!(!obb.contains(DVec3::new(10.0, 10.0, 10.0), 1e-9));
        Ok(())
    }

    #[test]
    fn test_single_point() -> Result<(), GeometryError> {
        let obb = fit_obb(&[0], &[[1.0, 2.0, 3.0]])?;
        assert_eq!(obb.center, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(obb.half_extents, DVec3::ZERO);
        assert_right_handed(&obb);
        Ok(())
    }
}
