use glam::DVec3;

use crate::eigen::Symmetric3;

/// Compute the centroid and the scatter matrix of a set of points.
///
/// The scatter matrix is the sum of the outer products of the offsets from the
/// centroid, i.e. the covariance matrix times the number of points. Divide by the
/// returned count to get the (biased) covariance.
///
/// # Arguments
///
/// * `points` - An iterator over the points. It is traversed twice.
///
/// # Returns
///
/// `(centroid, scatter, count)`, or `None` if the iterator is empty.
///
/// Example:
///
/// ```
/// use cloudbox_linalg::covariance::scatter_matrix;
/// use glam::DVec3;
///
/// let points = [DVec3::new(-1.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0)];
/// let (centroid, scatter, n) = scatter_matrix(points.iter().copied()).unwrap();
/// assert_eq!(centroid, DVec3::ZERO);
/// assert_eq!(scatter.m00, 2.0);
/// assert_eq!(n, 2);
/// ```
pub fn scatter_matrix<I>(points: I) -> Option<(DVec3, Symmetric3, usize)>
where
    I: Iterator<Item = DVec3> + Clone,
{
    let (sum, count) = points
        .clone()
        .fold((DVec3::ZERO, 0usize), |(sum, n), p| (sum + p, n + 1));
    if count == 0 {
        return None;
    }
    let centroid = sum / count as f64;

    let mut scatter = Symmetric3::default();
    for p in points {
        let d = p - centroid;
        scatter.m00 += d.x * d.x;
        scatter.m01 += d.x * d.y;
        scatter.m02 += d.x * d.z;
        scatter.m11 += d.y * d.y;
        scatter.m12 += d.y * d.z;
        scatter.m22 += d.z * d.z;
    }

    Some((centroid, scatter, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scatter_empty() {
        assert!(scatter_matrix(std::iter::empty::<DVec3>()).is_none());
    }

    #[test]
    fn test_scatter_line() {
        let points = [
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(2.0, 2.0, 1.0),
        ];
        let (centroid, scatter, n) = scatter_matrix(points.iter().copied()).unwrap();
        assert_eq!(n, 3);
        assert_relative_eq!(centroid.x, 1.0);
        assert_relative_eq!(centroid.y, 1.0);
        assert_relative_eq!(centroid.z, 1.0);

        assert_relative_eq!(scatter.m00, 2.0);
        assert_relative_eq!(scatter.m01, 2.0);
        assert_relative_eq!(scatter.m11, 2.0);
        assert_relative_eq!(scatter.m02, 0.0);
        assert_relative_eq!(scatter.m12, 0.0);
        assert_relative_eq!(scatter.m22, 0.0);

        let cov = scatter.scale(1.0 / n as f64);
        assert_relative_eq!(cov.m00, 2.0 / 3.0);
    }
}
