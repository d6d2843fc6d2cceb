use glam::DVec3;

/// Squared Euclidean distance between two points.
///
/// All index queries compare distances with this function, so brute force
/// searches that use it agree exactly with the kd-tree.
///
/// Example:
/// ```
/// use cloudbox_3d::ops::squared_distance;
///
/// let d2 = squared_distance(&[0.0, 0.0, 0.0], &[1.0, 2.0, 2.0]);
/// assert_eq!(d2, 9.0);
/// ```
#[inline]
pub fn squared_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

/// Euclidean distance between two points.
pub fn euclidean_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    squared_distance(a, b).sqrt()
}

/// Widen a stored point for double precision accumulation.
#[inline]
pub fn to_dvec3(p: &[f32; 3]) -> DVec3 {
    DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64)
}

/// Brute force nearest point. Returns `None` for an empty slice.
pub fn nearest_linear(points: &[[f32; 3]], query: &[f32; 3]) -> Option<usize> {
    let mut best = None;
    let mut best_dist = f32::INFINITY;
    for (i, p) in points.iter().enumerate() {
        let d = squared_distance(p, query);
        if d < best_dist {
            best_dist = d;
            best = Some(i);
        }
    }
    best
}
