use cloudbox_linalg::{scatter_matrix, symmetric_eigen3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::kdtree::KdTree;
use crate::ops::to_dvec3;

/// Normal assigned to points whose neighborhood cannot define a plane.
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Minimum number of neighbors, the point itself included, for a PCA normal.
pub const MIN_NEIGHBORS: usize = 3;

const MIN_NORMAL_LENGTH: f64 = 1e-8;

/// Parameters of the normal estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalEstimationParams {
    /// Number of nearest neighbors, the point itself included.
    pub k: usize,
    /// Estimate normals on the rayon thread pool.
    pub parallel: bool,
}

impl Default for NormalEstimationParams {
    fn default() -> Self {
        Self {
            k: 15,
            parallel: false,
        }
    }
}

impl NormalEstimationParams {
    /// Check the parameters.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.k == 0 {
            return Err(GeometryError::invalid("k", "must be at least 1"));
        }
        Ok(())
    }
}

/// Estimate a surface normal for every point of the tree.
///
/// The normal of a point is the eigenvector of smallest eigenvalue of the
/// covariance of its `k` nearest neighbors. Points with fewer than
/// [`MIN_NEIGHBORS`] neighbors, or whose eigenvector degenerates, get
/// [`DEFAULT_NORMAL`].
///
/// The sign of each normal is arbitrary: consumers must treat normals as
/// undirected lines.
///
/// # Arguments
///
/// * `tree` - Index over the points. Normals follow the order of [`KdTree::points`].
/// * `params` - Estimation parameters.
///
/// # Returns
///
/// One unit normal per point.
pub fn estimate_normals(
    tree: &KdTree,
    params: &NormalEstimationParams,
) -> Result<Vec<[f32; 3]>, GeometryError> {
    params.validate()?;

    let points = tree.points();
    if params.parallel {
        points
            .par_iter()
            .map(|p| normal_at(tree, p, params.k))
            .collect()
    } else {
        points.iter().map(|p| normal_at(tree, p, params.k)).collect()
    }
}

/// Estimate the normal of the surface around `query` from its `k` nearest points.
pub fn normal_at(tree: &KdTree, query: &[f32; 3], k: usize) -> Result<[f32; 3], GeometryError> {
    let neighbors = tree.knn(query, k)?;
    if neighbors.len() < MIN_NEIGHBORS {
        return Ok(DEFAULT_NORMAL);
    }

    let points = tree.points();
    let Some((_, scatter, _)) = scatter_matrix(neighbors.iter().map(|&i| to_dvec3(&points[i])))
    else {
        return Ok(DEFAULT_NORMAL);
    };

    // eigenvalues are sorted descending, the last one spans the normal
    let eig = symmetric_eigen3(&scatter);
    let normal = eig.vectors[2];
    let length = normal.length();
    if length <= MIN_NORMAL_LENGTH {
        return Ok(DEFAULT_NORMAL);
    }

    let n = normal / length;
    Ok([n.x as f32, n.y as f32, n.z as f32])
}
