use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::kdtree::KdTree;

/// Parameters of the normal based region growing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionGrowingParams {
    /// Maximum angle in degrees between the normals of adjacent region points.
    pub normal_threshold_deg: f32,
    /// Radius of the neighbor search around each region point, in cloud units.
    pub max_distance: f32,
    /// Hard cap on the number of points in the region.
    pub max_region_size: usize,
}

impl Default for RegionGrowingParams {
    fn default() -> Self {
        Self {
            normal_threshold_deg: 15.0,
            max_distance: 0.3,
            max_region_size: 10_000,
        }
    }
}

impl RegionGrowingParams {
    /// Check the parameters.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.normal_threshold_deg.is_finite()
            || !(0.0..=180.0).contains(&self.normal_threshold_deg)
        {
            return Err(GeometryError::invalid(
                "normal_threshold_deg",
                format!("must be within [0, 180], got {}", self.normal_threshold_deg),
            ));
        }
        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err(GeometryError::invalid(
                "max_distance",
                format!("must be finite and non-negative, got {}", self.max_distance),
            ));
        }
        Ok(())
    }
}

/// A set of points grown from a seed.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// The seed point index.
    pub seed: usize,
    /// Point indices in the order they joined the region. The seed comes first.
    pub indices: Vec<usize>,
    /// The parameters the region was grown with.
    pub params: RegionGrowingParams,
}

impl Region {
    /// Number of points in the region.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check if the region holds no points.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Grow a region from `seed` by breadth first expansion over similar normals.
///
/// A popped point joins the region and queries its neighbors within
/// `max_distance`. Every unvisited neighbor is marked visited at once and is
/// queued only if the absolute cosine between its normal and the popped point's
/// normal reaches `cos(normal_threshold_deg)`. Growth stops when the queue is
/// empty or the region holds `max_region_size` points, so the region can be
/// truncated before reaching a geometric boundary.
///
/// The absolute value makes the test insensitive to the arbitrary sign of PCA
/// normals. It also admits points on the opposite face of a thin surface.
///
/// # Arguments
///
/// * `seed` - Index of the seed point.
/// * `tree` - Index over the points.
/// * `normals` - One precomputed normal per point of the tree.
/// * `params` - Growth parameters.
pub fn grow_region(
    seed: usize,
    tree: &KdTree,
    normals: &[[f32; 3]],
    params: &RegionGrowingParams,
) -> Result<Region, GeometryError> {
    params.validate()?;
    if normals.len() != tree.len() {
        return Err(GeometryError::MismatchedLengths {
            left_name: "points",
            left_len: tree.len(),
            right_name: "normals",
            right_len: normals.len(),
        });
    }
    if seed >= tree.len() {
        return Err(GeometryError::IndexOutOfBounds {
            index: seed,
            len: tree.len(),
        });
    }

    let cos_threshold = params.normal_threshold_deg.to_radians().cos();
    let points = tree.points();

    let mut visited = vec![false; tree.len()];
    let mut queue = VecDeque::from([seed]);
    let mut indices = Vec::new();
    visited[seed] = true;

    while indices.len() < params.max_region_size {
        let Some(current) = queue.pop_front() else {
            break;
        };
        indices.push(current);

        let normal = &normals[current];
        for neighbor in tree.radius(&points[current], params.max_distance)? {
            if visited[neighbor] {
                continue;
            }
            visited[neighbor] = true;

            if dot(normal, &normals[neighbor]).abs() >= cos_threshold {
                queue.push_back(neighbor);
            }
        }
    }

    log::debug!(
        "region grown from seed {} holds {} points (cap {})",
        seed,
        indices.len(),
        params.max_region_size
    );

    Ok(Region {
        seed,
        indices,
        params: *params,
    })
}

#[inline]
fn dot(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
