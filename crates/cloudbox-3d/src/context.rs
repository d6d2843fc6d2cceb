use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::kdtree::{KdTree, DEFAULT_LEAF_CAPACITY};
use crate::normals::{estimate_normals, NormalEstimationParams};
use crate::obb::{fit_obb, OrientedBoundingBox};
use crate::pointcloud::PointCloud;
use crate::segmentation::{grow_region, Region, RegionGrowingParams};

/// Configuration of the whole pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of points per kd-tree leaf.
    pub leaf_capacity: usize,
    /// Normal estimation parameters.
    pub normals: NormalEstimationParams,
    /// Default region growing parameters.
    pub region: RegionGrowingParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            leaf_capacity: DEFAULT_LEAF_CAPACITY,
            normals: NormalEstimationParams::default(),
            region: RegionGrowingParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Check every parameter.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.leaf_capacity == 0 {
            return Err(GeometryError::invalid("leaf_capacity", "must be at least 1"));
        }
        self.normals.validate()?;
        self.region.validate()
    }
}

/// The indexed point set with its normals.
///
/// Built once per loaded cloud and read-only afterwards. Hosts own one context per
/// cloud and replace it when a new cloud is loaded. All queries take positions in
/// the raw sensor frame; see [`crate::transforms`] to convert picked positions.
#[derive(Debug, Clone)]
pub struct PointCloudContext {
    tree: KdTree,
    normals: Vec<[f32; 3]>,
    intensities: Option<Vec<f32>>,
    config: PipelineConfig,
}

impl PointCloudContext {
    /// Index `cloud` and estimate its normals.
    ///
    /// This is a blocking, CPU bound call meant to run off the interactive thread.
    pub fn new(cloud: &PointCloud, config: &PipelineConfig) -> Result<Self, GeometryError> {
        config.validate()?;

        let now = Instant::now();
        let tree = KdTree::build(cloud.points(), config.leaf_capacity)?;
        log::info!(
            "built kd-tree over {} points in {:?}",
            tree.len(),
            now.elapsed()
        );

        let now = Instant::now();
        let normals = estimate_normals(&tree, &config.normals)?;
        log::info!(
            "estimated {} normals (k = {}) in {:?}",
            normals.len(),
            config.normals.k,
            now.elapsed()
        );

        Ok(Self {
            tree,
            normals,
            intensities: cloud.intensities().map(<[f32]>::to_vec),
            config: *config,
        })
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if the context holds no points.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// The point positions.
    pub fn points(&self) -> &[[f32; 3]] {
        self.tree.points()
    }

    /// The unit normals, one per point, with arbitrary sign.
    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    /// Flat stride-3 copy of the normals, parallel to the position buffer.
    pub fn normals_flat(&self) -> Vec<f32> {
        self.normals.iter().flatten().copied().collect()
    }

    /// The point intensities of the source cloud, if any.
    pub fn intensities(&self) -> Option<&[f32]> {
        self.intensities.as_deref()
    }

    /// The spatial index.
    pub fn tree(&self) -> &KdTree {
        &self.tree
    }

    /// The configuration the context was built with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Index of the point closest to a raw frame position, `None` for an empty cloud.
    pub fn pick(&self, raw_query: &[f32; 3]) -> Option<usize> {
        self.tree.nearest(raw_query)
    }

    /// Grow a region from the point closest to `raw_query`.
    ///
    /// Returns `Ok(None)` when the cloud is empty.
    pub fn grow_from(
        &self,
        raw_query: &[f32; 3],
        params: &RegionGrowingParams,
    ) -> Result<Option<Region>, GeometryError> {
        let Some(seed) = self.pick(raw_query) else {
            return Ok(None);
        };

        let now = Instant::now();
        let region = grow_region(seed, &self.tree, &self.normals, params)?;
        log::info!(
            "region growing selected {} points in {:?}",
            region.len(),
            now.elapsed()
        );
        Ok(Some(region))
    }

    /// Fit an oriented bounding box to a region of this cloud.
    pub fn fit_region(&self, region: &Region) -> Result<OrientedBoundingBox, GeometryError> {
        fit_obb(&region.indices, self.points())
    }

    /// Pick a seed, grow a region around it and fit a cuboid to the region.
    ///
    /// Returns `Ok(None)` when the cloud is empty.
    pub fn auto_cuboid(
        &self,
        raw_query: &[f32; 3],
        params: &RegionGrowingParams,
    ) -> Result<Option<(Region, OrientedBoundingBox)>, GeometryError> {
        let Some(region) = self.grow_from(raw_query, params)? else {
            return Ok(None);
        };
        let obb = self.fit_region(&region)?;
        Ok(Some((region, obb)))
    }
}
