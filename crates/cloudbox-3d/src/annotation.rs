use crate::obb::OrientedBoundingBox;
use crate::segmentation::Region;

/// A confirmed cuboid annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct CuboidAnnotation {
    /// Identifier, unique within the owning [`CuboidAnnotations`].
    pub id: u64,
    /// Human readable label.
    pub label: String,
    /// The fitted box.
    pub obb: OrientedBoundingBox,
    /// Seed point of the region the box was fitted to.
    pub seed: usize,
    /// Number of points in that region.
    pub point_count: usize,
}

/// The confirmed cuboids of one session.
///
/// Identifiers increase monotonically and are never reused, even after removals.
#[derive(Debug, Clone, Default)]
pub struct CuboidAnnotations {
    annotations: Vec<CuboidAnnotation>,
    next_id: u64,
}

impl CuboidAnnotations {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a cuboid fitted to `region`, labelled "Cuboid N" with N = id + 1.
    /// Returns its id.
    pub fn confirm(&mut self, region: &Region, obb: OrientedBoundingBox) -> u64 {
        let label = format!("Cuboid {}", self.next_id + 1);
        self.confirm_with_label(region, obb, label)
    }

    /// Store a cuboid fitted to `region` with an explicit label. Returns its id.
    pub fn confirm_with_label(
        &mut self,
        region: &Region,
        obb: OrientedBoundingBox,
        label: impl Into<String>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.annotations.push(CuboidAnnotation {
            id,
            label: label.into(),
            obb,
            seed: region.seed,
            point_count: region.len(),
        });
        log::debug!("confirmed cuboid {} over {} points", id, region.len());
        id
    }

    /// Look up an annotation.
    pub fn get(&self, id: u64) -> Option<&CuboidAnnotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Remove an annotation, returning it if it existed.
    pub fn remove(&mut self, id: u64) -> Option<CuboidAnnotation> {
        let pos = self.annotations.iter().position(|a| a.id == id)?;
        Some(self.annotations.remove(pos))
    }

    /// Remove every annotation. Identifiers keep increasing.
    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    /// Iterate over the annotations in confirmation order.
    pub fn iter(&self) -> impl Iterator<Item = &CuboidAnnotation> {
        self.annotations.iter()
    }

    /// Number of annotations.
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Check if there are no annotations.
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}
