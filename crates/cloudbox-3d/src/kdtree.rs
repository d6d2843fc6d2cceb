use std::collections::BinaryHeap;

use crate::error::GeometryError;
use crate::ops::squared_distance;

/// Default maximum number of points stored in a leaf.
pub const DEFAULT_LEAF_CAPACITY: usize = 32;

/// A point returned by a neighborhood query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the point in the indexed point set.
    pub index: usize,
    /// Squared Euclidean distance to the query.
    pub distance_sq: f32,
}

// Ordered by distance so that a `BinaryHeap` keeps the farthest candidate on top.
impl Eq for Neighbor {}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance_sq
            .total_cmp(&other.distance_sq)
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        indices: Vec<usize>,
    },
    Branch {
        axis: usize,
        split: f32,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn build(points: &[[f32; 3]], indices: &mut [usize], depth: usize, capacity: usize) -> Node {
        if indices.len() <= capacity {
            return Node::Leaf {
                indices: indices.to_vec(),
            };
        }

        // choose split axis
        let axis = depth % 3;

        // partition around the median along the split axis; ties may land on either side
        let mid = indices.len() / 2;
        indices.select_nth_unstable_by(mid, |&a, &b| points[a][axis].total_cmp(&points[b][axis]));
        let split = points[indices[mid]][axis];

        let (left, right) = indices.split_at_mut(mid);
        Node::Branch {
            axis,
            split,
            left: Box::new(Node::build(points, left, depth + 1, capacity)),
            right: Box::new(Node::build(points, right, depth + 1, capacity)),
        }
    }

    /// Returns the child containing the query first, then its sibling, and the
    /// signed distance from the query to the split plane.
    #[inline]
    fn order<'a>(
        axis: usize,
        split: f32,
        left: &'a Node,
        right: &'a Node,
        query: &[f32; 3],
    ) -> (&'a Node, &'a Node, f32) {
        let diff = query[axis] - split;
        if diff < 0.0 {
            (left, right, diff)
        } else {
            (right, left, diff)
        }
    }

    fn nearest_search(&self, points: &[[f32; 3]], query: &[f32; 3], best: &mut Option<Neighbor>) {
        match self {
            Node::Leaf { indices } => {
                for &index in indices {
                    let distance_sq = squared_distance(&points[index], query);
                    if best.map_or(true, |b| distance_sq < b.distance_sq) {
                        *best = Some(Neighbor { index, distance_sq });
                    }
                }
            }
            Node::Branch {
                axis,
                split,
                left,
                right,
            } => {
                let (near, far, diff) = Node::order(*axis, *split, left, right, query);
                near.nearest_search(points, query, best);
                if diff * diff < best.map_or(f32::INFINITY, |b| b.distance_sq) {
                    far.nearest_search(points, query, best);
                }
            }
        }
    }

    fn radius_search(
        &self,
        points: &[[f32; 3]],
        query: &[f32; 3],
        radius_sq: f32,
        out: &mut Vec<Neighbor>,
    ) {
        match self {
            Node::Leaf { indices } => {
                for &index in indices {
                    let distance_sq = squared_distance(&points[index], query);
                    if distance_sq <= radius_sq {
                        out.push(Neighbor { index, distance_sq });
                    }
                }
            }
            Node::Branch {
                axis,
                split,
                left,
                right,
            } => {
                let (near, far, diff) = Node::order(*axis, *split, left, right, query);
                near.radius_search(points, query, radius_sq, out);
                if diff * diff <= radius_sq {
                    far.radius_search(points, query, radius_sq, out);
                }
            }
        }
    }

    fn knn_search(
        &self,
        points: &[[f32; 3]],
        query: &[f32; 3],
        k: usize,
        heap: &mut BinaryHeap<Neighbor>,
    ) {
        match self {
            Node::Leaf { indices } => {
                for &index in indices {
                    let candidate = Neighbor {
                        index,
                        distance_sq: squared_distance(&points[index], query),
                    };
                    if heap.len() < k {
                        heap.push(candidate);
                    } else if let Some(mut top) = heap.peek_mut() {
                        if candidate.distance_sq < top.distance_sq {
                            *top = candidate;
                        }
                    }
                }
            }
            Node::Branch {
                axis,
                split,
                left,
                right,
            } => {
                let (near, far, diff) = Node::order(*axis, *split, left, right, query);
                near.knn_search(points, query, k, heap);

                // until the heap is full every subtree may hold a candidate
                let bound = if heap.len() < k {
                    f32::INFINITY
                } else {
                    heap.peek().map_or(f32::INFINITY, |top| top.distance_sq)
                };
                if diff * diff < bound {
                    far.knn_search(points, query, k, heap);
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn num_leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Branch { left, right, .. } => left.num_leaves() + right.num_leaves(),
        }
    }
}

/// A static 3D kd-tree over a point set.
///
/// Internal nodes split at the median coordinate of their partition, cycling the
/// split axis x, y, z with depth. Leaves hold at most `leaf_capacity` point indices
/// and every index appears in exactly one leaf. The tree keeps its own copy of the
/// points and is never mutated after [`KdTree::build`], so it can be shared across
/// threads for concurrent queries.
///
/// Example:
///
/// ```
/// use cloudbox_3d::kdtree::KdTree;
///
/// let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
/// let tree = KdTree::new(&points);
/// assert_eq!(tree.nearest(&[0.9, 0.1, 0.0]), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct KdTree {
    points: Vec<[f32; 3]>,
    root: Node,
    leaf_capacity: usize,
}

impl KdTree {
    /// Build a tree with [`DEFAULT_LEAF_CAPACITY`].
    pub fn new(points: &[[f32; 3]]) -> Self {
        Self::build_with_capacity(points, DEFAULT_LEAF_CAPACITY)
    }

    /// Build a tree over `points`.
    ///
    /// # Arguments
    ///
    /// * `points` - The point set. It is copied into the tree.
    /// * `leaf_capacity` - Maximum number of points per leaf.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidParameter`] if `leaf_capacity` is zero.
    pub fn build(points: &[[f32; 3]], leaf_capacity: usize) -> Result<Self, GeometryError> {
        if leaf_capacity == 0 {
            return Err(GeometryError::invalid("leaf_capacity", "must be at least 1"));
        }

        let tree = Self::build_with_capacity(points, leaf_capacity);
        log::debug!(
            "built kd-tree over {} points: {} leaves, depth {}",
            tree.len(),
            tree.num_leaves(),
            tree.depth()
        );
        Ok(tree)
    }

    fn build_with_capacity(points: &[[f32; 3]], leaf_capacity: usize) -> Self {
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let root = Node::build(points, &mut indices, 0, leaf_capacity);
        Self {
            points: points.to_vec(),
            root,
            leaf_capacity,
        }
    }

    /// Number of indexed points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the tree indexes no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The indexed points. Query results are indices into this slice.
    pub fn points(&self) -> &[[f32; 3]] {
        &self.points
    }

    /// Maximum number of points stored in a leaf.
    pub fn leaf_capacity(&self) -> usize {
        self.leaf_capacity
    }

    /// Number of levels, counting the leaves.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Number of leaves.
    pub fn num_leaves(&self) -> usize {
        self.root.num_leaves()
    }

    /// Find the point closest to `query`.
    ///
    /// Returns `None` if the tree is empty. Among equidistant points the first one
    /// reached by the traversal wins.
    pub fn nearest(&self, query: &[f32; 3]) -> Option<usize> {
        let mut best = None;
        self.root.nearest_search(&self.points, query, &mut best);
        best.map(|n| n.index)
    }

    /// Find all points within `radius` of `query`, boundary included.
    ///
    /// The result is in traversal order, not sorted by distance.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidParameter`] if `radius` is negative or not finite.
    pub fn radius(&self, query: &[f32; 3], radius: f32) -> Result<Vec<usize>, GeometryError> {
        Ok(self
            .radius_with_distances(query, radius)?
            .into_iter()
            .map(|n| n.index)
            .collect())
    }

    /// Same as [`KdTree::radius`], also returning the squared distances.
    pub fn radius_with_distances(
        &self,
        query: &[f32; 3],
        radius: f32,
    ) -> Result<Vec<Neighbor>, GeometryError> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(GeometryError::invalid(
                "radius",
                format!("must be finite and non-negative, got {radius}"),
            ));
        }
        let mut out = Vec::new();
        self.root
            .radius_search(&self.points, query, radius * radius, &mut out);
        Ok(out)
    }

    /// Find the `k` points closest to `query`, in ascending distance order.
    ///
    /// Fewer than `k` indices are returned when the tree holds fewer points.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidParameter`] if `k` is zero.
    pub fn knn(&self, query: &[f32; 3], k: usize) -> Result<Vec<usize>, GeometryError> {
        Ok(self
            .knn_with_distances(query, k)?
            .into_iter()
            .map(|n| n.index)
            .collect())
    }

    /// Same as [`KdTree::knn`], also returning the squared distances.
    pub fn knn_with_distances(
        &self,
        query: &[f32; 3],
        k: usize,
    ) -> Result<Vec<Neighbor>, GeometryError> {
        if k == 0 {
            return Err(GeometryError::invalid("k", "must be at least 1"));
        }
        let mut heap = BinaryHeap::with_capacity(k.min(self.len()));
        self.root.knn_search(&self.points, query, k, &mut heap);
        Ok(heap.into_sorted_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square_with_duplicate() -> Vec<[f32; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0],
        ]
    }

    fn collect_leaf_indices(node: &Node, out: &mut Vec<usize>) {
        match node {
            Node::Leaf { indices } => out.extend(indices),
            Node::Branch { left, right, .. } => {
                collect_leaf_indices(left, out);
                collect_leaf_indices(right, out);
            }
        }
    }

    #[test]
    fn test_empty_tree() -> Result<(), GeometryError> {
        let tree = KdTree::new(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.nearest(&[0.0, 0.0, 0.0]), None);
        assert!(tree.radius(&[0.0, 0.0, 0.0], 10.0)?.is_empty());
        assert!(tree.knn(&[0.0, 0.0, 0.0], 3)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_invalid_parameters() {
        let tree = KdTree::new(&unit_square_with_duplicate());
        assert!(matches!(
            KdTree::build(&[], 0),
            Err(GeometryError::InvalidParameter { name: "leaf_capacity", .. })
        ));
        assert!(matches!(
            tree.radius(&[0.0, 0.0, 0.0], -1.0),
            Err(GeometryError::InvalidParameter { name: "radius", .. })
        ));
        assert!(tree.radius(&[0.0, 0.0, 0.0], f32::NAN).is_err());
        assert!(matches!(
            tree.knn(&[0.0, 0.0, 0.0], 0),
            Err(GeometryError::InvalidParameter { name: "k", .. })
        ));
    }

    #[test]
    fn test_unit_square() -> Result<(), GeometryError> {
        let tree = KdTree::build(&unit_square_with_duplicate(), 1)?;

        let nearest = tree.nearest(&[0.01, 0.01, 0.0]);
        assert!(matches!(nearest, Some(0) | Some(4)));

        let mut within = tree.radius(&[0.5, 0.5, 0.0], 1.5)?;
        within.sort_unstable();
        assert_eq!(within, vec![0, 1, 2, 3, 4]);

        let knn = tree.knn(&[0.9, 0.9, 0.0], 2)?;
        assert_eq!(knn[0], 2);
        assert!(matches!(knn[1], 1 | 3));
        Ok(())
    }

    #[test]
    fn test_every_index_in_one_leaf() -> Result<(), GeometryError> {
        let points: Vec<[f32; 3]> = (0..1000)
            .map(|i| {
                let t = i as f32;
                [(t * 0.37).sin(), (t * 0.11).cos(), (t * 0.05) % 1.0]
            })
            .collect();
        let tree = KdTree::build(&points, 8)?;

        let mut seen = Vec::new();
        collect_leaf_indices(&tree.root, &mut seen);
        seen.sort_unstable();
        assert_eq!(seen, (0..1000).collect::<Vec<_>>());
        assert!(tree.num_leaves() >= 1000 / 8);
        assert!(tree.depth() > 1);
        Ok(())
    }

    #[test]
    fn test_leaf_capacity_respected() -> Result<(), GeometryError> {
        fn max_leaf(node: &Node) -> usize {
            match node {
                Node::Leaf { indices } => indices.len(),
                Node::Branch { left, right, .. } => max_leaf(left).max(max_leaf(right)),
            }
        }
        // identical points force splits that cannot separate coordinates
        let points = vec![[1.0, 1.0, 1.0]; 100];
        let tree = KdTree::build(&points, 4)?;
        assert!(max_leaf(&tree.root) <= 4);
        assert_eq!(tree.knn(&[1.0, 1.0, 1.0], 10)?.len(), 10);
        assert_eq!(tree.radius(&[1.0, 1.0, 1.0], 0.0)?.len(), 100);
        Ok(())
    }

    #[test]
    fn test_knn_more_than_len() -> Result<(), GeometryError> {
        let tree = KdTree::new(&unit_square_with_duplicate());
        let knn = tree.knn_with_distances(&[0.0, 0.0, 0.0], 10)?;
        assert_eq!(knn.len(), 5);
        assert!(knn.windows(2).all(|w| w[0].distance_sq <= w[1].distance_sq));
        Ok(())
    }

    #[test]
    fn test_knn_huge_k() -> Result<(), GeometryError> {
        let tree = KdTree::new(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]]);
        assert_eq!(tree.knn(&[0.0, 0.0, 0.0], usize::MAX)?, vec![0, 1, 2]);
        assert_eq!(tree.knn(&[0.0, 0.0, 0.0], usize::MAX / 2)?.len(), 3);
        Ok(())
    }
}
