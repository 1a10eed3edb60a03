use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::Point3;

/// Fixed-radius neighbor queries over a subset of a static point set.
///
/// Queries return the original indices of the indexed points.
#[derive(Debug)]
pub struct NeighborIndex {
    tree: Option<ImmutableKdTree<f64, 3>>,
    indices: Vec<usize>,
}

impl NeighborIndex {
    /// Indexes `points[i]` for every `i` in `indices`; out-of-range indices are ignored.
    pub fn new(points: &[Point3<f64>], indices: impl IntoIterator<Item = usize>) -> Self {
        let indices: Vec<usize> = indices.into_iter().filter(|&i| i < points.len()).collect();
        let entries: Vec<[f64; 3]> = indices
            .iter()
            .map(|&i| [points[i].x, points[i].y, points[i].z])
            .collect();
        let tree = (!entries.is_empty()).then(|| ImmutableKdTree::new_from_slice(&entries));
        Self { tree, indices }
    }

    /// Indices of the indexed points within `radius` of `center`, in no particular order.
    pub fn within(&self, center: &Point3<f64>, radius: f64) -> Vec<usize> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        tree.within_unsorted::<SquaredEuclidean>(&[center.x, center.y, center.z], radius * radius)
            .into_iter()
            .map(|neighbour| self.indices[neighbour.item as usize])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
