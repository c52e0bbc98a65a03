use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::{BBox, Point};
use crate::layer::LayerId;

/// An entry in the R-tree hit-test index.
#[derive(Debug, Clone)]
pub struct SpatialEntry {
    pub layer_id: LayerId,
    /// Render position of the layer; higher draws on top.
    pub position: usize,
    pub bbox: BBox,
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min.x, self.bbox.min.y],
            [self.bbox.max.x, self.bbox.max.y],
        )
    }
}

/// Spatial index over layer bounds for pointer hit-testing.
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
}

impl SpatialIndex {
    pub fn build(entries: Vec<SpatialEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// All entries whose bounds contain `point`.
    pub fn query_point(&self, point: &Point) -> Vec<&SpatialEntry> {
        let query = AABB::from_point([point.x, point.y]);
        self.tree
            .locate_in_envelope_intersecting(&query)
            .filter(|entry| entry.bbox.contains_point(point))
            .collect()
    }

    /// The top-most entry under `point`.
    pub fn topmost_at(&self, point: &Point) -> Option<&SpatialEntry> {
        self.query_point(point)
            .into_iter()
            .max_by_key(|entry| entry.position)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
