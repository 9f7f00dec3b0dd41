//! Bounding-box R*-tree used to prune binning candidates.
//!
//! Every region contributes one rectangle (its cached bbox) tagged with the
//! region's position in the store. A point query returns the positions whose
//! rectangle covers the point, edges included, so the exact containment test
//! only runs on those regions.

use geo::Coord;
use regionheat_types::bbox::BoundingBox2D;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};
use smallvec::SmallVec;

type Entry = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Store positions of regions whose bbox may contain a point.
pub type Candidates = SmallVec<[usize; 8]>;

#[derive(Debug, Clone)]
pub struct RegionIndex {
    tree: RTree<Entry>,
}

impl RegionIndex {
    /// Bulk-load an index from bboxes listed in store order.
    pub fn new<'a, I>(bboxes: I) -> Self
    where
        I: IntoIterator<Item = &'a BoundingBox2D>,
    {
        let entries: Vec<Entry> = bboxes
            .into_iter()
            .enumerate()
            .map(|(pos, bbox)| {
                GeomWithData::new(
                    Rectangle::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]),
                    pos,
                )
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Positions of every bbox covering `point`, ascending.
    pub fn candidates(&self, point: &Coord<f64>) -> Candidates {
        let envelope = AABB::from_point([point.x, point.y]);
        let mut found: Candidates = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .collect();
        found.sort_unstable();
        found
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
