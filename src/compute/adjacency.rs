//! Shared-vertex neighbour resolution across a finished region set.
//!
//! Region `j` is a neighbour of region `i` when their bounding boxes are not
//! disjoint and at least one vertex of `j` is coordinate-equal to a vertex of
//! `i`. Equality is exact on the decoded values (`-0.0` and `0.0` match); no
//! tolerance is applied, so boundaries digitized with mismatched vertices do
//! not link. The relation is symmetric.

use crate::compute::spatial::bbox_disjoint;
use crate::region::Region;
use geo::Coord;
use rustc_hash::FxHashSet;

type VertexKey = (u64, u64);

fn vertex_key(coord: &Coord<f64>) -> VertexKey {
    // Adding +0.0 folds -0.0 into 0.0
    ((coord.x + 0.0).to_bits(), (coord.y + 0.0).to_bits())
}

fn vertex_set(region: &Region) -> FxHashSet<VertexKey> {
    region.vertices().map(vertex_key).collect()
}

fn shares_vertex(a: &FxHashSet<VertexKey>, b: &FxHashSet<VertexKey>) -> bool {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().any(|key| large.contains(key))
}

fn neighbours_of(i: usize, regions: &[Region], vertices: &[FxHashSet<VertexKey>]) -> Vec<String> {
    let bbox = regions[i].bbox();
    regions
        .iter()
        .enumerate()
        .filter(|&(j, other)| {
            j != i && !bbox_disjoint(bbox, other.bbox()) && shares_vertex(&vertices[i], &vertices[j])
        })
        .map(|(_, other)| other.id().to_string())
        .collect()
}

/// Neighbour ids of every region, in store order.
pub fn neighbour_lists(regions: &[Region]) -> Vec<Vec<String>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        let vertices: Vec<_> = regions.par_iter().map(vertex_set).collect();
        (0..regions.len())
            .into_par_iter()
            .map(|i| neighbours_of(i, regions, &vertices))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        let vertices: Vec<_> = regions.iter().map(vertex_set).collect();
        (0..regions.len())
            .map(|i| neighbours_of(i, regions, &vertices))
            .collect()
    }
}

/// Write `properties.neighbours` on every region, an empty list when a region
/// has none. Returns the number of directed neighbour links written.
pub fn resolve_neighbours(regions: &mut [Region]) -> usize {
    let lists = neighbour_lists(regions);
    let links = lists.iter().map(Vec::len).sum();

    for (region, ids) in regions.iter_mut().zip(lists) {
        region.set_neighbours(ids);
    }

    log::debug!(
        "Resolved neighbours for {} regions ({} links)",
        regions.len(),
        links
    );
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{GeometryKind, Properties, Shape};
    use geo::coord;

    fn rect(id: &str, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Region {
        let ring = vec![
            coord! { x: min_x, y: min_y },
            coord! { x: min_x, y: max_y },
            coord! { x: max_x, y: max_y },
            coord! { x: max_x, y: min_y },
        ];
        let shape = Shape::new(GeometryKind::Polygon, vec![vec![ring]], None).unwrap();
        Region::new(id, Properties::new(), shape).unwrap()
    }

    #[test]
    fn test_shared_edge_links_both_ways() {
        let mut regions = vec![
            rect("A", 0.0, 0.0, 1.0, 1.0),
            rect("B", 1.0, 0.0, 2.0, 1.0),
            rect("C", 5.0, 5.0, 6.0, 6.0),
        ];
        let links = resolve_neighbours(&mut regions);
        assert_eq!(links, 2);
        assert_eq!(regions[0].neighbours().unwrap(), vec!["B"]);
        assert_eq!(regions[1].neighbours().unwrap(), vec!["A"]);
        assert!(regions[2].neighbours().unwrap().is_empty());
    }

    #[test]
    fn test_corner_touch_counts() {
        let regions = vec![
            rect("A", 0.0, 0.0, 1.0, 1.0),
            rect("B", 1.0, 1.0, 2.0, 2.0),
        ];
        let lists = neighbour_lists(&regions);
        assert_eq!(lists[0], vec!["B"]);
        assert_eq!(lists[1], vec!["A"]);
    }

    #[test]
    fn test_overlap_without_shared_vertex() {
        // Overlapping boxes but no coordinate-equal vertex
        let regions = vec![
            rect("A", 0.0, 0.0, 2.0, 2.0),
            rect("B", 1.0, 1.0, 3.0, 3.0),
        ];
        let lists = neighbour_lists(&regions);
        assert!(lists[0].is_empty());
        assert!(lists[1].is_empty());
    }

    #[test]
    fn test_near_miss_is_not_a_neighbour() {
        let regions = vec![
            rect("A", 0.0, 0.0, 1.0, 1.0),
            rect("B", 1.00001, 0.0, 2.0, 1.0),
        ];
        assert!(neighbour_lists(&regions)[0].is_empty());
    }

    #[test]
    fn test_negative_zero_matches_zero() {
        let regions = vec![
            rect("A", -1.0, -1.0, 0.0, 0.0),
            rect("B", -0.0, -0.0, 1.0, 1.0),
        ];
        let lists = neighbour_lists(&regions);
        assert_eq!(lists[0], vec!["B"]);
        assert_eq!(lists[1], vec!["A"]);
    }

    #[test]
    fn test_symmetry_on_grid() {
        let mut regions = Vec::new();
        for row in 0..4 {
            for col in 0..4 {
                let (x, y) = (col as f64, row as f64);
                regions.push(rect(&format!("{}-{}", row, col), x, y, x + 1.0, y + 1.0));
            }
        }
        let lists = neighbour_lists(&regions);
        for (i, list) in lists.iter().enumerate() {
            for id in list {
                let j = regions.iter().position(|r| r.id() == id).unwrap();
                assert!(lists[j].iter().any(|n| n == regions[i].id()));
            }
        }
        // Interior cell touches its 8 surrounding cells
        assert_eq!(lists[5].len(), 8);
        // Corner cell touches 3
        assert_eq!(lists[0].len(), 3);
    }
}
