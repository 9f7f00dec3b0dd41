//! Planar ring primitives: closure, point-in-ring and bounding boxes.
//!
//! ## Boundary rule
//!
//! `point_in_ring` casts a ray from the query point toward +x and flips parity
//! for every edge it crosses. An edge is crossed when the horizontal line
//! through the point meets it on the half-open interval `[min_y, max_y)` of the
//! edge, at an x strictly greater than the point's x. Hence:
//!
//! - horizontal edges never count,
//! - a vertex shared by two edges is counted once,
//! - points on a left or bottom boundary are inside,
//! - points on a right or top boundary are outside.
//!
//! The rule depends only on the input values, so repeated calls agree.

use geo::{Coord, Polygon};
pub use regionheat_types::bbox::BoundingBox2D;

/// Append the first coordinate when the ring is not already closed.
pub fn close_ring(mut ring: Vec<Coord<f64>>) -> Vec<Coord<f64>> {
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last())
        && first != *last
    {
        ring.push(first);
    }
    ring
}

pub fn is_closed(ring: &[Coord<f64>]) -> bool {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) => first == last,
        _ => true,
    }
}

/// Ray-casting parity test; the ring is treated as implicitly closed.
///
/// # Examples
///
/// ```
/// use regionheat::compute::spatial::point_in_ring;
/// use geo::coord;
///
/// let square = [
///     coord! { x: 0.0, y: 0.0 },
///     coord! { x: 0.0, y: 10.0 },
///     coord! { x: 10.0, y: 10.0 },
///     coord! { x: 10.0, y: 0.0 },
/// ];
/// assert!(point_in_ring(&coord! { x: 5.0, y: 5.0 }, &square));
/// assert!(point_in_ring(&coord! { x: 0.0, y: 5.0 }, &square));
/// assert!(!point_in_ring(&coord! { x: 10.0, y: 5.0 }, &square));
/// ```
pub fn point_in_ring(point: &Coord<f64>, ring: &[Coord<f64>]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if x_cross > point.x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Inside the exterior ring and outside every interior ring.
pub fn point_in_polygon(point: &Coord<f64>, polygon: &Polygon<f64>) -> bool {
    point_in_ring(point, &polygon.exterior().0)
        && !polygon
            .interiors()
            .iter()
            .any(|hole| point_in_ring(point, &hole.0))
}

/// Bounding box of a ring, `None` when the ring is empty.
pub fn bbox_of(ring: &[Coord<f64>]) -> Option<BoundingBox2D> {
    BoundingBox2D::from_coords(ring)
}

/// True when the boxes cannot overlap on either axis.
#[inline]
pub fn bbox_disjoint(a: &BoundingBox2D, b: &BoundingBox2D) -> bool {
    a.disjoint(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, coord};

    fn square(min: f64, max: f64) -> Vec<Coord<f64>> {
        vec![
            coord! { x: min, y: min },
            coord! { x: min, y: max },
            coord! { x: max, y: max },
            coord! { x: max, y: min },
            coord! { x: min, y: min },
        ]
    }

    #[test]
    fn test_close_ring() {
        let open = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 1.0, y: 0.0 },
            coord! { x: 1.0, y: 1.0 },
        ];
        let closed = close_ring(open);
        assert_eq!(closed.len(), 4);
        assert!(is_closed(&closed));

        let again = close_ring(closed.clone());
        assert_eq!(again, closed);
        assert!(close_ring(Vec::new()).is_empty());
    }

    #[test]
    fn test_interior_and_exterior_points() {
        let ring = square(0.0, 10.0);
        assert!(point_in_ring(&coord! { x: 5.0, y: 5.0 }, &ring));
        assert!(!point_in_ring(&coord! { x: 15.0, y: 15.0 }, &ring));
        assert!(!point_in_ring(&coord! { x: -0.1, y: 5.0 }, &ring));
    }

    #[test]
    fn test_boundary_tie_break() {
        let ring = square(0.0, 10.0);
        // Left and bottom edges belong to the ring
        assert!(point_in_ring(&coord! { x: 0.0, y: 5.0 }, &ring));
        assert!(point_in_ring(&coord! { x: 5.0, y: 0.0 }, &ring));
        assert!(point_in_ring(&coord! { x: 0.0, y: 0.0 }, &ring));
        // Right and top edges do not
        assert!(!point_in_ring(&coord! { x: 10.0, y: 5.0 }, &ring));
        assert!(!point_in_ring(&coord! { x: 5.0, y: 10.0 }, &ring));
        assert!(!point_in_ring(&coord! { x: 10.0, y: 10.0 }, &ring));

        for _ in 0..10 {
            assert!(!point_in_ring(&coord! { x: 10.0, y: 5.0 }, &ring));
        }
    }

    #[test]
    fn test_ray_through_vertex_counts_once() {
        // Diamond whose left and right vertices sit on y = 0
        let diamond = vec![
            coord! { x: 0.0, y: -5.0 },
            coord! { x: 5.0, y: 0.0 },
            coord! { x: 0.0, y: 5.0 },
            coord! { x: -5.0, y: 0.0 },
        ];
        assert!(point_in_ring(&coord! { x: 0.0, y: 0.0 }, &diamond));
        assert!(!point_in_ring(&coord! { x: -6.0, y: 0.0 }, &diamond));
        assert!(!point_in_ring(&coord! { x: 6.0, y: 0.0 }, &diamond));
    }

    #[test]
    fn test_open_and_closed_rings_agree() {
        let closed = square(0.0, 10.0);
        let open = &closed[..4];
        for p in [
            coord! { x: 5.0, y: 5.0 },
            coord! { x: 0.0, y: 5.0 },
            coord! { x: 10.0, y: 5.0 },
            coord! { x: 11.0, y: 1.0 },
        ] {
            assert_eq!(point_in_ring(&p, &closed), point_in_ring(&p, open));
        }
    }

    #[test]
    fn test_concave_ring() {
        // U shape opening upward
        let u = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 9.0, y: 0.0 },
            coord! { x: 9.0, y: 9.0 },
            coord! { x: 6.0, y: 9.0 },
            coord! { x: 6.0, y: 3.0 },
            coord! { x: 3.0, y: 3.0 },
            coord! { x: 3.0, y: 9.0 },
            coord! { x: 0.0, y: 9.0 },
        ];
        assert!(point_in_ring(&coord! { x: 1.5, y: 6.0 }, &u));
        assert!(point_in_ring(&coord! { x: 7.5, y: 6.0 }, &u));
        assert!(!point_in_ring(&coord! { x: 4.5, y: 6.0 }, &u));
        assert!(point_in_ring(&coord! { x: 4.5, y: 1.0 }, &u));
    }

    #[test]
    fn test_degenerate_ring() {
        let line = vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 }];
        assert!(!point_in_ring(&coord! { x: 0.5, y: 0.5 }, &line));
        assert!(!point_in_ring(&coord! { x: 0.5, y: 0.5 }, &[]));
    }

    #[test]
    fn test_point_in_polygon_with_hole() {
        let polygon = Polygon::new(
            LineString::from(square(0.0, 10.0)),
            vec![LineString::from(square(4.0, 6.0))],
        );
        assert!(!point_in_polygon(&coord! { x: 5.0, y: 5.0 }, &polygon));
        assert!(point_in_polygon(&coord! { x: 2.0, y: 2.0 }, &polygon));
        assert!(point_in_polygon(&coord! { x: 8.0, y: 5.0 }, &polygon));
    }

    #[test]
    fn test_bbox_helpers() {
        let bbox = bbox_of(&square(0.0, 10.0)).unwrap();
        assert_eq!(bbox.to_array(), [0.0, 0.0, 10.0, 10.0]);
        assert!(bbox_of(&[]).is_none());

        let far = BoundingBox2D::new(20.0, 20.0, 30.0, 30.0);
        assert!(bbox_disjoint(&bbox, &far));
        assert!(!bbox_disjoint(&bbox, &BoundingBox2D::new(10.0, 5.0, 12.0, 6.0)));
    }
}
