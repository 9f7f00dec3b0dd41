use geo::Coord;
use serde::{Deserialize, Serialize};

/// A 2D axis-aligned bounding box.
///
/// Serialized as the four-element array `[minX, minY, maxX, maxY]` used by the
/// canonical region format. Boxes built from caller-supplied arrays are kept
/// exactly as given; nothing re-checks them against the geometry they cover.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox2D {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox2D {
    /// Create a new bounding box from minimum and maximum coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionheat_types::bbox::BoundingBox2D;
    ///
    /// let bbox = BoundingBox2D::new(0.0, 0.0, 10.0, 10.0);
    /// assert_eq!(bbox.to_array(), [0.0, 0.0, 10.0, 10.0]);
    /// ```
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box covering every coordinate, or `None` for an empty input.
    pub fn from_coords<'a, I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coord<f64>>,
    {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first.x, first.y, first.x, first.y);
        for c in iter {
            bbox.extend_coord(c);
        }
        Some(bbox)
    }

    /// Grow the box so it covers `coord`.
    pub fn extend_coord(&mut self, coord: &Coord<f64>) {
        self.min_x = self.min_x.min(coord.x);
        self.min_y = self.min_y.min(coord.y);
        self.max_x = self.max_x.max(coord.x);
        self.max_y = self.max_y.max(coord.y);
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(&self, other: &BoundingBox2D) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Check if a coordinate lies inside the box, edges included.
    pub fn contains_coord(&self, coord: &Coord<f64>) -> bool {
        coord.x >= self.min_x
            && coord.x <= self.max_x
            && coord.y >= self.min_y
            && coord.y <= self.max_y
    }

    /// True when the two boxes cannot overlap on at least one axis.
    ///
    /// Boxes that only touch along an edge or a corner are not disjoint.
    pub fn disjoint(&self, other: &BoundingBox2D) -> bool {
        self.max_x < other.min_x
            || self.min_x > other.max_x
            || self.max_y < other.min_y
            || self.min_y > other.max_y
    }

    /// Whether `min <= max` on both axes and every bound is finite.
    pub fn is_valid(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

impl From<[f64; 4]> for BoundingBox2D {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox2D> for [f64; 4] {
    fn from(bbox: BoundingBox2D) -> Self {
        bbox.to_array()
    }
}
