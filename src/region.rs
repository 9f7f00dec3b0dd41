//! Region model: immutable geometry plus a mutable accumulator state.
//!
//! A region's geometry is one polygon or a multipolygon, each polygon being an
//! outer ring plus optional holes. Geometry is built once, validated, closed,
//! and then shared behind an `Arc` so engine clones never copy it.

use crate::compute::spatial::{self, BoundingBox2D};
use crate::compute::validation::{validate_bbox, validate_id, validate_ring};
use crate::error::{HeatmapError, Result};
use geo::{Coord, LineString, Polygon};
use regionheat_types::state::State;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Opaque passthrough properties of a region.
pub type Properties = serde_json::Map<String, Value>;

/// Property key written by the adjacency pass.
pub const NEIGHBOURS_KEY: &str = "neighbours";

/// Supported geometry types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Polygon,
    MultiPolygon,
}

impl GeometryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPolygon => "MultiPolygon",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeometryKind {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Polygon" => Ok(GeometryKind::Polygon),
            "MultiPolygon" => Ok(GeometryKind::MultiPolygon),
            other => Err(HeatmapError::geometry(format!(
                "Unsupported geometry type: {:?}",
                other
            ))),
        }
    }
}

/// Validated, closed region geometry with cached bounding boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    kind: GeometryKind,
    polygons: Vec<Polygon<f64>>,
    polygon_bboxes: Vec<BoundingBox2D>,
    bbox: BoundingBox2D,
}

impl Shape {
    /// Build a shape from raw rings.
    ///
    /// `polygons` holds, per polygon, the outer ring followed by its holes. A
    /// `Polygon` shape takes exactly one polygon. Rings are closed by appending
    /// their first point when needed. A supplied `bbox` is kept as given once
    /// it passes [`validate_bbox`].
    ///
    /// # Examples
    ///
    /// ```
    /// use regionheat::region::{GeometryKind, Shape};
    /// use geo::coord;
    ///
    /// let square = vec![
    ///     coord! { x: 0.0, y: 0.0 },
    ///     coord! { x: 0.0, y: 10.0 },
    ///     coord! { x: 10.0, y: 10.0 },
    ///     coord! { x: 10.0, y: 0.0 },
    /// ];
    /// let shape = Shape::new(GeometryKind::Polygon, vec![vec![square]], None)?;
    /// assert!(shape.contains(&coord! { x: 5.0, y: 5.0 }));
    /// assert_eq!(shape.bbox().to_array(), [0.0, 0.0, 10.0, 10.0]);
    /// # Ok::<(), regionheat::HeatmapError>(())
    /// ```
    pub fn new(
        kind: GeometryKind,
        polygons: Vec<Vec<Vec<Coord<f64>>>>,
        bbox: Option<BoundingBox2D>,
    ) -> Result<Self> {
        if polygons.is_empty() {
            return Err(HeatmapError::geometry(format!("{} has no polygons", kind)));
        }
        if kind == GeometryKind::Polygon && polygons.len() != 1 {
            return Err(HeatmapError::geometry(format!(
                "Polygon must have exactly one outer ring, got {} polygons",
                polygons.len()
            )));
        }
        if let Some(bbox) = &bbox {
            validate_bbox(bbox)?;
        }

        let mut built = Vec::with_capacity(polygons.len());
        let mut polygon_bboxes = Vec::with_capacity(polygons.len());

        for (poly_idx, rings) in polygons.into_iter().enumerate() {
            let mut rings = rings
                .into_iter()
                .enumerate()
                .map(|(ring_idx, ring)| -> Result<Vec<Coord<f64>>> {
                    validate_ring(&ring, &format!("polygon {} ring {}", poly_idx, ring_idx))?;
                    Ok(spatial::close_ring(ring))
                });

            let exterior: Vec<Coord<f64>> = rings.next().ok_or_else(|| {
                HeatmapError::geometry(format!("polygon {} has no outer ring", poly_idx))
            })??;
            let holes = rings.collect::<Result<Vec<_>>>()?;

            let mut poly_bbox = spatial::bbox_of(&exterior).ok_or_else(|| {
                HeatmapError::geometry(format!("polygon {} outer ring is empty", poly_idx))
            })?;
            for hole in &holes {
                for coord in hole {
                    poly_bbox.extend_coord(coord);
                }
            }

            built.push(Polygon::new(
                LineString::from(exterior),
                holes.into_iter().map(LineString::from).collect(),
            ));
            polygon_bboxes.push(poly_bbox);
        }

        let computed = polygon_bboxes
            .iter()
            .skip(1)
            .fold(polygon_bboxes[0], |acc, b| acc.union(b));

        Ok(Self {
            kind,
            polygons: built,
            polygon_bboxes,
            bbox: bbox.unwrap_or(computed),
        })
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn polygons(&self) -> &[Polygon<f64>] {
        &self.polygons
    }

    pub fn bbox(&self) -> &BoundingBox2D {
        &self.bbox
    }

    /// Bbox pruning first, then the exact per-polygon test with hole exclusion.
    pub fn contains(&self, point: &Coord<f64>) -> bool {
        if !self.bbox.contains_coord(point) {
            return false;
        }
        self.polygons
            .iter()
            .zip(&self.polygon_bboxes)
            .any(|(polygon, bbox)| {
                bbox.contains_coord(point) && spatial::point_in_polygon(point, polygon)
            })
    }

    /// Every vertex of every ring, closing points included.
    pub fn vertices(&self) -> impl Iterator<Item = &Coord<f64>> + '_ {
        self.polygons.iter().flat_map(|polygon| {
            polygon
                .exterior()
                .0
                .iter()
                .chain(polygon.interiors().iter().flat_map(|ring| ring.0.iter()))
        })
    }

    /// Rings per polygon as coordinate slices, outer ring first.
    pub fn rings(&self) -> impl Iterator<Item = Vec<&[Coord<f64>]>> + '_ {
        self.polygons.iter().map(|polygon| {
            std::iter::once(polygon.exterior().0.as_slice())
                .chain(polygon.interiors().iter().map(|ring| ring.0.as_slice()))
                .collect()
        })
    }
}

/// A binning target: id, passthrough properties, shared geometry and state.
#[derive(Debug, Clone)]
pub struct Region {
    id: String,
    properties: Properties,
    shape: Arc<Shape>,
    state: State,
}

impl Region {
    /// Create a region; fails with `InvalidGeometry` when `id` is empty.
    pub fn new(id: &str, properties: Properties, shape: Shape) -> Result<Self> {
        Ok(Self {
            id: validate_id(Some(id))?,
            properties,
            shape: Arc::new(shape),
            state: State::new(),
        })
    }

    /// Replace the initial state, e.g. one carried by a serialized dataset.
    pub fn with_state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn kind(&self) -> GeometryKind {
        self.shape.kind()
    }

    pub fn bbox(&self) -> &BoundingBox2D {
        self.shape.bbox()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Whether the point lies in this region. Never mutates anything.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionheat::region::{GeometryKind, Region, Shape};
    /// use geo::coord;
    ///
    /// let square = vec![
    ///     coord! { x: 0.0, y: 0.0 },
    ///     coord! { x: 0.0, y: 10.0 },
    ///     coord! { x: 10.0, y: 10.0 },
    ///     coord! { x: 10.0, y: 0.0 },
    ///     coord! { x: 0.0, y: 0.0 },
    /// ];
    /// let shape = Shape::new(GeometryKind::Polygon, vec![vec![square]], None)?;
    /// let region = Region::new("A", Default::default(), shape)?;
    ///
    /// assert!(region.contains((5.0, 5.0)));
    /// assert!(!region.contains((15.0, 15.0)));
    /// assert!(!region.contains((10.0, 5.0)));
    /// # Ok::<(), regionheat::HeatmapError>(())
    /// ```
    pub fn contains(&self, point: impl Into<Coord<f64>>) -> bool {
        self.shape.contains(&point.into())
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Coord<f64>> + '_ {
        self.shape.vertices()
    }

    /// Neighbour ids written by the adjacency pass, if it has run.
    pub fn neighbours(&self) -> Option<Vec<&str>> {
        self.properties
            .get(NEIGHBOURS_KEY)?
            .as_array()?
            .iter()
            .map(Value::as_str)
            .collect()
    }

    pub(crate) fn set_neighbours(&mut self, ids: Vec<String>) {
        self.properties.insert(
            NEIGHBOURS_KEY.to_string(),
            Value::Array(ids.into_iter().map(Value::String).collect()),
        );
    }

    pub(crate) fn into_parts(self) -> (String, Properties, Arc<Shape>, State) {
        (self.id, self.properties, self.shape, self.state)
    }

    pub(crate) fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub(crate) fn set_state(&mut self, state: State) {
        self.state = state;
    }

    pub(crate) fn from_parts(
        id: String,
        properties: Properties,
        shape: Arc<Shape>,
        state: State,
    ) -> Self {
        Self {
            id,
            properties,
            shape,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn square(min: f64, max: f64) -> Vec<Coord<f64>> {
        vec![
            coord! { x: min, y: min },
            coord! { x: min, y: max },
            coord! { x: max, y: max },
            coord! { x: max, y: min },
            coord! { x: min, y: min },
        ]
    }

    fn region(id: &str, polygons: Vec<Vec<Vec<Coord<f64>>>>) -> Region {
        let kind = if polygons.len() == 1 {
            GeometryKind::Polygon
        } else {
            GeometryKind::MultiPolygon
        };
        Region::new(id, Properties::new(), Shape::new(kind, polygons, None).unwrap()).unwrap()
    }

    #[test]
    fn test_geometry_kind_parsing() {
        assert_eq!("Polygon".parse::<GeometryKind>().unwrap(), GeometryKind::Polygon);
        assert_eq!(
            "MultiPolygon".parse::<GeometryKind>().unwrap(),
            GeometryKind::MultiPolygon
        );
        assert!(matches!(
            "LineString".parse::<GeometryKind>(),
            Err(HeatmapError::InvalidGeometry(_))
        ));
        assert_eq!(GeometryKind::MultiPolygon.to_string(), "MultiPolygon");
    }

    #[test]
    fn test_square_containment() {
        let r = region("A", vec![vec![square(0.0, 10.0)]]);
        assert!(r.contains((5.0, 5.0)));
        assert!(!r.contains((15.0, 15.0)));
        for _ in 0..5 {
            assert!(!r.contains((10.0, 5.0)));
            assert!(r.contains((0.0, 5.0)));
        }
    }

    #[test]
    fn test_hole_exclusion() {
        let r = region("A", vec![vec![square(0.0, 10.0), square(4.0, 6.0)]]);
        assert!(!r.contains((5.0, 5.0)));
        assert!(r.contains((2.0, 2.0)));
        assert!(r.contains((7.0, 5.0)));
    }

    #[test]
    fn test_multipolygon_containment() {
        let r = region(
            "M",
            vec![vec![square(0.0, 1.0)], vec![square(5.0, 6.0)]],
        );
        assert_eq!(r.kind(), GeometryKind::MultiPolygon);
        assert_eq!(r.bbox().to_array(), [0.0, 0.0, 6.0, 6.0]);
        assert!(r.contains((0.5, 0.5)));
        assert!(r.contains((5.5, 5.5)));
        // Inside the region bbox but in neither polygon
        assert!(!r.contains((3.0, 3.0)));
    }

    #[test]
    fn test_rings_are_closed() {
        let open = square(0.0, 10.0)[..4].to_vec();
        let shape = Shape::new(GeometryKind::Polygon, vec![vec![open]], None).unwrap();
        let ring = &shape.polygons()[0].exterior().0;
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        assert_eq!(shape.vertices().count(), 5);
    }

    #[test]
    fn test_supplied_bbox_is_trusted() {
        let bbox = BoundingBox2D::new(-1.0, -1.0, 20.0, 20.0);
        let shape =
            Shape::new(GeometryKind::Polygon, vec![vec![square(0.0, 10.0)]], Some(bbox)).unwrap();
        assert_eq!(shape.bbox(), &bbox);

        let inverted = BoundingBox2D::new(10.0, 10.0, 0.0, 0.0);
        assert!(Shape::new(GeometryKind::Polygon, vec![vec![square(0.0, 10.0)]], Some(inverted))
            .is_err());
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(Shape::new(GeometryKind::MultiPolygon, vec![], None).is_err());
        assert!(Shape::new(GeometryKind::Polygon, vec![vec![]], None).is_err());
        assert!(
            Shape::new(
                GeometryKind::Polygon,
                vec![vec![square(0.0, 1.0)], vec![square(2.0, 3.0)]],
                None
            )
            .is_err()
        );
        let sliver = vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 }];
        assert!(Shape::new(GeometryKind::Polygon, vec![vec![sliver]], None).is_err());
    }

    #[test]
    fn test_empty_id_rejected() {
        let shape = Shape::new(GeometryKind::Polygon, vec![vec![square(0.0, 1.0)]], None).unwrap();
        assert!(matches!(
            Region::new("", Properties::new(), shape),
            Err(HeatmapError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_neighbours_property() {
        let mut r = region("A", vec![vec![square(0.0, 1.0)]]);
        assert!(r.neighbours().is_none());
        r.set_neighbours(vec!["B".to_string(), "C".to_string()]);
        assert_eq!(r.neighbours().unwrap(), vec!["B", "C"]);
    }
}
