//! GeoJSON conversion for regions.
//!
//! Renderer adapters draw plain-coordinate GeoJSON; these helpers turn regions
//! into features (id, properties and bbox carried over) and back.

use crate::error::{HeatmapError, Result};
use crate::region::{GeometryKind, Region, Shape};
use geo::Coord;
use geojson::{Feature, FeatureCollection, Geometry, Value, feature};

fn ring_positions(ring: &[Coord<f64>]) -> Vec<Vec<f64>> {
    ring.iter().map(|c| vec![c.x, c.y]).collect()
}

fn polygon_positions(rings: Vec<&[Coord<f64>]>) -> Vec<Vec<Vec<f64>>> {
    rings.into_iter().map(ring_positions).collect()
}

/// Converts a region's geometry to a GeoJSON geometry.
pub fn region_geometry(region: &Region) -> Geometry {
    let mut polygons = region.shape().rings().map(polygon_positions);
    let value = match region.kind() {
        GeometryKind::Polygon => Value::Polygon(polygons.next().unwrap_or_default()),
        GeometryKind::MultiPolygon => Value::MultiPolygon(polygons.collect()),
    };
    Geometry::new(value)
}

/// Converts a region to a GeoJSON feature with its id, properties and bbox.
pub fn region_to_feature(region: &Region) -> Feature {
    Feature {
        bbox: Some(region.bbox().to_array().to_vec()),
        geometry: Some(region_geometry(region)),
        id: Some(feature::Id::String(region.id().to_string())),
        properties: Some(region.properties().clone()),
        foreign_members: None,
    }
}

pub fn regions_to_feature_collection<'a, I>(regions: I) -> FeatureCollection
where
    I: IntoIterator<Item = &'a Region>,
{
    FeatureCollection {
        bbox: None,
        features: regions.into_iter().map(region_to_feature).collect(),
        foreign_members: None,
    }
}

/// Serializes regions as a GeoJSON FeatureCollection string.
pub fn to_geojson_string<'a, I>(regions: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Region>,
{
    Ok(serde_json::to_string(&regions_to_feature_collection(regions))?)
}

fn coords_of(positions: &[Vec<f64>]) -> Result<Vec<Coord<f64>>> {
    positions
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(HeatmapError::geometry(
                "Coordinate must have at least 2 values",
            )),
        })
        .collect()
}

fn rings_of(rings: &[Vec<Vec<f64>>]) -> Result<Vec<Vec<Coord<f64>>>> {
    rings.iter().map(|ring| coords_of(ring)).collect()
}

/// Builds a region from a GeoJSON feature with a string id and a
/// `Polygon` or `MultiPolygon` geometry. The feature bbox, if any, is kept.
pub fn region_from_feature(feature: &Feature) -> Result<Region> {
    let id = match &feature.id {
        Some(feature::Id::String(id)) => Some(id.as_str()),
        _ => None,
    };
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| HeatmapError::geometry("Feature has no geometry"))?;

    let (kind, polygons) = match &geometry.value {
        Value::Polygon(rings) => (GeometryKind::Polygon, vec![rings_of(rings)?]),
        Value::MultiPolygon(polys) => (
            GeometryKind::MultiPolygon,
            polys
                .iter()
                .map(|rings| rings_of(rings))
                .collect::<Result<Vec<_>>>()?,
        ),
        _ => {
            return Err(HeatmapError::geometry(
                "Feature geometry must be a Polygon or MultiPolygon",
            ));
        }
    };

    let bbox = match feature.bbox.as_deref() {
        Some([min_x, min_y, max_x, max_y]) => Some([*min_x, *min_y, *max_x, *max_y].into()),
        _ => None,
    };

    let shape = Shape::new(kind, polygons, bbox)?;
    Region::new(
        crate::compute::validation::validate_id(id)?.as_str(),
        feature.properties.clone().unwrap_or_default(),
        shape,
    )
}
