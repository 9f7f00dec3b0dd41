//! Canonical region format.
//!
//! A dataset is a JSON array of region descriptors:
//!
//! ```json
//! [{
//!   "id": "BEDOK",
//!   "properties": {"name": "Bedok"},
//!   "geometry": {
//!     "type": "Polygon",
//!     "bbox": [103.9, 1.31, 103.95, 1.34],
//!     "coordinates": ["<polyline outer ring>", "<polyline hole>"]
//!   },
//!   "state": {"_count": {"kind": "count", "value": 3}}
//! }]
//! ```
//!
//! `coordinates` nests one level deeper for `MultiPolygon`. On input, a ring
//! may be a polyline string or a raw `[[x, y], ...]` array. On output rings are
//! always polyline strings and `state` is written only when requested.

use crate::compute::polyline;
use crate::compute::spatial::BoundingBox2D;
use crate::compute::validation::validate_id;
use crate::error::{HeatmapError, Result};
use crate::region::{GeometryKind, Properties, Region, Shape};
use geo::Coord;
use regionheat_types::state::State;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;

/// Serialized form of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    pub geometry: GeometryDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox2D>,
    pub coordinates: Value,
}

/// One ring as it may appear in `coordinates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RingData {
    Encoded(String),
    Points(Vec<[f64; 2]>),
}

impl RingData {
    fn into_coords(self, precision: u32) -> Result<Vec<Coord<f64>>> {
        match self {
            RingData::Encoded(encoded) => polyline::decode(&encoded, precision),
            RingData::Points(points) => Ok(points.into_iter().map(Coord::from).collect()),
        }
    }
}

fn parse_rings(value: Value, kind: GeometryKind) -> Result<Vec<Vec<RingData>>> {
    let nested = match kind {
        GeometryKind::Polygon => serde_json::from_value::<Vec<RingData>>(value).map(|p| vec![p]),
        GeometryKind::MultiPolygon => serde_json::from_value::<Vec<Vec<RingData>>>(value),
    };
    nested.map_err(|e| {
        HeatmapError::geometry(format!("{} coordinates are malformed: {}", kind, e))
    })
}

fn with_region_context(id: &str, err: HeatmapError) -> HeatmapError {
    match err {
        HeatmapError::InvalidGeometry(msg) => {
            HeatmapError::InvalidGeometry(format!("region {:?}: {}", id, msg))
        }
        other => other,
    }
}

/// Build a region from its descriptor.
///
/// Fails with `InvalidGeometry` when the id is missing or empty, the geometry
/// type is unsupported, the coordinates do not nest to match the type, or a
/// ring is malformed.
pub fn decode_region(descriptor: RegionDescriptor, precision: u32) -> Result<Region> {
    let id = validate_id(descriptor.id.as_deref())?;
    let RegionDescriptor {
        properties,
        geometry,
        state,
        ..
    } = descriptor;

    let build = || -> Result<Region> {
        let kind: GeometryKind = geometry.kind.parse()?;
        let polygons = parse_rings(geometry.coordinates, kind)?
            .into_iter()
            .map(|rings| {
                rings
                    .into_iter()
                    .map(|ring| ring.into_coords(precision))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let shape = Shape::new(kind, polygons, geometry.bbox)?;
        Ok(Region::new(&id, properties, shape)?.with_state(state.unwrap_or_default()))
    };

    build().map_err(|e| with_region_context(&id, e))
}

/// Encode a region with polyline rings. `state` is included only on request.
pub fn encode_region(
    region: &Region,
    include_state: bool,
    precision: u32,
) -> Result<RegionDescriptor> {
    let polygons = region
        .shape()
        .rings()
        .map(|rings| {
            rings
                .into_iter()
                .map(|ring| polyline::encode(ring, precision).map(Value::String))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        })
        .collect::<Result<Vec<_>>>()?;

    let coordinates = match region.kind() {
        GeometryKind::Polygon => polygons.into_iter().next().unwrap_or(Value::Array(Vec::new())),
        GeometryKind::MultiPolygon => Value::Array(polygons),
    };

    Ok(RegionDescriptor {
        id: Some(region.id().to_string()),
        properties: region.properties().clone(),
        geometry: GeometryDescriptor {
            kind: region.kind().as_str().to_string(),
            bbox: Some(*region.bbox()),
            coordinates,
        },
        state: include_state.then(|| region.state().clone()),
    })
}

pub fn encode_dataset<'a, I>(
    regions: I,
    include_state: bool,
    precision: u32,
) -> Result<Vec<RegionDescriptor>>
where
    I: IntoIterator<Item = &'a Region>,
{
    regions
        .into_iter()
        .map(|region| encode_region(region, include_state, precision))
        .collect()
}

/// Decode every descriptor, failing on the first bad region or duplicate id.
pub fn decode_dataset(descriptors: Vec<RegionDescriptor>, precision: u32) -> Result<Vec<Region>> {
    let mut seen = FxHashSet::default();
    let mut regions = Vec::with_capacity(descriptors.len());

    for descriptor in descriptors {
        let region = decode_region(descriptor, precision)?;
        if !seen.insert(region.id().to_string()) {
            return Err(HeatmapError::precondition(format!(
                "Duplicate region id: {:?}",
                region.id()
            )));
        }
        regions.push(region);
    }

    log::debug!("Decoded {} regions", regions.len());
    Ok(regions)
}

pub fn to_json<'a, I>(regions: I, include_state: bool, precision: u32) -> Result<String>
where
    I: IntoIterator<Item = &'a Region>,
{
    let descriptors = encode_dataset(regions, include_state, precision)?;
    Ok(serde_json::to_string(&descriptors)?)
}

pub fn from_json(json: &str, precision: u32) -> Result<Vec<Region>> {
    let descriptors: Vec<RegionDescriptor> = serde_json::from_str(json)?;
    decode_dataset(descriptors, precision)
}

pub fn from_reader<R: Read>(reader: R, precision: u32) -> Result<Vec<Region>> {
    let descriptors: Vec<RegionDescriptor> = serde_json::from_reader(reader)?;
    decode_dataset(descriptors, precision)
}
