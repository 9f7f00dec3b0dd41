//! Validation for region ids, rings and bounding boxes.

use crate::error::{HeatmapError, Result};
use geo::Coord;
use regionheat_types::bbox::BoundingBox2D;
use smallvec::SmallVec;

/// Validates a region id is present and non-empty.
///
/// # Examples
///
/// ```
/// use regionheat::compute::validation::validate_id;
///
/// assert_eq!(validate_id(Some("R1")).unwrap(), "R1");
/// assert!(validate_id(Some("")).is_err());
/// assert!(validate_id(None).is_err());
/// ```
pub fn validate_id(id: Option<&str>) -> Result<String> {
    match id {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        Some(_) => Err(HeatmapError::geometry("Region id must not be empty")),
        None => Err(HeatmapError::geometry("Region id is missing")),
    }
}

/// Validates a single coordinate is finite.
pub fn validate_coord(coord: &Coord<f64>) -> Result<()> {
    if !coord.x.is_finite() {
        return Err(HeatmapError::geometry(format!(
            "x must be finite, got: {}",
            coord.x
        )));
    }

    if !coord.y.is_finite() {
        return Err(HeatmapError::geometry(format!(
            "y must be finite, got: {}",
            coord.y
        )));
    }

    Ok(())
}

/// Validates a ring has finite coordinates and at least three distinct
/// positions. Closure is not required here; callers close rings afterwards.
///
/// `context` is prefixed to error messages, e.g. `"polygon 0 ring 1"`.
///
/// # Examples
///
/// ```
/// use regionheat::compute::validation::validate_ring;
/// use geo::coord;
///
/// let triangle = [
///     coord! { x: 0.0, y: 0.0 },
///     coord! { x: 1.0, y: 0.0 },
///     coord! { x: 0.0, y: 1.0 },
/// ];
/// assert!(validate_ring(&triangle, "ring").is_ok());
///
/// // A closed two-point ring has only two distinct positions
/// let sliver = [
///     coord! { x: 0.0, y: 0.0 },
///     coord! { x: 1.0, y: 1.0 },
///     coord! { x: 0.0, y: 0.0 },
/// ];
/// assert!(validate_ring(&sliver, "ring").is_err());
/// ```
pub fn validate_ring(ring: &[Coord<f64>], context: &str) -> Result<()> {
    let mut distinct: SmallVec<[Coord<f64>; 3]> = SmallVec::new();

    for (idx, coord) in ring.iter().enumerate() {
        validate_coord(coord).map_err(|e| {
            HeatmapError::geometry(format!("{} point at index {}: {}", context, idx, e))
        })?;
        if distinct.len() < 3 && !distinct.contains(coord) {
            distinct.push(*coord);
        }
    }

    if distinct.len() < 3 {
        return Err(HeatmapError::geometry(format!(
            "{} needs at least 3 distinct positions, got {}",
            context,
            distinct.len()
        )));
    }

    Ok(())
}

/// Validates a supplied bounding box. The box is otherwise trusted.
pub fn validate_bbox(bbox: &BoundingBox2D) -> Result<()> {
    let values = bbox.to_array();
    if values.iter().any(|v| !v.is_finite()) {
        return Err(HeatmapError::geometry(format!(
            "Bounding box values must be finite, got: {:?}",
            values
        )));
    }

    if !bbox.is_valid() {
        return Err(HeatmapError::geometry(format!(
            "Bounding box has min > max: {:?}",
            values
        )));
    }

    Ok(())
}
