//! Encoded-polyline codec.
//!
//! Coordinates are scaled by `10^precision`, rounded to integers and written as
//! zig-zag deltas in 5-bit chunks offset by 63, which keeps the output in
//! printable ASCII. Each point writes its `x` value before its `y` value.
//!
//! Decoding rounds every value to `10^-(precision - 2)`, so at the default
//! precision of 7 callers see 5 decimal places. Any sequence already rounded to
//! that resolution survives `decode(encode(seq))` exactly.

use crate::error::{HeatmapError, Result};
use geo::Coord;

/// Precision of the canonical region format.
pub const DEFAULT_PRECISION: u32 = 7;

pub const MIN_PRECISION: u32 = 2;
pub const MAX_PRECISION: u32 = 10;

/// Largest scaled magnitude that still maps to an exact integer.
const MAX_SCALED: f64 = 9_007_199_254_740_992.0;

fn scale_factor(precision: u32) -> Result<f64> {
    if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
        return Err(HeatmapError::precondition(format!(
            "Polyline precision must be within [{}, {}], got: {}",
            MIN_PRECISION, MAX_PRECISION, precision
        )));
    }
    Ok(10f64.powi(precision as i32))
}

/// Round `value` to the decimal resolution callers see after decoding.
///
/// # Examples
///
/// ```
/// use regionheat::compute::polyline::round_to_precision;
///
/// assert_eq!(round_to_precision(1.234_567_8, 7), 1.23457);
/// ```
pub fn round_to_precision(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32 - 2);
    (value * factor).round() / factor
}

/// Encode a coordinate sequence as a polyline string.
///
/// # Examples
///
/// ```
/// use regionheat::compute::polyline::encode;
/// use geo::coord;
///
/// let line = [
///     coord! { x: 38.5, y: -120.2 },
///     coord! { x: 40.7, y: -120.95 },
///     coord! { x: 43.252, y: -126.453 },
/// ];
/// assert_eq!(encode(&line, 5)?, "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
/// # Ok::<(), regionheat::HeatmapError>(())
/// ```
pub fn encode(coords: &[Coord<f64>], precision: u32) -> Result<String> {
    let factor = scale_factor(precision)?;
    let mut out = String::with_capacity(coords.len() * 8);
    let (mut prev_x, mut prev_y) = (0i64, 0i64);

    for (idx, coord) in coords.iter().enumerate() {
        let x = scale(coord.x, factor).ok_or_else(|| out_of_range(idx, coord))?;
        let y = scale(coord.y, factor).ok_or_else(|| out_of_range(idx, coord))?;
        encode_value(x - prev_x, &mut out);
        encode_value(y - prev_y, &mut out);
        prev_x = x;
        prev_y = y;
    }

    Ok(out)
}

/// Decode a polyline string into coordinates rounded to `10^-(precision - 2)`.
pub fn decode(encoded: &str, precision: u32) -> Result<Vec<Coord<f64>>> {
    let factor = scale_factor(precision)?;
    let bytes = encoded.as_bytes();
    let mut coords = Vec::with_capacity(bytes.len() / 4);
    let mut offset = 0;
    let (mut x, mut y) = (0i64, 0i64);

    while offset < bytes.len() {
        let dx = decode_value(bytes, &mut offset)?;
        if offset >= bytes.len() {
            return Err(HeatmapError::geometry(format!(
                "Polyline ends after an x value at offset {}",
                offset
            )));
        }
        let dy = decode_value(bytes, &mut offset)?;

        x = x.checked_add(dx).ok_or_else(overflow)?;
        y = y.checked_add(dy).ok_or_else(overflow)?;

        coords.push(geo::coord! {
            x: round_to_precision(x as f64 / factor, precision),
            y: round_to_precision(y as f64 / factor, precision),
        });
    }

    Ok(coords)
}

fn scale(value: f64, factor: f64) -> Option<i64> {
    let scaled = (value * factor).round();
    (scaled.is_finite() && scaled.abs() <= MAX_SCALED).then_some(scaled as i64)
}

fn out_of_range(idx: usize, coord: &Coord<f64>) -> HeatmapError {
    HeatmapError::geometry(format!(
        "Point at index {} cannot be polyline-encoded: ({}, {})",
        idx, coord.x, coord.y
    ))
}

fn overflow() -> HeatmapError {
    HeatmapError::geometry("Polyline value overflows")
}

fn encode_value(delta: i64, out: &mut String) {
    let mut v = if delta < 0 {
        !(delta << 1) as u64
    } else {
        (delta << 1) as u64
    };
    while v >= 0x20 {
        out.push((((v & 0x1f) | 0x20) as u8 + 63) as char);
        v >>= 5;
    }
    out.push((v as u8 + 63) as char);
}

fn decode_value(bytes: &[u8], offset: &mut usize) -> Result<i64> {
    let mut result: u64 = 0;
    let mut shift = 0u32;

    loop {
        let Some(&byte) = bytes.get(*offset) else {
            return Err(HeatmapError::geometry("Polyline is truncated"));
        };
        if !(63..=126).contains(&byte) {
            return Err(HeatmapError::geometry(format!(
                "Invalid polyline character {:?} at offset {}",
                byte as char, *offset
            )));
        }
        if shift >= 64 {
            return Err(overflow());
        }
        *offset += 1;

        let chunk = u64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    let value = if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    };
    Ok(value as i64)
}
