//! Geometry kit and batch algorithms.
//!
//! Everything here is a pure function or an immutable structure:
//! - Polyline codec and decode rounding
//! - Ring closure, point-in-ring and bounding-box helpers
//! - The fixed SVY21 projection
//! - Region bbox index and neighbour resolution
//!
//! Nothing in this layer touches accumulator state.

pub mod adjacency;
#[cfg(feature = "geojson")]
pub mod geojson;
pub mod index;
pub mod polyline;
pub mod projection;
pub mod spatial;
pub mod validation;
