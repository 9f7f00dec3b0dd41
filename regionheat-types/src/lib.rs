//! # regionheat-types
//!
//! Core data types shared by the regionheat binning engine.
//!
//! - **Bounding boxes**: `BoundingBox2D`, serialized as `[minX, minY, maxX, maxY]`
//! - **Accumulator state**: `Accumulator`, `State`
//! - **Stat reports**: `StatReport`
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use regionheat_types::bbox::BoundingBox2D;
//! use regionheat_types::state::{Accumulator, State};
//! use geo::coord;
//!
//! let bbox = BoundingBox2D::new(103.6, 1.2, 104.1, 1.5);
//! assert!(bbox.contains_coord(&coord! { x: 103.8, y: 1.35 }));
//!
//! let mut state = State::new();
//! state.insert("_count", Accumulator::Count(0));
//! assert_eq!(state.count("_count"), Some(0));
//! ```

pub mod bbox;
pub mod state;
pub mod stats;
