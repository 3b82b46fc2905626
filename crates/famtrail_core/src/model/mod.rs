//! Domain model for location history and map projections.
//!
//! # Responsibility
//! - Define canonical data structures used by loading, resolution and
//!   rendering.
//! - Keep one entry shape for CSV and GeoJSON sources.
//!
//! # Invariants
//! - Source entries are immutable after load; render passes only derive.
//! - Resolution order is explicit (`year`, then `input_index`), never
//!   container enumeration order.

pub mod entry;
pub mod group;
pub mod marker;
