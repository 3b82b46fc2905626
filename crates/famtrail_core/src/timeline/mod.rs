//! Timeline resolution engine.
//!
//! # Responsibility
//! - Resolve each person's current position for a selected year.
//! - Group co-located positions and project person/group filters.
//!
//! # Invariants
//! - Every function here is pure over immutable store data; render passes
//!   recompute everything instead of patching previous results.

pub mod filter;
pub mod grouping;
pub mod keywords;
pub mod lifecycle;
