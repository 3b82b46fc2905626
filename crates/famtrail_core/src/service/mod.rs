//! Viewer use-case services.
//!
//! # Responsibility
//! - Sequence render passes over the timeline engine.
//! - Keep UI/FFI layers decoupled from loading and resolution details.
//!
//! # Invariants
//! - Render state is owned by `ViewerSession`, never by module globals.

pub mod coordinator;
pub mod photo_probe;
pub mod render_service;
