//! Core domain logic for the famtrail family-history map viewer.
//! This crate is the single source of truth for timeline resolution rules.

pub mod config;
pub mod logging;
pub mod model;
pub mod service;
pub mod source;
pub mod store;
pub mod timeline;

pub use config::{ConfigError, ViewerConfig};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogSettings, LoggingError,
};
pub use model::entry::{LocationEntry, PersonId, PersonTimeline, ResolvedPosition};
pub use model::group::{Group, LocationGroup};
pub use model::marker::{GeoBounds, Marker, MarkerIcon, MARKER_ICON};
pub use service::photo_probe::{AssumeExists, FsPhotoProbe, HttpPhotoProbe, PhotoProbe};
pub use service::render_service::{
    MarkerHandle, MarkerLayer, MemoryLayer, RenderOptions, RenderOutcome, RenderPlan,
    ServiceError, ServiceResult, ViewerSession,
};
pub use source::{SourceError, TextSource};
pub use store::{GroupDirectory, LoadError, PhotoDirectory, RecordStore};
pub use timeline::filter::{project, Selection};
pub use timeline::grouping::{group_positions, GroupingError, DEFAULT_TOLERANCE};
pub use timeline::keywords::{classify, FinalKind, Lifecycle, LifecycleKeywords};
pub use timeline::lifecycle::{resolve, LifecycleResolver};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
