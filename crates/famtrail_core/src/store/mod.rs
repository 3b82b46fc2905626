//! Loading of location, photo and group sources into in-memory stores.
//!
//! # Responsibility
//! - Parse fetched text (delimited or GeoJSON) into header-driven rows.
//! - Build the immutable `RecordStore`, `PhotoDirectory` and `GroupDirectory`.
//!
//! # Invariants
//! - Malformed rows are dropped silently; only unreadable sources are errors.
//! - Stores are never mutated after load.

use crate::source::{SourceError, TextSource};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod directory;
pub mod geo;
pub mod record_store;
pub mod rows;

pub use directory::{GroupDirectory, PhotoDirectory};
pub use record_store::RecordStore;

pub type LoadResult<T> = Result<T, LoadError>;

/// Source-level load failure.
#[derive(Debug)]
pub enum LoadError {
    Source(SourceError),
    Csv(csv::Error),
    GeoJson(String),
    /// No header cell maps to a known column.
    MissingColumns(Vec<String>),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(err) => write!(f, "{err}"),
            Self::Csv(err) => write!(f, "invalid delimited text: {err}"),
            Self::GeoJson(message) => write!(f, "invalid GeoJSON: {message}"),
            Self::MissingColumns(headers) => write!(
                f,
                "no recognized columns in header [{}]",
                headers.join(", ")
            ),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::GeoJson(_) => None,
            Self::MissingColumns(_) => None,
        }
    }
}

impl From<SourceError> for LoadError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

/// Parses location text, choosing GeoJSON or delimited by extension/content.
pub fn parse_locations(text: &str, extension: Option<&str>) -> LoadResult<RecordStore> {
    let is_geojson = matches!(extension, Some("geojson" | "json"))
        || text.trim_start().starts_with('{');
    let raw_rows = if is_geojson {
        geo::rows_from_geojson(text)?
    } else {
        rows::parse_delimited(text)?
    };
    Ok(RecordStore::load(&raw_rows))
}

/// Fetches and loads the location source.
pub fn load_locations(source: &TextSource) -> LoadResult<RecordStore> {
    let text = source.fetch()?;
    let extension = source.extension();
    parse_locations(&text, extension.as_deref())
}

/// Fetches and loads the person → photo source.
pub fn load_photos(source: &TextSource) -> LoadResult<PhotoDirectory> {
    let text = source.fetch()?;
    let rows = rows::parse_delimited(&text)?;
    Ok(PhotoDirectory::from_rows(&rows))
}

/// Fetches and loads the group → members source.
pub fn load_groups(source: &TextSource) -> LoadResult<GroupDirectory> {
    let text = source.fetch()?;
    let rows = rows::parse_delimited(&text)?;
    Ok(GroupDirectory::from_rows(&rows))
}
