//! Text source fetching for location, photo and group data.
//!
//! # Responsibility
//! - Read delimited/GeoJSON text from a local file or a published URL.
//! - Report fetch failures as typed errors with source context.
//!
//! # Invariants
//! - Only plain HTTP GET is used for remote sources; there is no write path.
//! - A failed fetch never leaves partially loaded state behind.

use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub type SourceResult<T> = Result<T, SourceError>;

/// Fetch failure for one text source.
#[derive(Debug)]
pub enum SourceError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Http {
        url: String,
        source: reqwest::Error,
    },
    HttpStatus {
        url: String,
        status: u16,
    },
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read `{}`: {source}", path.display()),
            Self::Http { url, source } => write!(f, "failed to fetch `{url}`: {source}"),
            Self::HttpStatus { url, status } => {
                write!(f, "failed to fetch `{url}`: HTTP status {status}")
            }
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Http { source, .. } => Some(source),
            Self::HttpStatus { .. } => None,
        }
    }
}

/// Location of one text resource.
///
/// Serialized as a plain string: values starting with `http://` or
/// `https://` are URLs, anything else is a file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TextSource {
    File(PathBuf),
    Url(String),
}

impl TextSource {
    /// Parses a user-provided location string.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::File(PathBuf::from(trimmed))
        }
    }

    /// Returns the lowercase extension of the path or URL path, if any.
    pub fn extension(&self) -> Option<String> {
        let path = match self {
            Self::File(path) => path.clone(),
            Self::Url(url) => {
                let without_query = url.split(['?', '#']).next().unwrap_or(url);
                PathBuf::from(without_query)
            }
        };
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Url(_) => "http",
        }
    }

    /// Reads the whole resource as UTF-8 text.
    ///
    /// # Side effects
    /// - Emits `source_fetch` logging events with duration and status.
    pub fn fetch(&self) -> SourceResult<String> {
        let started_at = Instant::now();
        let result = match self {
            Self::File(path) => read_file(path),
            Self::Url(url) => fetch_url(url),
        };

        match &result {
            Ok(text) => info!(
                "event=source_fetch module=source status=ok mode={} bytes={} duration_ms={}",
                self.mode(),
                text.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=source_fetch module=source status=error mode={} duration_ms={} error={}",
                self.mode(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

impl From<String> for TextSource {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<TextSource> for String {
    fn from(value: TextSource) -> Self {
        value.to_string()
    }
}

impl Display for TextSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

fn read_file(path: &Path) -> SourceResult<String> {
    std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn fetch_url(url: &str) -> SourceResult<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|source| SourceError::Http {
            url: url.to_string(),
            source,
        })?;
    let response = client.get(url).send().map_err(|source| SourceError::Http {
        url: url.to_string(),
        source,
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    response.text().map_err(|source| SourceError::Http {
        url: url.to_string(),
        source,
    })
}
