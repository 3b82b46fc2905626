//! Photo existence probing and fallback resolution.
//!
//! # Invariants
//! - A missing or unreachable photo is never an error; it resolves to the
//!   configured default photo.
//! - Probing runs before marker placement, inside the render pass.

use crate::config::MarkersConfig;
use crate::store::PhotoDirectory;
use log::debug;
use std::path::PathBuf;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Checks whether a photo reference points at an existing asset.
pub trait PhotoProbe {
    fn exists(&self, reference: &str) -> bool;
}

/// Accepts every reference without checking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeExists;

impl PhotoProbe for AssumeExists {
    fn exists(&self, _reference: &str) -> bool {
        true
    }
}

/// Checks relative references against a local directory.
///
/// Absolute paths are checked as-is; URLs are reported missing.
#[derive(Debug, Clone)]
pub struct FsPhotoProbe {
    base_dir: PathBuf,
}

impl FsPhotoProbe {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl PhotoProbe for FsPhotoProbe {
    fn exists(&self, reference: &str) -> bool {
        if is_url(reference) {
            return false;
        }
        self.base_dir.join(reference).is_file()
    }
}

/// Checks URL references with an HTTP HEAD request.
///
/// Other references are local: they are checked under the base directory
/// when one is set and accepted as-is otherwise.
pub struct HttpPhotoProbe {
    client: reqwest::blocking::Client,
    local: Option<FsPhotoProbe>,
}

impl HttpPhotoProbe {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            local: None,
        })
    }

    /// Builds a probe whose local references follow `photo_base_dir`.
    pub fn for_config(config: &MarkersConfig) -> Result<Self, reqwest::Error> {
        let probe = Self::new()?;
        Ok(match &config.photo_base_dir {
            Some(base_dir) => probe.with_base_dir(base_dir.clone()),
            None => probe,
        })
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.local = Some(FsPhotoProbe::new(base_dir));
        self
    }
}

impl PhotoProbe for HttpPhotoProbe {
    fn exists(&self, reference: &str) -> bool {
        if !is_url(reference) {
            return match &self.local {
                Some(local) => local.exists(reference),
                None => AssumeExists.exists(reference),
            };
        }
        match self.client.head(reference).send() {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(
                    "event=photo_probe module=service status=error error={}",
                    err
                );
                false
            }
        }
    }
}

/// Picks the probe matching marker configuration.
///
/// A configured `photo_base_dir` checks local files; otherwise every
/// reference is accepted as-is.
pub fn probe_for(config: &MarkersConfig) -> Box<dyn PhotoProbe> {
    match &config.photo_base_dir {
        Some(base_dir) => Box::new(FsPhotoProbe::new(base_dir.clone())),
        None => Box::new(AssumeExists),
    }
}

/// Resolves the photo for one person, falling back to `default_photo`.
pub fn resolve_photo(
    person: &str,
    photos: &PhotoDirectory,
    probe: &dyn PhotoProbe,
    default_photo: &str,
) -> String {
    match photos.get(person) {
        Some(reference) if probe.exists(reference) => reference.to_string(),
        Some(_) => {
            debug!(
                "event=photo_fallback module=service status=ok reason=missing_asset"
            );
            default_photo.to_string()
        }
        None => default_photo.to_string(),
    }
}

fn is_url(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::{
        probe_for, resolve_photo, AssumeExists, FsPhotoProbe, HttpPhotoProbe, PhotoProbe,
    };
    use crate::config::MarkersConfig;
    use crate::store::PhotoDirectory;

    struct NeverExists;

    impl PhotoProbe for NeverExists {
        fn exists(&self, _reference: &str) -> bool {
            false
        }
    }

    #[test]
    fn unknown_person_gets_default_photo() {
        let photos = PhotoDirectory::new();
        assert_eq!(
            resolve_photo("Sophie", &photos, &AssumeExists, "images/default.jpg"),
            "images/default.jpg"
        );
    }

    #[test]
    fn missing_asset_falls_back() {
        let mut photos = PhotoDirectory::new();
        photos.insert("Victor", "images/victor.jpg");
        assert_eq!(
            resolve_photo("Victor", &photos, &NeverExists, "images/default.jpg"),
            "images/default.jpg"
        );
        assert_eq!(
            resolve_photo("Victor", &photos, &AssumeExists, "images/default.jpg"),
            "images/victor.jpg"
        );
    }

    #[test]
    fn fs_probe_checks_relative_to_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("images")).unwrap();
        std::fs::write(dir.path().join("images/victor.jpg"), b"jpg").unwrap();

        let probe = FsPhotoProbe::new(dir.path());
        assert!(probe.exists("images/victor.jpg"));
        assert!(!probe.exists("images/marc.jpg"));
        assert!(!probe.exists("https://example.org/victor.jpg"));
    }

    #[test]
    fn probe_for_without_base_dir_accepts_everything() {
        let probe = probe_for(&MarkersConfig::default());
        assert!(probe.exists("images/anything.jpg"));

        let dir = tempfile::tempdir().unwrap();
        let config = MarkersConfig {
            photo_base_dir: Some(dir.path().to_path_buf()),
            ..MarkersConfig::default()
        };
        assert!(!probe_for(&config).exists("images/anything.jpg"));
    }

    #[test]
    fn url_checks_leave_local_references_alone() {
        let mut photos = PhotoDirectory::new();
        photos.insert("Victor", "images/victor.jpg");
        let probe = HttpPhotoProbe::new().unwrap();
        assert_eq!(
            resolve_photo("Victor", &photos, &probe, "images/default.jpg"),
            "images/victor.jpg"
        );
    }

    #[test]
    fn url_checks_send_local_references_to_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("images")).unwrap();
        std::fs::write(dir.path().join("images/victor.jpg"), b"jpg").unwrap();
        let config = MarkersConfig {
            photo_base_dir: Some(dir.path().to_path_buf()),
            ..MarkersConfig::default()
        };

        let probe = HttpPhotoProbe::for_config(&config).unwrap();
        assert!(probe.exists("images/victor.jpg"));
        assert!(!probe.exists("images/marc.jpg"));

        let mut photos = PhotoDirectory::new();
        photos.insert("Victor", "images/victor.jpg");
        photos.insert("Marc", "images/marc.jpg");
        assert_eq!(
            resolve_photo("Victor", &photos, &probe, "images/default.jpg"),
            "images/victor.jpg"
        );
        assert_eq!(
            resolve_photo("Marc", &photos, &probe, "images/default.jpg"),
            "images/default.jpg"
        );
    }
}
