//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level viewer functions to Dart via FRB.
//! - Own the single viewer session of the embedding app.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every render call runs a full pass and returns the complete marker set.

use famtrail_core::service::photo_probe::probe_for;
use famtrail_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Marker, MarkerIcon, MemoryLayer, RenderOutcome, TextSource, ViewerConfig, ViewerSession,
};
use famtrail_core::config::MarkersConfig;
use log::{info, warn};
use std::sync::{Mutex, MutexGuard};

static VIEWER: Mutex<Option<ViewerSlot>> = Mutex::new(None);

struct ViewerSlot {
    session: ViewerSession,
    layer: MemoryLayer,
    markers: MarkersConfig,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerActionResponse {
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ViewerActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Year range offered by the year selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerYearBounds {
    pub min_year: i32,
    pub max_year: i32,
    /// Currently selected year.
    pub year: i32,
}

/// One marker ready for the Dart map widget.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerMarker {
    pub person: String,
    pub lat: f64,
    pub lon: f64,
    pub year: i32,
    pub photo: String,
    pub popup_html: String,
    pub group_size: u32,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Photo icon geometry in logical pixels, shared by every marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerIcon {
    pub width: u32,
    pub height: u32,
    /// Point placed on the coordinates, from the icon's top-left corner.
    pub anchor_x: i32,
    pub anchor_y: i32,
    /// Popup tip, relative to the anchor.
    pub popup_anchor_x: i32,
    pub popup_anchor_y: i32,
}

impl From<MarkerIcon> for ViewerIcon {
    fn from(icon: MarkerIcon) -> Self {
        Self {
            width: icon.size.0,
            height: icon.size.1,
            anchor_x: icon.anchor.0,
            anchor_y: icon.anchor.1,
            popup_anchor_x: icon.popup_anchor.0,
            popup_anchor_y: icon.popup_anchor.1,
        }
    }
}

/// Render response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerRenderResponse {
    pub ok: bool,
    /// `true` when a newer render started first; `markers` is then empty
    /// and the previous markers stay valid.
    pub superseded: bool,
    pub year: i32,
    pub icon: ViewerIcon,
    pub markers: Vec<ViewerMarker>,
    pub message: String,
}

impl ViewerRenderResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            superseded: false,
            year: 0,
            icon: MarkerIcon::default().into(),
            markers: Vec::new(),
            message: message.into(),
        }
    }
}

/// Loads a viewer session from a TOML config file.
///
/// # FFI contract
/// - Sync call; reads (and may download) every configured source.
/// - Replaces the previous session only on success.
#[flutter_rust_bridge::frb(sync)]
pub fn viewer_load_config(config_path: String) -> ViewerActionResponse {
    match ViewerConfig::load(config_path.trim()) {
        Ok(config) => install_session(&config),
        Err(err) => ViewerActionResponse::failure(format!("viewer_load_config failed: {err}")),
    }
}

/// Loads a viewer session from explicit source locations.
///
/// Input semantics:
/// - Each location is a file path or an `http(s)://` URL.
/// - Empty optional locations are treated as absent.
#[flutter_rust_bridge::frb(sync)]
pub fn viewer_load_sources(
    locations: String,
    photos: Option<String>,
    groups: Option<String>,
) -> ViewerActionResponse {
    let mut config = ViewerConfig::default();
    config.sources.locations = TextSource::parse(&locations);
    config.sources.photos = non_empty_source(photos);
    config.sources.groups = non_empty_source(groups);
    if let Err(err) = config.validate() {
        return ViewerActionResponse::failure(format!("viewer_load_sources failed: {err}"));
    }
    install_session(&config)
}

/// Replaces the location data of the loaded viewer.
///
/// # FFI contract
/// - Sync call; reads (and may download) `locations`.
/// - On failure the previous data, selection and year stay in place.
/// - On success persons new to the data are selected and the year is
///   clamped into the new range.
#[flutter_rust_bridge::frb(sync)]
pub fn viewer_reload_locations(locations: String) -> ViewerActionResponse {
    let mut guard = lock_viewer();
    let Some(slot) = guard.as_mut() else {
        return ViewerActionResponse::failure("viewer_reload_locations failed: no viewer loaded");
    };
    let source = TextSource::parse(&locations);
    match slot.session.reload_locations(&source) {
        Ok(added) => ViewerActionResponse::success(format!(
            "Reloaded {} entries; {} new person(s).",
            slot.session.store().len(),
            added.len()
        )),
        Err(err) => {
            warn!("event=viewer_reload module=ffi status=error error={}", err);
            ViewerActionResponse::failure(format!("viewer_reload_locations failed: {err}"))
        }
    }
}

/// Returns the year range and current year, or `None` when nothing is loaded.
#[flutter_rust_bridge::frb(sync)]
pub fn viewer_year_bounds() -> Option<ViewerYearBounds> {
    let guard = lock_viewer();
    let slot = guard.as_ref()?;
    let (min_year, max_year) = slot.session.year_bounds()?;
    Some(ViewerYearBounds {
        min_year,
        max_year,
        year: slot.session.year(),
    })
}

/// Sets the selected year; takes effect on the next render.
#[flutter_rust_bridge::frb(sync)]
pub fn viewer_set_year(year: i32) -> ViewerActionResponse {
    with_session(|session| {
        session.set_year(year);
        format!("Year set to {year}.")
    })
}

/// Names offered by the filter control, groups first.
#[flutter_rust_bridge::frb(sync)]
pub fn viewer_selectable_names() -> Vec<String> {
    lock_viewer()
        .as_ref()
        .map(|slot| slot.session.selectable_names())
        .unwrap_or_default()
}

/// Currently selected person/group names.
#[flutter_rust_bridge::frb(sync)]
pub fn viewer_selected_names() -> Vec<String> {
    lock_viewer()
        .as_ref()
        .map(|slot| slot.session.selection().names().iter().cloned().collect())
        .unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn viewer_select(name: String) -> ViewerActionResponse {
    with_session(|session| {
        if session.selection_mut().select(name.as_str()) {
            "Selected.".to_string()
        } else {
            "Already selected.".to_string()
        }
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn viewer_deselect(name: String) -> ViewerActionResponse {
    with_session(|session| {
        if session.selection_mut().deselect(name.trim()) {
            "Deselected.".to_string()
        } else {
            "Not selected.".to_string()
        }
    })
}

/// Selects every person of the loaded data.
#[flutter_rust_bridge::frb(sync)]
pub fn viewer_select_all() -> ViewerActionResponse {
    with_session(|session| {
        let persons = session.store().persons().to_vec();
        session.selection_mut().select_all(persons);
        "All persons selected.".to_string()
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn viewer_clear_selection() -> ViewerActionResponse {
    with_session(|session| {
        session.selection_mut().clear();
        "Selection cleared.".to_string()
    })
}

/// Runs one render pass for the current year and selection.
///
/// # FFI contract
/// - Sync call; may probe photo references on disk or over HTTP.
/// - Never panics.
/// - Returns the complete marker set that replaces the previous one.
#[flutter_rust_bridge::frb(sync)]
pub fn viewer_render() -> ViewerRenderResponse {
    let mut guard = lock_viewer();
    let Some(slot) = guard.as_mut() else {
        return ViewerRenderResponse::failure("viewer_render failed: no viewer loaded");
    };

    let probe = probe_for(&slot.markers);
    match slot.session.render(&mut slot.layer, probe.as_ref()) {
        Ok(RenderOutcome::Rendered(plan)) => {
            let markers = plan.markers.iter().map(to_viewer_marker).collect::<Vec<_>>();
            let message = if markers.is_empty() {
                "No markers.".to_string()
            } else {
                format!("Rendered {} marker(s).", markers.len())
            };
            ViewerRenderResponse {
                ok: true,
                superseded: false,
                year: plan.year,
                icon: plan.icon.into(),
                markers,
                message,
            }
        }
        Ok(RenderOutcome::Superseded { generation }) => ViewerRenderResponse {
            ok: true,
            superseded: true,
            year: slot.session.year(),
            icon: MarkerIcon::default().into(),
            markers: Vec::new(),
            message: format!("Render {generation} superseded."),
        },
        Err(err) => ViewerRenderResponse::failure(format!("viewer_render failed: {err}")),
    }
}

fn install_session(config: &ViewerConfig) -> ViewerActionResponse {
    match ViewerSession::from_config(config) {
        Ok(session) => {
            let message = format!(
                "Loaded {} entries for {} person(s).",
                session.store().len(),
                session.store().persons().len()
            );
            info!(
                "event=viewer_load module=ffi status=ok entries={} dropped={}",
                session.store().len(),
                session.store().dropped_rows()
            );
            *lock_viewer() = Some(ViewerSlot {
                session,
                layer: MemoryLayer::new(),
                markers: config.markers.clone(),
            });
            ViewerActionResponse::success(message)
        }
        Err(err) => {
            warn!("event=viewer_load module=ffi status=error error={}", err);
            ViewerActionResponse::failure(format!("viewer load failed: {err}"))
        }
    }
}

fn with_session(f: impl FnOnce(&mut ViewerSession) -> String) -> ViewerActionResponse {
    match lock_viewer().as_mut() {
        Some(slot) => ViewerActionResponse::success(f(&mut slot.session)),
        None => ViewerActionResponse::failure("no viewer loaded"),
    }
}

fn lock_viewer() -> MutexGuard<'static, Option<ViewerSlot>> {
    // A panic inside a previous call must not wedge the viewer.
    VIEWER.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn non_empty_source(raw: Option<String>) -> Option<TextSource> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| TextSource::parse(&value))
}

fn to_viewer_marker(marker: &Marker) -> ViewerMarker {
    ViewerMarker {
        person: marker.person.clone(),
        lat: marker.lat,
        lon: marker.lon,
        year: marker.year,
        photo: marker.photo.clone(),
        popup_html: marker.popup_html.clone(),
        group_size: u32::try_from(marker.group_size).unwrap_or(u32::MAX),
        offset_x: marker.offset_px.0,
        offset_y: marker.offset_px.1,
    }
}
