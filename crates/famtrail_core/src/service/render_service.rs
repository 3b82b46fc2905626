//! Viewer session and render pipeline.
//!
//! # Responsibility
//! - Own the immutable session data (records, photos, groups) and the
//!   explicit render state (selected year, person/group selection).
//! - Run render passes: filter → resolve → group → photo probe → place.
//!
//! # Invariants
//! - A render pass fully replaces the previous pass's markers; it never
//!   patches them.
//! - Photo probing completes before any marker is placed.
//! - A superseded pass leaves the map layer untouched.
//! - Markers placed on the layer are owned by the session that placed them.

use crate::config::{MarkersConfig, ViewerConfig};
use crate::model::entry::{PersonId, ResolvedPosition};
use crate::model::marker::{GeoBounds, Marker, MarkerIcon, MARKER_ICON};
use crate::service::coordinator::RenderCoordinator;
use crate::service::photo_probe::{resolve_photo, PhotoProbe};
use crate::source::TextSource;
use crate::store::{self, GroupDirectory, LoadError, PhotoDirectory, RecordStore};
use crate::timeline::filter::{project, Selection};
use crate::timeline::grouping::{check_tolerance, group_positions, spread_offsets, GroupingError};
use crate::timeline::keywords::{LifecycleClassifier, LifecycleKeywords};
use crate::timeline::lifecycle::LifecycleResolver;
use log::{error, info};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Session/render failure.
#[derive(Debug)]
pub enum ServiceError {
    Load(LoadError),
    Grouping(GroupingError),
    Keywords(regex::Error),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(err) => write!(f, "{err}"),
            Self::Grouping(err) => write!(f, "{err}"),
            Self::Keywords(err) => write!(f, "invalid lifecycle keywords: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(err) => Some(err),
            Self::Grouping(err) => Some(err),
            Self::Keywords(err) => Some(err),
        }
    }
}

impl From<LoadError> for ServiceError {
    fn from(value: LoadError) -> Self {
        Self::Load(value)
    }
}

impl From<GroupingError> for ServiceError {
    fn from(value: GroupingError) -> Self {
        Self::Grouping(value)
    }
}

impl From<regex::Error> for ServiceError {
    fn from(value: regex::Error) -> Self {
        Self::Keywords(value)
    }
}

/// Opaque handle of a marker placed on a map layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerHandle(pub u64);

/// Contract of the external map widget.
pub trait MarkerLayer {
    fn add_marker(&mut self, marker: &Marker) -> MarkerHandle;
    fn remove_marker(&mut self, handle: MarkerHandle);
    fn bind_popup(&mut self, handle: MarkerHandle, html: &str);
    fn fit_bounds(&mut self, bounds: GeoBounds);
}

/// In-memory map layer for headless callers and tests.
#[derive(Debug, Default)]
pub struct MemoryLayer {
    next_handle: u64,
    markers: BTreeMap<MarkerHandle, Marker>,
    popups: BTreeMap<MarkerHandle, String>,
    bounds: Option<GeoBounds>,
    removed: usize,
}

impl MemoryLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers currently on the layer, in placement order.
    pub fn markers(&self) -> Vec<&Marker> {
        self.markers.values().collect()
    }

    pub fn popup(&self, handle: MarkerHandle) -> Option<&str> {
        self.popups.get(&handle).map(String::as_str)
    }

    pub fn handles(&self) -> Vec<MarkerHandle> {
        self.markers.keys().copied().collect()
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        self.bounds
    }

    /// Total number of markers removed over the layer's lifetime.
    pub fn removed_count(&self) -> usize {
        self.removed
    }
}

impl MarkerLayer for MemoryLayer {
    fn add_marker(&mut self, marker: &Marker) -> MarkerHandle {
        self.next_handle += 1;
        let handle = MarkerHandle(self.next_handle);
        self.markers.insert(handle, marker.clone());
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        if self.markers.remove(&handle).is_some() {
            self.removed += 1;
        }
        self.popups.remove(&handle);
    }

    fn bind_popup(&mut self, handle: MarkerHandle, html: &str) {
        if self.markers.contains_key(&handle) {
            self.popups.insert(handle, html.to_string());
        }
    }

    fn fit_bounds(&mut self, bounds: GeoBounds) {
        self.bounds = Some(bounds);
    }
}

/// Marker options used by every render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub tolerance: f64,
    pub default_photo: String,
    pub spread_radius_px: f64,
    /// Whether committed passes ask the layer to fit their bounds.
    pub fit_bounds: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&MarkersConfig::default())
    }
}

impl From<&MarkersConfig> for RenderOptions {
    fn from(value: &MarkersConfig) -> Self {
        Self {
            tolerance: value.tolerance,
            default_photo: value.default_photo.clone(),
            spread_radius_px: value.spread_radius_px,
            fit_bounds: value.fit_bounds,
        }
    }
}

/// Everything one render pass computed, before placement.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub year: i32,
    /// Persons selected by the filter, whether or not they resolved.
    pub visible: BTreeSet<PersonId>,
    pub markers: Vec<Marker>,
    pub group_count: usize,
    pub bounds: Option<GeoBounds>,
    /// Icon geometry shared by every marker of the pass.
    pub icon: MarkerIcon,
}

/// Result of [`ViewerSession::render`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// Markers of this pass now own the layer.
    Rendered(RenderPlan),
    /// A newer pass started before this one could commit.
    Superseded { generation: u64 },
}

/// One page-view session of the viewer.
pub struct ViewerSession {
    store: RecordStore,
    photos: PhotoDirectory,
    groups: Option<GroupDirectory>,
    classifier: LifecycleClassifier,
    options: RenderOptions,
    year: i32,
    selection: Selection,
    coordinator: Arc<RenderCoordinator>,
    placed: Vec<MarkerHandle>,
}

impl ViewerSession {
    /// Creates a session over `store` with default keywords.
    ///
    /// The initial year is the latest year in the data and every person is
    /// selected.
    pub fn new(store: RecordStore, options: RenderOptions) -> ServiceResult<Self> {
        check_tolerance(options.tolerance)?;
        let year = store.year_bounds().map(|(_, max)| max).unwrap_or_default();
        let selection = Selection::from_names(store.persons().iter().cloned());
        Ok(Self {
            store,
            photos: PhotoDirectory::new(),
            groups: None,
            classifier: LifecycleClassifier::default_ref().clone(),
            options,
            year,
            selection,
            coordinator: Arc::new(RenderCoordinator::new()),
            placed: Vec::new(),
        })
    }

    /// Loads every configured source and builds a session.
    ///
    /// # Errors
    /// - Returns the first source fetch/parse failure.
    pub fn from_config(config: &ViewerConfig) -> ServiceResult<Self> {
        let store = store::load_locations(&config.sources.locations).map_err(log_load_error)?;
        let mut session = Self::new(store, RenderOptions::from(&config.markers))?
            .with_keywords(&config.keywords)?;
        if let Some(source) = &config.sources.photos {
            session.photos = store::load_photos(source).map_err(log_load_error)?;
        }
        if let Some(source) = &config.sources.groups {
            session.groups = Some(store::load_groups(source).map_err(log_load_error)?);
        }
        Ok(session)
    }

    pub fn with_photos(mut self, photos: PhotoDirectory) -> Self {
        self.photos = photos;
        self
    }

    pub fn with_groups(mut self, groups: GroupDirectory) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn with_keywords(mut self, keywords: &LifecycleKeywords) -> ServiceResult<Self> {
        self.classifier = LifecycleClassifier::new(keywords)?;
        Ok(self)
    }

    /// Replaces the location data and returns the newly appearing persons.
    ///
    /// On failure the previous store, selection and year are untouched.
    /// On success the existing selection is kept, persons absent from the
    /// previous data are added to it, and the year is clamped into the new
    /// year bounds.
    pub fn reload_locations(&mut self, source: &TextSource) -> ServiceResult<Vec<PersonId>> {
        let store = store::load_locations(source).map_err(log_load_error)?;
        let added = store
            .persons()
            .iter()
            .filter(|person| self.store.entry_count(person) == 0)
            .cloned()
            .collect::<Vec<_>>();

        self.store = store;
        self.selection.select_all(added.iter().cloned());
        if let Some((min, max)) = self.store.year_bounds() {
            self.year = self.year.clamp(min, max);
        }
        info!(
            "event=records_reload module=service status=ok entries={} added_persons={} year={}",
            self.store.len(),
            added.len(),
            self.year
        );
        Ok(added)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn groups(&self) -> Option<&GroupDirectory> {
        self.groups.as_ref()
    }

    /// Bounds for the year selection control.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        self.store.year_bounds()
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn set_year(&mut self, year: i32) {
        self.year = year;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Shared coordinator; event sources may call `begin` to supersede
    /// an in-flight pass.
    pub fn coordinator(&self) -> Arc<RenderCoordinator> {
        Arc::clone(&self.coordinator)
    }

    /// Names offered by the filter control: groups first, then persons.
    pub fn selectable_names(&self) -> Vec<String> {
        let mut names = self
            .groups
            .iter()
            .flat_map(|directory| directory.groups().iter().map(|group| group.name.clone()))
            .collect::<Vec<_>>();
        names.extend(self.store.persons().iter().cloned());
        names
    }

    /// Resolves one person at the current year.
    pub fn resolve_person(&self, person: &str) -> Option<ResolvedPosition> {
        let timeline = self.store.timeline(person)?;
        LifecycleResolver::new(&self.classifier).resolve(&timeline, self.year)
    }

    /// Computes the markers for the current year and selection.
    ///
    /// Photo references are probed here, before any placement.
    pub fn plan(&self, probe: &dyn PhotoProbe) -> ServiceResult<RenderPlan> {
        let visible = project(&self.selection, self.groups.as_ref());
        let resolver = LifecycleResolver::new(&self.classifier);
        let positions = resolver.resolve_all(&self.store, self.year, &visible);
        let location_groups = group_positions(&positions, self.options.tolerance)?;

        let by_person = positions
            .iter()
            .map(|position| (position.person.as_str(), position))
            .collect::<BTreeMap<_, _>>();

        let mut markers = Vec::with_capacity(positions.len());
        for (group_index, group) in location_groups.iter().enumerate() {
            let offsets = spread_offsets(group.len(), self.options.spread_radius_px);
            for (member, offset) in group.members.iter().zip(offsets) {
                let Some(position) = by_person.get(member.as_str()) else {
                    continue;
                };
                let photo = resolve_photo(
                    member,
                    &self.photos,
                    probe,
                    &self.options.default_photo,
                );
                markers.push(Marker::from_position(
                    position,
                    photo,
                    group_index,
                    group.len(),
                    offset,
                ));
            }
        }

        let bounds = GeoBounds::around(&markers);
        Ok(RenderPlan {
            year: self.year,
            visible,
            markers,
            group_count: location_groups.len(),
            bounds,
            icon: MARKER_ICON,
        })
    }

    /// Runs one full render pass against `layer`.
    ///
    /// # Side effects
    /// - Removes every marker of the previous committed pass and places the
    ///   new ones with popups, unless the pass was superseded.
    /// - Emits `render_pass` / `render_superseded` logging events.
    pub fn render(
        &mut self,
        layer: &mut dyn MarkerLayer,
        probe: &dyn PhotoProbe,
    ) -> ServiceResult<RenderOutcome> {
        let started_at = Instant::now();
        let ticket = self.coordinator.begin();
        let plan = self.plan(probe)?;

        if !self.coordinator.is_current(&ticket) {
            info!(
                "event=render_superseded module=service status=skipped generation={} year={} duration_ms={}",
                ticket.generation(),
                plan.year,
                started_at.elapsed().as_millis()
            );
            return Ok(RenderOutcome::Superseded {
                generation: ticket.generation(),
            });
        }

        self.commit(layer, &plan);
        info!(
            "event=render_pass module=service status=ok generation={} year={} visible={} markers={} groups={} duration_ms={}",
            ticket.generation(),
            plan.year,
            plan.visible.len(),
            plan.markers.len(),
            plan.group_count,
            started_at.elapsed().as_millis()
        );
        Ok(RenderOutcome::Rendered(plan))
    }

    fn commit(&mut self, layer: &mut dyn MarkerLayer, plan: &RenderPlan) {
        for handle in self.placed.drain(..) {
            layer.remove_marker(handle);
        }
        for marker in &plan.markers {
            let handle = layer.add_marker(marker);
            layer.bind_popup(handle, &marker.popup_html);
            self.placed.push(handle);
        }
        if self.options.fit_bounds {
            if let Some(bounds) = plan.bounds {
                layer.fit_bounds(bounds);
            }
        }
    }
}

fn log_load_error(err: LoadError) -> LoadError {
    error!(
        "event=records_load module=service status=error error={}",
        err
    );
    err
}
