//! Marker projection handed to the map layer.
//!
//! # Responsibility
//! - Carry everything a map widget needs to place one photo marker.
//! - Build the popup markup shown when a marker is clicked.
//!
//! # Invariants
//! - Popup markup escapes all user-provided text.

use crate::model::entry::{PersonId, ResolvedPosition};
use serde::{Deserialize, Serialize};

/// Photo icon geometry, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerIcon {
    /// Width and height.
    pub size: (u32, u32),
    /// Point placed on the coordinates, from the icon's top-left corner.
    pub anchor: (i32, i32),
    /// Popup tip, relative to `anchor`.
    pub popup_anchor: (i32, i32),
}

/// Square photo icon centered on its coordinates, popup opening at the
/// top edge.
pub const MARKER_ICON: MarkerIcon = MarkerIcon {
    size: (50, 50),
    anchor: (25, 25),
    popup_anchor: (0, -25),
};

impl Default for MarkerIcon {
    fn default() -> Self {
        MARKER_ICON
    }
}

/// One marker of a render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub person: PersonId,
    pub lat: f64,
    pub lon: f64,
    /// Year of the resolved entry.
    pub year: i32,
    pub place: String,
    pub info: String,
    /// Photo reference after fallback resolution.
    pub photo: String,
    /// Index of the `LocationGroup` this marker belongs to.
    pub group_index: usize,
    /// Member count of that group; > 1 means the widget should spread it.
    pub group_size: usize,
    /// Suggested pixel offset from the anchor for spread-out display.
    pub offset_px: (f64, f64),
    pub popup_html: String,
}

impl Marker {
    /// Builds a marker from a resolved position and its grouping context.
    pub fn from_position(
        position: &ResolvedPosition,
        photo: impl Into<String>,
        group_index: usize,
        group_size: usize,
        offset_px: (f64, f64),
    ) -> Self {
        Self {
            person: position.person.clone(),
            lat: position.lat,
            lon: position.lon,
            year: position.year,
            place: position.place.clone(),
            info: position.info.clone(),
            photo: photo.into(),
            group_index,
            group_size,
            offset_px,
            popup_html: popup_html(position),
        }
    }
}

/// Geographic bounding box of one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// Smallest box containing every marker; `None` for an empty pass.
    pub fn around(markers: &[Marker]) -> Option<Self> {
        let first = markers.first()?;
        let mut bounds = Self {
            south: first.lat,
            west: first.lon,
            north: first.lat,
            east: first.lon,
        };
        for marker in &markers[1..] {
            bounds.south = bounds.south.min(marker.lat);
            bounds.north = bounds.north.max(marker.lat);
            bounds.west = bounds.west.min(marker.lon);
            bounds.east = bounds.east.max(marker.lon);
        }
        Some(bounds)
    }
}

/// Renders popup markup: name in bold, then place and year, then info.
pub fn popup_html(position: &ResolvedPosition) -> String {
    let mut html = format!("<strong>{}</strong><br>", escape_html(&position.person));
    let place = position.place.trim();
    if place.is_empty() {
        html.push_str(&position.year.to_string());
    } else {
        html.push_str(&format!("{} ({})", escape_html(place), position.year));
    }
    let info = position.info.trim();
    if !info.is_empty() {
        html.push_str("<br><em>");
        html.push_str(&escape_html(info));
        html.push_str("</em>");
    }
    html
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_html, popup_html, MarkerIcon, MARKER_ICON};
    use crate::model::entry::ResolvedPosition;

    fn position(place: &str, info: &str) -> ResolvedPosition {
        ResolvedPosition {
            person: "Victor Fromentin".to_string(),
            lat: 46.8,
            lon: 2.5,
            place: place.to_string(),
            info: info.to_string(),
            year: 1932,
        }
    }

    #[test]
    fn popup_includes_place_and_year() {
        let html = popup_html(&position("Nantes", ""));
        assert_eq!(html, "<strong>Victor Fromentin</strong><br>Nantes (1932)");
    }

    #[test]
    fn popup_without_place_shows_year_only() {
        let html = popup_html(&position("  ", ""));
        assert_eq!(html, "<strong>Victor Fromentin</strong><br>1932");
    }

    #[test]
    fn popup_appends_info_line() {
        let html = popup_html(&position("Nantes", "décès"));
        assert!(html.ends_with("<br><em>décès</em>"));
    }

    #[test]
    fn icon_is_centered_with_popup_at_top_edge() {
        let icon = MarkerIcon::default();
        assert_eq!(icon, MARKER_ICON);
        assert_eq!(icon.size, (50, 50));
        assert_eq!(icon.anchor, (25, 25));
        assert_eq!(icon.popup_anchor, (0, -25));
    }

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html("<b>\"A&B\"</b>"),
            "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;"
        );
    }
}
