//! Location entry domain model.
//!
//! # Responsibility
//! - Define the canonical location row shared by loading and resolution.
//! - Define per-person timelines and the resolved position projection.
//!
//! # Invariants
//! - `person` is never empty after trimming.
//! - `lat`/`lon` are finite numbers.
//! - Timeline order is `(year, input_index)` ascending; `input_index` is the
//!   original load order and is unique inside one `RecordStore`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Stable person identifier as written in the source data.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type PersonId = String;

/// One dated location row for one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEntry {
    /// Person identifier (display name in the source spreadsheet).
    pub person: PersonId,
    /// Calendar year from which this position applies.
    pub year: i32,
    /// WGS84 latitude in degrees.
    pub lat: f64,
    /// WGS84 longitude in degrees.
    pub lon: f64,
    /// Display label, may be empty.
    pub place: String,
    /// Free-text annotation, may carry lifecycle keywords.
    pub info: String,
    /// Position of the row in the original input; tie-breaker for equal years.
    pub input_index: usize,
}

impl LocationEntry {
    /// Creates an entry with empty `place`/`info`.
    pub fn new(person: impl Into<PersonId>, year: i32, lat: f64, lon: f64) -> Self {
        Self {
            person: person.into(),
            year,
            lat,
            lon,
            place: String::new(),
            info: String::new(),
            input_index: 0,
        }
    }

    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = place.into();
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    pub fn with_input_index(mut self, input_index: usize) -> Self {
        self.input_index = input_index;
        self
    }

    /// Total resolution order: ascending year, then original input order.
    pub fn timeline_order(&self, other: &Self) -> Ordering {
        self.year
            .cmp(&other.year)
            .then(self.input_index.cmp(&other.input_index))
    }
}

/// All entries of one person, ascending by `(year, input_index)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonTimeline {
    person: PersonId,
    entries: Vec<LocationEntry>,
}

impl PersonTimeline {
    /// Builds a timeline, sorting entries into resolution order.
    ///
    /// Entries belonging to another person are discarded.
    pub fn new(person: impl Into<PersonId>, entries: impl IntoIterator<Item = LocationEntry>) -> Self {
        let person = person.into();
        let mut entries = entries
            .into_iter()
            .filter(|entry| entry.person == person)
            .collect::<Vec<_>>();
        entries.sort_by(LocationEntry::timeline_order);
        Self { person, entries }
    }

    pub fn person(&self) -> &str {
        &self.person
    }

    pub fn entries(&self) -> &[LocationEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with `year <= target_year`, in resolution order.
    pub fn up_to(&self, target_year: i32) -> impl Iterator<Item = &LocationEntry> {
        self.entries
            .iter()
            .take_while(move |entry| entry.year <= target_year)
    }
}

/// Position attributed to one person for a queried year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPosition {
    pub person: PersonId,
    pub lat: f64,
    pub lon: f64,
    pub place: String,
    pub info: String,
    /// Year of the entry chosen as current (not the queried year).
    pub year: i32,
}

impl From<&LocationEntry> for ResolvedPosition {
    fn from(entry: &LocationEntry) -> Self {
        Self {
            person: entry.person.clone(),
            lat: entry.lat,
            lon: entry.lon,
            place: entry.place.clone(),
            info: entry.info.clone(),
            year: entry.year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LocationEntry, PersonTimeline};

    #[test]
    fn timeline_sorts_by_year_then_input_order() {
        let timeline = PersonTimeline::new(
            "A",
            vec![
                LocationEntry::new("A", 2010, 1.0, 1.0).with_input_index(0),
                LocationEntry::new("A", 2000, 2.0, 2.0).with_input_index(1),
                LocationEntry::new("A", 2010, 3.0, 3.0).with_input_index(2),
            ],
        );

        let order = timeline
            .entries()
            .iter()
            .map(|entry| (entry.year, entry.input_index))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![(2000, 1), (2010, 0), (2010, 2)]);
    }

    #[test]
    fn timeline_drops_foreign_entries() {
        let timeline = PersonTimeline::new(
            "A",
            vec![
                LocationEntry::new("A", 2000, 1.0, 1.0),
                LocationEntry::new("B", 2000, 1.0, 1.0),
            ],
        );
        assert_eq!(timeline.entries().len(), 1);
    }

    #[test]
    fn up_to_stops_at_target_year() {
        let timeline = PersonTimeline::new(
            "A",
            vec![
                LocationEntry::new("A", 1990, 1.0, 1.0).with_input_index(0),
                LocationEntry::new("A", 2000, 1.0, 1.0).with_input_index(1),
                LocationEntry::new("A", 2001, 1.0, 1.0).with_input_index(2),
            ],
        );
        assert_eq!(timeline.up_to(2000).count(), 2);
        assert_eq!(timeline.up_to(1980).count(), 0);
    }
}
