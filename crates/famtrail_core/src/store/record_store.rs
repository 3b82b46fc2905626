//! In-memory record store for location entries.
//!
//! # Responsibility
//! - Hold the flat, ordered collection of location entries for a session.
//! - Derive per-person timelines and year bounds on demand.
//!
//! # Invariants
//! - Entries are immutable after load and keep original input order.
//! - `input_index` equals the entry's row position in the raw input, so
//!   dropped rows leave gaps but order is preserved.
//! - Person order is first-appearance order in the input.
//! - Each person's entry positions are indexed once, at construction.

use crate::model::entry::{LocationEntry, PersonId, PersonTimeline};
use crate::store::rows::{entry_from_row, RawRow};
use log::{debug, info};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Loaded location entries for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    entries: Vec<LocationEntry>,
    persons: Vec<PersonId>,
    /// Positions in `entries`, per person, in input order.
    by_person: BTreeMap<PersonId, Vec<usize>>,
    dropped_rows: usize,
}

impl RecordStore {
    /// Loads raw rows, silently dropping malformed ones.
    ///
    /// No de-duplication is performed; several entries may share a
    /// person/year pair.
    pub fn load(rows: &[RawRow]) -> Self {
        let mut entries = Vec::with_capacity(rows.len());
        let mut dropped_rows = 0;

        for (input_index, row) in rows.iter().enumerate() {
            match entry_from_row(row, input_index) {
                Ok(entry) => entries.push(entry),
                Err(reason) => {
                    dropped_rows += 1;
                    debug!(
                        "event=row_dropped module=store status=skipped row={} reason={}",
                        input_index,
                        reason.code()
                    );
                }
            }
        }

        let store = Self::from_entries(entries, dropped_rows);
        info!(
            "event=records_load module=store status=ok entries={} persons={} dropped={}",
            store.entries.len(),
            store.persons.len(),
            store.dropped_rows
        );
        store
    }

    /// Builds a store from already-validated entries.
    ///
    /// Entries keep their given order; `input_index` values are reassigned
    /// when they would collide.
    pub fn from_entries(entries: Vec<LocationEntry>, dropped_rows: usize) -> Self {
        let mut entries = entries;
        let indexes_unique = {
            let mut seen = entries.iter().map(|entry| entry.input_index).collect::<Vec<_>>();
            seen.sort_unstable();
            seen.windows(2).all(|pair| pair[0] != pair[1])
        };
        if !indexes_unique {
            for (index, entry) in entries.iter_mut().enumerate() {
                entry.input_index = index;
            }
        }

        let mut persons: Vec<PersonId> = Vec::new();
        let mut by_person: BTreeMap<PersonId, Vec<usize>> = BTreeMap::new();
        for (position, entry) in entries.iter().enumerate() {
            match by_person.entry(entry.person.clone()) {
                Entry::Occupied(mut slot) => slot.get_mut().push(position),
                Entry::Vacant(slot) => {
                    persons.push(entry.person.clone());
                    slot.insert(vec![position]);
                }
            }
        }

        Self {
            entries,
            persons,
            by_person,
            dropped_rows,
        }
    }

    pub fn entries(&self) -> &[LocationEntry] {
        &self.entries
    }

    /// Distinct persons in first-appearance order.
    pub fn persons(&self) -> &[PersonId] {
        &self.persons
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of raw rows rejected during load.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Returns the sorted timeline for one person.
    pub fn timeline(&self, person: &str) -> Option<PersonTimeline> {
        let positions = self.by_person.get(person)?;
        Some(PersonTimeline::new(
            person,
            positions
                .iter()
                .map(|&position| self.entries[position].clone()),
        ))
    }

    /// Number of entries recorded for `person`.
    pub fn entry_count(&self, person: &str) -> usize {
        self.by_person.get(person).map_or(0, Vec::len)
    }

    /// Returns all timelines in first-appearance person order.
    pub fn timelines(&self) -> Vec<PersonTimeline> {
        self.persons
            .iter()
            .filter_map(|person| self.timeline(person))
            .collect()
    }

    /// Minimum and maximum year present, for the year selection control.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let min = self.entries.iter().map(|entry| entry.year).min()?;
        let max = self.entries.iter().map(|entry| entry.year).max()?;
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::RecordStore;
    use crate::model::entry::LocationEntry;

    #[test]
    fn interleaved_rows_index_each_person_once() {
        let entries = (0..300)
            .map(|row| {
                let person = ["Victor", "Jeanne", "Marc"][row % 3];
                LocationEntry::new(person, 1900 + (row / 3) as i32, 48.0, 2.0).with_input_index(row)
            })
            .collect::<Vec<_>>();
        let store = RecordStore::from_entries(entries, 0);

        assert_eq!(store.persons(), ["Victor", "Jeanne", "Marc"]);
        assert_eq!(store.entry_count("Jeanne"), 100);
        assert_eq!(store.entry_count("Sophie"), 0);

        let jeanne = store.timeline("Jeanne").unwrap();
        assert_eq!(jeanne.entries().len(), 100);
        assert!(jeanne.entries().iter().all(|entry| entry.person == "Jeanne"));
        assert_eq!(jeanne.entries()[0].input_index, 1);
        assert_eq!(jeanne.entries()[99].year, 1999);
        assert!(store.timeline("Sophie").is_none());
    }

    #[test]
    fn colliding_input_indexes_are_renumbered_before_indexing() {
        let entries = vec![
            LocationEntry::new("Marc", 1950, 45.76, 4.83),
            LocationEntry::new("Marc", 1920, 45.76, 4.83),
        ];
        let store = RecordStore::from_entries(entries, 2);

        let marc = store.timeline("Marc").unwrap();
        let order = marc
            .entries()
            .iter()
            .map(|entry| (entry.year, entry.input_index))
            .collect::<Vec<_>>();
        assert_eq!(order, [(1920, 1), (1950, 0)]);
        assert_eq!(store.dropped_rows(), 2);
    }
}
