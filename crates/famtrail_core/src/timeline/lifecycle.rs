//! Lifecycle resolver: one person's current position as of a year.
//!
//! # Responsibility
//! - Scan a person's timeline in `(year, input_index)` order up to a target
//!   year and pick the entry that is current.
//! - Apply stop and final-event termination rules.
//!
//! # Invariants
//! - A stop entry at or before the target year suppresses display for the
//!   whole pass; the scan never clears `stopped`.
//! - A final entry (death/divorce) is displayed only in its own year and
//!   suppresses display for every later target year.
//! - Entries after the target year are never consulted.

use crate::model::entry::{PersonTimeline, ResolvedPosition};
use crate::store::RecordStore;
use crate::timeline::keywords::LifecycleClassifier;
use std::collections::BTreeSet;

/// Resolves one timeline with the default keyword lists.
pub fn resolve(timeline: &PersonTimeline, target_year: i32) -> Option<ResolvedPosition> {
    LifecycleResolver::default().resolve(timeline, target_year)
}

/// Timeline resolver bound to one keyword classifier.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleResolver<'a> {
    classifier: &'a LifecycleClassifier,
}

impl Default for LifecycleResolver<'static> {
    fn default() -> Self {
        Self::new(LifecycleClassifier::default_ref())
    }
}

impl<'a> LifecycleResolver<'a> {
    pub fn new(classifier: &'a LifecycleClassifier) -> Self {
        Self { classifier }
    }

    /// Returns the current entry of `timeline` at `target_year`, if any.
    pub fn resolve(
        &self,
        timeline: &PersonTimeline,
        target_year: i32,
    ) -> Option<ResolvedPosition> {
        let mut last_valid = None;
        let mut stopped = false;

        for entry in timeline.up_to(target_year) {
            let lifecycle = self.classifier.classify(&entry.info);

            if lifecycle.stop {
                stopped = true;
            }

            if lifecycle.is_final() {
                if entry.year == target_year {
                    last_valid = Some(entry);
                } else {
                    stopped = true;
                }
            } else if !stopped {
                last_valid = Some(entry);
            }
        }

        if stopped {
            return None;
        }
        last_valid.map(ResolvedPosition::from)
    }

    /// Resolves every visible person of `store`, in first-appearance order.
    ///
    /// Persons absent at `target_year` are omitted.
    pub fn resolve_all(
        &self,
        store: &RecordStore,
        target_year: i32,
        visible: &BTreeSet<String>,
    ) -> Vec<ResolvedPosition> {
        store
            .persons()
            .iter()
            .filter(|person| visible.contains(person.as_str()))
            .filter_map(|person| store.timeline(person))
            .filter_map(|timeline| self.resolve(&timeline, target_year))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::resolve;
    use crate::model::entry::{LocationEntry, PersonTimeline};

    fn timeline(rows: &[(i32, &str)]) -> PersonTimeline {
        PersonTimeline::new(
            "A",
            rows.iter().enumerate().map(|(index, (year, info))| {
                LocationEntry::new("A", *year, 48.0 + f64::from(*year - 2000), 2.0)
                    .with_info(*info)
                    .with_input_index(index)
            }),
        )
    }

    #[test]
    fn later_row_in_final_year_still_advances_position() {
        let timeline = timeline(&[(2000, ""), (2005, "décès"), (2005, "funérailles")]);
        let resolved = resolve(&timeline, 2005).unwrap();
        assert_eq!(resolved.year, 2005);
        assert_eq!(resolved.info, "funérailles");
        assert!(resolve(&timeline, 2006).is_none());
    }

    #[test]
    fn ordinary_entry_after_final_in_later_year_stays_suppressed() {
        let timeline = timeline(&[(2000, ""), (2005, "divorce"), (2007, "")]);
        assert!(resolve(&timeline, 2007).is_none());
        assert!(resolve(&timeline, 2010).is_none());
    }

    #[test]
    fn stop_and_final_on_same_entry_is_absent() {
        let timeline = timeline(&[(2000, ""), (2005, "stop décès")]);
        assert!(resolve(&timeline, 2005).is_none());
    }

    #[test]
    fn equal_years_resolve_to_later_input_row() {
        let timeline = timeline(&[(2000, "first"), (2000, "second")]);
        assert_eq!(resolve(&timeline, 2000).unwrap().info, "second");
    }
}
