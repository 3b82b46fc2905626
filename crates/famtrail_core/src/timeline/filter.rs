//! Filter projection from a person/group selection to visible persons.
//!
//! # Invariants
//! - An empty selection projects to an empty set ("hide all").
//! - Without group definitions, selected names are person identifiers.
//! - With group definitions, a selected group name expands to its members;
//!   any other selected name is kept as a person identifier.

use crate::model::entry::PersonId;
use crate::store::GroupDirectory;
use std::collections::BTreeSet;

/// Current person/group selection of the filter control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    names: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut selection = Self::new();
        selection.select_all(names);
        selection
    }

    /// Adds one name; returns `false` when it was already selected.
    pub fn select(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.names.insert(trimmed.to_string())
    }

    /// Removes one name; returns `false` when it was not selected.
    pub fn deselect(&mut self, name: &str) -> bool {
        self.names.remove(name.trim())
    }

    pub fn select_all(&mut self, names: impl IntoIterator<Item = impl Into<String>>) {
        for name in names {
            self.select(name);
        }
    }

    /// The "deselect all" action.
    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Expands a selection into the concrete set of visible persons.
pub fn project(selection: &Selection, groups: Option<&GroupDirectory>) -> BTreeSet<PersonId> {
    let mut visible = BTreeSet::new();
    if selection.is_empty() {
        return visible;
    }

    for name in selection.names() {
        match groups.and_then(|directory| directory.get(name)) {
            Some(group) => visible.extend(group.members.iter().cloned()),
            None => {
                visible.insert(name.clone());
            }
        }
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::{project, Selection};

    #[test]
    fn select_trims_and_ignores_blank_names() {
        let mut selection = Selection::new();
        assert!(selection.select("  Victor "));
        assert!(!selection.select("Victor"));
        assert!(!selection.select("   "));
        assert!(selection.contains("Victor"));
        assert!(selection.deselect(" Victor"));
        assert!(selection.is_empty());
    }

    #[test]
    fn clear_hides_everything() {
        let mut selection = Selection::from_names(["A", "B"]);
        selection.clear();
        assert!(project(&selection, None).is_empty());
    }
}
