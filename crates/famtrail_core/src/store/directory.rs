//! Photo and group directories.
//!
//! Both are optional side sources loaded once per session and treated as
//! immutable afterwards.

use crate::model::entry::PersonId;
use crate::model::group::Group;
use crate::store::rows::{Field, RawRow};
use log::debug;
use std::collections::BTreeMap;

/// Separator between person names in a group's member cell.
pub const MEMBER_SEPARATOR: char = ';';

/// Person → photo reference mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoDirectory {
    photos: BTreeMap<PersonId, String>,
}

impl PhotoDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the directory from rows with person and photo columns.
    ///
    /// Rows missing either value are skipped; the first mapping per person wins.
    pub fn from_rows(rows: &[RawRow]) -> Self {
        let mut directory = Self::new();
        for (index, row) in rows.iter().enumerate() {
            match (row.get(Field::Person), row.get(Field::Photo)) {
                (Some(person), Some(photo)) => directory.insert(person, photo),
                _ => debug!(
                    "event=row_dropped module=store status=skipped source=photos row={}",
                    index
                ),
            }
        }
        directory
    }

    pub fn insert(&mut self, person: impl Into<PersonId>, photo: impl Into<String>) {
        self.photos.entry(person.into()).or_insert_with(|| photo.into());
    }

    pub fn get(&self, person: &str) -> Option<&str> {
        self.photos.get(person).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }
}

/// Group name → members mapping in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupDirectory {
    groups: Vec<Group>,
}

impl GroupDirectory {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    /// Builds the directory from rows with group and member columns.
    ///
    /// Members are split on `;`. Repeated group rows extend the same group.
    pub fn from_rows(rows: &[RawRow]) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            let (Some(name), Some(members)) = (row.get(Field::Group), row.get(Field::Members))
            else {
                debug!(
                    "event=row_dropped module=store status=skipped source=groups row={}",
                    index
                );
                continue;
            };
            let members = split_members(members);
            match groups.iter_mut().find(|group| group.name == name) {
                Some(group) => {
                    let merged = group
                        .members
                        .iter()
                        .cloned()
                        .chain(members)
                        .collect::<Vec<_>>();
                    *group = Group::new(name, merged);
                }
                None => groups.push(Group::new(name, members)),
            }
        }
        Self { groups }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn split_members(raw: &str) -> Vec<PersonId> {
    raw.split(MEMBER_SEPARATOR)
        .map(str::trim)
        .filter(|member| !member.is_empty())
        .map(str::to_string)
        .collect()
}
