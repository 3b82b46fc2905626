//! Person groups and per-pass location groups.

use crate::model::entry::PersonId;
use serde::{Deserialize, Serialize};

/// Named set of persons, loaded once from an external definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    /// Member identifiers in definition order; duplicates are removed on load.
    pub members: Vec<PersonId>,
}

impl Group {
    pub fn new(name: impl Into<String>, members: impl IntoIterator<Item = impl Into<PersonId>>) -> Self {
        let mut deduped: Vec<PersonId> = Vec::new();
        for member in members {
            let member = member.into();
            if !deduped.contains(&member) {
                deduped.push(member);
            }
        }
        Self {
            name: name.into(),
            members: deduped,
        }
    }

    pub fn contains(&self, person: &str) -> bool {
        self.members.iter().any(|member| member == person)
    }
}

/// Persons sharing tolerance-equal resolved coordinates in one render pass.
///
/// `lat`/`lon` are the anchor coordinates: the position of the first member
/// that opened the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationGroup {
    pub lat: f64,
    pub lon: f64,
    pub members: Vec<PersonId>,
}

impl LocationGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
