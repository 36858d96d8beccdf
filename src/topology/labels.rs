//! Subdomain (block) ids and their optional human-readable names.
//!
//! Every element carries a [`SubdomainId`]. Names are bound separately in a
//! [`SubdomainNames`] table so that unnamed subdomains cost nothing.

use std::collections::BTreeMap;

/// Integer tag of a subdomain (element block).
pub type SubdomainId = u16;

/// Name table for subdomains.
///
/// Binding a name to an id that is already named replaces the old name
/// (last write wins); [`SubdomainNames::set_name`] hands back the previous
/// name so callers can report the overwrite.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubdomainNames {
    names: BTreeMap<SubdomainId, String>,
}

impl SubdomainNames {
    /// Creates an empty name table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `id`.
    ///
    /// Returns the previous name, if any.
    pub fn set_name(&mut self, id: SubdomainId, name: impl Into<String>) -> Option<String> {
        self.names.insert(id, name.into())
    }

    /// Returns the name bound to `id`.
    pub fn name(&self, id: SubdomainId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Returns the smallest id bound to `name`.
    pub fn id_by_name(&self, name: &str) -> Option<SubdomainId> {
        self.names
            .iter()
            .find_map(|(&id, bound)| (bound == name).then_some(id))
    }

    /// Iterates `(id, name)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (SubdomainId, &str)> + '_ {
        self.names.iter().map(|(&id, name)| (id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
