//! Group registry for tracking capture groups
//!
//! This module provides a registry that maps capture group names to their
//! 1-based indices and back. It is filled from the group table the engine
//! reports after compilation, and is used for:
//! - Ensuring group names are unique within a pattern
//! - Building the `groups` object of a match result
//! - Resolving `$<name>` references in replacement templates

use std::collections::HashMap;
use std::sync::Arc;

/// Information about a capture group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupInfo {
    /// The index of the group (1-based, matching `$1`, `$2`, etc.)
    pub index: usize,
    /// The name of the group (if it's a named group)
    pub name: Option<Arc<str>>,
}

/// Registry for tracking capture groups
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    /// Group infos in index order
    groups: Vec<GroupInfo>,
    /// Map from group name to index
    name_to_index: HashMap<Arc<str>, usize>,
}

impl GroupRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        GroupRegistry::default()
    }

    /// Build a registry from the engine's group table.
    ///
    /// `names[i]` is the name of group `i`; entry 0 is the whole match and
    /// is skipped.
    ///
    /// # Errors
    /// Returns an error if a name is used more than once
    pub fn from_names<I, S>(names: I) -> Result<Self, GroupRegistryError>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut registry = GroupRegistry::new();
        for name in names.into_iter().skip(1) {
            registry.register_group(name.as_ref().map(|s| <S as AsRef<str>>::as_ref(s)))?;
        }
        Ok(registry)
    }

    /// Register the next capture group
    ///
    /// # Returns
    /// The index assigned to this group
    ///
    /// # Errors
    /// Returns an error if the name is already in use
    pub fn register_group(&mut self, name: Option<&str>) -> Result<usize, GroupRegistryError> {
        let index = self.groups.len() + 1;

        let name: Option<Arc<str>> = name.map(Arc::from);
        if let Some(ref group_name) = name {
            if self.name_to_index.contains_key(group_name) {
                return Err(GroupRegistryError::DuplicateGroupName(group_name.to_string()));
            }
            self.name_to_index.insert(group_name.clone(), index);
        }

        self.groups.push(GroupInfo { index, name });
        Ok(index)
    }

    /// Get group info by index
    pub fn get_by_index(&self, index: usize) -> Option<&GroupInfo> {
        index.checked_sub(1).and_then(|i| self.groups.get(i))
    }

    /// Get group index by name
    pub fn get_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Get the total number of capture groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Whether any group carries a name
    pub fn has_names(&self) -> bool {
        !self.name_to_index.is_empty()
    }

    /// Named groups as `(name, index)` in index order
    pub fn named(&self) -> impl Iterator<Item = (&Arc<str>, usize)> + '_ {
        self.groups
            .iter()
            .filter_map(|g| g.name.as_ref().map(|name| (name, g.index)))
    }
}

/// Errors that can occur in the group registry
#[derive(Debug, Clone, PartialEq)]
pub enum GroupRegistryError {
    /// A group name is used more than once
    DuplicateGroupName(String),
}

impl std::fmt::Display for GroupRegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupRegistryError::DuplicateGroupName(name) => {
                write!(f, "duplicate capture group name '{}'", name)
            }
        }
    }
}

impl std::error::Error for GroupRegistryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_unnamed_group() {
        let mut registry = GroupRegistry::new();
        let index = registry.register_group(None).unwrap();
        assert_eq!(index, 1);
        assert_eq!(registry.group_count(), 1);
        assert!(!registry.has_names());
    }

    #[test]
    fn test_register_named_group() {
        let mut registry = GroupRegistry::new();
        let index = registry.register_group(Some("name")).unwrap();
        assert_eq!(index, 1);
        assert!(registry.has_names());
        assert_eq!(registry.get_by_name("name"), Some(1));
    }

    #[test]
    fn test_duplicate_name_error() {
        let mut registry = GroupRegistry::new();
        registry.register_group(Some("name")).unwrap();
        let result = registry.register_group(Some("name"));
        assert!(matches!(
            result,
            Err(GroupRegistryError::DuplicateGroupName(_))
        ));
    }

    #[test]
    fn test_from_engine_names_skips_whole_match() {
        let names = vec![None, Some("year"), None, Some("day")];
        let registry = GroupRegistry::from_names(names).unwrap();
        assert_eq!(registry.group_count(), 3);
        assert_eq!(registry.get_by_name("year"), Some(1));
        assert_eq!(registry.get_by_name("day"), Some(3));
        assert_eq!(registry.get_by_index(2).unwrap().name, None);
        assert!(registry.get_by_index(0).is_none());

        let named: Vec<(String, usize)> = registry
            .named()
            .map(|(name, index)| (name.to_string(), index))
            .collect();
        assert_eq!(named, vec![("year".to_string(), 1), ("day".to_string(), 3)]);
    }

    #[test]
    fn test_from_names_rejects_duplicates() {
        let names = vec![None, Some("x".to_string()), Some("x".to_string())];
        assert!(matches!(
            GroupRegistry::from_names(names),
            Err(GroupRegistryError::DuplicateGroupName(name)) if name == "x"
        ));
    }
}
