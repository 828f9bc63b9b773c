use crate::model::{AtlasGroup, PathPair};
use std::collections::BTreeMap;

/// Directory -> atlas assignment produced by the mapping pass.
///
/// Keys are the directories holding a marker file. Ancestry is decided on
/// whole path components, so `tex1` never covers `tex10`.
#[derive(Debug, Clone, Default)]
pub struct AtlasGroupMap {
    groups: BTreeMap<PathPair, AtlasGroup>,
}

impl AtlasGroupMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `key` an atlas root named `target_name`. Returns false if it already was one.
    pub fn insert_group(&mut self, key: PathPair, target_name: impl Into<String>) -> bool {
        if self.groups.contains_key(&key) {
            return false;
        }
        let group = AtlasGroup::new(target_name, key.clone());
        self.groups.insert(key, group);
        true
    }

    /// The group whose key is `dir` or an ancestor of it.
    pub fn covering_group(&self, dir: &PathPair) -> Option<(&PathPair, &AtlasGroup)> {
        self.groups.iter().find(|(key, _)| dir.is_within(key))
    }

    /// The group keyed exactly at `dir`.
    pub fn group(&self, dir: &PathPair) -> Option<&AtlasGroup> {
        self.groups.get(dir)
    }

    /// Appends `dir` to the group covering it. Returns the key it joined.
    pub fn append_member(&mut self, dir: &PathPair) -> Option<PathPair> {
        let (key, group) = self.groups.iter_mut().find(|(key, _)| dir.is_within(key))?;
        if !group.members.contains(dir) {
            group.members.push(dir.clone());
        }
        Some(key.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathPair, &AtlasGroup)> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
