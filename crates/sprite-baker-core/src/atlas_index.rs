use crate::error::{BuildError, Result};
use crate::model::AtlasMapEntry;
use std::collections::HashMap;
use std::path::Path;

/// Name <-> frame index lookup built from an atlas map.
///
/// The zero-based line number of a record is its frame index.
#[derive(Debug, Clone, Default)]
pub struct AtlasIndex {
    name_to_index: HashMap<String, usize>,
    index_to_name: Vec<String>,
}

impl AtlasIndex {
    pub fn load(map_file: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(map_file).map_err(|e| BuildError::io(map_file, e))?;
        Self::parse(&text, map_file)
    }

    /// Parses map text; `path` is only used in error reports.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut index = Self::default();
        for (line_no, line) in text.lines().enumerate() {
            let entry = AtlasMapEntry::parse_line(line).map_err(|reason| BuildError::AtlasMap {
                path: path.to_path_buf(),
                line: line_no + 1,
                reason,
            })?;
            let name = entry.sprite_file_name;
            if index.name_to_index.contains_key(&name) {
                return Err(BuildError::DuplicateSprite {
                    path: path.to_path_buf(),
                    name,
                });
            }
            index.name_to_index.insert(name.clone(), line_no);
            index.index_to_name.push(name);
        }
        Ok(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.index_to_name.get(index).map(String::as_str)
    }

    /// Like `index_of`, but reports a missing name as `UnknownSprite` against `referrer`.
    pub fn require(&self, name: &str, referrer: &Path) -> Result<usize> {
        self.index_of(name).ok_or_else(|| BuildError::UnknownSprite {
            path: referrer.to_path_buf(),
            name: name.to_string(),
        })
    }

    /// Sprite names in frame-index order.
    pub fn names(&self) -> &[String] {
        &self.index_to_name
    }

    pub fn len(&self) -> usize {
        self.index_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_name.is_empty()
    }
}
