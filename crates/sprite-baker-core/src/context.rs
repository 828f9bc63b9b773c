use crate::atlas::AtlasOptions;
use crate::config::BuildConfig;
use crate::model::PathPair;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Target-relative paths the current run expects to exist when it finishes.
#[derive(Debug, Clone, Default)]
pub struct TouchedPaths {
    paths: HashSet<PathBuf>,
}

impl TouchedPaths {
    pub fn insert(&mut self, relative: impl Into<PathBuf>) {
        self.paths.insert(relative.into());
    }

    /// Registers `relative` and every ancestor directory of it.
    pub fn insert_with_ancestors(&mut self, relative: &Path) {
        for p in relative.ancestors() {
            if p.as_os_str().is_empty() {
                break;
            }
            self.paths.insert(p.to_path_buf());
        }
    }

    pub fn contains(&self, relative: &Path) -> bool {
        self.paths.contains(relative)
    }

    /// Removes `relative`, returning whether it was registered.
    pub fn take(&mut self, relative: &Path) -> bool {
        self.paths.remove(relative)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

/// Mutable state shared by the handlers during one run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub config: BuildConfig,
    pub touched: TouchedPaths,
    /// Absolute source paths claimed by a handler; never plain-copied.
    pub excluded: HashSet<PathBuf>,
}

impl BuildContext {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            touched: TouchedPaths::default(),
            excluded: HashSet::new(),
        }
    }

    /// Forgets everything recorded by a previous run.
    pub fn reset(&mut self) {
        self.touched.clear();
        self.excluded.clear();
    }

    pub fn source_root(&self) -> &Path {
        &self.config.source_dir
    }

    pub fn target_root(&self) -> &Path {
        &self.config.target_dir
    }

    pub fn exclude(&mut self, source_file: impl Into<PathBuf>) {
        self.excluded.insert(source_file.into());
    }

    pub fn is_excluded(&self, source_file: &Path) -> bool {
        self.excluded.contains(source_file)
    }

    /// Registers `dir/name` as an expected output.
    pub fn touch_in(&mut self, dir: &PathPair, name: impl AsRef<Path>) {
        self.touched.insert(dir.child_relative(name));
    }

    /// Counterpart of a source directory under the target root.
    pub fn target_of(&self, dir: &PathPair) -> PathPair {
        dir.rebase(&self.config.target_dir)
    }

    pub fn in_textures(&self, dir: &PathPair) -> bool {
        self.config.in_textures(dir.relative())
    }

    pub fn atlas_options(&self) -> AtlasOptions {
        AtlasOptions::from(&self.config)
    }
}
