use crate::config::BuildConfig;
use crate::context::{BuildContext, TouchedPaths};
use crate::error::{BuildError, Outcome, Result};
use crate::fs_util::{file_name_string, is_older, list_dirs, list_files, modified};
use crate::groups::AtlasGroupMap;
use crate::handler::{Mapper, Rebuilder};
use crate::handlers::{default_mappers, default_rebuilders};
use crate::model::PathPair;
use crate::sprite_source::SpriteDecoder;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};
use walkdir::WalkDir;

/// Per-handler rebuild counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerTally {
    pub rebuilt: usize,
    pub up_to_date: usize,
}

/// Summary of one `ContentBuilder::build` run.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub directories: usize,
    pub atlas_groups: usize,
    /// Keyed by `Rebuilder::name`.
    pub handlers: BTreeMap<&'static str, HandlerTally>,
    pub files_copied: usize,
    pub files_current: usize,
    /// Target entries deleted by reconciliation (a deleted directory counts once).
    pub removed: usize,
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn tally(&self, handler: &str) -> HandlerTally {
        self.handlers.get(handler).copied().unwrap_or_default()
    }

    pub fn total_rebuilt(&self) -> usize {
        self.handlers.values().map(|t| t.rebuilt).sum()
    }

    fn record(&mut self, handler: &'static str, outcome: Outcome) {
        let tally = self.handlers.entry(handler).or_default();
        match outcome {
            Outcome::Rebuilt => tally.rebuilt += 1,
            Outcome::UpToDate => tally.up_to_date += 1,
            Outcome::NotApplicable => {}
        }
    }
}

/// Incremental content build: mirrors the source tree into the target tree,
/// letting registered handlers turn directories into derived artifacts and
/// sweeping everything the run did not produce.
pub struct ContentBuilder {
    ctx: BuildContext,
    mappers: Vec<Box<dyn Mapper>>,
    rebuilders: Vec<Box<dyn Rebuilder>>,
}

impl ContentBuilder {
    /// Builder with the atlas and animation-descriptor handlers.
    pub fn new(config: BuildConfig) -> Self {
        Self::with_decoders(config, Vec::new())
    }

    /// Like `new`, plus a sprite-source handler per decoder.
    pub fn with_decoders(config: BuildConfig, decoders: Vec<Arc<dyn SpriteDecoder>>) -> Self {
        Self {
            ctx: BuildContext::new(config),
            mappers: default_mappers(&decoders),
            rebuilders: default_rebuilders(&decoders),
        }
    }

    /// Builder with no handlers: every file is plain-copied.
    pub fn bare(config: BuildConfig) -> Self {
        Self {
            ctx: BuildContext::new(config),
            mappers: Vec::new(),
            rebuilders: Vec::new(),
        }
    }

    /// Appends a mapper; it runs after those already registered.
    pub fn register_mapper(&mut self, mapper: Box<dyn Mapper>) -> &mut Self {
        self.mappers.push(mapper);
        self
    }

    /// Appends a rebuilder; it runs after those already registered.
    pub fn register_rebuilder(&mut self, rebuilder: Box<dyn Rebuilder>) -> &mut Self {
        self.rebuilders.push(rebuilder);
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.ctx.config
    }

    /// Outputs registered by the last run that reconciliation did not find on disk.
    pub fn touched(&self) -> &TouchedPaths {
        &self.ctx.touched
    }

    #[instrument(skip_all, fields(source = %self.ctx.source_root().display(), target = %self.ctx.target_root().display()))]
    /// Runs one full build.
    ///
    /// Notes:
    /// - Aborts on the first hard error; outputs already written stay in place.
    /// - Nothing is written before the mapping pass succeeds.
    pub fn build(&mut self) -> Result<BuildReport> {
        self.ctx.config.validate()?;
        let started = Instant::now();
        self.ctx.reset();
        for p in self.ctx.config.preserve.clone() {
            self.ctx.touched.insert_with_ancestors(&p);
        }

        let result = self.run(started);
        if let Err(e) = &result {
            error!(error = %e, code = e.exit_code(), "build failed");
        }
        result
    }

    fn run(&mut self, started: Instant) -> Result<BuildReport> {
        let mut report = BuildReport::default();

        let dirs = self.enumerate()?;
        report.directories = dirs.len();
        info!(directories = dirs.len(), "source tree enumerated");

        let groups = self.map_directories(&dirs)?;
        report.atlas_groups = groups.len();
        info!(groups = groups.len(), "mapping pass done");

        self.materialize(&dirs)?;
        self.rebuild(&dirs, &groups, &mut report)?;
        self.copy_plain_files(&dirs, &mut report)?;
        self.reconcile(&mut report)?;

        report.elapsed = started.elapsed();
        info!(
            rebuilt = report.total_rebuilt(),
            copied = report.files_copied,
            current = report.files_current,
            removed = report.removed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "build finished"
        );
        Ok(report)
    }

    /// Breadth-first list of source directories, parents first, siblings by name.
    fn enumerate(&mut self) -> Result<Vec<PathPair>> {
        let root = self.ctx.source_root().to_path_buf();
        let mut dirs = vec![PathPair::from_relative(&root, "")];
        let mut i = 0;
        while i < dirs.len() {
            for sub in list_dirs(dirs[i].absolute())? {
                let relative = dirs[i].child_relative(file_name_string(&sub));
                self.ctx.touched.insert(relative.clone());
                dirs.push(PathPair::from_relative(&root, relative));
            }
            i += 1;
        }
        Ok(dirs)
    }

    fn map_directories(&mut self, dirs: &[PathPair]) -> Result<AtlasGroupMap> {
        let mut groups = AtlasGroupMap::new();
        for dir in dirs {
            for mapper in &self.mappers {
                let outcome = mapper.map(dir, &mut groups, &mut self.ctx)?;
                if outcome != Outcome::NotApplicable {
                    debug!(dir = %dir, handler = mapper.name(), "mapped");
                }
            }
        }
        Ok(groups)
    }

    fn materialize(&self, dirs: &[PathPair]) -> Result<()> {
        for dir in dirs {
            let target = self.ctx.target_of(dir);
            std::fs::create_dir_all(target.absolute()).map_err(|e| BuildError::io(target.absolute(), e))?;
        }
        Ok(())
    }

    fn rebuild(&mut self, dirs: &[PathPair], groups: &AtlasGroupMap, report: &mut BuildReport) -> Result<()> {
        for dir in dirs {
            for rebuilder in &self.rebuilders {
                let outcome = rebuilder.build_map(dir, groups, &mut self.ctx)?;
                report.record(rebuilder.name(), outcome);
            }
        }
        Ok(())
    }

    fn copy_plain_files(&mut self, dirs: &[PathPair], report: &mut BuildReport) -> Result<()> {
        for dir in dirs {
            for file in list_files(dir.absolute(), None)? {
                if self.ctx.is_excluded(&file) {
                    continue;
                }
                let relative = dir.child_relative(file_name_string(&file));
                let target = self.ctx.target_root().join(&relative);
                self.ctx.touched.insert(relative);
                if is_older(modified(&target)?, modified(&file)?) {
                    std::fs::copy(&file, &target).map_err(|e| BuildError::io(&target, e))?;
                    debug!(file = %file.display(), "copied");
                    report.files_copied += 1;
                } else {
                    report.files_current += 1;
                }
            }
        }
        Ok(())
    }

    /// Deletes every target entry the run did not register. Directories that
    /// were not registered go with their whole subtree.
    fn reconcile(&mut self, report: &mut BuildReport) -> Result<()> {
        let root = self.ctx.target_root().to_path_buf();
        let mut it = WalkDir::new(&root).min_depth(1).sort_by_file_name().into_iter();
        while let Some(entry) = it.next() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&root).to_path_buf();
                BuildError::io(path, e.into())
            })?;
            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };
            let is_dir = entry.file_type().is_dir();
            let registered = self.ctx.touched.take(relative);
            if self.is_preserved(relative) {
                if is_dir {
                    it.skip_current_dir();
                }
                continue;
            }
            if registered {
                continue;
            }
            if is_dir {
                it.skip_current_dir();
                std::fs::remove_dir_all(entry.path()).map_err(|e| BuildError::io(entry.path(), e))?;
            } else {
                std::fs::remove_file(entry.path()).map_err(|e| BuildError::io(entry.path(), e))?;
            }
            debug!(path = %relative.display(), "removed stale output");
            report.removed += 1;
        }
        Ok(())
    }

    fn is_preserved(&self, relative: &Path) -> bool {
        self.ctx.config.preserve.iter().any(|p| relative.starts_with(p))
    }
}
