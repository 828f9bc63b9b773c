use crate::context::BuildContext;
use crate::error::{Outcome, Result};
use crate::groups::AtlasGroupMap;
use crate::model::PathPair;
use std::path::PathBuf;

/// Mapping-pass capability: inspects one source directory before anything is built.
///
/// Must be idempotent for an unchanged directory. Returns `NotApplicable` for
/// directories the handler ignores and `UpToDate` once it has claimed one.
pub trait Mapper {
    fn name(&self) -> &'static str;
    fn map(&self, dir: &PathPair, groups: &mut AtlasGroupMap, ctx: &mut BuildContext) -> Result<Outcome>;
}

/// Build-pass capability: regenerates this handler's artifacts for one directory.
///
/// Implementations register every output in `ctx.touched` whether or not they
/// regenerate it, and only write after their `Staleness` check says `Proceed`.
pub trait Rebuilder {
    fn name(&self) -> &'static str;
    fn build_map(&self, dir: &PathPair, groups: &AtlasGroupMap, ctx: &mut BuildContext) -> Result<Outcome>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Outputs are missing or older than an input.
    Proceed,
    /// Outputs are current.
    Skip,
}

/// Result of a freshness check, with whatever the check had to load.
#[derive(Debug)]
pub struct Assessment<T> {
    pub verdict: Verdict,
    pub loaded: T,
}

impl<T> Assessment<T> {
    pub fn proceed(loaded: T) -> Self {
        Self {
            verdict: Verdict::Proceed,
            loaded,
        }
    }

    pub fn skip(loaded: T) -> Self {
        Self {
            verdict: Verdict::Skip,
            loaded,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.verdict == Verdict::Proceed
    }
}

/// Read-only freshness oracle used by a `Rebuilder` before regenerating.
///
/// `relevant` lists the declared inputs and outputs; each handler documents
/// its layout. Anything parsed or decoded on the way is handed back in
/// `Assessment::loaded` so regeneration does not load it twice.
pub trait Staleness {
    type Loaded;
    fn should_update(&self, relevant: &[PathBuf], dir: &PathPair, ctx: &BuildContext) -> Result<Assessment<Self::Loaded>>;
}
