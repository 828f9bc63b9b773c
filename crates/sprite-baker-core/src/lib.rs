//! Incremental content build engine for 2D games.
//!
//! - Mirrors a source content tree into a target tree, copying plain files only when stale
//! - Directories holding a `*.makeatlas` marker (and everything below them) are packed into one atlas
//! - `*.spriteanim` descriptors are resolved to atlas frame indices; sprite-editor files go through a `SpriteDecoder`
//! - Anything in the target the run did not produce is swept at the end
//!
//! Quick example:
//! ```ignore
//! use sprite_baker_core::prelude::*;
//! # fn main() -> Result<(), BuildError> {
//! let cfg = BuildConfig::builder()
//!     .source_dir("Content")
//!     .target_dir("out/Content")
//!     .build();
//! let report = ContentBuilder::new(cfg).build()?;
//! println!("rebuilt: {}", report.total_rebuilt());
//! # Ok(()) }
//! ```

pub mod animation;
pub mod atlas;
pub mod atlas_index;
pub mod compositing;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod fs_util;
pub mod groups;
pub mod handler;
pub mod handlers;
pub mod model;
pub mod packer;
pub mod sprite_source;

pub use atlas::*;
pub use atlas_index::AtlasIndex;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use model::*;
pub use packer::*;

/// Convenience prelude for common types and functions.
/// Importing `sprite_baker_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::atlas::{AtlasOptions, AtlasSprite, ComposedAtlas, compose_atlas, write_atlas};
    pub use crate::atlas_index::AtlasIndex;
    pub use crate::config::{BuildConfig, BuildConfigBuilder};
    pub use crate::context::{BuildContext, TouchedPaths};
    pub use crate::engine::{BuildReport, ContentBuilder, HandlerTally};
    pub use crate::error::{BuildError, Outcome};
    pub use crate::groups::AtlasGroupMap;
    pub use crate::handler::{Assessment, Mapper, Rebuilder, Staleness, Verdict};
    pub use crate::model::{AtlasGroup, AtlasMapEntry, PathPair, Rect};
    pub use crate::sprite_source::{LoopDirection, SpriteDecoder, SpriteFrame, SpriteSheet, SpriteTag};
}
