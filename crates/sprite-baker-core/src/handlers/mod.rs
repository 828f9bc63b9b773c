//! Built-in handlers and the default registration order.

pub mod make_atlas;
pub mod sprite_anim;
pub mod sprite_source;

pub use make_atlas::MakeAtlasHandler;
pub use sprite_anim::SpriteAnimHandler;
pub use sprite_source::SpriteSourceHandler;

use crate::atlas::{AtlasSprite, compose_atlas, write_atlas};
use crate::atlas_index::AtlasIndex;
use crate::config::ext;
use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::fs_util::{add_extension, slash_path};
use crate::groups::AtlasGroupMap;
use crate::handler::{Mapper, Rebuilder};
use crate::model::PathPair;
use crate::sprite_source::SpriteDecoder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Mappers in the order the engine runs them.
pub fn default_mappers(decoders: &[Arc<dyn SpriteDecoder>]) -> Vec<Box<dyn Mapper>> {
    let mut out: Vec<Box<dyn Mapper>> = vec![Box::new(MakeAtlasHandler::with_decoders(decoders.to_vec()))];
    for d in decoders {
        out.push(Box::new(SpriteSourceHandler::new(Arc::clone(d))));
    }
    out
}

/// Rebuilders in the order the engine runs them. Atlases come first so the
/// animation handlers of the same directory can read the fresh map.
pub fn default_rebuilders(decoders: &[Arc<dyn SpriteDecoder>]) -> Vec<Box<dyn Rebuilder>> {
    let mut out: Vec<Box<dyn Rebuilder>> = vec![
        Box::new(MakeAtlasHandler::with_decoders(decoders.to_vec())),
        Box::new(SpriteAnimHandler),
    ];
    for d in decoders {
        out.push(Box::new(SpriteSourceHandler::new(Arc::clone(d))));
    }
    out
}

/// Where an animation's frames live: the covering group's atlas, or a
/// private atlas next to the animation source.
#[derive(Debug, Clone)]
pub(crate) enum AtlasSlot {
    Group { key: PathPair, base: PathBuf },
    Private { base: PathBuf },
}

impl AtlasSlot {
    pub(crate) fn resolve(dir: &PathPair, stem: &str, groups: &AtlasGroupMap) -> Self {
        match groups.covering_group(dir) {
            Some((key, group)) => Self::Group {
                key: key.clone(),
                base: key.child_relative(&group.target_name),
            },
            None => Self::Private {
                base: dir.child_relative(stem),
            },
        }
    }

    /// Target-relative atlas path without extension.
    pub(crate) fn base(&self) -> &Path {
        match self {
            Self::Group { base, .. } | Self::Private { base } => base,
        }
    }

    pub(crate) fn is_private(&self) -> bool {
        matches!(self, Self::Private { .. })
    }

    /// Value written to an animation's `atlas` field.
    pub(crate) fn reference(&self) -> String {
        slash_path(self.base())
    }

    pub(crate) fn map_path(&self, target_root: &Path) -> PathBuf {
        target_root.join(add_extension(self.base(), ext::ATLAS_MAP))
    }

    pub(crate) fn png_path(&self, target_root: &Path) -> PathBuf {
        target_root.join(add_extension(self.base(), ext::PNG))
    }

    /// Registers a private atlas as output; a group atlas must already exist.
    /// Two private atlases with the same target path are an `OutputConflict`.
    pub(crate) fn claim(&self, ctx: &mut BuildContext) -> Result<()> {
        match self {
            Self::Private { base } => {
                for file in [add_extension(base, ext::PNG), add_extension(base, ext::ATLAS_MAP)] {
                    if ctx.touched.contains(&file) {
                        return Err(BuildError::OutputConflict {
                            path: ctx.target_root().join(&file),
                            reason: "another private atlas of this directory".into(),
                        });
                    }
                    ctx.touched.insert(file);
                }
                Ok(())
            }
            Self::Group { key, .. } => {
                if self.map_path(ctx.target_root()).is_file() {
                    Ok(())
                } else {
                    Err(BuildError::MissingAtlasMap {
                        dir: key.absolute().to_path_buf(),
                    })
                }
            }
        }
    }

    /// Fails when a private atlas file has a same-named source file that would
    /// otherwise be copied over it. Call once the handler has excluded its inputs.
    pub(crate) fn check_loose_sources(&self, ctx: &BuildContext) -> Result<()> {
        let Self::Private { base } = self else {
            return Ok(());
        };
        for file in [add_extension(base, ext::PNG), add_extension(base, ext::ATLAS_MAP)] {
            let source = ctx.source_root().join(&file);
            if source.is_file() && !ctx.is_excluded(&source) {
                return Err(BuildError::OutputConflict {
                    path: ctx.target_root().join(&file),
                    reason: format!("the copy of '{}'", source.display()),
                });
            }
        }
        Ok(())
    }

    /// Packs `sprites` into this private atlas and returns the index of what was written.
    pub(crate) fn write_private(&self, sprites: Vec<AtlasSprite>, ctx: &BuildContext) -> Result<AtlasIndex> {
        let png_path = self.png_path(ctx.target_root());
        let map_path = self.map_path(ctx.target_root());
        let count = sprites.len();
        let atlas = compose_atlas(sprites, &ctx.atlas_options())?;
        write_atlas(&atlas, &png_path, &map_path)?;
        info!(
            atlas = %self.reference(),
            sprites = count,
            width = atlas.width(),
            height = atlas.height(),
            "private atlas rebuilt"
        );
        AtlasIndex::parse(&atlas.map_text(), &map_path)
    }
}
