use super::AtlasSlot;
use crate::animation::{ResolvedFrame, SpriteAnimation, to_json_pretty};
use crate::atlas::AtlasSprite;
use crate::atlas_index::AtlasIndex;
use crate::config::ext;
use crate::context::BuildContext;
use crate::error::{BuildError, Outcome, Result};
use crate::fs_util::{file_name_string, file_stem_string, is_older, list_files, modified};
use crate::groups::AtlasGroupMap;
use crate::handler::{Assessment, Mapper, Rebuilder, Staleness};
use crate::model::PathPair;
use crate::sprite_source::{SpriteDecoder, SpriteSheet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Emits one `.spriteanim` per tag of each sprite-editor file handled by its decoder.
#[derive(Clone)]
pub struct SpriteSourceHandler {
    decoder: Arc<dyn SpriteDecoder>,
}

impl SpriteSourceHandler {
    pub fn new(decoder: Arc<dyn SpriteDecoder>) -> Self {
        Self { decoder }
    }

    fn sources(&self, dir: &PathPair) -> Result<Vec<PathBuf>> {
        list_files(dir.absolute(), Some(self.decoder.extension()))
    }
}

/// Output file names for `sheet`: one per tag, or `<stem>.spriteanim` for an untagged file.
pub fn animation_files(sheet: &SpriteSheet, stem: &str) -> Vec<String> {
    if sheet.tags.is_empty() {
        vec![format!("{stem}.{}", ext::SPRITE_ANIM)]
    } else {
        sheet
            .tags
            .iter()
            .map(|t| format!("{}.{}", t.name, ext::SPRITE_ANIM))
            .collect()
    }
}

/// Animations for `sheet`, paired with their output file names.
fn animations(sheet: &SpriteSheet, stem: &str, index: &AtlasIndex, atlas: &str, source: &Path) -> Result<Vec<(String, SpriteAnimation)>> {
    let resolve = |from: usize, to: usize| -> Result<Vec<ResolvedFrame>> {
        sheet.frames[from..=to]
            .iter()
            .map(|f| Ok(ResolvedFrame::new(index.require(&f.name, source)?, f.duration_ms)))
            .collect()
    };
    let names = animation_files(sheet, stem);
    if sheet.tags.is_empty() {
        if sheet.frames.is_empty() {
            return Err(BuildError::InvalidSprite {
                path: source.to_path_buf(),
                reason: "file has no frames".into(),
            });
        }
        let frames = resolve(0, sheet.frames.len() - 1)?;
        return Ok(names
            .into_iter()
            .map(|n| (n, SpriteAnimation::whole_file(stem, frames.clone(), atlas)))
            .collect());
    }
    sheet
        .tags
        .iter()
        .zip(names)
        .map(|(tag, file)| Ok((file, SpriteAnimation::from_tag(tag, resolve(tag.from, tag.to)?, atlas))))
        .collect()
}

/// Registers `dir/file` as an output of `source`. A hand-written descriptor
/// with that name, or an earlier output claiming it, is an `OutputConflict`.
fn claim_output(dir: &PathPair, file: &str, source: &Path, ctx: &mut BuildContext) -> Result<()> {
    let conflict = |reason: String| BuildError::OutputConflict {
        path: ctx.target_root().join(dir.child_relative(file)),
        reason,
    };
    let descriptor = dir.absolute().join(file);
    if descriptor.is_file() {
        return Err(conflict(format!(
            "the output of descriptor '{}' (also produced by '{}')",
            descriptor.display(),
            source.display()
        )));
    }
    let relative = dir.child_relative(file);
    if ctx.touched.contains(&relative) {
        return Err(conflict(format!(
            "an animation already produced in this directory (again by '{}')",
            source.display()
        )));
    }
    ctx.touched.insert(relative);
    Ok(())
}

impl Mapper for SpriteSourceHandler {
    fn name(&self) -> &'static str {
        "spritesource"
    }

    fn map(&self, dir: &PathPair, _groups: &mut AtlasGroupMap, ctx: &mut BuildContext) -> Result<Outcome> {
        if !ctx.in_textures(dir) {
            return Ok(Outcome::NotApplicable);
        }
        let sources = self.sources(dir)?;
        if sources.is_empty() {
            return Ok(Outcome::NotApplicable);
        }
        for source in sources {
            ctx.exclude(source);
        }
        Ok(Outcome::UpToDate)
    }
}

impl Rebuilder for SpriteSourceHandler {
    fn name(&self) -> &'static str {
        "spritesource"
    }

    fn build_map(&self, dir: &PathPair, groups: &AtlasGroupMap, ctx: &mut BuildContext) -> Result<Outcome> {
        if !ctx.in_textures(dir) {
            return Ok(Outcome::NotApplicable);
        }
        let sources = self.sources(dir)?;
        if sources.is_empty() {
            return Ok(Outcome::NotApplicable);
        }

        let target = ctx.target_of(dir);
        let mut outcome = Outcome::UpToDate;
        for source in sources {
            ctx.exclude(source.clone());
            let stem = file_stem_string(&source);
            let source_rel = dir.child_relative(file_name_string(&source));
            let slot = AtlasSlot::resolve(dir, &stem, groups);
            slot.claim(ctx)?;
            slot.check_loose_sources(ctx)?;

            let map_path = slot.map_path(ctx.target_root());
            let relevant = [source.clone(), map_path.clone()];
            let assessment = self.should_update(&relevant, dir, ctx)?;
            let stale = assessment.is_stale();
            let sheet = assessment.loaded;
            for file in animation_files(&sheet, &stem) {
                claim_output(dir, &file, &source, ctx)?;
            }
            if !stale {
                debug!(source = %source_rel.display(), "sprite animations up to date");
                continue;
            }

            let index = if slot.is_private() {
                let sprites = sheet
                    .frames
                    .iter()
                    .map(|f| AtlasSprite::new(f.name.clone(), f.image.clone()))
                    .collect();
                slot.write_private(sprites, ctx)?
            } else {
                AtlasIndex::load(&map_path)?
            };
            let anims = animations(&sheet, &stem, &index, &slot.reference(), &source)?;
            for (file, anim) in &anims {
                let output = target.absolute().join(file);
                let json = to_json_pretty(anim, &output)?;
                std::fs::write(&output, json).map_err(|e| BuildError::io(&output, e))?;
            }
            info!(
                source = %source_rel.display(),
                animations = anims.len(),
                atlas = %slot.reference(),
                "sprite animations rebuilt"
            );
            outcome = Outcome::Rebuilt;
        }
        Ok(outcome)
    }
}

impl Staleness for SpriteSourceHandler {
    type Loaded = SpriteSheet;

    /// `relevant` is `[sprite file, atlas map]`; the animation outputs are
    /// derived from the decoded tags.
    fn should_update(&self, relevant: &[PathBuf], dir: &PathPair, ctx: &BuildContext) -> Result<Assessment<Self::Loaded>> {
        let [source, map_path, ..] = relevant else {
            return Err(BuildError::InvalidConfig(format!(
                "sprite check in '{}' needs the sprite file and atlas map paths",
                dir
            )));
        };
        let sheet = self.decoder.decode(source)?;
        sheet.validate(source)?;

        let source_time = modified(source)?;
        let map_time = modified(map_path)?;
        if is_older(map_time, source_time) {
            return Ok(Assessment::proceed(sheet));
        }
        let target = ctx.target_of(dir);
        for file in animation_files(&sheet, &file_stem_string(source)) {
            let output_time = modified(&target.absolute().join(file))?;
            if is_older(output_time, source_time) || is_older(output_time, map_time) {
                return Ok(Assessment::proceed(sheet));
            }
        }
        Ok(Assessment::skip(sheet))
    }
}
