use super::AtlasSlot;
use crate::animation::{AnimDescriptor, to_json_pretty};
use crate::atlas::AtlasSprite;
use crate::atlas_index::AtlasIndex;
use crate::config::ext;
use crate::context::BuildContext;
use crate::error::{BuildError, Outcome, Result};
use crate::fs_util::{file_name_string, file_stem_string, is_older, list_files, modified, newest};
use crate::groups::AtlasGroupMap;
use crate::handler::{Assessment, Rebuilder, Staleness};
use crate::model::{AtlasMapEntry, PathPair};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolves `*.spriteanim` descriptors against an atlas map.
///
/// Inside an atlas group the group's map is used; elsewhere the referenced
/// frame images are packed into a private `<stem>.png`/`<stem>.atlasmap`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpriteAnimHandler;

/// Descriptor parsed by the freshness check.
#[derive(Debug)]
pub struct LoadedDescriptor {
    pub descriptor: AnimDescriptor,
    /// Referenced frame images, first occurrence order, no repeats.
    pub frame_files: Vec<PathBuf>,
}

fn frame_files(descriptor: &AnimDescriptor, base: &Path) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    descriptor
        .frames
        .iter()
        .map(|f| base.join(&f.name))
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

fn load_frames(files: &[PathBuf], map_path: &Path) -> Result<Vec<AtlasSprite>> {
    let mut names = HashSet::new();
    let mut sprites = Vec::with_capacity(files.len());
    for file in files {
        if !file.is_file() {
            return Err(BuildError::MissingFile { path: file.clone() });
        }
        let name = file_name_string(file);
        if let Some(problem) = AtlasMapEntry::name_problem(&name) {
            return Err(BuildError::InvalidSprite {
                path: file.clone(),
                reason: problem.to_string(),
            });
        }
        if !names.insert(name.clone()) {
            return Err(BuildError::DuplicateSprite {
                path: map_path.to_path_buf(),
                name,
            });
        }
        let image = image::open(file)
            .map_err(|e| BuildError::image(file, e))?
            .to_rgba8();
        sprites.push(AtlasSprite::new(name, image));
    }
    Ok(sprites)
}

impl Rebuilder for SpriteAnimHandler {
    fn name(&self) -> &'static str {
        "spriteanim"
    }

    fn build_map(&self, dir: &PathPair, groups: &AtlasGroupMap, ctx: &mut BuildContext) -> Result<Outcome> {
        if !ctx.in_textures(dir) {
            return Ok(Outcome::NotApplicable);
        }
        let descriptors = list_files(dir.absolute(), Some(ext::SPRITE_ANIM))?;
        if descriptors.is_empty() {
            return Ok(Outcome::NotApplicable);
        }

        let target = ctx.target_of(dir);
        let mut outcome = Outcome::UpToDate;
        for source in descriptors {
            ctx.exclude(source.clone());
            let file_name = file_name_string(&source);
            let output_rel = dir.child_relative(&file_name);
            ctx.touched.insert(output_rel.clone());

            let slot = AtlasSlot::resolve(dir, &file_stem_string(&source), groups);
            slot.claim(ctx)?;

            let output = target.absolute().join(&file_name);
            let map_path = slot.map_path(ctx.target_root());
            let relevant = [source.clone(), output.clone(), map_path.clone()];
            let assessment = self.should_update(&relevant, dir, ctx)?;
            for frame in &assessment.loaded.frame_files {
                ctx.exclude(frame.clone());
            }
            slot.check_loose_sources(ctx)?;
            if !assessment.is_stale() {
                debug!(animation = %output_rel.display(), "animation up to date");
                continue;
            }

            let loaded = assessment.loaded;
            let index = if slot.is_private() {
                slot.write_private(load_frames(&loaded.frame_files, &map_path)?, ctx)?
            } else {
                AtlasIndex::load(&map_path)?
            };
            let resolved = loaded.descriptor.resolve(&index, &slot.reference(), &source)?;
            let json = to_json_pretty(&resolved, &output)?;
            std::fs::write(&output, json).map_err(|e| BuildError::io(&output, e))?;
            info!(
                animation = %output_rel.display(),
                frames = resolved.frames.len(),
                atlas = %resolved.atlas,
                "animation rebuilt"
            );
            outcome = Outcome::Rebuilt;
        }
        Ok(outcome)
    }
}

impl Staleness for SpriteAnimHandler {
    type Loaded = LoadedDescriptor;

    /// `relevant` is `[descriptor, resolved output, atlas map]`.
    ///
    /// The descriptor is always parsed, so a malformed file fails the build
    /// even when its output looks current.
    fn should_update(&self, relevant: &[PathBuf], dir: &PathPair, _ctx: &BuildContext) -> Result<Assessment<Self::Loaded>> {
        let [source, output, map_path, ..] = relevant else {
            return Err(BuildError::InvalidConfig(format!(
                "animation check in '{}' needs descriptor, output and atlas map paths",
                dir
            )));
        };
        let descriptor = AnimDescriptor::load(source)?;
        let base = source.parent().unwrap_or(dir.absolute());
        let loaded = LoadedDescriptor {
            frame_files: frame_files(&descriptor, base),
            descriptor,
        };

        let output_time = modified(output)?;
        let map_time = modified(map_path)?;
        let stale = is_older(output_time, modified(source)?)
            || map_time.is_none()
            || is_older(output_time, map_time)
            || is_older(map_time, newest(&loaded.frame_files)?);
        Ok(if stale {
            Assessment::proceed(loaded)
        } else {
            Assessment::skip(loaded)
        })
    }
}
