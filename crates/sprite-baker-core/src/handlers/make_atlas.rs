use crate::atlas::{AtlasSprite, compose_atlas, write_atlas};
use crate::atlas_index::AtlasIndex;
use crate::config::ext;
use crate::context::BuildContext;
use crate::error::{BuildError, Outcome, Result};
use crate::fs_util::{file_name_string, file_stem_string, has_extension, is_older, list_files, modified, newest};
use crate::groups::AtlasGroupMap;
use crate::handler::{Assessment, Mapper, Rebuilder, Staleness};
use crate::model::{AtlasMapEntry, PathPair};
use crate::sprite_source::{SpriteDecoder, SpriteSheet};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Marker-file handler.
///
/// A directory holding `<name>.makeatlas` becomes an atlas group; it and every
/// directory below it contribute their loose PNGs (and, when decoders are
/// registered, the frames of their sprite-editor files) to `<name>.png` and
/// `<name>.atlasmap` in the group's target directory.
#[derive(Clone, Default)]
pub struct MakeAtlasHandler {
    decoders: Vec<Arc<dyn SpriteDecoder>>,
}

/// A sprite-editor file feeding a group atlas, decoded by the freshness check.
#[derive(Debug)]
pub struct DecodedSource {
    pub path: PathBuf,
    pub sheet: SpriteSheet,
}

impl MakeAtlasHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decoders(decoders: Vec<Arc<dyn SpriteDecoder>>) -> Self {
        Self { decoders }
    }

    fn decoder_for(&self, path: &Path) -> Option<&Arc<dyn SpriteDecoder>> {
        self.decoders.iter().find(|d| has_extension(path, d.extension()))
    }

    /// Loose images and sprite sources of every member, in member order.
    fn gather_inputs(&self, members: &[PathPair]) -> Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        for member in members {
            for file in list_files(member.absolute(), None)? {
                if has_extension(&file, ext::PNG) || self.decoder_for(&file).is_some() {
                    out.push(file);
                }
            }
        }
        Ok(out)
    }
}

fn marker_of(dir: &PathPair) -> Result<Option<PathBuf>> {
    let mut markers = list_files(dir.absolute(), Some(ext::MAKE_ATLAS))?;
    if markers.len() > 1 {
        return Err(BuildError::MultipleMarkers {
            dir: dir.absolute().to_path_buf(),
        });
    }
    Ok(markers.pop())
}

impl Mapper for MakeAtlasHandler {
    fn name(&self) -> &'static str {
        "makeatlas"
    }

    fn map(&self, dir: &PathPair, groups: &mut AtlasGroupMap, ctx: &mut BuildContext) -> Result<Outcome> {
        if !ctx.in_textures(dir) {
            return Ok(Outcome::NotApplicable);
        }
        match marker_of(dir)? {
            Some(marker) => {
                if let Some((key, _)) = groups.covering_group(dir) {
                    if key != dir {
                        return Err(BuildError::NestedMarker {
                            dir: dir.absolute().to_path_buf(),
                            covered_by: key.absolute().to_path_buf(),
                        });
                    }
                }
                let name = file_stem_string(&marker);
                if groups.insert_group(dir.clone(), name.as_str()) {
                    debug!(dir = %dir, atlas = %name, "atlas group");
                }
                ctx.exclude(marker);
            }
            None => {
                if groups.append_member(dir).is_none() {
                    return Ok(Outcome::NotApplicable);
                }
            }
        }
        for image in list_files(dir.absolute(), Some(ext::PNG))? {
            ctx.exclude(image);
        }
        Ok(Outcome::UpToDate)
    }
}

impl Rebuilder for MakeAtlasHandler {
    fn name(&self) -> &'static str {
        "makeatlas"
    }

    fn build_map(&self, dir: &PathPair, groups: &AtlasGroupMap, ctx: &mut BuildContext) -> Result<Outcome> {
        if !ctx.in_textures(dir) {
            return Ok(Outcome::NotApplicable);
        }
        let Some(group) = groups.group(dir) else {
            return Ok(Outcome::NotApplicable);
        };

        let png_name = format!("{}.{}", group.target_name, ext::PNG);
        let map_name = format!("{}.{}", group.target_name, ext::ATLAS_MAP);
        ctx.touch_in(dir, &png_name);
        ctx.touch_in(dir, &map_name);

        let target = ctx.target_of(dir);
        let atlas_rel = target.child_relative(&png_name);
        let png_path = target.absolute().join(&png_name);
        let map_path = target.absolute().join(&map_name);
        let mut relevant = vec![map_path.clone(), png_path.clone()];
        relevant.extend(self.gather_inputs(&group.members)?);

        let assessment = self.should_update(&relevant, dir, ctx)?;
        if !assessment.is_stale() {
            debug!(atlas = %atlas_rel.display(), "atlas up to date");
            return Ok(Outcome::UpToDate);
        }

        let mut sprites = Vec::new();
        for input in relevant[2..].iter().filter(|p| has_extension(p, ext::PNG)) {
            let image = image::open(input)
                .map_err(|e| BuildError::image(input, e))?
                .to_rgba8();
            sprites.push(AtlasSprite::new(file_name_string(input), image));
        }
        for source in assessment.loaded {
            debug!(source = %source.path.display(), frames = source.sheet.frame_count(), "adding sprite frames");
            sprites.extend(
                source
                    .sheet
                    .frames
                    .into_iter()
                    .map(|f| AtlasSprite::new(f.name, f.image)),
            );
        }

        let count = sprites.len();
        let atlas = compose_atlas(sprites, &ctx.atlas_options())?;
        write_atlas(&atlas, &png_path, &map_path)?;
        info!(
            atlas = %atlas_rel.display(),
            sprites = count,
            width = atlas.width(),
            height = atlas.height(),
            "atlas rebuilt"
        );
        Ok(Outcome::Rebuilt)
    }
}

impl Staleness for MakeAtlasHandler {
    type Loaded = Vec<DecodedSource>;

    /// `relevant` is `[atlas map, atlas png, inputs...]`.
    ///
    /// Besides timestamps, the sprite names recorded in the existing map must
    /// match the current inputs, so deleting or renaming an input rebuilds
    /// the atlas too.
    fn should_update(&self, relevant: &[PathBuf], _dir: &PathPair, _ctx: &BuildContext) -> Result<Assessment<Self::Loaded>> {
        let [map_path, png_path, inputs @ ..] = relevant else {
            return Ok(Assessment::proceed(Vec::new()));
        };

        let mut decoded = Vec::new();
        let mut names = Vec::new();
        for input in inputs {
            match self.decoder_for(input) {
                Some(decoder) => {
                    let sheet = decoder.decode(input)?;
                    sheet.validate(input)?;
                    names.extend(sheet.frames.iter().map(|f| f.name.clone()));
                    decoded.push(DecodedSource {
                        path: input.clone(),
                        sheet,
                    });
                }
                None => {
                    let name = file_name_string(input);
                    if let Some(problem) = AtlasMapEntry::name_problem(&name) {
                        return Err(BuildError::InvalidSprite {
                            path: input.clone(),
                            reason: problem.to_string(),
                        });
                    }
                    names.push(name);
                }
            }
        }
        let mut seen = HashSet::new();
        if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(BuildError::DuplicateSprite {
                path: map_path.clone(),
                name: dup.clone(),
            });
        }

        let newest_input = newest(inputs)?;
        if is_older(modified(map_path)?, newest_input) || is_older(modified(png_path)?, newest_input) {
            return Ok(Assessment::proceed(decoded));
        }

        let current = match AtlasIndex::load(map_path) {
            Ok(index) => index,
            Err(e) => {
                debug!(error = %e, "existing atlas map unreadable");
                return Ok(Assessment::proceed(decoded));
            }
        };
        let expected: HashSet<&str> = names.iter().map(String::as_str).collect();
        let recorded: HashSet<&str> = current.names().iter().map(String::as_str).collect();
        if expected != recorded {
            return Ok(Assessment::proceed(decoded));
        }
        Ok(Assessment::skip(decoded))
    }
}
