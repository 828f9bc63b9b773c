//! Atlas composition: trims, packs and blits sprites onto one power-of-two
//! canvas and produces the line-ordered atlas map.
//!
//! ```ignore
//! let sprites = vec![AtlasSprite::new("hero.png", hero_rgba)];
//! let atlas = compose_atlas(sprites, &AtlasOptions::default())?;
//! write_atlas(&atlas, "out/hero.png", "out/hero.atlasmap")?;
//! ```

use crate::compositing::{blit_rgba, compute_trim_rect, next_pow2};
use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::model::{AtlasMapEntry, PackedRect, Rect};
use crate::packer::{SpaceAllocator, free_list::FreeListAllocator};
use image::{ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// In-memory sprite to pack (name + decoded pixels).
pub struct AtlasSprite {
    /// Name written to the map's first field, usually the source file name.
    pub name: String,
    pub image: RgbaImage,
}

impl AtlasSprite {
    pub fn new(name: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasOptions {
    /// Canvas bound per axis; must be a power of two.
    pub max_size: u32,
    /// Pixels reserved to the right and below every sprite.
    pub padding: u32,
    pub trim: bool,
    pub premultiply_alpha: bool,
}

impl Default for AtlasOptions {
    fn default() -> Self {
        Self {
            max_size: 4096,
            padding: 1,
            trim: false,
            premultiply_alpha: true,
        }
    }
}

impl From<&BuildConfig> for AtlasOptions {
    fn from(cfg: &BuildConfig) -> Self {
        Self {
            max_size: cfg.max_sheet_size,
            padding: cfg.padding,
            trim: cfg.trim,
            premultiply_alpha: cfg.premultiply_alpha,
        }
    }
}

/// Output of `compose_atlas`: the canvas, placements and map entries.
pub struct ComposedAtlas {
    pub image: RgbaImage,
    /// Placed rectangles, in placement order.
    pub rects: Vec<PackedRect>,
    /// One entry per rectangle, same order as `rects`.
    pub entries: Vec<AtlasMapEntry>,
    /// Far edges reported by the allocator.
    pub used_extent: (u32, u32),
}

impl ComposedAtlas {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Newline-terminated map text, one entry per line.
    pub fn map_text(&self) -> String {
        let mut out = String::new();
        for e in &self.entries {
            out.push_str(&e.to_line());
            out.push('\n');
        }
        out
    }
}

#[instrument(skip_all, fields(sprites = sprites.len()))]
/// Packs `sprites` into a single canvas.
///
/// Notes:
/// - Sprites are placed largest padded area first; ties break on name so the output is deterministic.
/// - The canvas is rounded up to powers of two per axis and never exceeds `max_size`.
/// - Overflowing the sheet is an error; there is no second sheet.
/// - Names that cannot be written to a map line are rejected before packing.
pub fn compose_atlas(sprites: Vec<AtlasSprite>, opts: &AtlasOptions) -> Result<ComposedAtlas> {
    for s in &sprites {
        if let Some(problem) = AtlasMapEntry::name_problem(&s.name) {
            return Err(BuildError::InvalidSprite {
                path: PathBuf::from(&s.name),
                reason: problem.to_string(),
            });
        }
    }
    let mut allocator = FreeListAllocator::new(opts.max_size, opts.max_size)?;

    let mut prepared: Vec<(PackedRect, RgbaImage)> = sprites
        .into_iter()
        .map(|s| {
            let (iw, ih) = s.image.dimensions();
            let content = if opts.trim {
                // fully transparent sprites keep their whole area
                compute_trim_rect(&s.image).unwrap_or(Rect::new(0, 0, iw, ih))
            } else {
                Rect::new(0, 0, iw, ih)
            };
            let rect = PackedRect {
                name: s.name,
                content,
                source_size: (iw, ih),
                padded_w: content.w + opts.padding,
                padded_h: content.h + opts.padding,
                position: None,
            };
            (rect, s.image)
        })
        .collect();

    prepared.sort_by(|(a, _), (b, _)| {
        b.padded_area()
            .cmp(&a.padded_area())
            .then_with(|| a.name.cmp(&b.name))
    });

    let total = prepared.len();
    for (i, (rect, _)) in prepared.iter_mut().enumerate() {
        let pos = allocator
            .pack(rect.padded_w, rect.padded_h)
            .map_err(|e| match e {
                BuildError::OutOfSpace {
                    max_width,
                    max_height,
                    ..
                } => BuildError::OutOfSpace {
                    max_width,
                    max_height,
                    placed: i,
                    total,
                },
                other => other,
            })?;
        rect.position = Some(pos);
    }

    let used_extent = allocator.used_extent();
    let canvas_w = next_pow2(used_extent.0);
    let canvas_h = next_pow2(used_extent.1);
    debug!(canvas_w, canvas_h, used_w = used_extent.0, used_h = used_extent.1, "canvas size");

    let mut canvas = RgbaImage::new(canvas_w, canvas_h);
    let mut rects = Vec::with_capacity(total);
    let mut entries = Vec::with_capacity(total);
    for (rect, image) in prepared {
        let (x, y) = rect.position.unwrap_or_default();
        blit_rgba(&image, rect.content, &mut canvas, x, y, opts.premultiply_alpha);
        entries.push(AtlasMapEntry {
            sprite_file_name: rect.name.clone(),
            sheet_index: 0,
            x,
            y,
            width: rect.content.w,
            height: rect.content.h,
            pivot_x: pivot(rect.source_size.0, rect.content.x),
            pivot_y: pivot(rect.source_size.1, rect.content.y),
        });
        rects.push(rect);
    }

    Ok(ComposedAtlas {
        image: canvas,
        rects,
        entries,
        used_extent,
    })
}

/// Half the untrimmed extent (rounded up), shifted by the trim offset.
fn pivot(source_extent: u32, trim_offset: u32) -> i32 {
    source_extent.div_ceil(2) as i32 - trim_offset as i32
}

/// Encodes the canvas as PNG and writes the map text next to it.
pub fn write_atlas(atlas: &ComposedAtlas, png_path: &Path, map_path: &Path) -> Result<()> {
    atlas
        .image
        .save_with_format(png_path, ImageFormat::Png)
        .map_err(|e| BuildError::image(png_path, e))?;
    std::fs::write(map_path, atlas.map_text()).map_err(|e| BuildError::io(map_path, e))?;
    Ok(())
}
