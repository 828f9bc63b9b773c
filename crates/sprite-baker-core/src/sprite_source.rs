//! Interface to sprite-editor files (multi-frame documents with tagged
//! sub-animations). Decoding the binary format is left to implementors of
//! [`SpriteDecoder`].

use crate::error::{BuildError, Result};
use crate::model::AtlasMapEntry;
use image::RgbaImage;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopDirection {
    #[default]
    Forward,
    Reverse,
    PingPong,
    PingPongReverse,
}

impl LoopDirection {
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::Reverse | Self::PingPongReverse)
    }

    pub fn is_ping_pong(self) -> bool {
        matches!(self, Self::PingPong | Self::PingPongReverse)
    }
}

/// One flattened frame.
#[derive(Debug, Clone)]
pub struct SpriteFrame {
    /// Unique within the file; becomes the atlas map name.
    pub name: String,
    pub duration_ms: u32,
    pub image: RgbaImage,
}

/// Inclusive frame range forming one animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteTag {
    pub name: String,
    pub from: usize,
    pub to: usize,
    /// 0 repeats forever.
    pub repeat: u16,
    pub direction: LoopDirection,
}

impl SpriteTag {
    pub fn is_looping(&self) -> bool {
        self.repeat != 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpriteSheet {
    pub frames: Vec<SpriteFrame>,
    pub tags: Vec<SpriteTag>,
}

impl SpriteSheet {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Checks tag ranges and frame-name uniqueness; `path` is used in errors.
    pub fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: String| BuildError::InvalidSprite {
            path: path.to_path_buf(),
            reason,
        };
        let mut seen = HashSet::new();
        for f in &self.frames {
            if let Some(problem) = AtlasMapEntry::name_problem(&f.name) {
                return Err(invalid(format!("frame '{}': {problem}", f.name)));
            }
            if !seen.insert(f.name.as_str()) {
                return Err(invalid(format!("duplicate frame name '{}'", f.name)));
            }
        }
        let mut tag_names = HashSet::new();
        for t in &self.tags {
            if t.name.is_empty() || t.name.contains(['/', '\\']) {
                return Err(invalid(format!("tag name '{}' cannot be used as a file name", t.name)));
            }
            if !tag_names.insert(t.name.as_str()) {
                return Err(invalid(format!("duplicate tag name '{}'", t.name)));
            }
            if t.from > t.to || t.to >= self.frames.len() {
                return Err(invalid(format!(
                    "tag '{}' spans frames {}..={} but the file has {} frames",
                    t.name,
                    t.from,
                    t.to,
                    self.frames.len()
                )));
            }
        }
        Ok(())
    }
}

/// Decodes one sprite-editor file format.
pub trait SpriteDecoder {
    /// File extension handled, without the dot.
    fn extension(&self) -> &str;
    fn decode(&self, path: &Path) -> Result<SpriteSheet>;
}
