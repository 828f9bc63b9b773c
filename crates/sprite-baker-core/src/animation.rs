use crate::atlas_index::AtlasIndex;
use crate::error::{BuildError, Result};
use crate::sprite_source::SpriteTag;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// A hand-written animation descriptor as found in the source tree.
///
/// Unknown fields are carried through to the output untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct AnimDescriptor {
    pub frames: Vec<DescriptorFrame>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescriptorFrame {
    /// Image path relative to the descriptor's directory.
    pub name: String,
    /// Copied to the output as written, so fractional or string durations survive.
    pub duration: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnimDescriptor {
    pub fn from_json(text: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| BuildError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        Self::from_json(&text, path)
    }

    /// Replaces every frame name with its index in `index` and binds the result to `atlas`.
    pub fn resolve(self, index: &AtlasIndex, atlas: &str, referrer: &Path) -> Result<ResolvedAnimation> {
        let frames = self
            .frames
            .into_iter()
            .map(|f| {
                let key = sprite_key(&f.name);
                Ok(ResolvedFrame {
                    name: index.require(&key, referrer)?,
                    duration: f.duration,
                    extra: f.extra,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let mut extra = self.extra;
        extra.remove("atlas");
        Ok(ResolvedAnimation {
            frames,
            atlas: atlas.to_string(),
            extra,
        })
    }
}

/// Atlas map name of a descriptor frame: its file name.
pub fn sprite_key(frame_name: &str) -> String {
    Path::new(frame_name)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| frame_name.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFrame {
    /// Frame index in the atlas map.
    pub name: usize,
    pub duration: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResolvedFrame {
    pub fn new(name: usize, duration_ms: u32) -> Self {
        Self {
            name,
            duration: Value::from(duration_ms),
            extra: Map::new(),
        }
    }
}

/// Descriptor output with frame names resolved to atlas indices.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedAnimation {
    pub frames: Vec<ResolvedFrame>,
    pub atlas: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Animation generated from a sprite-editor file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteAnimation {
    pub name: String,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub ping_pong: bool,
    pub reverse: bool,
    pub frames: Vec<ResolvedFrame>,
    pub atlas: String,
}

impl SpriteAnimation {
    /// Builds the animation for `tag` from `(frame index, duration)` pairs.
    pub fn from_tag(tag: &SpriteTag, frames: Vec<ResolvedFrame>, atlas: &str) -> Self {
        Self {
            name: tag.name.clone(),
            looping: tag.is_looping(),
            ping_pong: tag.direction.is_ping_pong(),
            reverse: tag.direction.is_reversed(),
            frames,
            atlas: atlas.to_string(),
        }
    }

    /// Untagged files play every frame forward, looping.
    pub fn whole_file(name: &str, frames: Vec<ResolvedFrame>, atlas: &str) -> Self {
        Self {
            name: name.to_string(),
            looping: true,
            ping_pong: false,
            reverse: false,
            frames,
            atlas: atlas.to_string(),
        }
    }
}

/// Pretty JSON for any animation output.
pub fn to_json_pretty<T: Serialize>(value: &T, path: &Path) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|source| BuildError::Json {
        path: path.to_path_buf(),
        source,
    })
}
