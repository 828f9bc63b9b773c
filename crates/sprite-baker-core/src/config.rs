use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File extensions recognized by the built-in handlers (without the leading dot).
pub mod ext {
    /// Marker file designating a directory as an atlas target.
    pub const MAKE_ATLAS: &str = "makeatlas";
    /// Line-ordered atlas map emitted next to every atlas image.
    pub const ATLAS_MAP: &str = "atlasmap";
    /// Sprite animation descriptor (JSON).
    pub const SPRITE_ANIM: &str = "spriteanim";
    pub const PNG: &str = "png";
}

/// Build configuration.
/// Key notes:
///   - `textures_dir` limits atlas/animation handlers to one subtree of the source root
///   - `max_sheet_size` bounds every atlas canvas and must be a power of two
///   - `preserve` lists target-relative paths that reconciliation never deletes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Root of the source asset tree (never written).
    pub source_dir: PathBuf,
    /// Root of the output tree.
    pub target_dir: PathBuf,
    /// Source-relative subtree handled by the atlas and animation handlers.
    /// Empty means the whole tree.
    #[serde(default = "default_textures_dir")]
    pub textures_dir: PathBuf,

    /// Maximum atlas width and height in pixels.
    #[serde(default = "default_max_sheet_size")]
    pub max_sheet_size: u32,
    /// Pixels added to the right and bottom of every sprite.
    #[serde(default = "default_padding")]
    pub padding: u32,
    /// Trim fully transparent borders before packing.
    #[serde(default)]
    pub trim: bool,
    /// Premultiply color by alpha when composing atlas images.
    #[serde(default = "default_premultiply")]
    pub premultiply_alpha: bool,

    /// Target-relative paths kept by reconciliation even though no handler produces them.
    #[serde(default)]
    pub preserve: Vec<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("Content"),
            target_dir: PathBuf::from("out/Content"),
            textures_dir: default_textures_dir(),
            max_sheet_size: default_max_sheet_size(),
            padding: default_padding(),
            trim: false,
            premultiply_alpha: default_premultiply(),
            preserve: Vec::new(),
        }
    }
}

impl BuildConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - `max_sheet_size` is zero or not a power of two
    /// - `padding` leaves no room on the sheet
    /// - `textures_dir` or a `preserve` entry is absolute
    /// - source and target roots are the same directory, or one contains the other
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::BuildError;

        if !self.max_sheet_size.is_power_of_two() {
            return Err(BuildError::InvalidConfig(format!(
                "max_sheet_size must be a power of two (got {})",
                self.max_sheet_size
            )));
        }
        if self.padding >= self.max_sheet_size {
            return Err(BuildError::InvalidConfig(format!(
                "padding ({}) leaves no usable space on a {}px sheet",
                self.padding, self.max_sheet_size
            )));
        }
        if self.textures_dir.is_absolute() {
            return Err(BuildError::InvalidConfig(format!(
                "textures_dir must be relative to the source root (got '{}')",
                self.textures_dir.display()
            )));
        }
        if let Some(p) = self.preserve.iter().find(|p| p.is_absolute()) {
            return Err(BuildError::InvalidConfig(format!(
                "preserve entries must be relative to the target root (got '{}')",
                p.display()
            )));
        }
        let source = resolved_root(&self.source_dir);
        let target = resolved_root(&self.target_dir);
        if source == target {
            return Err(BuildError::InvalidConfig(
                "source_dir and target_dir must differ".into(),
            ));
        }
        if target.starts_with(&source) || source.starts_with(&target) {
            return Err(BuildError::InvalidConfig(format!(
                "source_dir '{}' and target_dir '{}' must not contain each other",
                self.source_dir.display(),
                self.target_dir.display()
            )));
        }
        Ok(())
    }

    /// True if the source-relative directory lies in the textures subtree.
    pub fn in_textures(&self, relative: &Path) -> bool {
        relative.starts_with(&self.textures_dir)
    }

    pub fn builder() -> BuildConfigBuilder {
        BuildConfigBuilder::new()
    }
}

/// Canonical form of `path` as far as it exists, with the missing tail appended.
/// Symlinks and `..` in the existing part are resolved.
fn resolved_root(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut cur = path;
    loop {
        if let Ok(mut found) = std::fs::canonicalize(cur) {
            found.extend(missing.iter().rev());
            return found;
        }
        match (cur.parent(), cur.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                cur = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            _ => return path.to_path_buf(),
        }
    }
}

fn default_textures_dir() -> PathBuf {
    PathBuf::from("textures")
}
fn default_max_sheet_size() -> u32 {
    4096
}
fn default_padding() -> u32 {
    1
}
fn default_premultiply() -> bool {
    true
}

/// Builder for `BuildConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct BuildConfigBuilder {
    cfg: BuildConfig,
}

impl BuildConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: BuildConfig::default(),
        }
    }
    pub fn source_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.cfg.source_dir = v.into();
        self
    }
    pub fn target_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.cfg.target_dir = v.into();
        self
    }
    pub fn textures_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.cfg.textures_dir = v.into();
        self
    }
    pub fn max_sheet_size(mut self, v: u32) -> Self {
        self.cfg.max_sheet_size = v;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn trim(mut self, v: bool) -> Self {
        self.cfg.trim = v;
        self
    }
    pub fn premultiply_alpha(mut self, v: bool) -> Self {
        self.cfg.premultiply_alpha = v;
        self
    }
    pub fn preserve(mut self, v: impl Into<PathBuf>) -> Self {
        self.cfg.preserve.push(v.into());
        self
    }
    pub fn build(self) -> BuildConfig {
        self.cfg
    }
}
