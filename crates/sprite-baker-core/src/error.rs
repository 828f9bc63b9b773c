use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Image error at '{}': {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Malformed sprite animation at '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Multiple atlas markers found in '{}'", dir.display())]
    MultipleMarkers { dir: PathBuf },
    #[error(
        "Atlas marker at '{}' is already covered by the atlas in '{}'",
        dir.display(),
        covered_by.display()
    )]
    NestedMarker { dir: PathBuf, covered_by: PathBuf },
    #[error("Required file is missing: '{}'", path.display())]
    MissingFile { path: PathBuf },
    #[error("No atlas map in output for atlas directory '{}'", dir.display())]
    MissingAtlasMap { dir: PathBuf },
    #[error("Sprites do not fit in a {max_width}x{max_height} sheet ({placed}/{total} placed)")]
    OutOfSpace {
        max_width: u32,
        max_height: u32,
        placed: usize,
        total: usize,
    },
    #[error("Malformed atlas map '{}' at line {line}: {reason}", path.display())]
    AtlasMap {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("Sprite '{name}' is declared more than once in '{}'", path.display())]
    DuplicateSprite { path: PathBuf, name: String },
    #[error("Sprite '{name}' referenced by '{}' is not in its atlas", path.display())]
    UnknownSprite { path: PathBuf, name: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid sprite file '{}': {reason}", path.display())]
    InvalidSprite { path: PathBuf, reason: String },
    #[error("Output '{}' would overwrite {reason}", path.display())]
    OutputConflict { path: PathBuf, reason: String },
}

impl BuildError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn image(path: impl AsRef<Path>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Process exit code reported for this error. Codes 0..=2 are reserved for
    /// non-error outcomes.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Json { .. } => 3,
            Self::MultipleMarkers { .. } => 4,
            Self::NestedMarker { .. } => 5,
            Self::MissingFile { .. } | Self::MissingAtlasMap { .. } => 6,
            Self::Io { .. } => 7,
            Self::Image { .. } => 8,
            Self::OutOfSpace { .. } => 9,
            Self::AtlasMap { .. } | Self::DuplicateSprite { .. } | Self::UnknownSprite { .. } => 10,
            Self::InvalidConfig(_) => 11,
            Self::InvalidSprite { .. } => 12,
            Self::OutputConflict { .. } => 13,
        }
    }
}

/// Non-error result of a handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The handler has nothing to do for this directory.
    NotApplicable,
    /// At least one artifact was regenerated.
    Rebuilt,
    /// Every artifact was already current.
    UpToDate,
}

pub type Result<T> = std::result::Result<T, BuildError>;
