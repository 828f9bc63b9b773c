use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.x >= r.right() || r.x >= self.right() || self.y >= r.bottom() || r.y >= self.bottom())
    }
}

/// A root-relative path paired with its resolved absolute location.
///
/// Equality, hashing and ordering only look at the relative part, so the same
/// directory seen from the source and target roots compares equal.
#[derive(Debug, Clone)]
pub struct PathPair {
    relative: PathBuf,
    absolute: PathBuf,
}

impl PathPair {
    /// Pairs `relative` with `root.join(relative)`.
    pub fn from_relative(root: &Path, relative: impl Into<PathBuf>) -> Self {
        let relative = relative.into();
        let absolute = if relative.as_os_str().is_empty() {
            root.to_path_buf()
        } else {
            root.join(&relative)
        };
        Self { relative, absolute }
    }

    pub fn relative(&self) -> &Path {
        &self.relative
    }

    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    /// The same relative path resolved under another root.
    pub fn rebase(&self, root: &Path) -> Self {
        Self::from_relative(root, self.relative.clone())
    }

    /// Relative path of a child entry.
    pub fn child_relative(&self, name: impl AsRef<Path>) -> PathBuf {
        self.relative.join(name)
    }

    /// True if `self` is `ancestor` or lies beneath it (component-wise).
    pub fn is_within(&self, ancestor: &PathPair) -> bool {
        self.relative.starts_with(&ancestor.relative)
    }
}

impl PartialEq for PathPair {
    fn eq(&self, other: &Self) -> bool {
        self.relative == other.relative
    }
}

impl Eq for PathPair {}

impl Hash for PathPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relative.hash(state);
    }
}

impl PartialOrd for PathPair {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathPair {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.relative.cmp(&other.relative)
    }
}

impl fmt::Display for PathPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative.display())
    }
}

/// One logical atlas: its name plus every directory whose loose images feed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasGroup {
    pub target_name: String,
    /// Key directory first, then descendants in traversal order.
    pub members: Vec<PathPair>,
}

impl AtlasGroup {
    pub fn new(target_name: impl Into<String>, key: PathPair) -> Self {
        Self {
            target_name: target_name.into(),
            members: vec![key],
        }
    }
}

/// A sprite scheduled for packing.
#[derive(Debug, Clone)]
pub struct PackedRect {
    pub name: String,
    /// Tight content box within the source image.
    pub content: Rect,
    /// Original (untrimmed) source size.
    pub source_size: (u32, u32),
    pub padded_w: u32,
    pub padded_h: u32,
    /// Top-left of the padded box once placed.
    pub position: Option<(u32, u32)>,
}

impl PackedRect {
    pub fn padded_area(&self) -> u64 {
        self.padded_w as u64 * self.padded_h as u64
    }

    /// Padded box on the canvas, if placed.
    pub fn placed_box(&self) -> Option<Rect> {
        self.position
            .map(|(x, y)| Rect::new(x, y, self.padded_w, self.padded_h))
    }
}

/// One line of an atlas map. Its line number in the file is the frame index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasMapEntry {
    pub sprite_file_name: String,
    pub sheet_index: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub pivot_x: i32,
    pub pivot_y: i32,
}

impl AtlasMapEntry {
    pub const FIELD_COUNT: usize = 8;

    /// Why `name` cannot be stored in the first field of a map line, if it can't.
    pub fn name_problem(name: &str) -> Option<&'static str> {
        if name.is_empty() {
            Some("empty sprite name")
        } else if name.contains(',') {
            Some("sprite name contains ','")
        } else if name.contains(['\n', '\r']) {
            Some("sprite name contains a line break")
        } else {
            None
        }
    }

    /// Renders the entry without the trailing newline.
    pub fn to_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{}",
            self.sprite_file_name,
            self.sheet_index,
            self.x,
            self.y,
            self.width,
            self.height,
            self.pivot_x,
            self.pivot_y
        )
    }

    /// Parses one map line. The error string describes the first offending field.
    pub fn parse_line(line: &str) -> std::result::Result<Self, String> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != Self::FIELD_COUNT {
            return Err(format!(
                "expected {} fields, found {}",
                Self::FIELD_COUNT,
                fields.len()
            ));
        }
        if fields[0].is_empty() {
            return Err("empty sprite name".into());
        }
        fn num<T: std::str::FromStr>(fields: &[&str], i: usize, what: &str) -> std::result::Result<T, String> {
            fields[i]
                .trim()
                .parse()
                .map_err(|_| format!("invalid {} '{}'", what, fields[i]))
        }
        Ok(Self {
            sprite_file_name: fields[0].to_string(),
            sheet_index: num(&fields, 1, "sheet index")?,
            x: num(&fields, 2, "x")?,
            y: num(&fields, 3, "y")?,
            width: num(&fields, 4, "width")?,
            height: num(&fields, 5, "height")?,
            pivot_x: num(&fields, 6, "pivot x")?,
            pivot_y: num(&fields, 7, "pivot y")?,
        })
    }
}
