use crate::error::{BuildError, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Last-write time of `path`, or `None` if it does not exist.
pub fn modified(path: &Path) -> Result<Option<SystemTime>> {
    match std::fs::metadata(path) {
        Ok(meta) => meta
            .modified()
            .map(Some)
            .map_err(|e| BuildError::io(path, e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BuildError::io(path, e)),
    }
}

/// Newest last-write time among `inputs` (missing inputs are ignored).
pub fn newest(inputs: &[PathBuf]) -> Result<Option<SystemTime>> {
    let mut best = None;
    for p in inputs {
        if let Some(t) = modified(p)? {
            best = Some(best.map_or(t, |b: SystemTime| b.max(t)));
        }
    }
    Ok(best)
}

/// An output is stale if it is missing or strictly older than `input_time`.
pub fn is_older(output: Option<SystemTime>, input_time: Option<SystemTime>) -> bool {
    match (output, input_time) {
        (None, _) => true,
        (Some(out), Some(inp)) => out < inp,
        (Some(_), None) => false,
    }
}

/// Regular files directly inside `dir`, sorted by name, optionally filtered by extension.
pub fn list_files(dir: &Path, extension: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))? {
        let entry = entry.map_err(|e| BuildError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| BuildError::io(&path, e))?;
        if !file_type.is_file() {
            continue;
        }
        if let Some(ext) = extension {
            if !has_extension(&path, ext) {
                continue;
            }
        }
        out.push(path);
    }
    out.sort();
    Ok(out)
}

/// Subdirectories directly inside `dir`, sorted by name.
pub fn list_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))? {
        let entry = entry.map_err(|e| BuildError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| BuildError::io(entry.path(), e))?;
        if file_type.is_dir() {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}

/// Case-insensitive extension check (`ext` without the dot).
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

pub fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn file_stem_string(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Relative path rendered with forward slashes, for data files read by the engine.
pub fn slash_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Appends `.ext` to the last component, keeping any dots already in it.
pub fn add_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}
