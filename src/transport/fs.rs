use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::constants::selection::{TEXT_EXTENSION, TRUNCATION_MARKER};
use crate::errors::MixError;
use crate::selection::Candidate;
use crate::types::CategoryId;

/// List category names: the immediate subdirectories of `root`, sorted by name.
///
/// Symlinked directories count as categories. A directory name that is not valid
/// UTF-8 is a configuration error.
pub fn list_category_dirs(root: &Path) -> Result<Vec<CategoryId>, MixError> {
    let mut categories = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|err| walk_error(root, err))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            return Err(MixError::Configuration(format!(
                "category directory name is not valid UTF-8: {}",
                entry.path().display()
            )));
        };
        categories.push(name.to_string());
    }
    categories.sort();
    if categories.is_empty() {
        return Err(MixError::Configuration(format!(
            "no category subdirectories found under {}",
            root.display()
        )));
    }
    Ok(categories)
}

/// List candidate text files directly inside `dir`, sorted by path, with their sizes.
///
/// Symlinked files are followed. Truncation artifacts left behind by an interrupted
/// run are never candidates.
pub fn list_candidates(dir: &Path) -> Result<Vec<Candidate>, MixError> {
    let mut candidates = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|err| walk_error(dir, err))?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_text_file(path) || is_truncation_artifact(path) {
            continue;
        }
        let size = fs::metadata(path).map_err(MixError::at(path))?.len();
        candidates.push(Candidate {
            path: path.to_path_buf(),
            size,
        });
    }
    candidates.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(candidates)
}

/// True if the path has a `.txt` extension (case-insensitive).
pub fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(TEXT_EXTENSION))
        .unwrap_or(false)
}

/// True if the file name marks a truncated copy produced by selection.
pub fn is_truncation_artifact(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.contains(TRUNCATION_MARKER))
        .unwrap_or(false)
}

/// Path inside `dir` for the truncated copy of `source` holding its first `len` bytes.
pub fn truncation_path(dir: &Path, source: &Path, len: u64) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!("{stem}_{TRUNCATION_MARKER}{len}.{TEXT_EXTENSION}"))
}

/// Create `dir` and any missing parents.
pub fn ensure_dir(dir: &Path) -> Result<(), MixError> {
    fs::create_dir_all(dir).map_err(MixError::at(dir))
}

/// Create the parent directory of `path` when it has one.
pub fn ensure_parent_dir(path: &Path) -> Result<(), MixError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn walk_error(root: &Path, err: walkdir::Error) -> MixError {
    let path = err.path().unwrap_or(root).to_path_buf();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
    MixError::Filesystem { path, source }
}
