//! Directory scanning for portrait and candid image sets.
//!
//! Images are recognised by extension. Archive metadata left behind by
//! macOS (`__MACOSX/`, `._name.jpg`) is dropped silently; every other
//! non-image file is reported back as skipped so the caller can warn.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::shared::constants::{APPLE_DOUBLE_PREFIX, IMAGE_EXTENSIONS, METADATA_DIR_NAME};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScanResult {
    pub images: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn is_platform_metadata(path: &Path) -> bool {
    path.components().any(|c| c.as_os_str() == METADATA_DIR_NAME)
        || path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(APPLE_DOUBLE_PREFIX))
}

/// Walks `root` recursively in file-name order.
pub fn scan_recursive(root: &Path) -> io::Result<ScanResult> {
    let mut result = ScanResult::default();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != METADATA_DIR_NAME);

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        classify_entry(entry.into_path(), &mut result);
    }
    Ok(result)
}

/// Lists the direct children of `dir` in file-name order.
pub fn scan_flat(dir: &Path) -> io::Result<ScanResult> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut result = ScanResult::default();
    for path in paths {
        classify_entry(path, &mut result);
    }
    Ok(result)
}

/// Stable identifier for `path`: relative to `root`, `/`-separated.
pub fn identifier_for(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn classify_entry(path: PathBuf, result: &mut ScanResult) {
    if is_platform_metadata(&path) {
        log::debug!("Ignoring platform metadata file: {}", path.display());
    } else if is_image_file(&path) {
        result.images.push(path);
    } else {
        result.skipped.push(path);
    }
}
