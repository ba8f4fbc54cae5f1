use std::path::{Path, PathBuf};

/// Puts a copy of a classified image into a category bucket.
///
/// Called concurrently by classification workers; creating a bucket
/// that already exists must succeed.
pub trait OutputPlacer: Send + Sync {
    /// Returns where the copy landed.
    fn place(&self, source: &Path, category: &str) -> std::io::Result<PathBuf>;
}
