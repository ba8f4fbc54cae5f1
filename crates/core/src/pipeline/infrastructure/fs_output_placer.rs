use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::pipeline::output_placer::OutputPlacer;

/// Copies images to `<root>/<category>/<file name>`.
///
/// The original is never moved. `create_dir_all` tolerates a directory
/// created concurrently by another worker.
pub struct FsOutputPlacer {
    root: PathBuf,
}

impl FsOutputPlacer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputPlacer for FsOutputPlacer {
    fn place(&self, source: &Path, category: &str) -> io::Result<PathBuf> {
        let name = source.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no file name in {}", source.display()),
            )
        })?;
        let dir = self.root.join(category);
        fs::create_dir_all(&dir)?;
        let dest = dir.join(name);
        fs::copy(source, &dest)?;
        Ok(dest)
    }
}
