use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::gallery::domain::gallery::{Gallery, GalleryError};
use crate::gallery::domain::gallery_store::GalleryStore;

/// Keeps the gallery in a single human-readable JSON file.
///
/// Writes go to a sibling `.tmp` file that is renamed into place, so a
/// crash mid-write never leaves a truncated gallery behind.
pub struct JsonGalleryStore {
    path: PathBuf,
}

impl JsonGalleryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_err(&self, source: std::io::Error) -> GalleryError {
        GalleryError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl GalleryStore for JsonGalleryStore {
    fn save(&self, gallery: &Gallery) -> Result<(), GalleryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.write_err(e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let file = fs::File::create(&tmp).map_err(|e| self.write_err(e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, gallery)?;
        writer.flush().map_err(|e| self.write_err(e))?;
        drop(writer);

        fs::rename(&tmp, &self.path).map_err(|e| self.write_err(e))?;
        log::info!(
            "Saved gallery with {} images ({} faces) to {}",
            gallery.len(),
            gallery.embedding_count(),
            self.path.display()
        );
        Ok(())
    }

    fn load(&self) -> Result<Gallery, GalleryError> {
        let json = fs::read_to_string(&self.path).map_err(|e| GalleryError::Read {
            path: self.path.clone(),
            source: e,
        })?;
        let gallery = Gallery::from_json(&json)?;
        log::info!(
            "Loaded gallery with {} images ({} faces) from {}",
            gallery.len(),
            gallery.embedding_count(),
            self.path.display()
        );
        Ok(gallery)
    }
}
