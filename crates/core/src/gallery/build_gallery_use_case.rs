use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::detection::domain::face_extractor::FaceExtractor;
use crate::gallery::domain::gallery::{Gallery, GalleryError};
use crate::imaging::domain::image_reader::ImageReader;
use crate::shared::image_files;

/// A reference image that contributed nothing to the gallery, and why.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedImage {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub struct GalleryBuildReport {
    pub gallery: Gallery,
    /// Non-image files and images that failed to decode.
    pub skipped: Vec<SkippedImage>,
    /// Identifiers of images that decoded but contained no face.
    pub faceless: Vec<String>,
}

/// Builds the reference gallery from a directory of labeled portraits.
///
/// Each portrait is identified by its path relative to the portrait
/// root. Undecodable files and faceless images are left out; only a
/// dimensionality conflict between descriptors aborts the build.
pub struct BuildGalleryUseCase {
    reader: Arc<dyn ImageReader>,
    extractor: Arc<dyn FaceExtractor>,
    on_progress: Option<Box<dyn Fn(usize, usize) + Send + Sync>>,
}

impl BuildGalleryUseCase {
    pub fn new(
        reader: Arc<dyn ImageReader>,
        extractor: Arc<dyn FaceExtractor>,
        on_progress: Option<Box<dyn Fn(usize, usize) + Send + Sync>>,
    ) -> Self {
        Self {
            reader,
            extractor,
            on_progress,
        }
    }

    /// Scans `portrait_dir` recursively and builds the gallery.
    pub fn execute(&self, portrait_dir: &Path) -> Result<GalleryBuildReport, GalleryError> {
        let scan = image_files::scan_recursive(portrait_dir).map_err(|e| GalleryError::Scan {
            path: portrait_dir.to_path_buf(),
            source: e,
        })?;

        let images: Vec<(String, PathBuf)> = scan
            .images
            .into_iter()
            .map(|p| (image_files::identifier_for(portrait_dir, &p), p))
            .collect();

        let mut report = self.build(&images)?;
        let non_images = scan.skipped.into_iter().map(|path| {
            log::warn!("Skipping non-image file: {}", path.display());
            SkippedImage {
                path,
                reason: "not an image file".to_string(),
            }
        });
        report.skipped.splice(0..0, non_images);
        Ok(report)
    }

    /// Builds a gallery from `(identifier, path)` pairs, in the given order.
    pub fn build(&self, images: &[(String, PathBuf)]) -> Result<GalleryBuildReport, GalleryError> {
        let mut report = GalleryBuildReport {
            gallery: Gallery::new(),
            skipped: Vec::new(),
            faceless: Vec::new(),
        };

        for (i, (identifier, path)) in images.iter().enumerate() {
            self.add_image(identifier, path, &mut report)?;
            if let Some(ref cb) = self.on_progress {
                cb(i + 1, images.len());
            }
        }

        log::info!(
            "Gallery built: {} of {} reference images contributed {} faces",
            report.gallery.len(),
            images.len(),
            report.gallery.embedding_count()
        );
        Ok(report)
    }

    fn add_image(
        &self,
        identifier: &str,
        path: &Path,
        report: &mut GalleryBuildReport,
    ) -> Result<(), GalleryError> {
        let frame = match self.reader.read(path) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Could not read image {}: {e}", path.display());
                report.skipped.push(SkippedImage {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                return Ok(());
            }
        };

        let faces = self.extractor.extract(&frame).unwrap_or_else(|e| {
            log::warn!("Face extraction failed for {}: {e}", path.display());
            Vec::new()
        });

        if faces.is_empty() {
            log::debug!("No faces in reference image {identifier}");
            report.faceless.push(identifier.to_string());
            return Ok(());
        }

        let embeddings = faces.into_iter().map(|f| f.embedding).collect();
        match report.gallery.insert(identifier, embeddings) {
            Err(e @ GalleryError::NonFinite { .. }) => {
                log::warn!("Skipping {}: {e}", path.display());
                report.skipped.push(SkippedImage {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                Ok(())
            }
            other => other,
        }
    }
}
