use crate::gallery::domain::gallery::{Gallery, GalleryError};

/// Durable storage for a built gallery.
pub trait GalleryStore: Send {
    fn save(&self, gallery: &Gallery) -> Result<(), GalleryError>;
    fn load(&self) -> Result<Gallery, GalleryError>;
}
