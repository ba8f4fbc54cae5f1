use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// One face found in an image together with its descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub region: Region,
    pub embedding: Embedding,
}

/// Domain interface for face detection plus descriptor extraction.
///
/// Must be deterministic for identical input. Implementations are
/// constructed once and shared read-only across the gallery build and
/// every classification worker, hence `Sync` and `&self`.
pub trait FaceExtractor: Send + Sync {
    fn extract(&self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;
}
