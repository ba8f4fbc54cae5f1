use serde::Serialize;

/// Outcome of matching one detected face against the gallery.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchResult {
    /// Position of the face among the detections of its image.
    pub face_index: usize,
    /// Closest reference identifier, `None` when nothing matched.
    pub identifier: Option<String>,
    /// Distance to the closest reference, `None` when the gallery is empty.
    pub distance: Option<f64>,
}

impl MatchResult {
    pub fn matched(face_index: usize, identifier: impl Into<String>, distance: f64) -> Self {
        Self {
            face_index,
            identifier: Some(identifier.into()),
            distance: Some(distance),
        }
    }

    pub fn no_match(face_index: usize) -> Self {
        Self {
            face_index,
            identifier: None,
            distance: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.identifier.is_some()
    }
}
