use thiserror::Error;

use crate::matching::domain::match_result::MatchResult;
use crate::shared::embedding::Embedding;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("query embedding has dimension {found}, gallery uses {expected}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// Finds the reference identity closest to a query face.
///
/// The linear scan is the reference implementation; an approximate
/// index can stand behind the same interface. Shared read-only across
/// classification workers.
pub trait FaceMatcher: Send + Sync {
    fn best_match(&self, face_index: usize, query: &Embedding) -> Result<MatchResult, MatchError>;
}
