use std::sync::Arc;

use crate::gallery::domain::gallery::Gallery;
use crate::matching::domain::distance::cosine_distance;
use crate::matching::domain::face_matcher::{FaceMatcher, MatchError};
use crate::matching::domain::match_result::MatchResult;
use crate::shared::embedding::Embedding;

/// Exhaustive nearest-neighbour search over every gallery embedding.
///
/// Ties go to the first embedding in gallery order. Without a cutoff
/// the closest identity is always returned, however far away it is;
/// with `max_distance` set, anything farther becomes a non-match that
/// still reports the distance it was rejected at.
pub struct LinearScanMatcher {
    gallery: Arc<Gallery>,
    max_distance: Option<f64>,
}

impl LinearScanMatcher {
    pub fn new(gallery: Arc<Gallery>) -> Self {
        Self {
            gallery,
            max_distance: None,
        }
    }

    pub fn with_max_distance(mut self, max_distance: Option<f64>) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }
}

impl FaceMatcher for LinearScanMatcher {
    fn best_match(&self, face_index: usize, query: &Embedding) -> Result<MatchResult, MatchError> {
        let Some(expected) = self.gallery.dim() else {
            return Ok(MatchResult::no_match(face_index));
        };
        if query.dim() != expected {
            return Err(MatchError::DimensionMismatch {
                expected,
                found: query.dim(),
            });
        }

        let mut best: Option<(&str, f64)> = None;
        for (identifier, reference) in self.gallery.iter_embeddings() {
            let d = cosine_distance(query.as_slice(), reference.as_slice());
            if best.map_or(true, |(_, min)| d < min) {
                best = Some((identifier, d));
            }
        }

        Ok(match best {
            Some((_, d)) if self.max_distance.is_some_and(|max| d > max) => MatchResult {
                face_index,
                identifier: None,
                distance: Some(d),
            },
            Some((identifier, d)) => MatchResult::matched(face_index, identifier, d),
            None => MatchResult::no_match(face_index),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn emb(values: &[f32]) -> Embedding {
        Embedding::new(values.to_vec())
    }

    fn gallery(entries: &[(&str, Vec<Vec<f32>>)]) -> Arc<Gallery> {
        let mut g = Gallery::new();
        for (id, embs) in entries {
            g.insert(*id, embs.iter().map(|e| emb(e)).collect()).unwrap();
        }
        Arc::new(g)
    }

    #[test]
    fn test_empty_gallery_is_no_match() {
        let matcher = LinearScanMatcher::new(Arc::new(Gallery::new()));
        let result = matcher.best_match(0, &emb(&[1.0, 0.0])).unwrap();
        assert_eq!(result, MatchResult::no_match(0));
    }

    #[test]
    fn test_returns_closest_identity() {
        let matcher = LinearScanMatcher::new(gallery(&[
            ("a/121.jpg", vec![vec![1.0, 0.0]]),
            ("a/170.jpg", vec![vec![0.0, 1.0]]),
        ]));
        let result = matcher.best_match(2, &emb(&[0.1, 0.9])).unwrap();
        assert_eq!(result.face_index, 2);
        assert_eq!(result.identifier.as_deref(), Some("a/170.jpg"));
    }

    #[test]
    fn test_considers_every_embedding_of_an_entry() {
        let matcher = LinearScanMatcher::new(gallery(&[
            ("group.jpg", vec![vec![1.0, 0.0], vec![0.0, 1.0]]),
            ("solo.jpg", vec![vec![0.7, 0.7]]),
        ]));
        let result = matcher.best_match(0, &emb(&[0.0, 1.0])).unwrap();
        assert_eq!(result.identifier.as_deref(), Some("group.jpg"));
        assert_relative_eq!(result.distance.unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tie_goes_to_first_inserted() {
        let matcher = LinearScanMatcher::new(gallery(&[
            ("z/200.jpg", vec![vec![1.0, 0.0]]),
            ("a/100.jpg", vec![vec![2.0, 0.0]]),
        ]));
        let result = matcher.best_match(0, &emb(&[3.0, 0.0])).unwrap();
        assert_eq!(result.identifier.as_deref(), Some("z/200.jpg"));
    }

    #[test]
    fn test_far_match_still_returned_without_cutoff() {
        let matcher = LinearScanMatcher::new(gallery(&[("only.jpg", vec![vec![1.0, 0.0]])]));
        let result = matcher.best_match(0, &emb(&[-1.0, 0.0])).unwrap();
        assert_eq!(result.identifier.as_deref(), Some("only.jpg"));
        assert_relative_eq!(result.distance.unwrap(), 2.0);
    }

    #[test]
    fn test_cutoff_turns_far_match_into_none() {
        let matcher = LinearScanMatcher::new(gallery(&[("only.jpg", vec![vec![1.0, 0.0]])]))
            .with_max_distance(Some(0.5));
        let result = matcher.best_match(0, &emb(&[0.0, 1.0])).unwrap();
        assert!(!result.is_match());
        assert_relative_eq!(result.distance.unwrap(), 1.0);
    }

    #[test]
    fn test_cutoff_keeps_near_match() {
        let matcher = LinearScanMatcher::new(gallery(&[("only.jpg", vec![vec![1.0, 0.0]])]))
            .with_max_distance(Some(0.5));
        assert!(matcher.best_match(0, &emb(&[1.0, 0.1])).unwrap().is_match());
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let matcher = LinearScanMatcher::new(gallery(&[("a.jpg", vec![vec![1.0, 0.0, 0.0]])]));
        let err = matcher.best_match(0, &emb(&[1.0, 0.0])).unwrap_err();
        assert_eq!(
            err,
            MatchError::DimensionMismatch {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_repeated_queries_are_identical() {
        let matcher = LinearScanMatcher::new(gallery(&[
            ("a.jpg", vec![vec![0.3, 0.4, 0.5]]),
            ("b.jpg", vec![vec![0.5, 0.4, 0.3]]),
        ]));
        let q = emb(&[0.31, 0.42, 0.47]);
        assert_eq!(
            matcher.best_match(0, &q).unwrap(),
            matcher.best_match(0, &q).unwrap()
        );
    }
}
