use crate::classification::domain::category::CategoryRange;
use crate::classification::domain::classification_decision::ClassificationDecision;
use crate::classification::domain::identity::{IdentityError, IdentityExtractor};
use crate::matching::domain::match_result::MatchResult;

/// Turns the per-face matches of one image into its bucket decision.
///
/// Every matched face votes for the category whose range holds its
/// identity token. A category is chosen when its share of the matched
/// faces is strictly above the threshold, so an image can land in
/// several buckets at once. Images with no matched face go to
/// `unknown`.
pub struct Aggregator {
    categories: Vec<CategoryRange>,
    threshold: f64,
    identity: Box<dyn IdentityExtractor>,
}

impl Aggregator {
    pub fn new(
        categories: Vec<CategoryRange>,
        threshold: f64,
        identity: Box<dyn IdentityExtractor>,
    ) -> Self {
        Self {
            categories,
            threshold,
            identity,
        }
    }

    pub fn categories(&self) -> &[CategoryRange] {
        &self.categories
    }

    /// Fails when a matched identifier carries no numeric token; one
    /// malformed gallery name poisons the whole image rather than
    /// silently dropping a vote.
    pub fn aggregate(
        &self,
        image_id: &str,
        results: &[MatchResult],
    ) -> Result<ClassificationDecision, IdentityError> {
        let tokens = results
            .iter()
            .filter_map(|r| r.identifier.as_deref())
            .map(|id| self.identity.token(id))
            .collect::<Result<Vec<i64>, _>>()?;

        if tokens.is_empty() {
            return Ok(ClassificationDecision::unknown(image_id));
        }

        let total = tokens.len() as f64;
        let categories = self
            .categories
            .iter()
            .filter(|c| {
                let count = tokens.iter().filter(|&&t| c.contains(t)).count();
                count as f64 / total > self.threshold
            })
            .map(|c| c.label.clone())
            .collect();

        Ok(ClassificationDecision {
            image_id: image_id.to_string(),
            categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::domain::identity::FileStemIdentity;
    use crate::shared::constants::{DEFAULT_VOTE_THRESHOLD, UNKNOWN_CATEGORY};
    use rstest::rstest;

    fn aggregator(ranges: &[(&str, i64, i64)]) -> Aggregator {
        Aggregator::new(
            ranges
                .iter()
                .map(|(l, lo, hi)| CategoryRange::new(*l, *lo, *hi))
                .collect(),
            DEFAULT_VOTE_THRESHOLD,
            Box::new(FileStemIdentity),
        )
    }

    fn three_buckets() -> Aggregator {
        aggregator(&[("104", 120, 145), ("106", 167, 189), ("108", 207, 237)])
    }

    /// One matched face per token; `None` entries become non-matches.
    fn matches(tokens: &[Option<i64>]) -> Vec<MatchResult> {
        tokens
            .iter()
            .enumerate()
            .map(|(i, t)| match t {
                Some(t) => MatchResult::matched(i, format!("portraits/{t}.jpg"), 0.1),
                None => MatchResult::no_match(i),
            })
            .collect()
    }

    #[test]
    fn test_no_faces_is_unknown() {
        let d = three_buckets().aggregate("img.jpg", &[]).unwrap();
        assert_eq!(d.categories, vec![UNKNOWN_CATEGORY.to_string()]);
        assert!(d.is_unknown());
    }

    #[test]
    fn test_all_unmatched_is_unknown() {
        let d = three_buckets()
            .aggregate("img.jpg", &matches(&[None, None]))
            .unwrap();
        assert!(d.is_unknown());
    }

    #[test]
    fn test_majority_category_selected_and_empty_excluded() {
        // 3 of 4 in "104", one token outside every range
        let d = three_buckets()
            .aggregate(
                "img.jpg",
                &matches(&[Some(130), Some(121), Some(144), Some(500)]),
            )
            .unwrap();
        assert_eq!(d.categories, vec!["104".to_string()]);
        assert_eq!(d.image_id, "img.jpg");
    }

    #[test]
    fn test_every_category_above_threshold_is_selected() {
        let d = three_buckets()
            .aggregate("group.jpg", &matches(&[Some(130), Some(170), Some(210)]))
            .unwrap();
        assert_eq!(
            d.categories,
            vec!["104".to_string(), "106".to_string(), "108".to_string()]
        );
    }

    #[test]
    fn test_exactly_threshold_share_is_excluded() {
        // 3/3/4 of ten: only the 0.4 share is strictly above 0.3
        let mut tokens = vec![Some(130); 3];
        tokens.extend(vec![Some(170); 3]);
        tokens.extend(vec![Some(210); 4]);
        let d = three_buckets()
            .aggregate("crowd.jpg", &matches(&tokens))
            .unwrap();
        assert_eq!(d.categories, vec!["108".to_string()]);
    }

    #[test]
    fn test_denominator_counts_matched_faces_only() {
        // one match out of three detections: 1/1 share
        let d = three_buckets()
            .aggregate("img.jpg", &matches(&[None, Some(130), None]))
            .unwrap();
        assert_eq!(d.categories, vec!["104".to_string()]);
    }

    #[test]
    fn test_no_category_wins_leaves_image_unplaced() {
        let d = three_buckets()
            .aggregate("img.jpg", &matches(&[Some(1), Some(2), Some(300)]))
            .unwrap();
        assert!(d.is_unplaced());
        assert!(!d.is_unknown());
    }

    #[rstest]
    #[case(120)]
    #[case(145)]
    fn test_range_endpoints_do_not_vote(#[case] token: i64) {
        let d = three_buckets()
            .aggregate("img.jpg", &matches(&[Some(token)]))
            .unwrap();
        assert!(d.is_unplaced());
    }

    #[test]
    fn test_overlapping_ranges_both_count() {
        let d = aggregator(&[("wide", 100, 200), ("narrow", 120, 140)])
            .aggregate("img.jpg", &matches(&[Some(130)]))
            .unwrap();
        assert_eq!(d.categories, vec!["wide".to_string(), "narrow".to_string()]);
    }

    #[test]
    fn test_malformed_identifier_is_error() {
        let results = vec![
            MatchResult::matched(0, "portraits/130.jpg", 0.1),
            MatchResult::matched(1, "portraits/alice.jpg", 0.2),
        ];
        let err = three_buckets().aggregate("img.jpg", &results).unwrap_err();
        assert!(matches!(err, IdentityError::MalformedIdentifier { .. }));
    }

    #[test]
    fn test_custom_threshold() {
        let agg = Aggregator::new(
            vec![CategoryRange::new("a", 0, 10), CategoryRange::new("b", 10, 20)],
            0.5,
            Box::new(FileStemIdentity),
        );
        let d = agg
            .aggregate("img.jpg", &matches(&[Some(1), Some(11)]))
            .unwrap();
        assert!(d.is_unplaced());
    }
}
