use serde::Serialize;

use crate::shared::constants::UNKNOWN_CATEGORY;

/// Which buckets one query image belongs to.
///
/// Zero categories is a legitimate outcome (faces matched, but no bucket
/// won enough votes) and differs from the `unknown` bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassificationDecision {
    pub image_id: String,
    pub categories: Vec<String>,
}

impl ClassificationDecision {
    pub fn unknown(image_id: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            categories: vec![UNKNOWN_CATEGORY.to_string()],
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.categories.len() == 1 && self.categories[0] == UNKNOWN_CATEGORY
    }

    pub fn is_unplaced(&self) -> bool {
        self.categories.is_empty()
    }
}
