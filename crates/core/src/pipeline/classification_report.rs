use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::matching::domain::match_result::MatchResult;
use crate::shared::region::Region;

/// Everything decided about one successfully classified image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImageClassification {
    /// One result per detected face, in detection order.
    pub matches: Vec<MatchResult>,
    /// Where each face was found, aligned with `matches`.
    pub regions: Vec<Region>,
    /// Buckets chosen by the vote; empty means the image was left unplaced.
    pub categories: Vec<String>,
    /// Copies written to the output tree.
    pub placed: Vec<PathBuf>,
}

/// Why an image was abandoned, and any copies written before it was.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImageFailure {
    pub reason: String,
    pub placed: Vec<PathBuf>,
}

impl ImageFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            placed: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ImageOutcome {
    Classified(ImageClassification),
    /// The image was abandoned; the run continued.
    Failed(ImageFailure),
}

/// What a worker hands back for one query image.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageRun {
    pub image_id: String,
    pub outcome: ImageOutcome,
    /// Milliseconds spent per stage on this image.
    pub timings: Vec<(&'static str, f64)>,
}

/// Result of a classification run, keyed by image file name.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub images: BTreeMap<String, ImageClassification>,
    pub failed: BTreeMap<String, ImageFailure>,
    /// Non-image files found in the query directory.
    pub skipped: Vec<PathBuf>,
    /// Set when the run stopped before every image was processed.
    pub cancelled: bool,
}

impl ClassificationReport {
    /// Records one image. Returns `false` if the id was already present.
    pub fn record(&mut self, run: ImageRun) -> bool {
        if self.contains(&run.image_id) {
            log::warn!("Image {} reported twice; keeping first result", run.image_id);
            return false;
        }
        match run.outcome {
            ImageOutcome::Classified(c) => {
                self.images.insert(run.image_id, c);
            }
            ImageOutcome::Failed(failure) => {
                self.failed.insert(run.image_id, failure);
            }
        }
        true
    }

    pub fn contains(&self, image_id: &str) -> bool {
        self.images.contains_key(image_id) || self.failed.contains_key(image_id)
    }

    /// Images that reached a decision or failed.
    pub fn processed(&self) -> usize {
        self.images.len() + self.failed.len()
    }

    /// Gallery identifiers matched in `image_id`, one entry per face.
    pub fn matched_identifiers(&self, image_id: &str) -> Option<Vec<Option<&str>>> {
        self.images.get(image_id).map(|c| {
            c.matches
                .iter()
                .map(|m| m.identifier.as_deref())
                .collect()
        })
    }

    /// Every copy written, including those of images that later failed.
    pub fn placed_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.images
            .values()
            .flat_map(|c| c.placed.iter())
            .chain(self.failed.values().flat_map(|f| f.placed.iter()))
    }

    /// Number of images placed in each category.
    pub fn category_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for c in self.images.values() {
            for category in &c.categories {
                *counts.entry(category.as_str()).or_default() += 1;
            }
        }
        counts
    }

    /// Images that matched faces but won no category.
    pub fn unplaced(&self) -> impl Iterator<Item = &str> {
        self.images
            .iter()
            .filter(|(_, c)| c.categories.is_empty())
            .map(|(id, _)| id.as_str())
    }
}
