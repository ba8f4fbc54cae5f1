use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::classification::domain::aggregator::Aggregator;
use crate::detection::domain::face_extractor::FaceExtractor;
use crate::imaging::domain::image_reader::ImageReader;
use crate::imaging::infrastructure::box_annotator::BoxAnnotator;
use crate::matching::domain::face_matcher::FaceMatcher;
use crate::pipeline::batch_executor::BatchExecutor;
use crate::pipeline::classification_report::{
    ClassificationReport, ImageClassification, ImageFailure, ImageOutcome, ImageRun,
};
use crate::pipeline::output_placer::OutputPlacer;
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::image_files;
use crate::shared::region::Region;

/// Classification pipeline over a directory of candid photos:
/// scan → read → extract → match → vote → copy into buckets.
///
/// Images are independent, so the executor may process them in any
/// order and on any number of threads. Per-image problems land in the
/// report; only matcher failures abort the run.
pub struct ClassifyImagesUseCase {
    classifier: ImageClassifier,
    executor: Box<dyn BatchExecutor>,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    cancelled: Arc<AtomicBool>,
}

impl ClassifyImagesUseCase {
    pub fn new(
        reader: Arc<dyn ImageReader>,
        extractor: Arc<dyn FaceExtractor>,
        matcher: Arc<dyn FaceMatcher>,
        aggregator: Aggregator,
        placer: Box<dyn OutputPlacer>,
        executor: Box<dyn BatchExecutor>,
    ) -> Self {
        Self {
            classifier: ImageClassifier {
                reader,
                extractor,
                matcher,
                aggregator,
                placer,
                annotator: None,
            },
            executor,
            logger: Box::new(NullPipelineLogger),
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Also writes a copy of each image with its faces outlined.
    pub fn with_annotator(mut self, annotator: BoxAnnotator) -> Self {
        self.classifier.annotator = Some(annotator);
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Called after every image; returning `false` cancels the run.
    pub fn with_progress(
        mut self,
        on_progress: Box<dyn Fn(usize, usize) -> bool + Send>,
    ) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Classifies every image directly inside `query_dir`.
    pub fn execute(&mut self, query_dir: &Path) -> Result<ClassificationReport, PipelineError> {
        let scan = image_files::scan_flat(query_dir).map_err(|e| PipelineError::Scan {
            path: query_dir.to_path_buf(),
            source: e,
        })?;
        for path in &scan.skipped {
            log::warn!("Skipping non-image file: {}", path.display());
        }

        let total = scan.images.len();
        self.logger.info(&format!(
            "Classifying {total} images from {}",
            query_dir.display()
        ));

        let mut report = ClassificationReport {
            skipped: scan.skipped,
            ..ClassificationReport::default()
        };
        let classifier = &self.classifier;
        let logger = &mut self.logger;
        let on_progress = &self.on_progress;
        let mut done = 0;

        let task = |path: &Path| classifier.classify(path);
        let mut sink = |run: ImageRun| -> bool {
            for (stage, ms) in &run.timings {
                logger.timing(stage, *ms);
            }
            match &run.outcome {
                ImageOutcome::Classified(c) => logger.metric("faces", c.matches.len() as f64),
                ImageOutcome::Failed(f) => logger.image_failed(&run.image_id, &f.reason),
            }
            report.record(run);
            done += 1;
            logger.progress(done, total);
            on_progress.as_ref().map_or(true, |cb| cb(done, total))
        };

        self.executor
            .execute(&scan.images, &task, &self.cancelled, &mut sink)?;

        report.cancelled = report.processed() < total;
        if report.cancelled {
            log::warn!(
                "Classification cancelled after {} of {total} images",
                report.processed()
            );
        }
        self.logger.summary();
        Ok(report)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// The per-image half of the pipeline, shared by all workers.
struct ImageClassifier {
    reader: Arc<dyn ImageReader>,
    extractor: Arc<dyn FaceExtractor>,
    matcher: Arc<dyn FaceMatcher>,
    aggregator: Aggregator,
    placer: Box<dyn OutputPlacer>,
    annotator: Option<BoxAnnotator>,
}

impl ImageClassifier {
    fn classify(&self, path: &Path) -> Result<ImageRun, PipelineError> {
        let image_id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut timings = Vec::new();
        let failed = |failure: ImageFailure, timings| ImageRun {
            image_id: image_id.clone(),
            outcome: ImageOutcome::Failed(failure),
            timings,
        };

        let t = Instant::now();
        let frame = match self.reader.read(path) {
            Ok(frame) => frame,
            Err(e) => {
                let reason = format!("could not decode image: {e}");
                return Ok(failed(ImageFailure::new(reason), timings));
            }
        };
        timings.push(("decode", elapsed_ms(t)));

        let t = Instant::now();
        let faces = self.extractor.extract(&frame).unwrap_or_else(|e| {
            log::warn!("Face extraction failed for {image_id}: {e}");
            Vec::new()
        });
        timings.push(("extract", elapsed_ms(t)));
        if faces.is_empty() {
            log::debug!("No faces detected in {image_id}");
        }

        let t = Instant::now();
        let matches = faces
            .iter()
            .enumerate()
            .map(|(i, face)| self.matcher.best_match(i, &face.embedding))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PipelineError::Match {
                image: image_id.clone(),
                source: e,
            })?;
        timings.push(("match", elapsed_ms(t)));

        let decision = match self.aggregator.aggregate(&image_id, &matches) {
            Ok(decision) => decision,
            Err(e) => return Ok(failed(ImageFailure::new(e.to_string()), timings)),
        };
        log::debug!("{image_id}: {} faces -> {:?}", faces.len(), decision.categories);

        let regions: Vec<Region> = faces.iter().map(|f| f.region).collect();
        if let Some(annotator) = &self.annotator {
            let outlined: Vec<(Region, bool)> = regions
                .iter()
                .zip(&matches)
                .map(|(r, m)| (*r, m.is_match()))
                .collect();
            if let Err(e) = annotator.annotate(path, &frame, &outlined) {
                log::warn!("Could not write annotated copy of {image_id}: {e}");
            }
        }

        // Every bucket is attempted so the report lists all copies on disk.
        let t = Instant::now();
        let mut placed = Vec::with_capacity(decision.categories.len());
        let mut errors = Vec::new();
        for category in &decision.categories {
            match self.placer.place(path, category) {
                Ok(dest) => placed.push(dest),
                Err(e) => errors.push(format!("could not copy into '{category}': {e}")),
            }
        }
        timings.push(("place", elapsed_ms(t)));

        if !errors.is_empty() {
            let failure = ImageFailure {
                reason: errors.join("; "),
                placed,
            };
            return Ok(failed(failure, timings));
        }

        Ok(ImageRun {
            image_id: decision.image_id,
            outcome: ImageOutcome::Classified(ImageClassification {
                matches,
                regions,
                categories: decision.categories,
                placed,
            }),
            timings,
        })
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
