use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use crate::pipeline::classification_report::ImageRun;
use crate::pipeline::pipeline_error::PipelineError;

/// Per-image work handed to an executor. Must be callable from any worker.
pub type ImageTask<'a> = dyn Fn(&Path) -> Result<ImageRun, PipelineError> + Sync + 'a;

/// Receives each finished image on the calling thread.
///
/// Returning `false` requests cancellation of the remaining images.
pub type ImageSink<'a> = dyn FnMut(ImageRun) -> bool + 'a;

/// Abstracts how a batch of query images is scheduled.
///
/// Implementations run `task` at most once per image, stop picking up
/// new images once `cancelled` is set, and return the first fatal
/// error after in-flight images have finished.
pub trait BatchExecutor: Send + Sync {
    fn execute(
        &self,
        images: &[PathBuf],
        task: &ImageTask<'_>,
        cancelled: &AtomicBool,
        sink: &mut ImageSink<'_>,
    ) -> Result<(), PipelineError>;
}
