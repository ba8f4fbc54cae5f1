use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::pipeline::batch_executor::{BatchExecutor, ImageSink, ImageTask};
use crate::pipeline::pipeline_error::PipelineError;

/// Classifies images one after another on the calling thread.
#[derive(Debug, Default)]
pub struct SequentialBatchExecutor;

impl BatchExecutor for SequentialBatchExecutor {
    fn execute(
        &self,
        images: &[PathBuf],
        task: &ImageTask<'_>,
        cancelled: &AtomicBool,
        sink: &mut ImageSink<'_>,
    ) -> Result<(), PipelineError> {
        for path in images {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let run = match task(path.as_path()) {
                Ok(run) => run,
                Err(e) => {
                    cancelled.store(true, Ordering::Relaxed);
                    return Err(e);
                }
            };
            if !sink(run) {
                cancelled.store(true, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}
