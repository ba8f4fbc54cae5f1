use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::pipeline::batch_executor::{BatchExecutor, ImageSink, ImageTask};
use crate::pipeline::classification_report::ImageRun;
use crate::pipeline::pipeline_error::PipelineError;

/// Fans images out to a fixed pool of scoped worker threads.
///
/// Layout: `queue → N workers → caller [sink]`
///
/// Every path is queued once up front, so each image is taken by exactly
/// one worker. Results flow back to the calling thread, which owns the
/// sink and therefore the report and logger.
pub struct ThreadedBatchExecutor {
    workers: usize,
}

impl ThreadedBatchExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for ThreadedBatchExecutor {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(workers)
    }
}

impl BatchExecutor for ThreadedBatchExecutor {
    fn execute(
        &self,
        images: &[PathBuf],
        task: &ImageTask<'_>,
        cancelled: &AtomicBool,
        sink: &mut ImageSink<'_>,
    ) -> Result<(), PipelineError> {
        if images.is_empty() {
            return Ok(());
        }

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<&PathBuf>();
        for path in images {
            // Receiver is alive until the end of this function.
            let _ = job_tx.send(path);
        }
        drop(job_tx);

        let (result_tx, result_rx) =
            crossbeam_channel::bounded::<Result<ImageRun, PipelineError>>(self.workers * 2);
        let worker_count = self.workers.min(images.len());

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..worker_count)
                .map(|_| {
                    let job_rx = job_rx.clone();
                    let result_tx = result_tx.clone();
                    scope.spawn(move || {
                        for path in job_rx {
                            if cancelled.load(Ordering::Relaxed) {
                                break;
                            }
                            if result_tx.send(task(path.as_path())).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();
            drop(result_tx);

            let mut first_error = None;
            for result in &result_rx {
                match result {
                    Ok(run) => {
                        if first_error.is_none() && !sink(run) {
                            cancelled.store(true, Ordering::Relaxed);
                        }
                    }
                    Err(e) => {
                        cancelled.store(true, Ordering::Relaxed);
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }

            let mut panicked = false;
            for handle in handles {
                panicked |= handle.join().is_err();
            }

            match first_error {
                Some(e) => Err(e),
                None if panicked => Err(PipelineError::WorkerPanicked),
                None => Ok(()),
            }
        })
    }
}
