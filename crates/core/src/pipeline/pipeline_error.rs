use std::path::PathBuf;

use thiserror::Error;

use crate::matching::domain::face_matcher::MatchError;

/// Failures that stop a whole classification run.
///
/// Problems confined to one image (undecodable file, malformed gallery
/// identifier, failed copy) are recorded in the report instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("matching failed for {image}: {source}")]
    Match {
        image: String,
        #[source]
        source: MatchError,
    },
    #[error("failed to scan query images in {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("worker thread panicked")]
    WorkerPanicked,
}
