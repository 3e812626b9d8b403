//! Error types for the pipeline driver.

use std::path::PathBuf;

/// Error that stops a run or a single document.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// Filesystem operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Document id unknown to the archive.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// Worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Statistics serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Attach a path to an I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure to turn one graphic into an output image.
///
/// Reported per pair; sibling pairs of the same document are unaffected.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ImageError {
    /// The graphic file holds no data.
    #[error("image {0} is empty")]
    Empty(String),

    /// The graphic has no file extension to keep.
    #[error("image {0} has no extension")]
    MissingExtension(String),

    /// The graphic could not be read from the archive.
    #[error("failed to read image {name}: {source}")]
    Read {
        /// Graphic filename.
        name: String,
        /// Underlying error.
        source: PipelineError,
    },
}
