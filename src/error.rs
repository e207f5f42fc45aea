use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors surfaced by the graph storage engine.
///
/// There is no retry and no partial recovery: after `Corruption`,
/// `CapacityExhausted` or a failed save/load the instance must be discarded.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("storage error at {}: {source}", .location.display())]
    Storage {
        location: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corruption detected: {0}")]
    Corruption(&'static str),
    #[error("capacity exhausted: {0}")]
    CapacityExhausted(&'static str),
    #[error("format mismatch: {0}")]
    FormatMismatch(String),
}

impl GraphError {
    /// Wraps an I/O error with the file it occurred on.
    pub(crate) fn at(location: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> GraphError {
        let location = location.into();
        move |source| GraphError::Storage { location, source }
    }
}
