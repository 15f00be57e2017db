use std::path::PathBuf;

/// Errors raised inside a transfer attempt.
///
/// These never escape the engine: every attempt resolves its error into a
/// retry-or-terminate decision, and the caller only ever sees formatted
/// messages through [`TransferEvents`](crate::TransferEvents).
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source file missing: {0}")]
    SourceMissing(PathBuf),

    #[error("seek to resume offset {offset} failed: {source}")]
    SeekFailed {
        offset: u64,
        source: std::io::Error,
    },

    #[error("Network unavailable")]
    NetworkUnavailable,
}
