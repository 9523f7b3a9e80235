//! Library error type.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by reporters and trace listeners.
///
/// The timing core itself never fails; misuse (root cancellation,
/// double install) is reported through `tracing::warn!` and ignored.
#[derive(Debug, Error)]
pub enum ProfilerError {
    /// Writing a report to its sink failed.
    #[error("failed to write report")]
    Io(#[from] std::io::Error),

    /// Creating or writing a trace file failed.
    #[error("failed to write trace file {path}")]
    Trace {
        /// Trace file location.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Serializing a report to JSON failed.
    #[error("failed to serialize report")]
    Serialize(#[from] serde_json::Error),
}
