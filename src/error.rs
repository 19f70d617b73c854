//! Error kinds for the report engine.

use std::path::PathBuf;
use thiserror::Error;

/// Failure modes of a report run. All of them are terminal: this is a
/// single-shot batch job, and a partial report is worse than none.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A role's raw sample file is missing.
    #[error("sample file not found: {path}")]
    NotFound { path: PathBuf },

    /// A data line does not expose the expected column window.
    #[error("malformed sample line at {path}:{line}: {reason}")]
    Format {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// The three role series share no sampled second.
    #[error("merged series is empty: the three roles share no common second")]
    EmptyResult,

    /// Total memory or core count lookup failed. No fallback: a report
    /// normalized against unknown memory would be silently wrong.
    #[error("host query failed: {0}")]
    HostQuery(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
