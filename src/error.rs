use std::path::PathBuf;

use thiserror::Error;

/// Clipgrep's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Clipgrep's crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
///
/// Propagation policy:
/// - Per-file problems (`TranscriptNotFound`, `ParseFailure`, `UnknownFormat`) are recorded
///   in result summaries and logged; they never abort a multi-file search.
/// - Per-batch problems (`ExportFailed`) are recorded in the export summary.
/// - `CapabilityUnavailable`, `InvalidSearchType`, `InvalidOutputFormat` and
///   `ExportTotalFailure` are the only variants surfaced to the top-level caller.
#[derive(Debug, Error)]
pub enum Error {
    /// No transcript file could be located next to the media file.
    #[error("no transcript found for '{media}'")]
    TranscriptNotFound { media: PathBuf },

    /// A transcript file was located but could not be parsed.
    #[error("failed to parse transcript '{path}': {reason}")]
    ParseFailure { path: PathBuf, reason: String },

    /// A transcript file has an extension outside the known format set.
    #[error("unknown transcript format: '{path}'")]
    UnknownFormat { path: PathBuf },

    /// A search strategy was requested that requires an external capability
    /// (e.g. semantic search without an embedding provider).
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// The requested search type is not one of the supported strategies.
    #[error("unsupported search type: '{0}'")]
    InvalidSearchType(String),

    /// The requested output format cannot be produced from the given inputs
    /// (e.g. video output from audio-only sources).
    #[error("invalid output format: {0}")]
    InvalidOutputFormat(String),

    /// A single export batch failed. Recorded per batch, not fatal on its own.
    #[error("export batch {batch} failed: {reason}")]
    ExportFailed { batch: usize, reason: String },

    /// Every export batch failed; there is no output to assemble.
    #[error("export failed: none of {attempted} batches rendered")]
    ExportTotalFailure { attempted: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Message(String),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Whether this error is a per-file condition that search treats as
    /// "skip this file" rather than a failure of the whole call.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::TranscriptNotFound { .. } | Self::ParseFailure { .. } | Self::UnknownFormat { .. }
        )
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}
