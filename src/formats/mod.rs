//! Transcript file formats.
//!
//! Why this exists:
//! - We want a single, strongly-typed representation of transcript formats
//!   across the store and the CLI.
//! - Using an enum avoids stringly-typed suffix conditionals and keeps the
//!   set of supported formats explicit and closed: an unrecognized
//!   extension is an `UnknownFormat` error, never a silent skip.

pub mod srt;
pub mod sphinx;
pub mod vtt;

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::segments::Segment;

/// The supported transcript formats, in the order the store prefers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFormat {
    /// Canonical structured JSON: an array of `{content, start, end, words?}`.
    Json,

    /// Cue-based timed-track format (WebVTT), optionally with inline
    /// per-word timestamp tags.
    Vtt,

    /// Plain numbered timed-track format (SRT). No word-level timing.
    Srt,

    /// Legacy line-oriented phoneme-aligned format (`.transcript`).
    Sphinx,
}

impl TranscriptFormat {
    /// Map a transcript path to its format by extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "vtt" => Some(Self::Vtt),
            "srt" => Some(Self::Srt),
            "transcript" => Some(Self::Sphinx),
            _ => None,
        }
    }

    /// Parse transcript data in this format into canonical segments.
    pub fn parse_str(self, data: &str) -> Result<Vec<Segment>> {
        match self {
            Self::Json => Ok(serde_json::from_str(data)?),
            Self::Vtt => vtt::parse(data),
            Self::Srt => srt::parse(data),
            Self::Sphinx => sphinx::parse(data),
        }
    }
}

/// Read and parse a transcript file, dispatching on its extension.
///
/// All failure modes are folded into the crate error taxonomy:
/// unknown extension, unreadable file, or malformed content.
pub fn parse_file(path: &Path) -> Result<Vec<Segment>> {
    let format = TranscriptFormat::from_path(path).ok_or_else(|| Error::UnknownFormat {
        path: path.to_path_buf(),
    })?;

    let data = fs::read_to_string(path).map_err(|err| Error::ParseFailure {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    format.parse_str(&data).map_err(|err| match err {
        err @ Error::ParseFailure { .. } => err,
        other => Error::ParseFailure {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })
}

/// Convert a `HH:MM:SS(.mmm)` timestamp to seconds.
pub(crate) fn timestamp_to_secs(ts: &str) -> Option<f64> {
    let mut parts = ts.split(':');
    let hours: f64 = parts.next()?.trim().parse().ok()?;
    let minutes: f64 = parts.next()?.trim().parse().ok()?;
    // Seconds may use either `.` or `,` as the decimal separator.
    let seconds: f64 = parts.next()?.trim().replace(',', ".").parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
