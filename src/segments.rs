//! Core data model: transcript segments, word timings and search matches.
//!
//! The canonical transcript interchange format is a JSON array of
//! `{content, start, end, words?}` objects, with word entries shaped as
//! `{word, start, end, conf}`. Everything the rest of the crate does —
//! searching, padding, merging, exporting — operates on these types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One transcript line: a sentence (or cue) with its time range.
///
/// Invariants:
/// - `end > start`
/// - `words`, when present, are time-ordered and fall approximately within
///   `[start, end]` (synthesized word timings are an even-split estimate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub content: String,
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Word>>,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether this segment carries real (non-synthesized) word-level timing.
    pub fn has_words(&self) -> bool {
        self.words.as_ref().is_some_and(|w| !w.is_empty())
    }
}

/// A sub-segment timing unit: one spoken word with its own time range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    pub start: f64,
    pub end: f64,
    /// Recognizer confidence in `[0, 1]`. Absent in older transcripts; we
    /// default to full confidence rather than making every consumer handle
    /// an optional.
    #[serde(rename = "conf", default = "full_confidence")]
    pub confidence: f64,
    /// The originating media file. Attached during search so words from
    /// several files can be pooled (mash search); never part of the
    /// canonical on-disk schema.
    #[serde(skip)]
    pub file: Option<PathBuf>,
}

fn full_confidence() -> f64 {
    1.0
}

/// A search hit: a segment-shaped record tied to its source media file.
///
/// Matches are created by the search engine and copied — never mutated in
/// place — by the composition builder before padding and resync adjust the
/// timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub file: PathBuf,
    pub start: f64,
    pub end: f64,
    pub content: String,
    /// Cosine similarity score; semantic search only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Match {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// The final ordered, overlap-free sequence of matches ready for rendering.
///
/// Invariants after `compose::build`:
/// - ordered by start time within each file grouping as produced
/// - no two consecutive entries for the same file overlap
/// - every `start >= 0`
pub type Composition = Vec<Match>;
