//! Composition building: padding, resync, overlap merging, shuffling and
//! clip limits.
//!
//! Search output is raw: matches may overlap once padding is applied, and
//! callers may want remix-style ordering or a bounded clip count. `build`
//! turns raw matches into the final composition the export planner renders.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::segments::{Composition, Match};
use crate::search::SearchType;

/// Default padding for fragment search: smooths abrupt word boundaries.
pub const DEFAULT_PADDING: f64 = 0.3;

/// Micro-padding for mash search: keeps single-word clips from overlapping.
pub const MASH_PADDING: f64 = 0.05;

/// Options controlling composition construction.
#[derive(Debug, Clone, Default)]
pub struct ComposeOpts {
    /// Symmetric time expansion per match, in seconds. When `None`, a
    /// per-strategy default applies (see [`default_padding`]).
    pub padding: Option<f64>,

    /// Constant offset correcting systematic transcript/media drift.
    pub resync: f64,

    /// Shuffle the merged composition for remix-style output.
    pub randomize: bool,

    /// Keep at most this many clips (0 = unlimited). Applied last, after
    /// ordering is finalized.
    pub max_clips: usize,
}

/// Default padding policy when the caller does not specify one.
///
/// Word-level strategies get a small positive pad; mash gets an even
/// smaller one; sentence timing already includes natural breathing room.
pub fn default_padding(search_type: SearchType) -> f64 {
    match search_type {
        SearchType::Fragment => DEFAULT_PADDING,
        SearchType::Mash => MASH_PADDING,
        SearchType::Sentence | SearchType::Semantic => 0.0,
    }
}

/// Merge time overlaps between clips from the same file.
///
/// Sorts by start time, then walks the list once: a clip merges into its
/// predecessor only when both come from the same file and the predecessor's
/// end reaches the clip's start. The pass is greedy and single — it does
/// not reorder across files, and it is idempotent on its own output.
pub fn remove_overlaps(mut segments: Vec<Match>) -> Vec<Match> {
    if segments.is_empty() {
        return segments;
    }

    segments.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));

    let mut out: Vec<Match> = Vec::with_capacity(segments.len());
    for segment in segments {
        match out.last_mut() {
            Some(previous) if previous.file == segment.file && previous.end >= segment.start => {
                previous.end = previous.end.max(segment.end);
            }
            _ => out.push(segment),
        }
    }

    out
}

/// Apply padding and resync to copies of the matches, clamp timestamps to
/// zero, and merge any overlaps the adjustment created.
pub fn pad_and_sync(matches: &[Match], padding: f64, resync: f64) -> Vec<Match> {
    if matches.is_empty() {
        return Vec::new();
    }

    let processed = matches
        .iter()
        .map(|m| {
            let mut clip = m.clone();
            clip.start = (clip.start - padding + resync).max(0.0);
            clip.end = (clip.end + padding + resync).max(0.0);
            clip
        })
        .collect();

    remove_overlaps(processed)
}

/// Build the final composition from raw search matches.
pub fn build(
    matches: &[Match],
    search_type: SearchType,
    opts: &ComposeOpts,
    rng: &mut impl Rng,
) -> Composition {
    let padding = opts.padding.unwrap_or_else(|| default_padding(search_type));
    let mut composition = pad_and_sync(matches, padding, opts.resync);

    // Shuffling is only meaningful after merging: shuffling raw matches
    // would corrupt the same-file-adjacency assumption the merge relies on.
    if opts.randomize {
        composition.shuffle(rng);
    }

    if opts.max_clips > 0 {
        composition.truncate(opts.max_clips);
    }

    composition
}
