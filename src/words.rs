//! Word-timestamp synthesis.
//!
//! Word-level search strategies need a flat word sequence with timing. When
//! a transcript only carries sentence-level timing, we approximate: each
//! segment's duration is distributed evenly across its whitespace-split
//! tokens. The approximation is never used when real word timing exists.

use std::path::Path;

use tracing::info;

use crate::segments::{Segment, Word};

/// Flatten a segment list into a word sequence, synthesizing timing for
/// segments that lack it.
///
/// Word *i* of *n* in a synthesized segment spans
/// `[start + i*(dur/n), start + (i+1)*(dur/n))`.
pub fn words_from_segments(segments: &[Segment], file: Option<&Path>) -> Vec<Word> {
    let has_real_timing = segments.first().is_some_and(Segment::has_words);

    if has_real_timing {
        return segments
            .iter()
            .flat_map(|segment| segment.words.iter().flatten())
            .map(|word| Word {
                file: file.map(Path::to_path_buf),
                ..word.clone()
            })
            .collect();
    }

    if let Some(file) = file {
        info!(
            file = %file.display(),
            "synthesizing word-level timestamps (transcript has sentence-level timing only)"
        );
    }

    let mut words = Vec::new();
    for segment in segments {
        let tokens: Vec<&str> = segment.content.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        let per_word = segment.duration() / tokens.len() as f64;
        for (i, token) in tokens.iter().enumerate() {
            words.push(Word {
                word: (*token).to_string(),
                start: segment.start + i as f64 * per_word,
                end: segment.start + (i + 1) as f64 * per_word,
                confidence: 1.0,
                file: file.map(Path::to_path_buf),
            });
        }
    }

    words
}
