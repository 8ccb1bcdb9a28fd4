//! Legacy line-oriented phoneme-aligned transcript parsing (`.transcript`).
//!
//! One recognized word per line: `word start end [confidence]`, with
//! `<s>` / `</s>` sentence markers and `<sil>` silence entries produced by
//! the aligner. Sentences span from their first word's start to their last
//! word's end.

use crate::error::{Error, Result};
use crate::segments::{Segment, Word};

pub fn parse(data: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut current: Vec<Word> = Vec::new();

    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let token = parts.next().expect("non-empty line has a first token");

        match token {
            "<s>" | "</s>" => {
                flush(&mut segments, &mut current);
            }
            "<sil>" => {}
            word => {
                let start: f64 = parse_field(parts.next(), line)?;
                let end: f64 = parse_field(parts.next(), line)?;
                let confidence: f64 = match parts.next() {
                    Some(raw) => raw
                        .parse()
                        .map_err(|_| Error::msg(format!("bad confidence in line: '{line}'")))?,
                    None => 1.0,
                };

                current.push(Word {
                    word: word.to_string(),
                    start,
                    end,
                    confidence,
                    file: None,
                });
            }
        }
    }

    flush(&mut segments, &mut current);
    Ok(segments)
}

fn parse_field(raw: Option<&str>, line: &str) -> Result<f64> {
    raw.and_then(|r| r.parse().ok())
        .ok_or_else(|| Error::msg(format!("bad timing in line: '{line}'")))
}

fn flush(segments: &mut Vec<Segment>, words: &mut Vec<Word>) {
    if words.is_empty() {
        return;
    }

    let words = std::mem::take(words);
    let content = words
        .iter()
        .map(|w| w.word.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    segments.push(Segment {
        start: words.first().expect("non-empty").start,
        end: words.last().expect("non-empty").end,
        content,
        words: Some(words),
    });
}
