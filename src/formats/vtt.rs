//! Cue-based timed-track (WebVTT) parsing.
//!
//! Two flavors show up in the wild:
//! - "cued" files (auto-generated YouTube captions) carry inline
//!   `<HH:MM:SS.mmm>` tags between words, giving word-level timing;
//! - "uncued" files only carry a timing line per cue block.
//!
//! We detect inline tags anywhere in the file and pick the parse path
//! accordingly. Tested against automatically generated YouTube subtitles.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::formats::timestamp_to_secs;
use crate::segments::{Segment, Word};

fn inline_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<(\d\d:\d\d:\d\d(?:\.\d+)?)>").expect("static regex"))
}

fn any_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</?[^>]+>").expect("static regex"))
}

fn timing_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d\d:\d\d:\d\d").expect("static regex"))
}

/// Parse WebVTT data into canonical segments.
pub fn parse(data: &str) -> Result<Vec<Segment>> {
    // Keep only lines that carry a timestamp somewhere; in cued files the
    // content line itself carries inline tags, so pairing each tagged line
    // with its predecessor recovers (timing line, content line) cues.
    let timed: Vec<&str> = data
        .lines()
        .filter(|line| timing_re().is_match(line))
        .collect();

    let mut cues = Vec::new();
    for (i, line) in timed.iter().enumerate() {
        if inline_tag_re().is_match(line) && i > 0 {
            cues.push((timed[i - 1], *line));
        }
    }

    if cues.is_empty() {
        parse_uncued(data)
    } else {
        parse_cued(&cues)
    }
}

/// Parse cue pairs of (timing line, tagged content line) into segments with
/// word-level timing.
///
/// Words between two consecutive inline timestamps get that interval
/// distributed evenly across them; trailing words run to the cue's end.
fn parse_cued(cues: &[(&str, &str)]) -> Result<Vec<Segment>> {
    let mut out = Vec::new();

    for (meta, content) in cues {
        let (seg_start, seg_end) = parse_timing_line(meta)?;

        // Strip styling tags like <c> / </c>, keeping timestamp tags.
        let clean = any_tag_re().replace_all(content, |caps: &regex::Captures| {
            if inline_tag_re().is_match(&caps[0]) {
                caps[0].to_string()
            } else {
                String::new()
            }
        });

        let mut words: Vec<Word> = Vec::new();
        let mut current_time = seg_start;
        let mut rest = clean.as_ref();

        loop {
            let tag = inline_tag_re().captures(rest);
            let (chunk, next_time, advance) = match &tag {
                Some(caps) => {
                    let m = caps.get(0).expect("whole match");
                    let t = timestamp_to_secs(&caps[1])
                        .ok_or_else(|| Error::msg(format!("bad inline timestamp in '{content}'")))?;
                    (&rest[..m.start()], t, m.end())
                }
                None => (rest, seg_end, rest.len()),
            };

            push_words_evenly(&mut words, chunk, current_time, next_time);
            current_time = next_time;

            rest = &rest[advance..];
            if tag.is_none() {
                break;
            }
        }

        if !words.is_empty() {
            let content = words
                .iter()
                .map(|w| w.word.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            out.push(Segment {
                content,
                start: seg_start,
                end: seg_end,
                words: Some(words),
            });
        }
    }

    Ok(out)
}

/// Distribute `[start, end]` evenly across the whitespace-split words of `chunk`.
fn push_words_evenly(words: &mut Vec<Word>, chunk: &str, start: f64, end: f64) {
    let tokens: Vec<&str> = chunk.split_whitespace().collect();
    if tokens.is_empty() {
        return;
    }

    let per_word = (end - start) / tokens.len() as f64;
    for (i, token) in tokens.iter().enumerate() {
        words.push(Word {
            word: (*token).to_string(),
            start: start + i as f64 * per_word,
            end: start + (i + 1) as f64 * per_word,
            confidence: 1.0,
            file: None,
        });
    }
}

/// Parse VTT data that has no inline word tags: a timing line opens each
/// cue, following text lines accumulate into its content.
fn parse_uncued(data: &str) -> Result<Vec<Segment>> {
    let mut out: Vec<Segment> = Vec::new();

    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.contains(" --> ") {
            let (start, end) = parse_timing_line(line)?;
            out.push(Segment {
                content: String::new(),
                start,
                end,
                words: None,
            });
        } else if let Some(current) = out.last_mut() {
            // Skip cue identifiers; everything else is cue text.
            if line.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            if !current.content.is_empty() {
                current.content.push(' ');
            }
            current.content.push_str(line);
        }
    }

    out.retain(|s| !s.content.is_empty());
    Ok(out)
}

/// Parse a `start --> end` cue timing line, ignoring trailing cue settings.
fn parse_timing_line(line: &str) -> Result<(f64, f64)> {
    let (start_str, end_str) = line
        .split_once(" --> ")
        .ok_or_else(|| Error::msg(format!("missing '-->' in timing line: '{line}'")))?;

    let start = timestamp_to_secs(start_str.trim())
        .ok_or_else(|| Error::msg(format!("bad start timestamp: '{line}'")))?;
    let end_str = end_str.split_whitespace().next().unwrap_or(end_str);
    let end = timestamp_to_secs(end_str)
        .ok_or_else(|| Error::msg(format!("bad end timestamp: '{line}'")))?;

    Ok((start, end))
}
