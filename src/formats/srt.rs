//! Plain numbered timed-track (SRT) parsing.
//!
//! Each block is `index / start --> end / text…`. Multi-line text is
//! concatenated with single spaces. This format carries no word-level
//! timing; the synthesizer fills that in downstream when needed.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::formats::timestamp_to_secs;
use crate::segments::Segment;

fn timecode_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{2}:\d{2}:\d{2}[,.]\d{1,3})\s*-->\s*(\d{2}:\d{2}:\d{2}[,.]\d{1,3})")
            .expect("static regex")
    })
}

/// Parse SRT data into canonical segments. Malformed blocks are skipped.
pub fn parse(data: &str) -> Result<Vec<Segment>> {
    let normalized = data.replace("\r\n", "\n");
    let mut segments = Vec::new();

    for block in normalized.split("\n\n") {
        if block.trim().is_empty() {
            continue;
        }
        if let Some(segment) = parse_block(block) {
            segments.push(segment);
        }
    }

    Ok(segments)
}

fn parse_block(block: &str) -> Option<Segment> {
    let lines: Vec<&str> = block.lines().collect();

    // Find the timecode line; the index line precedes it, text follows.
    let (time_idx, caps) = lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| timecode_re().captures(line).map(|c| (i, c)))?;

    let start = timestamp_to_secs(&caps[1])?;
    let end = timestamp_to_secs(&caps[2])?;

    let content = lines[time_idx + 1..]
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if content.is_empty() {
        return None;
    }

    Some(Segment {
        content,
        start,
        end,
        words: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRT: &str = "1\n\
00:00:00,000 --> 00:00:02,500\n\
Prometo ser\n\
o concerto\n\
\n\
2\n\
00:00:02,500 --> 00:00:04,700\n\
segunda legenda\n";

    #[test]
    fn parses_blocks_and_joins_multiline_text() -> anyhow::Result<()> {
        let segments = parse(SRT)?;
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].content, "Prometo ser o concerto");
        assert_eq!(segments[0].start, 0.0);
        assert_eq!(segments[0].end, 2.5);
        assert_eq!(segments[1].content, "segunda legenda");
        assert!(segments[0].words.is_none());
        Ok(())
    }

    #[test]
    fn skips_malformed_blocks() -> anyhow::Result<()> {
        let data = "not a block at all\n\n1\n00:00:01,000 --> 00:00:02,000\nok\n";
        let segments = parse(data)?;
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].content, "ok");
        Ok(())
    }

    #[test]
    fn handles_crlf_line_endings() -> anyhow::Result<()> {
        let data = "1\r\n00:00:00,000 --> 00:00:01,000\r\nwindows line\r\n\r\n";
        let segments = parse(data)?;
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].content, "windows line");
        Ok(())
    }
}
