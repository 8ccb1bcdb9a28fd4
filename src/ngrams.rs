//! N-gram extraction over transcript word sequences.
//!
//! Useful for corpus exploration: what phrases exist before you search for
//! them. Real word timing is used when present; otherwise segment content
//! is split on punctuation and whitespace.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

use crate::store::TranscriptStore;

fn split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[.?!,:"]+\s*|\s+"#).expect("static regex"))
}

/// Extract all n-grams across the given files' transcripts.
///
/// Files without a usable transcript are skipped (the store logs them).
pub fn ngrams(
    store: &mut TranscriptStore,
    files: &[PathBuf],
    n: usize,
    prefer: Option<&str>,
) -> Vec<Vec<String>> {
    if n == 0 {
        return Vec::new();
    }

    let mut words: Vec<String> = Vec::new();
    for file in files {
        let Some(segments) = store.parse(file, prefer) else {
            continue;
        };

        for segment in segments.iter() {
            match &segment.words {
                Some(segment_words) if !segment_words.is_empty() => {
                    words.extend(segment_words.iter().map(|w| w.word.clone()));
                }
                _ => {
                    words.extend(
                        split_re()
                            .split(&segment.content)
                            .filter(|t| !t.is_empty())
                            .map(str::to_string),
                    );
                }
            }
        }
    }

    words.windows(n).map(<[String]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn bigrams_span_segment_boundaries() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("talk.json"),
            r#"[{"content":"one two","start":0.0,"end":1.0},
                {"content":"three","start":1.0,"end":2.0}]"#,
        )?;

        let mut store = TranscriptStore::new();
        let grams = ngrams(&mut store, &[dir.path().join("talk.mp4")], 2, None);
        assert_eq!(
            grams,
            vec![
                vec!["one".to_string(), "two".to_string()],
                vec!["two".to_string(), "three".to_string()],
            ]
        );
        Ok(())
    }

    #[test]
    fn punctuation_does_not_leak_into_tokens() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("talk.json"),
            r#"[{"content":"well, hello! there","start":0.0,"end":1.0}]"#,
        )?;

        let mut store = TranscriptStore::new();
        let grams = ngrams(&mut store, &[dir.path().join("talk.mp4")], 1, None);
        let flat: Vec<String> = grams.into_iter().flatten().collect();
        assert_eq!(flat, vec!["well", "hello", "there"]);
        Ok(())
    }

    #[test]
    fn zero_n_yields_nothing() {
        let mut store = TranscriptStore::new();
        assert!(ngrams(&mut store, &[], 0, None).is_empty());
    }
}
