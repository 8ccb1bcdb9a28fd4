use std::fs;
use std::path::{Path, PathBuf};

use clipgrep::Error;
use clipgrep::embeddings::EmbeddingProvider;
use clipgrep::search::{Engine, SearchOpts, SearchType};

/// Write a transcript fixture next to where the media file would live and
/// return the media path.
fn media_with_transcript(dir: &Path, stem: &str, transcript_json: &str) -> PathBuf {
    fs::write(dir.join(format!("{stem}.json")), transcript_json).expect("write fixture");
    dir.join(format!("{stem}.mp4"))
}

#[test]
fn sentence_search_returns_the_whole_segment() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let media = media_with_transcript(
        dir.path(),
        "show",
        r#"[{"content":"Prometo ser o concerto","start":0.0,"end":4.7}]"#,
    );

    let mut engine = Engine::new();
    let results = engine.search(
        &[media.clone()],
        &["concerto".to_string()],
        SearchType::Sentence,
        &SearchOpts::default(),
    )?;

    assert_eq!(results.matches.len(), 1);
    let m = &results.matches[0];
    assert_eq!(m.file, media);
    assert_eq!(m.start, 0.0);
    assert_eq!(m.end, 4.7);
    assert_eq!(m.content, "Prometo ser o concerto");
    Ok(())
}

#[test]
fn sentence_search_never_duplicates_a_segment_across_queries() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let media = media_with_transcript(
        dir.path(),
        "show",
        r#"[{"content":"both words appear here","start":0.0,"end":2.0}]"#,
    );

    let mut engine = Engine::new();
    let results = engine.search(
        &[media],
        &["words".to_string(), "appear".to_string()],
        SearchType::Sentence,
        &SearchOpts::default(),
    )?;

    assert_eq!(results.matches.len(), 1);
    Ok(())
}

#[test]
fn fragment_search_spans_the_matched_words_exactly() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let media = media_with_transcript(
        dir.path(),
        "band",
        r#"[{"content":"Suicidal Tendencies","start":16.78,"end":17.96,
            "words":[{"word":"Suicidal","start":16.78,"end":17.3,"conf":0.98},
                     {"word":"Tendencies","start":17.3,"end":17.96,"conf":0.97}]}]"#,
    );

    let mut engine = Engine::new();
    let results = engine.search(
        &[media],
        &["Suicidal Tendencies".to_string()],
        SearchType::Fragment,
        &SearchOpts::default(),
    )?;

    assert_eq!(results.matches.len(), 1);
    let m = &results.matches[0];
    assert!((m.start - 16.78).abs() < 1e-9);
    assert!((m.end - 17.96).abs() < 1e-9);
    assert_eq!(m.content, "Suicidal Tendencies");
    Ok(())
}

#[test]
fn fragment_matches_are_two_consecutive_words_for_a_two_token_query() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let media = media_with_transcript(
        dir.path(),
        "talk",
        r#"[{"content":"a b a b a","start":0.0,"end":5.0,
            "words":[{"word":"a","start":0.0,"end":1.0},
                     {"word":"b","start":1.0,"end":2.0},
                     {"word":"a","start":2.0,"end":3.0},
                     {"word":"b","start":3.0,"end":4.0},
                     {"word":"a","start":4.0,"end":5.0}]}]"#,
    );

    let mut engine = Engine::new();
    let results = engine.search(
        &[media],
        &["a b".to_string()],
        SearchType::Fragment,
        &SearchOpts {
            exact_match: true,
            ..Default::default()
        },
    )?;

    // The sliding window finds every consecutive (a, b) pair.
    assert_eq!(results.matches.len(), 2);
    for (m, expected_start) in results.matches.iter().zip([0.0, 2.0]) {
        assert_eq!(m.content, "a b");
        assert_eq!(m.start, expected_start);
        assert_eq!(m.end, expected_start + 2.0);
    }
    Ok(())
}

#[test]
fn fragment_search_synthesizes_word_timing_when_missing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    // Sentence-level only: four words over four seconds.
    let media = media_with_transcript(
        dir.path(),
        "talk",
        r#"[{"content":"one two three four","start":0.0,"end":4.0}]"#,
    );

    let mut engine = Engine::new();
    let results = engine.search(
        &[media],
        &["two three".to_string()],
        SearchType::Fragment,
        &SearchOpts::default(),
    )?;

    assert_eq!(results.matches.len(), 1);
    let m = &results.matches[0];
    assert!((m.start - 1.0).abs() < 1e-9);
    assert!((m.end - 3.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn mash_returns_one_match_per_token_in_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let media = media_with_transcript(
        dir.path(),
        "talk",
        r#"[{"content":"Hello, world hello","start":0.0,"end":3.0,
            "words":[{"word":"Hello,","start":0.0,"end":1.0},
                     {"word":"world","start":1.0,"end":2.0},
                     {"word":"hello","start":2.0,"end":3.0}]}]"#,
    );

    let mut engine = Engine::new().with_seed(7);
    let results = engine.search(
        &[media.clone()],
        &["world hello".to_string()],
        SearchType::Mash,
        &SearchOpts::default(),
    )?;

    assert_eq!(results.matches.len(), 2);
    assert_eq!(results.matches[0].content, "world");
    // Normalization strips punctuation: either occurrence of "hello" works.
    assert!(results.matches[1].content.to_lowercase().starts_with("hello"));
    assert!(results.matches.iter().all(|m| m.file == media));
    Ok(())
}

#[test]
fn mash_hard_stops_when_any_token_is_missing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let media = media_with_transcript(
        dir.path(),
        "talk",
        r#"[{"content":"hello world","start":0.0,"end":2.0,
            "words":[{"word":"hello","start":0.0,"end":1.0},
                     {"word":"world","start":1.0,"end":2.0}]}]"#,
    );

    let mut engine = Engine::new().with_seed(7);
    let results = engine.search(
        &[media],
        &["hello missing world".to_string()],
        SearchType::Mash,
        &SearchOpts::default(),
    )?;

    // Not a partial sequence: the whole call comes back empty.
    assert!(results.matches.is_empty());
    Ok(())
}

#[test]
fn mash_is_deterministic_under_a_fixed_seed() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let words: Vec<String> = (0..20)
        .map(|i| {
            format!(
                r#"{{"word":"echo","start":{}.0,"end":{}.5}}"#,
                i, i
            )
        })
        .collect();
    let transcript = format!(
        r#"[{{"content":"echo corpus","start":0.0,"end":20.0,"words":[{}]}}]"#,
        words.join(",")
    );
    let media = media_with_transcript(dir.path(), "talk", &transcript);

    let pick = |seed: u64| -> anyhow::Result<f64> {
        let mut engine = Engine::new().with_seed(seed);
        let results = engine.search(
            &[media.clone()],
            &["echo".to_string()],
            SearchType::Mash,
            &SearchOpts::default(),
        )?;
        Ok(results.matches[0].start)
    };

    assert_eq!(pick(42)?, pick(42)?);
    Ok(())
}

#[test]
fn files_without_transcripts_are_skipped_not_fatal() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let good = media_with_transcript(
        dir.path(),
        "good",
        r#"[{"content":"hello world","start":0.0,"end":2.0}]"#,
    );
    let missing = dir.path().join("missing.mp4");

    let mut engine = Engine::new();
    let results = engine.search(
        &[missing.clone(), good],
        &["hello".to_string()],
        SearchType::Sentence,
        &SearchOpts::default(),
    )?;

    assert_eq!(results.matches.len(), 1);
    assert_eq!(results.skipped.len(), 1);
    assert_eq!(results.skipped[0].0, missing);
    assert!(matches!(
        results.skipped[0].1,
        Error::TranscriptNotFound { .. }
    ));
    Ok(())
}

#[test]
fn empty_matches_is_a_distinct_success() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let media = media_with_transcript(
        dir.path(),
        "talk",
        r#"[{"content":"nothing relevant","start":0.0,"end":2.0}]"#,
    );

    let mut engine = Engine::new();
    let results = engine.search(
        &[media],
        &["absent".to_string()],
        SearchType::Sentence,
        &SearchOpts::default(),
    )?;

    assert!(results.is_empty());
    assert!(results.skipped.is_empty());
    Ok(())
}

/// Embeds a text as presence flags for two keywords plus a constant, so
/// similarity is high exactly when the keyword overlaps.
struct KeywordProvider;

impl EmbeddingProvider for KeywordProvider {
    fn encode(&self, texts: &[String]) -> clipgrep::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let t = t.to_lowercase();
                vec![
                    t.contains("dog") as u8 as f32,
                    t.contains("cat") as u8 as f32,
                    0.5,
                ]
            })
            .collect())
    }
}

#[test]
fn semantic_search_requires_a_provider() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let media = media_with_transcript(
        dir.path(),
        "pets",
        r#"[{"content":"the dog barks","start":0.0,"end":2.0}]"#,
    );

    let mut engine = Engine::new();
    let err = engine
        .search(
            &[media],
            &["dog".to_string()],
            SearchType::Semantic,
            &SearchOpts::default(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::CapabilityUnavailable(_)));
    Ok(())
}

#[test]
fn semantic_search_thresholds_and_sorts_by_score() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let media = media_with_transcript(
        dir.path(),
        "pets",
        r#"[{"content":"a quiet evening","start":0.0,"end":2.0},
            {"content":"the dog barks","start":2.0,"end":4.0},
            {"content":"dog and cat together","start":4.0,"end":6.0}]"#,
    );

    let mut engine = Engine::new().with_embeddings(Box::new(KeywordProvider));
    let results = engine.search(
        &[media.clone()],
        &["the dog".to_string()],
        SearchType::Semantic,
        &SearchOpts {
            threshold: 0.7,
            ..Default::default()
        },
    )?;

    // "a quiet evening" falls below the threshold; the pure dog segment
    // outranks the mixed one.
    assert_eq!(results.matches.len(), 2);
    assert_eq!(results.matches[0].content, "the dog barks");
    assert_eq!(results.matches[1].content, "dog and cat together");
    let scores: Vec<f64> = results.matches.iter().map(|m| m.score.unwrap()).collect();
    assert!(scores[0] >= scores[1]);
    assert!(scores.iter().all(|s| *s >= 0.7));

    // The embeddings cache lands next to the media file.
    assert!(dir.path().join("pets.embeddings").is_file());
    Ok(())
}
