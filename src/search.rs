//! The search engine: four strategies over canonical transcript segments.
//!
//! We expose a single entry point (`Engine::search`) that wraps transcript
//! loading, word-timestamp synthesis, and the per-strategy matching logic.
//!
//! The intent is:
//! - The transcript store (and its cache) is loaded once and reused across
//!   repeated searches.
//! - The embedding provider is injected once; semantic search fails with a
//!   distinct capability error when it is absent.
//! - The random source is owned by the engine and seedable, so mash output
//!   is reproducible under a fixed seed.
//!
//! Per-file problems (no transcript, malformed transcript) are recorded in
//! the result summary and logged — they never abort a multi-file batch.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::{Regex, RegexBuilder};
use tracing::{error, warn};

use crate::embeddings::{EmbeddingProvider, cosine_similarity, load_or_compute};
use crate::error::{Error, Result};
use crate::segments::Match;
use crate::store::TranscriptStore;
use crate::words::words_from_segments;

/// Default similarity threshold for semantic search.
pub const DEFAULT_SEMANTIC_THRESHOLD: f64 = 0.45;

/// Available search strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SearchType {
    /// Match whole transcript segments against each query.
    Sentence,

    /// Match a contiguous run of words using word-level timing.
    Fragment,

    /// Assemble one randomly chosen occurrence per query token.
    Mash,

    /// Rank segments by embedding similarity to the queries.
    Semantic,
}

impl FromStr for SearchType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sentence" => Ok(Self::Sentence),
            "fragment" => Ok(Self::Fragment),
            "mash" => Ok(Self::Mash),
            "semantic" => Ok(Self::Semantic),
            other => Err(Error::InvalidSearchType(other.to_string())),
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sentence => "sentence",
            Self::Fragment => "fragment",
            Self::Mash => "mash",
            Self::Semantic => "semantic",
        };
        f.write_str(name)
    }
}

/// Options shared by all search strategies.
#[derive(Debug, Clone)]
pub struct SearchOpts {
    /// Preferred transcript extension to try before the priority list.
    pub prefer: Option<String>,

    /// Match whole words only (queries are escaped and boundary-wrapped).
    pub exact_match: bool,

    /// Minimum similarity score for semantic matches.
    pub threshold: f64,

    /// Regenerate embedding caches instead of loading them.
    pub force_reindex: bool,
}

impl Default for SearchOpts {
    fn default() -> Self {
        Self {
            prefer: None,
            exact_match: false,
            threshold: DEFAULT_SEMANTIC_THRESHOLD,
            force_reindex: false,
        }
    }
}

/// The outcome of one search call.
///
/// `matches` empty is a distinct, successful "no results" — callers can
/// tell it apart from failures, which are either in `skipped` (per-file,
/// non-fatal) or returned as `Err` from [`Engine::search`].
#[derive(Debug, Default)]
pub struct SearchResults {
    pub matches: Vec<Match>,
    pub skipped: Vec<(PathBuf, Error)>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// The main search entry point.
///
/// `Engine` owns the long-lived pieces:
/// - the injected [`TranscriptStore`] (parsed-transcript cache)
/// - an optional boxed [`EmbeddingProvider`] for semantic search
/// - a seedable random source for mash selection and shuffling
pub struct Engine {
    store: TranscriptStore,
    embeddings: Option<Box<dyn EmbeddingProvider>>,
    rng: StdRng,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_store(TranscriptStore::new())
    }

    /// Create an engine around an existing transcript store, preserving its
    /// cache.
    pub fn with_store(store: TranscriptStore) -> Self {
        Self {
            store,
            embeddings: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Attach an embedding provider, enabling semantic search.
    pub fn with_embeddings(mut self, provider: Box<dyn EmbeddingProvider>) -> Self {
        self.embeddings = Some(provider);
        self
    }

    /// Seed the engine's random source for reproducible mash/shuffle output.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn store(&self) -> &TranscriptStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TranscriptStore {
        &mut self.store
    }

    /// The engine's random source, for shuffling downstream of search.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Search `files` for `queries` using the given strategy.
    ///
    /// Queries are independent (OR'd). Files with no usable transcript are
    /// skipped, logged, and recorded in the result summary.
    pub fn search(
        &mut self,
        files: &[PathBuf],
        queries: &[String],
        search_type: SearchType,
        opts: &SearchOpts,
    ) -> Result<SearchResults> {
        match search_type {
            SearchType::Sentence => self.search_sentence(files, queries, opts),
            SearchType::Fragment => self.search_fragment(files, queries, opts),
            SearchType::Mash => self.search_mash(files, queries, opts),
            SearchType::Semantic => self.search_semantic(files, queries, opts),
        }
    }

    fn search_sentence(
        &mut self,
        files: &[PathBuf],
        queries: &[String],
        opts: &SearchOpts,
    ) -> Result<SearchResults> {
        let regexes = compile_queries(queries, opts.exact_match)?;
        let mut results = SearchResults::default();

        for file in files {
            let Some(segments) = self.load_or_skip(file, opts, &mut results) else {
                continue;
            };

            for segment in segments.iter() {
                // First matching query wins; one segment never yields
                // duplicate matches even when several queries hit it.
                if regexes.iter().any(|re| re.is_match(&segment.content)) {
                    results.matches.push(Match {
                        file: file.clone(),
                        start: segment.start,
                        end: segment.end,
                        content: segment.content.clone(),
                        score: None,
                    });
                }
            }
        }

        Ok(results)
    }

    fn search_fragment(
        &mut self,
        files: &[PathBuf],
        queries: &[String],
        opts: &SearchOpts,
    ) -> Result<SearchResults> {
        // Each query is a token sequence; every token becomes its own regex.
        let mut token_sets: Vec<Vec<Regex>> = Vec::new();
        for query in queries {
            let tokens: Vec<String> = query.split_whitespace().map(str::to_string).collect();
            if tokens.is_empty() {
                continue;
            }
            token_sets.push(compile_queries(&tokens, opts.exact_match)?);
        }

        let mut results = SearchResults::default();

        for file in files {
            let Some(segments) = self.load_or_skip(file, opts, &mut results) else {
                continue;
            };
            let words = words_from_segments(&segments, Some(file));

            // Fragments never span file boundaries: the window sweep runs
            // over one file's word sequence at a time.
            for token_regexes in &token_sets {
                for window in words.windows(token_regexes.len()) {
                    let all_match = token_regexes
                        .iter()
                        .zip(window.iter())
                        .all(|(re, word)| re.is_match(&word.word));
                    if !all_match {
                        continue;
                    }

                    let content = window
                        .iter()
                        .map(|w| w.word.as_str())
                        .collect::<Vec<_>>()
                        .join(" ");
                    results.matches.push(Match {
                        file: file.clone(),
                        start: window[0].start,
                        end: window[window.len() - 1].end,
                        content,
                        score: None,
                    });
                }
            }
        }

        Ok(results)
    }

    fn search_mash(
        &mut self,
        files: &[PathBuf],
        queries: &[String],
        opts: &SearchOpts,
    ) -> Result<SearchResults> {
        let mut results = SearchResults::default();

        let mut all_words = Vec::new();
        for file in files {
            let Some(segments) = self.load_or_skip(file, opts, &mut results) else {
                continue;
            };
            all_words.extend(words_from_segments(&segments, Some(file)));
        }

        if all_words.is_empty() {
            error!("could not extract any words from the provided files");
            return Ok(results);
        }

        let tokens: Vec<&str> = queries
            .iter()
            .flat_map(|q| q.split_whitespace())
            .collect();

        let mut picked = Vec::with_capacity(tokens.len());
        for token in tokens {
            let normalized_token = normalize_word(token);
            let candidates: Vec<&crate::segments::Word> = all_words
                .iter()
                .filter(|w| normalize_word(&w.word) == normalized_token)
                .collect();

            // A mash composition is meaningless with a missing token, so a
            // single miss empties the whole result rather than yielding a
            // partial sequence.
            if candidates.is_empty() {
                error!(token, "mash token has no occurrences; returning no results");
                return Ok(results);
            }

            let word = candidates[self.rng.gen_range(0..candidates.len())];
            picked.push(Match {
                file: word.file.clone().unwrap_or_default(),
                start: word.start,
                end: word.end,
                content: word.word.clone(),
                score: None,
            });
        }

        results.matches = picked;
        Ok(results)
    }

    fn search_semantic(
        &mut self,
        files: &[PathBuf],
        queries: &[String],
        opts: &SearchOpts,
    ) -> Result<SearchResults> {
        let Some(provider) = self.embeddings.as_deref() else {
            return Err(Error::CapabilityUnavailable(
                "semantic search requires an embedding provider".to_string(),
            ));
        };

        let query_embeddings = provider.encode(queries)?;
        let mut results = SearchResults::default();

        // (file, start, end, content, embedding) in encounter order.
        let mut corpus: Vec<(PathBuf, f64, f64, String, Vec<f32>)> = Vec::new();

        for file in files {
            let segments = match self.store.try_parse(file, opts.prefer.as_deref()) {
                Ok(segments) => segments,
                Err(err) => {
                    error!(file = %file.display(), %err, "skipping file");
                    results.skipped.push((file.clone(), err));
                    continue;
                }
            };

            let embeddings = match load_or_compute(provider, file, &segments, opts.force_reindex) {
                Ok(embeddings) => embeddings,
                Err(err) => {
                    error!(file = %file.display(), %err, "skipping file: embeddings unavailable");
                    results.skipped.push((file.clone(), err));
                    continue;
                }
            };

            if embeddings.len() != segments.len() {
                warn!(
                    file = %file.display(),
                    cached = embeddings.len(),
                    segments = segments.len(),
                    "embeddings cache length mismatch; pairing truncated (use force_reindex to rebuild)"
                );
            }

            for (segment, embedding) in segments.iter().zip(embeddings) {
                corpus.push((
                    file.clone(),
                    segment.start,
                    segment.end,
                    segment.content.clone(),
                    embedding,
                ));
            }
        }

        for query_embedding in &query_embeddings {
            for (file, start, end, content, embedding) in &corpus {
                let score = cosine_similarity(query_embedding, embedding);
                if score >= opts.threshold {
                    results.matches.push(Match {
                        file: file.clone(),
                        start: *start,
                        end: *end,
                        content: content.clone(),
                        score: Some(score),
                    });
                }
            }
        }

        // Stable sort: equal scores keep first-encountered order.
        results.matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(results)
    }

    /// Load a file's transcript, or record it as skipped.
    fn load_or_skip(
        &mut self,
        file: &Path,
        opts: &SearchOpts,
        results: &mut SearchResults,
    ) -> Option<std::sync::Arc<Vec<crate::segments::Segment>>> {
        match self.store.try_parse(file, opts.prefer.as_deref()) {
            Ok(segments) => Some(segments),
            Err(err) => {
                error!(file = %file.display(), %err, "skipping file");
                results.skipped.push((file.to_path_buf(), err));
                None
            }
        }
    }
}

/// Compile each query into a case-insensitive regex.
///
/// With `exact_match`, the query is escaped and wrapped in word boundaries
/// so it matches whole words only; otherwise it is used as a regex pattern
/// verbatim.
fn compile_queries(queries: &[String], exact_match: bool) -> Result<Vec<Regex>> {
    queries
        .iter()
        .map(|query| {
            let pattern = if exact_match {
                format!(r"\b{}\b", regex::escape(query))
            } else {
                query.clone()
            };
            RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map_err(|err| Error::msg(format!("invalid query pattern '{query}': {err}")))
        })
        .collect()
}

/// Lowercase and strip sentence punctuation for mash token comparison.
fn normalize_word(word: &str) -> String {
    word.to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | '?' | '!' | ',' | ':' | '"'))
        .collect()
}
