//! Text-embedding boundary and the on-disk embedding cache.
//!
//! Actual embedding computation is an external collaborator: callers hand
//! the engine an [`EmbeddingProvider`] and we treat it as a black box that
//! turns texts into vectors. What lives here is the part the engine owns —
//! the per-media cache file and the similarity math.
//!
//! Cache contract: one binary file per source media, addressed by replacing
//! the media extension with `.embeddings`; invalidated only by an explicit
//! force-reindex flag, never by mtime.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::segments::Segment;

/// An external text-embedding backend.
///
/// Implementations encode each input text into one fixed-width vector.
/// The engine never inspects the vectors beyond cosine similarity, so any
/// model and dimensionality works as long as queries and segments go
/// through the same provider.
pub trait EmbeddingProvider {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// The cache path for a media file's segment embeddings.
pub fn embeddings_path(media: &Path) -> PathBuf {
    media.with_extension("embeddings")
}

/// Load cached embeddings for `media`, or compute and cache them.
///
/// `force` bypasses and overwrites any existing cache file. A cache file
/// that fails to decode is treated as absent and recomputed.
pub fn load_or_compute(
    provider: &dyn EmbeddingProvider,
    media: &Path,
    segments: &[Segment],
    force: bool,
) -> Result<Vec<Vec<f32>>> {
    let path = embeddings_path(media);

    if !force && path.is_file() {
        match read_cache(&path) {
            Ok(embeddings) => return Ok(embeddings),
            Err(err) => {
                warn!(path = %path.display(), %err, "discarding unreadable embeddings cache");
            }
        }
    }

    info!(media = %media.display(), count = segments.len(), "generating embeddings");
    let texts: Vec<String> = segments.iter().map(|s| s.content.clone()).collect();
    let embeddings = provider.encode(&texts)?;

    let encoded = bincode::serde::encode_to_vec(&embeddings, bincode::config::standard())
        .map_err(|err| Error::msg(format!("failed to encode embeddings cache: {err}")))?;
    fs::write(&path, encoded)?;

    Ok(embeddings)
}

fn read_cache(path: &Path) -> Result<Vec<Vec<f32>>> {
    let bytes = fs::read(path)?;
    let (embeddings, _) =
        bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|err| Error::msg(format!("failed to decode embeddings cache: {err}")))?;
    Ok(embeddings)
}

/// Cosine similarity between two vectors. Zero-magnitude inputs score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Deterministic provider: embeds each text as [len, 1.0], counting calls.
    struct StubProvider {
        calls: Cell<usize>,
    }

    impl StubProvider {
        fn new() -> Self {
            Self { calls: Cell::new(0) }
        }
    }

    impl EmbeddingProvider for StubProvider {
        fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.set(self.calls.get() + 1);
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, 1.0])
                .collect())
        }
    }

    fn segment(content: &str) -> Segment {
        Segment {
            content: content.into(),
            start: 0.0,
            end: 1.0,
            words: None,
        }
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn cache_is_written_once_and_reused() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let media = dir.path().join("talk.mp4");
        let segments = vec![segment("hello"), segment("goodbye")];

        let provider = StubProvider::new();
        let first = load_or_compute(&provider, &media, &segments, false)?;
        assert_eq!(provider.calls.get(), 1);
        assert!(embeddings_path(&media).is_file());

        let second = load_or_compute(&provider, &media, &segments, false)?;
        assert_eq!(provider.calls.get(), 1, "second call must hit the cache");
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn force_reindex_recomputes() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let media = dir.path().join("talk.mp4");
        let segments = vec![segment("hello")];

        let provider = StubProvider::new();
        load_or_compute(&provider, &media, &segments, false)?;
        load_or_compute(&provider, &media, &segments, true)?;
        assert_eq!(provider.calls.get(), 2);
        Ok(())
    }

    #[test]
    fn corrupt_cache_is_recomputed() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let media = dir.path().join("talk.mp4");
        let segments = vec![segment("hello")];

        fs::write(embeddings_path(&media), b"not bincode")?;
        let provider = StubProvider::new();
        let embeddings = load_or_compute(&provider, &media, &segments, false)?;
        assert_eq!(provider.calls.get(), 1);
        assert_eq!(embeddings.len(), 1);
        Ok(())
    }
}
