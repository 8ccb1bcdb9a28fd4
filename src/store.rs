//! Transcript discovery and caching.
//!
//! The store is the single entry point for turning a media path into
//! canonical segments. It is an explicitly constructed object owned by the
//! caller (no process-wide singleton): tests get isolated caches, and the
//! host application owns the lifecycle.
//!
//! Resolution order for `find_transcript`:
//! 1. exact same-stem file with a candidate extension (preferred extension
//!    first, then the fixed priority list)
//! 2. fuzzy match: any sibling whose name starts with the media stem and
//!    ends with a candidate extension (covers language-tagged names like
//!    `video.en.srt`)
//! 3. last-resort regex match allowing arbitrary middle segments
//!
//! The first hit wins; later strategies are never consulted once one matches.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use regex::Regex;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::formats;
use crate::media::SUBTITLE_EXTENSIONS;
use crate::segments::Segment;

/// Locate a transcript file for the given media file.
///
/// `prefer` is an extension (with or without the leading dot) to try before
/// the default priority list.
pub fn find_transcript(media: &Path, prefer: Option<&str>) -> Option<PathBuf> {
    let parent = match media.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.exists() {
        return None;
    }

    let stem = media.file_stem()?.to_str()?.to_string();
    let exts = candidate_extensions(prefer);

    // Strategy 1: exact stem match (video.mp4 -> video.srt).
    for ext in &exts {
        let candidate = media.with_extension(ext);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    // List siblings once for the fuzzy strategies. Sorted so resolution is
    // deterministic regardless of directory iteration order.
    let mut siblings: Vec<PathBuf> = fs::read_dir(&parent)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    siblings.sort();

    // Strategy 2: fuzzy match for language-tagged names (video.en.srt).
    for ext in &exts {
        let suffix = format!(".{ext}");
        for path in &siblings {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(&stem) && name.ends_with(&suffix) {
                return Some(path.clone());
            }
        }
    }

    // Strategy 3: legacy regex fallback for complex multi-part extensions.
    for ext in &exts {
        let pattern = format!("{}.*?\\.?{}", regex::escape(&stem), regex::escape(ext));
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        for path in &siblings {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if re.is_match(name) {
                return Some(path.clone());
            }
        }
    }

    None
}

fn candidate_extensions(prefer: Option<&str>) -> Vec<String> {
    let mut exts = Vec::new();
    if let Some(prefer) = prefer {
        exts.push(prefer.trim_start_matches('.').to_ascii_lowercase());
    }
    for ext in SUBTITLE_EXTENSIONS {
        if !exts.iter().any(|e| e == ext) {
            exts.push((*ext).to_string());
        }
    }
    exts
}

#[derive(Debug)]
struct CacheEntry {
    segments: Arc<Vec<Segment>>,
    mtime: Option<SystemTime>,
}

/// Parsed-transcript cache keyed by transcript path, invalidated whenever
/// the on-disk modification time changes.
///
/// A cache hit returns the same in-memory list (`Arc`), so callers must not
/// mutate it — they copy segments into `Match`es before any adjustment.
#[derive(Debug, Default)]
pub struct TranscriptStore {
    cache: HashMap<PathBuf, CacheEntry>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locate and parse the transcript for `media`.
    ///
    /// Not-found and parse failures are logged and reported as `None`; they
    /// are never fatal to a multi-file batch. Use [`try_parse`] when the
    /// concrete error is needed for a skip report.
    ///
    /// [`try_parse`]: TranscriptStore::try_parse
    pub fn parse(&mut self, media: &Path, prefer: Option<&str>) -> Option<Arc<Vec<Segment>>> {
        match self.try_parse(media, prefer) {
            Ok(segments) => Some(segments),
            Err(err) => {
                error!(media = %media.display(), %err, "failed to load transcript");
                None
            }
        }
    }

    /// Like [`parse`](TranscriptStore::parse), but surfaces the error so
    /// callers can aggregate per-file failures.
    pub fn try_parse(&mut self, media: &Path, prefer: Option<&str>) -> Result<Arc<Vec<Segment>>> {
        let path = find_transcript(media, prefer).ok_or_else(|| Error::TranscriptNotFound {
            media: media.to_path_buf(),
        })?;

        let mtime = fs::metadata(&path).and_then(|m| m.modified()).ok();

        if let Some(entry) = self.cache.get(&path) {
            if entry.mtime == mtime && entry.mtime.is_some() {
                debug!(path = %path.display(), "transcript cache hit");
                return Ok(Arc::clone(&entry.segments));
            }
        }

        let segments = Arc::new(formats::parse_file(&path)?);
        self.cache.insert(
            path,
            CacheEntry {
                segments: Arc::clone(&segments),
                mtime,
            },
        );

        Ok(segments)
    }

    /// Drop the cached parse for one media file (e.g. after regenerating
    /// its transcript).
    pub fn invalidate(&mut self, media: &Path) {
        if let Some(path) = find_transcript(media, None) {
            self.cache.remove(&path);
        }
    }

    /// Clear the whole cache.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
