//! `clipgrep` — search spoken content in media transcripts and compose the
//! matches into renderable supercuts.
//!
//! This crate provides:
//! - Transcript discovery and parsing (VTT, SRT, canonical JSON, legacy
//!   phoneme-aligned) into one canonical segment form, with caching
//! - Four search strategies: sentence, fragment, mash and semantic
//! - Composition building: padding, resync, overlap merging, shuffling
//! - Export planning: strategy selection and memory-bounded batch rendering
//!   through an external renderer, plus playlist/subtitle outputs
//!
//! The library is designed to be used by both CLI tools and long-running
//! services, with an emphasis on clarity, streaming output, and minimal
//! surprises. Transcription and embedding computation are external
//! collaborators injected at the boundaries.

// High-level API (most consumers should start here).
pub mod compose;
pub mod search;

// Canonical data model and media classification.
pub mod media;
pub mod segments;

// Transcript loading: discovery, format parsers, caching, word synthesis.
pub mod formats;
pub mod store;
pub mod words;

// Search collaborators.
pub mod embeddings;
pub mod ngrams;

// Export planning and the renderer boundary.
pub mod export;
pub mod ffmpeg_renderer;
pub mod renderer;

// Output encoders that serialize compositions into various formats.
pub mod clip_encoder;
pub mod edl_encoder;
pub mod json_array_encoder;
pub mod m3u_encoder;
pub mod vtt_encoder;

// The external transcription boundary.
pub mod transcriber;

// Logging configuration and control.
pub mod logging;

pub mod error;

pub use error::{Error, Result};
