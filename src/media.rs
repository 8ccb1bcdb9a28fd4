//! Media and transcript file classification by extension.

use std::path::Path;

/// Video container extensions we recognize as video sources.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "flv"];

/// Audio container extensions we recognize as audio sources.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "flac", "ogg", "m4a"];

/// Transcript extensions in resolution priority order: the canonical JSON
/// cache first, then cue-based, then plain, then the legacy fallback format.
pub const SUBTITLE_EXTENSIONS: &[&str] = &["json", "vtt", "srt", "transcript"];

/// Broad classification of a media file by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Video,
    Audio,
    Unknown,
}

pub fn media_type(path: &Path) -> MediaType {
    let Some(ext) = extension_lowercase(path) else {
        return MediaType::Unknown;
    };
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        MediaType::Video
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        MediaType::Audio
    } else {
        MediaType::Unknown
    }
}

pub fn is_video_extension(ext: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

pub fn is_audio_extension(ext: &str) -> bool {
    AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

pub fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
