//! Export planning: strategy selection, batching, and failure accounting.
//!
//! Large compositions are split into contiguous batches and rendered
//! strictly sequentially — each batch's render fully completes before the
//! next starts, which bounds peak memory in the external renderer. A batch
//! failure is recorded and the remaining batches still run; the whole
//! operation only fails when zero batches rendered.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::media::{self, MediaType};
use crate::renderer::{ExportStrategy, MediaRenderer};
use crate::segments::Match;

/// Number of clips per render batch for large supercuts.
pub const BATCH_SIZE: usize = 20;

/// Classify the composition's sources: video wins over audio when mixed.
pub fn input_media_type(composition: &[Match]) -> MediaType {
    let mut saw_audio = false;
    for clip in composition {
        match media::media_type(&clip.file) {
            MediaType::Video => return MediaType::Video,
            MediaType::Audio => saw_audio = true,
            MediaType::Unknown => {}
        }
    }
    if saw_audio {
        MediaType::Audio
    } else {
        MediaType::Unknown
    }
}

/// Decide the export strategy from the composition's sources and the
/// requested output extension.
///
/// Video sources prefer a video strategy unless the output extension is
/// audio-only. Audio-only sources against a video output extension is an
/// error: video cannot be synthesized from audio.
pub fn plan_strategy(composition: &[Match], output: &Path) -> Result<ExportStrategy> {
    let input = input_media_type(composition);
    let ext = media::extension_lowercase(output).unwrap_or_default();
    let output_is_video = media::is_video_extension(&ext);
    let output_is_audio = media::is_audio_extension(&ext);

    match input {
        MediaType::Audio if output_is_video => Err(Error::InvalidOutputFormat(format!(
            "cannot produce video output '{}' from audio-only sources; use an audio extension like .mp3",
            output.display()
        ))),
        MediaType::Audio => Ok(ExportStrategy::Audio),
        MediaType::Video if output_is_audio => Ok(ExportStrategy::Audio),
        MediaType::Video => Ok(ExportStrategy::Video),
        MediaType::Unknown if output_is_audio => Ok(ExportStrategy::Audio),
        MediaType::Unknown => Ok(ExportStrategy::Video),
    }
}

/// Split a composition into contiguous ordered batches.
pub fn chunk(composition: &[Match], batch_size: usize) -> Vec<&[Match]> {
    if composition.is_empty() || batch_size == 0 {
        return Vec::new();
    }
    composition.chunks(batch_size).collect()
}

/// What happened to each batch of an export run.
#[derive(Debug)]
pub struct ExportSummary {
    pub total_batches: usize,
    pub rendered: usize,
    pub failed: Vec<(usize, Error)>,
}

impl ExportSummary {
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Fraction of batches that rendered, in `[0, 1]`.
    pub fn fraction_rendered(&self) -> f64 {
        if self.total_batches == 0 {
            return 1.0;
        }
        self.rendered as f64 / self.total_batches as f64
    }
}

/// Render a whole composition in a single pass.
pub fn create_supercut(
    renderer: &mut dyn MediaRenderer,
    composition: &[Match],
    output: &Path,
) -> Result<()> {
    if composition.is_empty() {
        return Ok(());
    }

    let strategy = plan_strategy(composition, output)?;
    info!(clips = composition.len(), output = %output.display(), "rendering supercut");
    let result = renderer.render(composition, strategy, output);
    cleanup_scratch_logs(output);
    result
}

/// Render a composition in memory-bounded batches.
///
/// Each batch renders into an intermediate file inside a temporary
/// directory; the surviving intermediates are concatenated into `output`.
/// Batches run strictly sequentially. Per-batch failures are logged and
/// recorded; only zero successes fails the whole operation. Intermediates
/// and scratch logs are removed on every exit path.
///
/// `progress` receives an overall fraction in `[0, 1]` as work completes.
pub fn create_supercut_in_batches(
    renderer: &mut dyn MediaRenderer,
    composition: &[Match],
    output: &Path,
    batch_size: usize,
    mut progress: Option<&mut dyn FnMut(f64)>,
) -> Result<ExportSummary> {
    let batches = chunk(composition, batch_size);
    if batches.is_empty() {
        return Ok(ExportSummary {
            total_batches: 0,
            rendered: 0,
            failed: Vec::new(),
        });
    }

    let strategy = plan_strategy(composition, output)?;
    let ext = media::extension_lowercase(output).unwrap_or_else(|| {
        match strategy {
            ExportStrategy::Video => "mp4".to_string(),
            ExportStrategy::Audio => "mp3".to_string(),
        }
    });

    // Intermediates live in a scratch directory beside the output so the
    // final concatenation never crosses filesystems; the directory is
    // removed on drop, success or not.
    let parent = output.parent().filter(|p| !p.as_os_str().is_empty());
    let scratch = match parent {
        Some(parent) => TempDir::new_in(parent)?,
        None => TempDir::new()?,
    };

    let mut parts: Vec<PathBuf> = Vec::new();
    let mut failed: Vec<(usize, Error)> = Vec::new();

    for (index, batch) in batches.iter().enumerate() {
        let part = scratch.path().join(format!("batch{index:04}.{ext}"));
        info!(batch = index, clips = batch.len(), "rendering batch");

        match renderer.render(batch, strategy, &part) {
            Ok(()) => parts.push(part),
            Err(err) => {
                error!(batch = index, %err, "batch render failed; continuing");
                failed.push((
                    index,
                    Error::ExportFailed {
                        batch: index,
                        reason: err.to_string(),
                    },
                ));
            }
        }

        if let Some(progress) = progress.as_deref_mut() {
            progress((index + 1) as f64 / batches.len() as f64 * 0.8);
        }
    }

    if parts.is_empty() {
        cleanup_scratch_logs(output);
        return Err(Error::ExportTotalFailure {
            attempted: batches.len(),
        });
    }

    let summary = ExportSummary {
        total_batches: batches.len(),
        rendered: parts.len(),
        failed,
    };

    if summary.is_partial() {
        warn!(
            rendered = summary.rendered,
            total = summary.total_batches,
            "partial export: continuing with the batches that rendered"
        );
    }

    info!(parts = parts.len(), output = %output.display(), "concatenating batches");
    let concat_result = renderer.concatenate(&parts, strategy, output);
    cleanup_scratch_logs(output);
    concat_result?;

    if let Some(progress) = progress.as_deref_mut() {
        progress(1.0);
    }

    Ok(summary)
}

/// Export each clip of the composition as its own file:
/// `basename_00000.ext`, `basename_00001.ext`, …
pub fn export_individual_clips(
    renderer: &mut dyn MediaRenderer,
    composition: &[Match],
    output: &Path,
) -> Result<ExportSummary> {
    if composition.is_empty() {
        return Ok(ExportSummary {
            total_batches: 0,
            rendered: 0,
            failed: Vec::new(),
        });
    }

    let strategy = plan_strategy(composition, output)?;
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("clip");
    let ext = media::extension_lowercase(output).unwrap_or_else(|| "mp4".to_string());
    let dir = output.parent().unwrap_or_else(|| Path::new("."));

    let mut rendered = 0;
    let mut failed = Vec::new();

    for (index, clip) in composition.iter().enumerate() {
        let path = dir.join(format!("{stem}_{index:05}.{ext}"));
        match renderer.render(std::slice::from_ref(clip), strategy, &path) {
            Ok(()) => rendered += 1,
            Err(err) => {
                error!(clip = index, %err, "clip export failed; continuing");
                failed.push((
                    index,
                    Error::ExportFailed {
                        batch: index,
                        reason: err.to_string(),
                    },
                ));
            }
        }
    }

    cleanup_scratch_logs(output);

    if rendered == 0 {
        return Err(Error::ExportTotalFailure {
            attempted: composition.len(),
        });
    }

    Ok(ExportSummary {
        total_batches: composition.len(),
        rendered,
        failed,
    })
}

/// Remove scratch log files some renderers leave beside the output.
pub fn cleanup_scratch_logs(output: &Path) {
    let Some(dir) = output.parent().filter(|p| p.exists()) else {
        return;
    };
    let Some(stem) = output.file_stem().and_then(|s| s.to_str()) else {
        return;
    };

    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(stem) && name.ends_with(".log") {
            let _ = fs::remove_file(entry.path());
        }
    }
}
