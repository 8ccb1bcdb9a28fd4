//! An `ffmpeg`-backed implementation of the renderer boundary.
//!
//! Clips are cut and joined in a single ffmpeg invocation using the concat
//! demuxer with `inpoint`/`outpoint` entries, so we never materialize one
//! intermediate file per clip ourselves. Batch intermediates produced by
//! the export planner are joined with stream copy.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result as AnyResult};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};
use crate::renderer::{ExportStrategy, MediaRenderer};
use crate::segments::Match;

#[derive(Debug)]
pub struct FfmpegRenderer {
    ffmpeg_path: PathBuf,
}

impl FfmpegRenderer {
    /// Locate `ffmpeg` on the PATH and verify it runs.
    pub fn new() -> Result<Self> {
        Self::with_binary("ffmpeg")
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Result<Self> {
        let ffmpeg_path = binary.into();

        let probe = Command::new(&ffmpeg_path).arg("-version").output();
        match probe {
            Ok(output) if output.status.success() => Ok(Self { ffmpeg_path }),
            _ => Err(Error::CapabilityUnavailable(format!(
                "ffmpeg not available at '{}'",
                ffmpeg_path.display()
            ))),
        }
    }

    fn run(&self, args: &[&str], output: &Path) -> AnyResult<()> {
        let result = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .args(args)
            .arg(output)
            .output()
            .context("failed to execute ffmpeg")?;

        if !result.status.success() {
            anyhow::bail!(
                "ffmpeg failed for '{}': {}",
                output.display(),
                stderr_tail(&result.stderr)
            );
        }

        debug!(output = %output.display(), "ffmpeg run complete");
        Ok(())
    }
}

impl MediaRenderer for FfmpegRenderer {
    fn render(&mut self, clips: &[Match], strategy: ExportStrategy, output: &Path) -> Result<()> {
        let list = write_clip_list(clips).context("failed to write concat list")?;
        let list_path = list.path().to_string_lossy().into_owned();

        let mut args = vec!["-f", "concat", "-safe", "0", "-i", list_path.as_str()];
        match strategy {
            ExportStrategy::Video => {
                args.extend(["-c:v", "libx264", "-preset", "medium", "-crf", "23", "-c:a", "aac"]);
            }
            ExportStrategy::Audio => {
                // Drop any video stream; the audio codec follows the output extension.
                args.push("-vn");
            }
        }

        self.run(&args, output)?;
        Ok(())
    }

    fn concatenate(
        &mut self,
        parts: &[PathBuf],
        _strategy: ExportStrategy,
        output: &Path,
    ) -> Result<()> {
        let list = write_part_list(parts).context("failed to write concat list")?;
        let list_path = list.path().to_string_lossy().into_owned();

        // Intermediates share one encoding, so joining them is a stream copy.
        let args = [
            "-f",
            "concat",
            "-safe",
            "0",
            "-i",
            list_path.as_str(),
            "-c",
            "copy",
        ];
        self.run(&args, output)?;
        Ok(())
    }
}

/// Write a concat-demuxer list with one `file`/`inpoint`/`outpoint` entry
/// per clip.
fn write_clip_list(clips: &[Match]) -> AnyResult<NamedTempFile> {
    let mut list = NamedTempFile::new()?;
    for clip in clips {
        writeln!(list, "file {}", quote_path(&clip.file))?;
        writeln!(list, "inpoint {:.6}", clip.start)?;
        writeln!(list, "outpoint {:.6}", clip.end)?;
    }
    list.flush()?;
    Ok(list)
}

fn write_part_list(parts: &[PathBuf]) -> AnyResult<NamedTempFile> {
    let mut list = NamedTempFile::new()?;
    for part in parts {
        writeln!(list, "file {}", quote_path(part))?;
    }
    list.flush()?;
    Ok(list)
}

/// Quote a path for the concat demuxer: single quotes, with embedded single
/// quotes closed, escaped and reopened.
fn quote_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    format!("'{}'", raw.replace('\'', r"'\''"))
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let tail = lines.len().saturating_sub(5);
    lines[tail..].join("\n")
}
