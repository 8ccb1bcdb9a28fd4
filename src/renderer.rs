//! The external media renderer boundary.
//!
//! Actual audio/video cutting and concatenation is an external
//! collaborator. The export planner only ever hands a renderer the four
//! fields of each clip (`file`, `start`, `end`, `content`) plus the chosen
//! strategy — implementations must not assume anything richer exists.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::segments::Match;

/// Whether an export produces a video or an audio-only file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStrategy {
    Video,
    Audio,
}

/// An external renderer that cuts clips out of source media and joins them.
pub trait MediaRenderer {
    /// Render the given clips, in order, into a single output file.
    fn render(&mut self, clips: &[Match], strategy: ExportStrategy, output: &Path) -> Result<()>;

    /// Concatenate previously rendered intermediate files into `output`.
    fn concatenate(
        &mut self,
        parts: &[PathBuf],
        strategy: ExportStrategy,
        output: &Path,
    ) -> Result<()>;
}
