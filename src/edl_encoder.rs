use std::io::Write;
use std::path;

use crate::Result;
use crate::clip_encoder::ClipEncoder;
use crate::segments::Match;

/// A `ClipEncoder` that writes an mpv-compatible EDL playlist.
///
/// Each line is `path,start,duration`. Paths are absolutized so the EDL
/// plays from any working directory.
pub struct EdlEncoder<W: Write> {
    w: W,
    started: bool,
    closed: bool,
}

impl<W: Write> EdlEncoder<W> {
    pub fn new(w: W) -> Self {
        Self {
            w,
            started: false,
            closed: false,
        }
    }

    fn start_if_needed(&mut self) -> Result<()> {
        if !self.started {
            self.w.write_all(b"# mpv EDL v0\n")?;
            self.started = true;
        }
        Ok(())
    }
}

impl<W: Write> ClipEncoder for EdlEncoder<W> {
    fn write_clip(&mut self, clip: &Match) -> Result<()> {
        if self.closed {
            return Err(crate::Error::msg(
                "cannot write clip: encoder is already closed",
            ));
        }

        self.start_if_needed()?;

        let absolute = path::absolute(&clip.file).unwrap_or_else(|_| clip.file.clone());
        writeln!(
            &mut self.w,
            "{},{},{}",
            absolute.display(),
            clip.start,
            clip.duration()
        )?;
        self.w.flush()?;

        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.start_if_needed()?;
        self.w.flush()?;
        self.closed = true;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn clip(file: &str, start: f64, end: f64) -> Match {
        Match {
            file: PathBuf::from(file),
            start,
            end,
            content: String::new(),
            score: None,
        }
    }

    #[test]
    fn edl_lines_are_path_start_duration() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = EdlEncoder::new(&mut out);
        enc.write_clip(&clip("/media/a.mp4", 2.0, 3.5))?;
        enc.close()?;

        let s = std::str::from_utf8(&out)?;
        assert!(s.starts_with("# mpv EDL v0\n"));
        assert!(s.contains("/media/a.mp4,2,1.5\n"));
        Ok(())
    }

    #[test]
    fn edl_write_after_close_errors() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = EdlEncoder::new(&mut out);
        enc.close()?;
        assert!(enc.write_clip(&clip("a.mp4", 0.0, 1.0)).is_err());
        Ok(())
    }
}
