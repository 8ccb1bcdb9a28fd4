use std::io::Write;

use crate::Result;
use crate::clip_encoder::ClipEncoder;
use crate::segments::Match;

/// A `ClipEncoder` that writes a VLC-compatible M3U playlist.
///
/// Each clip becomes one playlist entry with `start-time`/`stop-time`
/// options, so VLC plays exactly the matched range of the source file.
pub struct M3uEncoder<W: Write> {
    w: W,
    started: bool,
    closed: bool,
}

impl<W: Write> M3uEncoder<W> {
    pub fn new(w: W) -> Self {
        Self {
            w,
            started: false,
            closed: false,
        }
    }

    /// Write the `#EXTM3U` header if we haven't written it yet.
    fn start_if_needed(&mut self) -> Result<()> {
        if !self.started {
            self.w.write_all(b"#EXTM3U\n")?;
            self.started = true;
        }
        Ok(())
    }
}

impl<W: Write> ClipEncoder for M3uEncoder<W> {
    fn write_clip(&mut self, clip: &Match) -> Result<()> {
        if self.closed {
            return Err(crate::Error::msg(
                "cannot write clip: encoder is already closed",
            ));
        }

        self.start_if_needed()?;

        writeln!(&mut self.w, "#EXTINF:")?;
        writeln!(&mut self.w, "#EXTVLCOPT:start-time={}", clip.start)?;
        writeln!(&mut self.w, "#EXTVLCOPT:stop-time={}", clip.end)?;
        writeln!(&mut self.w, "{}", clip.file.display())?;
        self.w.flush()?;

        Ok(())
    }

    /// Flush the underlying writer. This is idempotent.
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        // An empty playlist still gets its header so players accept the file.
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
    fn m3u_writes_header_and_vlc_options() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = M3uEncoder::new(&mut out);
        enc.write_clip(&clip("a.mp4", 1.5, 3.25))?;
        enc.close()?;

        let s = std::str::from_utf8(&out)?;
        assert_eq!(
            s,
            "#EXTM3U\n#EXTINF:\n#EXTVLCOPT:start-time=1.5\n#EXTVLCOPT:stop-time=3.25\na.mp4\n"
        );
        Ok(())
    }

    #[test]
    fn m3u_empty_playlist_still_has_header() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = M3uEncoder::new(&mut out);
        enc.close()?;
        assert_eq!(std::str::from_utf8(&out)?, "#EXTM3U\n");
        Ok(())
    }

    #[test]
    fn m3u_write_after_close_errors() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = M3uEncoder::new(&mut out);
        enc.close()?;
        assert!(enc.write_clip(&clip("a.mp4", 0.0, 1.0)).is_err());
        Ok(())
    }
}
