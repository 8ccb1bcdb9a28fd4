use anyhow::Result;
use std::io::Write;

use crate::clip_encoder::ClipEncoder;
use crate::segments::Match;

/// A `ClipEncoder` that writes subtitles for the *rendered* supercut in
/// WebVTT format.
///
/// Design:
/// - We stream output directly to a `Write` implementation.
/// - We write the WebVTT header lazily on the first clip so that:
///   - callers can construct the encoder without immediately writing output
///   - even "no clips" runs still behave predictably (close just flushes)
/// - Cue times are re-based onto a zero-origin timeline by accumulating
///   clip durations: in the rendered output, clip N starts where clip N-1
///   ended, not at its source timestamp.
pub struct VttEncoder<W: Write> {
    /// The underlying writer we stream VTT into.
    w: W,

    /// Where the next clip lands on the rendered timeline.
    cursor: f64,

    /// Cue index for the next clip.
    index: usize,

    /// Whether we've written the `WEBVTT` header.
    started: bool,

    /// Whether the encoder has been closed.
    closed: bool,
}

impl<W: Write> VttEncoder<W> {
    /// Create a new VTT encoder that writes to the provided writer.
    pub fn new(w: W) -> Self {
        Self {
            w,
            cursor: 0.0,
            index: 0,
            started: false,
            closed: false,
        }
    }

    /// Write the WebVTT header if we haven't written it yet.
    fn start_if_needed(&mut self) -> Result<()> {
        if !self.started {
            // WebVTT files begin with a mandatory header line followed by a blank line.
            self.w.write_all(b"WEBVTT\n\n")?;
            self.started = true;
        }
        Ok(())
    }
}

impl<W: Write> ClipEncoder for VttEncoder<W> {
    /// Write a single cue on the rendered timeline.
    fn write_clip(&mut self, clip: &Match) -> crate::Result<()> {
        if self.closed {
            return Err(crate::Error::msg(
                "cannot write clip: encoder is already closed",
            ));
        }

        self.start_if_needed()?;

        let start = self.cursor;
        let end = start + clip.duration();

        // WebVTT timestamps use `HH:MM:SS.mmm`.
        writeln!(&mut self.w, "{}", self.index)?;
        writeln!(
            &mut self.w,
            "{} --> {}",
            format_timestamp_vtt(start),
            format_timestamp_vtt(end)
        )?;

        // Cue text. (We write it verbatim; if we later want to sanitize/escape,
        // this is where we'd do it.)
        writeln!(&mut self.w, "{}", clip.content)?;

        // Blank line separates cues.
        writeln!(&mut self.w)?;

        // Flush so streaming consumers (stdout, pipes, sockets) see output promptly.
        self.w.flush()?;

        self.cursor = end;
        self.index += 1;

        Ok(())
    }

    /// Flush the underlying writer. This is idempotent.
    fn close(&mut self) -> crate::Result<()> {
        if self.closed {
            return Ok(());
        }

        // We flush so callers get output immediately (especially important for streaming to stdout).
        self.w.flush()?;
        self.closed = true;

        Ok(())
    }
}

/// Format seconds into a WebVTT timestamp (`HH:MM:SS.mmm`).
///
/// Rounding policy:
/// - We round to the nearest millisecond to reduce drift when converting from `f64`.
fn format_timestamp_vtt(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round() as u64;

    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;

    let s = total_s % 60;
    let total_m = total_s / 60;

    let m = total_m % 60;
    let h = total_m / 60;

    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn clip(start: f64, end: f64, content: &str) -> Match {
        Match {
            file: PathBuf::from("a.mp4"),
            start,
            end,
            content: content.to_string(),
            score: None,
        }
    }

    #[test]
    fn vtt_close_without_clips_emits_nothing() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = VttEncoder::new(&mut out);
        enc.close()?;
        assert_eq!(std::str::from_utf8(&out)?, "");
        Ok(())
    }

    #[test]
    fn vtt_rebases_cues_onto_the_rendered_timeline() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = VttEncoder::new(&mut out);

        // Source times are 10s in; the rendered supercut starts at zero.
        enc.write_clip(&clip(10.0, 11.5, "hello"))?;
        enc.write_clip(&clip(42.0, 43.0, "world"))?;
        enc.close()?;

        let s = std::str::from_utf8(&out)?;
        assert!(s.starts_with("WEBVTT\n\n"));
        assert!(s.contains("0\n00:00:00.000 --> 00:00:01.500\nhello\n\n"));
        assert!(s.contains("1\n00:00:01.500 --> 00:00:02.500\nworld\n\n"));
        assert_eq!(s.matches("WEBVTT\n\n").count(), 1);
        Ok(())
    }

    #[test]
    fn vtt_format_timestamp_rounds_to_nearest_millisecond() {
        assert_eq!(format_timestamp_vtt(0.0004), "00:00:00.000");
        assert_eq!(format_timestamp_vtt(0.0006), "00:00:00.001");
        assert_eq!(format_timestamp_vtt(1.9995), "00:00:02.000");
        assert_eq!(format_timestamp_vtt(3661.25), "01:01:01.250");
    }

    #[test]
    fn vtt_write_after_close_errors() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = VttEncoder::new(&mut out);
        enc.close()?;
        let err = enc.write_clip(&clip(0.0, 1.0, "nope")).unwrap_err();
        assert!(err.to_string().contains("already closed"));
        Ok(())
    }
}
