//! The external transcription boundary.
//!
//! Speech-to-text inference lives outside this crate; a provider streams
//! finished segments into a sink as they are produced. What the crate owns
//! is the persistence contract: segments are written to the canonical JSON
//! transcript incrementally, so if the provider is interrupted mid-stream
//! the completed prefix still lands on disk as a valid transcript. Callers
//! that regenerate a transcript should invalidate the store entry for it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::segments::Segment;

/// An external speech-to-text backend.
///
/// Implementations call the sink once per finished segment, in time order.
/// Returning `Ok(false)` from the sink asks the provider to stop early.
pub trait TranscriptionProvider {
    fn transcribe(&mut self, media: &Path, sink: &mut dyn SegmentSink) -> Result<()>;
}

/// Receives segments as a provider produces them.
pub trait SegmentSink {
    fn on_segment(&mut self, segment: Segment) -> Result<bool>;
}

/// Run a provider and persist its segments as a canonical JSON transcript.
///
/// Returns the number of segments written. If the provider errors
/// mid-stream, the segments produced so far are still closed out as a
/// valid JSON array on disk, and the provider's error is then surfaced —
/// the partial transcript is usable (and cached) like any other.
pub fn persist_transcript(
    provider: &mut dyn TranscriptionProvider,
    media: &Path,
    out: &Path,
) -> Result<usize> {
    let file = File::create(out)?;
    let mut writer = JsonSegmentWriter::new(BufWriter::new(file));
    let mut count = 0usize;

    let run_res = {
        let mut sink = WriterSink {
            writer: &mut writer,
            count: &mut count,
        };
        provider.transcribe(media, &mut sink)
    };

    let close_res = writer.close();

    match (run_res, close_res) {
        (Ok(()), Ok(())) => {
            info!(media = %media.display(), segments = count, out = %out.display(), "transcript persisted");
            Ok(count)
        }
        (Ok(()), Err(close_err)) => Err(close_err),
        (Err(err), _) => {
            warn!(
                media = %media.display(),
                segments = count,
                %err,
                "transcription interrupted; keeping the completed prefix"
            );
            Err(err)
        }
    }
}

struct WriterSink<'a, W: Write> {
    writer: &'a mut JsonSegmentWriter<W>,
    count: &'a mut usize,
}

impl<'a, W: Write> SegmentSink for WriterSink<'a, W> {
    fn on_segment(&mut self, segment: Segment) -> Result<bool> {
        self.writer.write(&segment)?;
        *self.count += 1;
        Ok(true)
    }
}

/// Streams segments as one JSON array, element by element.
///
/// Same lazy-start/comma-state shape as the clip array encoder; kept
/// private because it's an implementation detail of `persist_transcript`.
struct JsonSegmentWriter<W: Write> {
    w: W,
    started: bool,
    first: bool,
}

impl<W: Write> JsonSegmentWriter<W> {
    fn new(w: W) -> Self {
        Self {
            w,
            started: false,
            first: true,
        }
    }

    fn start_if_needed(&mut self) -> Result<()> {
        if !self.started {
            self.w.write_all(b"[")?;
            self.started = true;
        }
        Ok(())
    }

    fn write(&mut self, segment: &Segment) -> Result<()> {
        self.start_if_needed()?;
        if !self.first {
            self.w.write_all(b",")?;
        }
        self.first = false;

        serde_json::to_writer(&mut self.w, segment)?;

        // Flush per segment so an interrupted run leaves the prefix on disk.
        self.w.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.start_if_needed()?;
        self.w.write_all(b"]")?;
        self.w.flush()?;
        Ok(())
    }
}
