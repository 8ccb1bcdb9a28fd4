use crate::Result;
use crate::segments::Match;

/// A streaming encoder for composition clips.
///
/// Implementations serialize clips one at a time into some output format
/// (playlist, subtitle track, JSON). `close` finalizes the output and is
/// idempotent; writing after close is an error.
pub trait ClipEncoder {
    fn write_clip(&mut self, clip: &Match) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}
