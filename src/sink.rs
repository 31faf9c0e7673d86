//! Text sinks the router fans entities out to.

use std::io::Write;

use crate::cancel::CancelToken;
use crate::encoding::{ENTITY_SEPARATOR, RECORD_SEPARATOR};
use crate::error::Result;

/// Capability receiving each serialised entity.
///
/// Every operation may fail; the router swallows all non-cancellation
/// failures, so a broken sink never stops emission. A sink must not close
/// an underlying stream it did not create — dropping a sink releases only
/// what the sink itself owns.
pub trait Sink: Send {
    /// Deliver one serialised entity.
    fn write(&mut self, text: &str, cancel: &CancelToken) -> Result<()>;

    /// Flush any buffered output.
    fn flush(&mut self, cancel: &CancelToken) -> Result<()>;
}

/// Sink over any writer.
///
/// The writer is owned for the sink's lifetime but never explicitly
/// closed; use [`into_inner`](Self::into_inner) to take it back.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap `writer`.
    pub fn new(writer: W) -> Self {
        WriterSink { writer }
    }

    /// Consume the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write(&mut self, text: &str, cancel: &CancelToken) -> Result<()> {
        cancel.check()?;
        self.writer.write_all(text.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self, cancel: &CancelToken) -> Result<()> {
        cancel.check()?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Strip the entity and record separator bytes for console display.
///
/// The visual ornaments and indents written next to the separators stay,
/// so the result reads as plain indented lines.
pub fn beautify(text: &str) -> String {
    text.chars()
        .filter(|c| *c != ENTITY_SEPARATOR as char && *c != RECORD_SEPARATOR as char)
        .collect()
}
