//! Incremental reader over a structured logfile stream.

use std::io::Read;

use chrono::FixedOffset;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::header::{Header, HeaderParse, Identity};

/// Upper bound on buffered bytes awaiting a complete element.
pub const MAX_BUFFER_SIZE: usize = 32 * 1024;
/// Bytes requested from the stream per top-up.
const SINGLE_READ: usize = 4 * 1024;

/// A parsed element of the stream.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Element {
    /// The header entity opening a file.
    Header(Header),
}

/// Incremental reader producing the parsed elements of one logfile.
///
/// The header comes first; event elements are reserved by the format
/// contract and currently reported as end-of-elements, whatever the
/// remaining bytes hold.
pub struct Reader<R> {
    stream: R,
    buf: Vec<u8>,
    tz: Option<FixedOffset>,
    header_seen: bool,
    eof: bool,
}

impl<R: Read> Reader<R> {
    /// A reader over `stream` using the local offset for zone-less
    /// header times.
    pub fn new(stream: R) -> Self {
        Self::with_time_zone(stream, None)
    }

    /// A reader with an explicit fallback offset for zone-less header
    /// times.
    pub fn with_time_zone(stream: R, tz: Option<FixedOffset>) -> Self {
        Reader {
            stream,
            buf: Vec::new(),
            tz,
            header_seen: false,
            eof: false,
        }
    }

    /// The next parsed element, or `None` at the end of the parseable
    /// stream.
    ///
    /// I/O failures and cancellation pass through unchanged; every other
    /// failure is a `Format` with the cause attached.
    pub fn next_element(&mut self, cancel: &CancelToken) -> Result<Option<Element>> {
        cancel.check()?;
        if self.header_seen {
            // Event parsing is reserved.
            return Ok(None);
        }
        loop {
            cancel.check()?;
            match Header::identify(&self.buf) {
                Identity::NeedMore => {
                    if self.eof {
                        return if self.buf.is_empty() {
                            Ok(None)
                        } else {
                            Err(Error::format("incomplete element"))
                        };
                    }
                    self.fill()?;
                    continue;
                }
                Identity::Mismatch => return Err(Error::format("header expected first")),
                Identity::Match => {}
            }
            match Header::parse(&self.buf, self.tz) {
                Ok(HeaderParse::NeedMore) => {
                    if self.eof {
                        return Err(Error::format("incomplete element"));
                    }
                    self.fill()?;
                }
                Ok(HeaderParse::Parsed { header, consumed }) => {
                    if consumed == 0 {
                        return Err(Error::Internal(
                            "header parse claimed progress without consuming".into(),
                        ));
                    }
                    self.buf.drain(..consumed);
                    self.header_seen = true;
                    return Ok(Some(Element::Header(header)));
                }
                Err(e @ (Error::Io(_) | Error::Cancelled | Error::Format { .. })) => {
                    return Err(e);
                }
                Err(e) => return Err(Error::format_caused_by("malformed header entity", e)),
            }
        }
    }

    /// Consume the reader, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.stream
    }

    fn fill(&mut self) -> Result<()> {
        let want = SINGLE_READ.min(MAX_BUFFER_SIZE - self.buf.len());
        if want == 0 {
            return Err(Error::format("buffer full"));
        }
        let mut chunk = [0u8; SINGLE_READ];
        let n = self.stream.read(&mut chunk[..want])?;
        if n == 0 {
            self.eof = true;
        } else {
            self.buf.extend_from_slice(&chunk[..n]);
        }
        Ok(())
    }
}
