//! The self-describing header entity opening every logfile.

use chrono::FixedOffset;

use crate::encoding::{
    self, ENTITY_SEPARATOR, INDENT, ORNAMENTS, QUOTATION_MARK, RECORD_SEPARATOR,
    VISUAL_RECORD_SEPARATOR,
};
use crate::error::{Error, Result};
use crate::timefmt::{self, LogTime};

/// Identity literal opening every header entity.
pub const HEADER_IDENTITY: &str = "SLF.1";

const APP_KEY: &str = "app";
const START_UP_KEY: &str = "start-up";
const SEQ_NO_KEY: &str = "seq-no";

/// The entity written at the top of every logfile.
///
/// Created by the router at file open; immutable once serialised.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Application name from the `app` record.
    pub app_name: String,
    /// Instant the producing process started.
    pub start_up: LogTime,
    /// Sequence number of the file within its process instance.
    pub seq_no: u64,
    /// Optional records, kept in insertion order.
    pub misc: Vec<(String, String)>,
}

/// Outcome of a header identity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// Too few bytes to decide.
    NeedMore,
    /// The first record is the header identity literal.
    Match,
    /// The first record is something else.
    Mismatch,
}

/// Successful outcome of [`Header::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderParse {
    /// The buffer does not yet hold a complete entity.
    NeedMore,
    /// A header was parsed.
    Parsed {
        /// The parsed header, start-up converted to UTC.
        header: Header,
        /// Bytes consumed from the start of the input.
        consumed: usize,
    },
}

impl Header {
    /// A header with no optional records.
    pub fn new(app_name: impl Into<String>, start_up: LogTime, seq_no: u64) -> Self {
        Header {
            app_name: app_name.into(),
            start_up,
            seq_no,
            misc: Vec::new(),
        }
    }

    /// Append an optional record.
    pub fn with_misc(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.misc.push((key.into(), value.into()));
        self
    }

    /// Serialise this header as one stream entity.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(96);
        out.push_str(HEADER_IDENTITY);
        push_quoted_record(&mut out, APP_KEY, &self.app_name);
        push_quoted_record(&mut out, START_UP_KEY, &self.start_up.to_iso8601());

        out.push(RECORD_SEPARATOR as char);
        out.push_str(VISUAL_RECORD_SEPARATOR);
        out.push_str(SEQ_NO_KEY);
        out.push('=');
        out.push_str(&self.seq_no.to_string());

        for (key, value) in &self.misc {
            out.push('\n');
            out.push(RECORD_SEPARATOR as char);
            out.push_str(INDENT);
            out.push(QUOTATION_MARK as char);
            out.push_str(&encoding::encode(key, &[QUOTATION_MARK]));
            out.push(QUOTATION_MARK as char);
            out.push('=');
            out.push(QUOTATION_MARK as char);
            out.push_str(&encoding::encode(value, &[QUOTATION_MARK]));
            out.push(QUOTATION_MARK as char);
        }
        out.push(ENTITY_SEPARATOR as char);
        out
    }

    /// Probe whether `bytes` open with a header entity.
    ///
    /// Tolerates a single leading entity separator (the older placement
    /// convention).
    pub fn identify(bytes: &[u8]) -> Identity {
        let bytes = strip_leading_separator(bytes);
        if bytes.len() < HEADER_IDENTITY.len() {
            return Identity::NeedMore;
        }
        match bytes
            .iter()
            .position(|b| *b == RECORD_SEPARATOR || *b == ENTITY_SEPARATOR)
        {
            Some(p) => {
                if &bytes[..p] == HEADER_IDENTITY.as_bytes() {
                    Identity::Match
                } else {
                    Identity::Mismatch
                }
            }
            // Without a separator the first record is still open; it can
            // only turn out to be the identity if it matches it exactly
            // so far.
            None if bytes == HEADER_IDENTITY.as_bytes() => Identity::NeedMore,
            None => Identity::Mismatch,
        }
    }

    /// Parse one header entity from the start of `bytes`.
    ///
    /// An unspecified-zone start-up time is interpreted in `tz` (`None`
    /// means the local offset) and converted to UTC; an offset-zoned one
    /// is converted; UTC is preserved. Structural mismatches fail
    /// `Unsupported`; grammar violations fail `Format`.
    pub fn parse(bytes: &[u8], tz: Option<FixedOffset>) -> Result<HeaderParse> {
        let lead = bytes.len() - strip_leading_separator(bytes).len();
        let split = encoding::split_records(bytes, lead)?;
        if !split.complete {
            return Ok(HeaderParse::NeedMore);
        }
        if split.records.len() < 4 {
            return Err(Error::Unsupported(format!(
                "header has {} records, expected at least 4",
                split.records.len()
            )));
        }
        let records: Vec<&[u8]> = split
            .records
            .iter()
            .map(|r| encoding::trim(r, ORNAMENTS))
            .collect();
        if records[0] != HEADER_IDENTITY.as_bytes() {
            return Err(Error::Unsupported(format!(
                "not a {HEADER_IDENTITY} header"
            )));
        }

        let app_name = expect_kv(records[1], APP_KEY)?;

        let start_text = expect_kv(records[2], START_UP_KEY)?;
        let start_up = match timefmt::parse_iso8601(&start_text) {
            Ok(time) => LogTime::Utc(time.to_utc(tz)),
            Err(e @ Error::Format { .. }) => return Err(e),
            Err(e) => return Err(Error::format_caused_by("bad start-up record", e)),
        };

        let seq_text = expect_kv(records[3], SEQ_NO_KEY)?;
        let seq_no: u64 = seq_text
            .parse()
            .map_err(|e| Error::format(format!("bad sequence number {seq_text:?}: {e}")))?;
        if seq_no == 0 {
            return Err(Error::format("sequence number must be positive"));
        }

        let mut misc = Vec::new();
        for record in &records[4..] {
            let (key, value) = encoding::parse_kv(record)?;
            misc.push((decode_text(key)?, decode_text(value.unwrap_or(b""))?));
        }

        Ok(HeaderParse::Parsed {
            header: Header {
                app_name,
                start_up,
                seq_no,
                misc,
            },
            consumed: lead + split.consumed,
        })
    }
}

fn push_quoted_record(out: &mut String, key: &str, value: &str) {
    out.push(RECORD_SEPARATOR as char);
    out.push_str(VISUAL_RECORD_SEPARATOR);
    out.push_str(key);
    out.push('=');
    out.push(QUOTATION_MARK as char);
    out.push_str(&encoding::encode(value, &[QUOTATION_MARK]));
    out.push(QUOTATION_MARK as char);
}

fn strip_leading_separator(bytes: &[u8]) -> &[u8] {
    match bytes.first() {
        Some(&ENTITY_SEPARATOR) => &bytes[1..],
        _ => bytes,
    }
}

/// Parse `record` as a kv pair whose decoded key must be `expected_key`;
/// returns the decoded value.
fn expect_kv(record: &[u8], expected_key: &str) -> Result<String> {
    let (key, value) = encoding::parse_kv(record)?;
    let key = decode_text(key)?;
    if key != expected_key {
        return Err(Error::Unsupported(format!(
            "expected {expected_key:?} record, found {key:?}"
        )));
    }
    decode_text(value.unwrap_or(b""))
}

fn decode_text(bytes: &[u8]) -> Result<String> {
    let text =
        std::str::from_utf8(bytes).map_err(|_| Error::format("record bytes are not UTF-8"))?;
    encoding::decode(text)
}
