//! Byte-level framing for the stream: separator constants, percent
//! escaping, line and record splitting, and the tolerant key/value parser.
//!
//! Everything here works on byte slices; interpretation as text happens in
//! the callers, and only for keys, known literals, and human-visible value
//! content.

use crate::error::{Error, Result};

/// Entity separator; ends a header or event entity.
pub const ENTITY_SEPARATOR: u8 = 0x1E;
/// Record separator; ends one record within an entity.
pub const RECORD_SEPARATOR: u8 = 0x1F;
/// Quotation mark for keys and values (a backtick).
pub const QUOTATION_MARK: u8 = b'`';
/// Assignment byte between a key and its value.
pub const ASSIGNMENT: u8 = b'=';
/// Visual ornament emitted after a record separator for readability.
pub const VISUAL_RECORD_SEPARATOR: &str = " == ";
/// Continuation-line indent.
pub const INDENT: &str = "    ";
/// Bytes the parser discards around records and unquoted tokens.
pub const ORNAMENTS: &[u8] = b" -=#*\t\n";

const ESCAPE: u8 = b'%';
const HEX: &[u8; 16] = b"0123456789ABCDEF";

fn must_escape(b: u8, extras: &[u8]) -> bool {
    b == ESCAPE || extras.contains(&b) || (b < 0x20 && !matches!(b, 0x09 | 0x0A | 0x0D))
}

/// Percent-encode `text` for placement inside a record.
///
/// Escapes the escape introducer `%`, every byte listed in `extras`, and
/// every control byte in `[0x00, 0x1F]` except tab, LF, and CR, as `%HH`
/// with upper-case hex digits. All other bytes pass through. There is no
/// already-encoded detection: encoding a second time re-encodes any `%`
/// the first pass produced.
pub fn encode(text: &str, extras: &[u8]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut utf8 = [0u8; 4];
    for ch in text.chars() {
        let bytes = ch.encode_utf8(&mut utf8).as_bytes();
        if bytes.iter().any(|b| must_escape(*b, extras)) {
            for b in bytes {
                out.push(ESCAPE as char);
                out.push(HEX[(b >> 4) as usize] as char);
                out.push(HEX[(b & 0x0F) as usize] as char);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Reverse [`encode`].
///
/// Fails `Format` when a `%` is not followed by two hex digits, when the
/// input ends inside an escape, or when the decoded bytes are not UTF-8.
pub fn decode(text: &str) -> Result<String> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == ESCAPE {
            let hi = bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16));
            let lo = bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16));
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    out.push(((hi << 4) | lo) as u8);
                    i += 3;
                }
                _ => return Err(Error::format(format!("invalid escape at byte {i}"))),
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| Error::format("escape sequence decodes to invalid UTF-8"))
}

/// Split decoded text into lines, normalising CRLF and lone CR to LF.
///
/// Empty input yields one empty line; a trailing LF yields a trailing
/// empty line.
pub fn split_lines(text: &str) -> Vec<String> {
    let normalised = text.replace("\r\n", "\n").replace('\r', "\n");
    normalised.split('\n').map(str::to_owned).collect()
}

/// Strip leading and trailing bytes contained in `set`.
pub fn trim<'a>(bytes: &'a [u8], set: &[u8]) -> &'a [u8] {
    let start = bytes
        .iter()
        .position(|b| !set.contains(b))
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !set.contains(b))
        .map_or(start, |p| p + 1);
    &bytes[start..end]
}

/// Outcome of [`split_records`].
#[derive(Debug, PartialEq, Eq)]
pub struct RecordSplit<'a> {
    /// Record slices in stream order. While the entity is incomplete,
    /// only records already terminated by a record separator appear.
    pub records: Vec<&'a [u8]>,
    /// Bytes consumed from `offset`, including the entity separator when
    /// the entity is complete.
    pub consumed: usize,
    /// Whether an entity separator was reached.
    pub complete: bool,
}

/// Walk `bytes` from `offset`, emitting a record at each record separator
/// until an entity separator closes the entity.
///
/// Without an entity separator the records found so far are returned with
/// `complete == false` and `consumed` equal to the bytes walked. Fails
/// `InvalidArg` when `offset` lies past the end of `bytes`.
pub fn split_records(bytes: &[u8], offset: usize) -> Result<RecordSplit<'_>> {
    if offset > bytes.len() {
        return Err(Error::InvalidArg("offset past end of data"));
    }
    let mut records = Vec::new();
    let mut start = offset;
    for (pos, b) in bytes.iter().enumerate().skip(offset) {
        match *b {
            ENTITY_SEPARATOR => {
                records.push(&bytes[start..pos]);
                return Ok(RecordSplit {
                    records,
                    consumed: pos - offset + 1,
                    complete: true,
                });
            }
            RECORD_SEPARATOR => {
                records.push(&bytes[start..pos]);
                start = pos + 1;
            }
            _ => {}
        }
    }
    Ok(RecordSplit {
        records,
        consumed: bytes.len() - offset,
        complete: false,
    })
}

/// Parse one record as a key with an optional value.
///
/// Quoting uses the backtick; zero, two, or four quotation marks are the
/// only legal counts. Unquoted keys and values are trimmed of ornament
/// bytes on both sides. Between a closing quote and the assignment, and
/// between the assignment and an opening quote, only ornament bytes may
/// appear; any other stray byte outside quotes fails `Format`.
///
/// The recognised shapes are `k`, `` `k` ``, `k=v`, `` `k`=v ``,
/// `` k=`v` ``, and `` `k`=`v` ``. Note that the assignment byte is itself
/// an ornament, so a record whose first significant byte is an opening
/// quote is always read as a quoted key — `` =`value` `` yields the key
/// `value` with no value, while a bare `=` yields an empty key and an
/// empty value.
pub fn parse_kv(bytes: &[u8]) -> Result<(&[u8], Option<&[u8]>)> {
    let quotes: Vec<usize> = bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == QUOTATION_MARK)
        .map(|(i, _)| i)
        .collect();
    match quotes.len() {
        0 => parse_unquoted(bytes),
        2 | 4 => parse_quoted(bytes, &quotes),
        n => Err(Error::format(format!("{n} quotation marks in record"))),
    }
}

fn parse_unquoted(bytes: &[u8]) -> Result<(&[u8], Option<&[u8]>)> {
    match bytes.iter().position(|b| *b == ASSIGNMENT) {
        Some(a) => Ok((
            trim(&bytes[..a], ORNAMENTS),
            Some(trim(&bytes[a + 1..], ORNAMENTS)),
        )),
        None => Ok((trim(bytes, ORNAMENTS), None)),
    }
}

fn parse_quoted<'a>(bytes: &'a [u8], quotes: &[usize]) -> Result<(&'a [u8], Option<&'a [u8]>)> {
    let first_significant = bytes.iter().position(|b| !ORNAMENTS.contains(b));
    if first_significant == Some(quotes[0]) {
        // Quoted key.
        let key = &bytes[quotes[0] + 1..quotes[1]];
        if quotes.len() == 4 {
            let between = &bytes[quotes[1] + 1..quotes[2]];
            if !between.contains(&ASSIGNMENT) || !ornaments_only(between) {
                return Err(Error::format(
                    "expected assignment between quoted key and quoted value",
                ));
            }
            if !ornaments_only(&bytes[quotes[3] + 1..]) {
                return Err(Error::format("stray bytes after quoted value"));
            }
            return Ok((key, Some(&bytes[quotes[2] + 1..quotes[3]])));
        }
        let after_key = &bytes[quotes[1] + 1..];
        match after_key.iter().position(|b| *b == ASSIGNMENT) {
            Some(a) => {
                if !ornaments_only(&after_key[..a]) {
                    return Err(Error::format(
                        "stray bytes between quoted key and assignment",
                    ));
                }
                Ok((key, Some(trim(&after_key[a + 1..], ORNAMENTS))))
            }
            None => {
                if !ornaments_only(after_key) {
                    return Err(Error::format("stray bytes after quoted key"));
                }
                Ok((key, None))
            }
        }
    } else {
        // Unquoted key; the quotes must all belong to the value.
        if quotes.len() != 2 {
            return Err(Error::format("four quotation marks require a quoted key"));
        }
        let a = match bytes[..quotes[0]].iter().position(|b| *b == ASSIGNMENT) {
            Some(a) => a,
            None => return Err(Error::format("quoted value without an assignment")),
        };
        if !ornaments_only(&bytes[a + 1..quotes[0]]) {
            return Err(Error::format(
                "stray bytes between assignment and quoted value",
            ));
        }
        if !ornaments_only(&bytes[quotes[1] + 1..]) {
            return Err(Error::format("stray bytes after quoted value"));
        }
        Ok((
            trim(&bytes[..a], ORNAMENTS),
            Some(&bytes[quotes[0] + 1..quotes[1]]),
        ))
    }
}

fn ornaments_only(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| ORNAMENTS.contains(b))
}
