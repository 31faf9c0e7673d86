//! ISO-8601 round-trip formatting and parsing, UNIX-second conversion,
//! and the compact stamp used in logfile name interpolation.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::error::{Error, Result};

/// An instant with its zone knowledge preserved.
///
/// The round-trip form renders UTC with a trailing `Z`, a fixed offset
/// with `±HH:MM`, and wall-clock time without zone information with no
/// suffix at all. Parsing restores the same three kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTime {
    /// An instant in UTC.
    Utc(DateTime<Utc>),
    /// An instant carrying a fixed offset from UTC.
    Offset(DateTime<FixedOffset>),
    /// Wall-clock time with no zone information.
    Unspecified(NaiveDateTime),
}

impl LogTime {
    /// The current instant with the local offset attached.
    pub fn now_local() -> Self {
        let now = Local::now();
        LogTime::Offset(now.with_timezone(now.offset()))
    }

    /// The current instant in UTC.
    pub fn now_utc() -> Self {
        LogTime::Utc(Utc::now())
    }

    /// Convert to UTC, interpreting an unspecified-zone time in `tz`
    /// (`None` means the local offset).
    pub fn to_utc(&self, tz: Option<FixedOffset>) -> DateTime<Utc> {
        match self {
            LogTime::Utc(t) => *t,
            LogTime::Offset(t) => t.with_timezone(&Utc),
            LogTime::Unspecified(naive) => {
                let offset = tz.unwrap_or_else(local_offset);
                offset
                    .from_local_datetime(naive)
                    .single()
                    .map_or_else(|| Utc.from_utc_datetime(naive), |t| t.with_timezone(&Utc))
            }
        }
    }

    /// Round-trip ISO-8601 form with seven-digit fractional seconds.
    pub fn to_iso8601(&self) -> String {
        match self {
            LogTime::Utc(t) => format!("{}Z", naive_iso(&t.naive_utc())),
            LogTime::Offset(t) => {
                format!("{}{}", naive_iso(&t.naive_local()), offset_suffix(t.offset()))
            }
            LogTime::Unspecified(t) => naive_iso(t),
        }
    }
}

impl fmt::Display for LogTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn local_offset() -> FixedOffset {
    *Local::now().offset()
}

fn naive_iso(t: &NaiveDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:07}",
        t.year(),
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        t.second(),
        t.nanosecond() / 100,
    )
}

fn offset_suffix(offset: &FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let abs = secs.unsigned_abs();
    format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

/// Parse a round-trip ISO-8601 timestamp, restoring its zone kind.
///
/// A trailing `Z` yields [`LogTime::Utc`], a `±HH:MM` suffix yields
/// [`LogTime::Offset`], and no suffix yields [`LogTime::Unspecified`].
/// Fails `InvalidArg` on empty input and `Format` on malformed input.
pub fn parse_iso8601(text: &str) -> Result<LogTime> {
    if text.is_empty() {
        return Err(Error::InvalidArg("empty timestamp"));
    }
    if let Some(base) = text.strip_suffix(['Z', 'z']) {
        let naive = parse_naive(base)?;
        return Ok(LogTime::Utc(Utc.from_utc_datetime(&naive)));
    }
    if let Some((base, offset)) = split_offset(text) {
        let naive = parse_naive(base)?;
        let zoned = offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| Error::format(format!("unrepresentable offset time {text:?}")))?;
        return Ok(LogTime::Offset(zoned));
    }
    Ok(LogTime::Unspecified(parse_naive(text)?))
}

/// Parse to an offset-zoned timestamp.
///
/// Input without a zone takes the local base UTC offset; a `Z` suffix
/// yields a zero offset.
pub fn parse_iso8601_offset(text: &str) -> Result<DateTime<FixedOffset>> {
    match parse_iso8601(text)? {
        LogTime::Offset(t) => Ok(t),
        LogTime::Utc(t) => Ok(t.fixed_offset()),
        LogTime::Unspecified(naive) => {
            let offset = local_offset();
            offset
                .from_local_datetime(&naive)
                .single()
                .ok_or_else(|| Error::format(format!("unrepresentable local time {text:?}")))
        }
    }
}

fn parse_naive(text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| Error::format(format!("bad timestamp {text:?}: {e}")))
}

/// Split a trailing `±HH:MM` zone suffix off `text`.
///
/// The date's own `-` separators never match: the suffix sign sits six
/// bytes from the end, after the time-of-day part.
fn split_offset(text: &str) -> Option<(&str, FixedOffset)> {
    if text.len() < 6 || !text.is_char_boundary(text.len() - 6) {
        return None;
    }
    let (base, suffix) = text.split_at(text.len() - 6);
    let s = suffix.as_bytes();
    let sign = match s[0] {
        b'+' => 1i32,
        b'-' => -1i32,
        _ => return None,
    };
    if s[3] != b':' {
        return None;
    }
    let digit = |b: u8| (b as char).to_digit(10);
    let hh = digit(s[1])? * 10 + digit(s[2])?;
    let mm = digit(s[4])? * 10 + digit(s[5])?;
    let secs = sign * (hh as i32 * 3600 + mm as i32 * 60);
    FixedOffset::east_opt(secs).map(|offset| (base, offset))
}

/// Seconds since 1970-01-01T00:00:00Z; pre-epoch instants are negative.
pub fn unix_seconds(time: &DateTime<Utc>) -> i64 {
    time.timestamp()
}

/// The instant `seconds` after (before, when negative) the UNIX epoch.
pub fn from_unix_seconds(seconds: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(seconds, 0).ok_or(Error::InvalidArg("timestamp out of range"))
}

/// The `yyyyMMdd-HHmmssfff` stamp used in logfile name interpolation.
pub fn file_stamp<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    time.format("%Y%m%d-%H%M%S%3f").to_string()
}
