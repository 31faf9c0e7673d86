//! Typed log events, their details, and event entity serialisation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::encoding::{
    self, ENTITY_SEPARATOR, INDENT, QUOTATION_MARK, RECORD_SEPARATOR, VISUAL_RECORD_SEPARATOR,
};
use crate::error::{Error, Result};
use crate::timefmt::LogTime;

/// Identity literal opening every event entity.
pub const EVENT_IDENTITY: &str = "EVENT";

/// Conventional severity names rendering to the level text of an event.
///
/// The wire format carries free level text rather than a closed
/// enumeration; this type is a convenience for callers emitting the
/// common levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Extremely verbose diagnostics.
    Trace,
    /// Developer-facing diagnostics.
    Debug,
    /// General information.
    Info,
    /// Conditions worth noting.
    Warning,
    /// Failures requiring attention.
    Error,
    /// Failures threatening the process.
    Critical,
}

impl Level {
    /// The level text carried on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "Trace",
            Level::Debug => "Debug",
            Level::Info => "Info",
            Level::Warning => "Warning",
            Level::Error => "Error",
            Level::Critical => "Critical",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" | "information" => Ok(Level::Info),
            "warning" | "warn" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "critical" | "fatal" => Ok(Level::Critical),
            other => Err(Error::Unsupported(format!("unknown level {other:?}"))),
        }
    }
}

/// A named (or positional) argument attached to an event-id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventArg {
    /// Argument name; omitted from the JSON projection when absent.
    #[serde(rename = "n", skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    /// Argument value.
    #[serde(rename = "v")]
    pub value: String,
}

/// Structured event identifier: a numeric chain, a textual chain, and
/// optional arguments.
///
/// Serialises to the fixed JSON shape
/// `{"en": [...], "et": [...], "a": [{"n": ..., "v": ...}, ...]}` where
/// `"a"` is omitted when there are no arguments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventId {
    /// Numeric chain, most significant first.
    #[serde(rename = "en")]
    pub numbers: Vec<i64>,
    /// Textual chain mirroring the numeric one.
    #[serde(rename = "et")]
    pub texts: Vec<String>,
    /// Arguments; empty for a bare identifier.
    #[serde(rename = "a", skip_serializing_if = "Vec::is_empty", default)]
    pub args: Vec<EventArg>,
}

impl EventId {
    /// An identifier from its numeric and textual chains.
    pub fn new<N, T, S>(numbers: N, texts: T) -> Self
    where
        N: IntoIterator<Item = i64>,
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EventId {
            numbers: numbers.into_iter().collect(),
            texts: texts.into_iter().map(Into::into).collect(),
            args: Vec::new(),
        }
    }

    /// Append an argument; `name` may be `None` for a positional one.
    pub fn with_arg(mut self, name: Option<&str>, value: impl Into<String>) -> Self {
        self.args.push(EventArg {
            name: name.map(str::to_owned),
            value: value.into(),
        });
        self
    }

    /// The fixed JSON projection.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Internal(format!("event-id projection: {e}")))
    }

    /// Human-readable inline form: the dotted chains, then the argument
    /// list in braces when arguments are present.
    pub fn inline_text(&self) -> String {
        let mut out = String::new();
        let numbers: Vec<String> = self.numbers.iter().map(i64::to_string).collect();
        out.push_str(&numbers.join("."));
        if !self.texts.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            let texts: Vec<String> = self
                .texts
                .iter()
                .map(|t| encoding::encode(t, &[QUOTATION_MARK, b'.']))
                .collect();
            out.push_str(&texts.join("."));
        }
        if !self.args.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push('{');
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if let Some(name) = &arg.name {
                    out.push_str(&encoding::encode(name, &[QUOTATION_MARK]));
                    out.push('=');
                }
                out.push(QUOTATION_MARK as char);
                out.push_str(&encoding::encode(&arg.value, &[QUOTATION_MARK]));
                out.push(QUOTATION_MARK as char);
            }
            out.push('}');
        }
        out
    }
}

/// A captured failure with its causal chain, for the exception detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    /// Failure type name.
    pub kind: String,
    /// Failure message.
    pub message: String,
    /// Stack or context frames, innermost first.
    pub frames: Vec<String>,
    /// The underlying cause, if any.
    pub cause: Option<Box<ExceptionInfo>>,
}

impl ExceptionInfo {
    /// A failure entry with no frames and no cause.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ExceptionInfo {
            kind: kind.into(),
            message: message.into(),
            frames: Vec::new(),
            cause: None,
        }
    }

    /// Attach frames, innermost first.
    pub fn with_frames<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frames = frames.into_iter().map(Into::into).collect();
        self
    }

    /// Attach the underlying cause.
    pub fn with_cause(mut self, cause: ExceptionInfo) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

/// One typed detail attached to an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    /// Free text; CR and LF are preserved through serialisation.
    Message(String),
    /// Raw bytes, rendered as a hex dump.
    Binary(Vec<u8>),
    /// Structured event identifier.
    EventId(EventId),
    /// A failure and its causal chain.
    Exception(ExceptionInfo),
    /// Logger hierarchy path, outermost segment first.
    Hierarchy(Vec<String>),
    /// Opens a run of details to be encrypted as one block.
    SensitiveBegin,
    /// Closes the innermost open sensitive run.
    SensitiveEnd,
}

/// Discriminant used for registry lookup and capability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailKind {
    /// [`Detail::Message`]
    Message,
    /// [`Detail::Binary`]
    Binary,
    /// [`Detail::EventId`]
    EventId,
    /// [`Detail::Exception`]
    Exception,
    /// [`Detail::Hierarchy`]
    Hierarchy,
    /// [`Detail::SensitiveBegin`]
    SensitiveBegin,
    /// [`Detail::SensitiveEnd`]
    SensitiveEnd,
}

impl Detail {
    /// This detail's discriminant.
    pub fn kind(&self) -> DetailKind {
        match self {
            Detail::Message(_) => DetailKind::Message,
            Detail::Binary(_) => DetailKind::Binary,
            Detail::EventId(_) => DetailKind::EventId,
            Detail::Exception(_) => DetailKind::Exception,
            Detail::Hierarchy(_) => DetailKind::Hierarchy,
            Detail::SensitiveBegin => DetailKind::SensitiveBegin,
            Detail::SensitiveEnd => DetailKind::SensitiveEnd,
        }
    }
}

/// A structured log event; consumed exactly once by
/// [`Router::forward`](crate::Router::forward).
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Instant the event was produced.
    pub time: LogTime,
    /// Level text; see [`Level`] for the conventional names.
    pub level: String,
    /// Emitted regardless of any minimum level; marked `Dev` on the wire.
    pub developer_forced: bool,
    /// Typed payload details in emission order.
    pub details: Vec<Detail>,
}

impl Event {
    /// An event at the current local time with no details.
    pub fn new(level: impl fmt::Display) -> Self {
        Event {
            time: LogTime::now_local(),
            level: level.to_string(),
            developer_forced: false,
            details: Vec::new(),
        }
    }

    /// Replace the event time.
    pub fn at(mut self, time: LogTime) -> Self {
        self.time = time;
        self
    }

    /// Mark the event developer-forced.
    pub fn developer_forced(mut self) -> Self {
        self.developer_forced = true;
        self
    }

    /// Append a detail.
    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.details.push(detail);
        self
    }

    /// Append a message detail.
    pub fn with_message(self, text: impl Into<String>) -> Self {
        self.with_detail(Detail::Message(text.into()))
    }

    /// Append an event-id detail.
    pub fn with_event_id(self, id: EventId) -> Self {
        self.with_detail(Detail::EventId(id))
    }

    /// Append a hierarchy detail.
    pub fn with_hierarchy<I, S>(self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_detail(Detail::Hierarchy(
            segments.into_iter().map(Into::into).collect(),
        ))
    }

    /// Serialise this event as one stream entity.
    ///
    /// The configuration supplies the detail formatters and, for
    /// sensitive blocks, the cipher capability.
    pub fn serialize(&self, config: &Config) -> Result<String> {
        let mut out = String::with_capacity(128);
        out.push_str(EVENT_IDENTITY);

        out.push(RECORD_SEPARATOR as char);
        out.push(' ');
        out.push_str(&self.time.to_iso8601());

        push_header_record(&mut out, &encoding::encode(&self.level, &[]));

        let hierarchy = self.details.iter().find_map(|d| match d {
            Detail::Hierarchy(segments) => Some(segments),
            _ => None,
        });
        if let Some(segments) = hierarchy {
            let encoded: Vec<String> = segments
                .iter()
                .map(|s| encoding::encode(s, &[QUOTATION_MARK, b'.']))
                .collect();
            push_header_record(&mut out, &encoded.join("."));
        }

        let event_id = self.details.iter().find_map(|d| match d {
            Detail::EventId(id) => Some(id),
            _ => None,
        });
        if let Some(id) = event_id {
            push_header_record(&mut out, &id.inline_text());
        }

        if self.developer_forced {
            push_header_record(&mut out, "Dev");
        }

        let mut records = Vec::new();
        emit_records(&self.details, config, &mut records)?;
        for (i, record) in records.iter().enumerate() {
            if i == 0 {
                out.push(RECORD_SEPARATOR as char);
                out.push_str(VISUAL_RECORD_SEPARATOR);
            } else {
                out.push('\n');
                out.push(RECORD_SEPARATOR as char);
                out.push_str(INDENT);
            }
            out.push_str(record);
        }

        out.push('\n');
        out.push(ENTITY_SEPARATOR as char);
        Ok(out)
    }
}

fn push_header_record(out: &mut String, text: &str) {
    out.push(RECORD_SEPARATOR as char);
    out.push_str(VISUAL_RECORD_SEPARATOR);
    out.push_str(text);
}

/// One `` `key`=`value` `` record with both parts encoded.
fn kv_record(key: &str, value: &str) -> String {
    format!(
        "`{}`=`{}`",
        encoding::encode(key, &[QUOTATION_MARK]),
        encoding::encode(value, &[QUOTATION_MARK]),
    )
}

/// Turn a run of details into value records.
///
/// Hierarchy details were consumed by the header line and are skipped;
/// event-ids are re-emitted as JSON only when they carry arguments;
/// sensitive runs fold into a single encrypted record.
fn emit_records(details: &[Detail], config: &Config, records: &mut Vec<String>) -> Result<()> {
    let mut i = 0;
    while i < details.len() {
        match &details[i] {
            Detail::Hierarchy(_) => {}
            // An unmatched close is ignored.
            Detail::SensitiveEnd => {}
            Detail::SensitiveBegin => {
                let close = matching_end(details, i);
                if let Some(record) = sensitive_record(&details[i + 1..close], config)? {
                    records.push(record);
                }
                i = close;
            }
            Detail::EventId(id) => {
                if !id.args.is_empty() {
                    match config.formatters().get(DetailKind::EventId) {
                        Some(formatter) => {
                            let text = formatter.format(&details[i])?;
                            records.push(kv_record(formatter.id(), &text));
                        }
                        None => log::debug!("no formatter registered for event-id details"),
                    }
                }
            }
            other => match config.formatters().get(other.kind()) {
                Some(formatter) => {
                    let text = formatter.format(other)?;
                    records.push(kv_record(formatter.id(), &text));
                }
                None => log::debug!("no formatter registered for {:?} details", other.kind()),
            },
        }
        i += 1;
    }
    Ok(())
}

/// Fold one sensitive run into an encrypted record.
///
/// The inner details serialise as if they stood alone, every record on a
/// continuation line; the result's UTF-8 bytes are encrypted as one blob.
/// A missing cipher or a failed encryption drops the block.
fn sensitive_record(inner: &[Detail], config: &Config) -> Result<Option<String>> {
    let mut sub = Vec::new();
    emit_records(inner, config, &mut sub)?;
    let mut text = String::new();
    for record in &sub {
        text.push('\n');
        text.push(RECORD_SEPARATOR as char);
        text.push_str(INDENT);
        text.push_str(record);
    }
    let Some(cipher) = config.cipher() else {
        log::debug!("sensitive block dropped: no cipher configured");
        return Ok(None);
    };
    let ciphertext = match cipher.encrypt(text.as_bytes()) {
        Ok(ciphertext) => ciphertext,
        Err(e) => {
            log::warn!("sensitive block dropped: {e}");
            return Ok(None);
        }
    };
    Ok(Some(kv_record("Sensitive", &cipher.serialise(&ciphertext))))
}

/// Index of the `SensitiveEnd` closing the run opened at `begin`,
/// honouring nesting. An unterminated run folds to the end of the list.
fn matching_end(details: &[Detail], begin: usize) -> usize {
    let mut depth = 0usize;
    for (i, detail) in details.iter().enumerate().skip(begin) {
        match detail {
            Detail::SensitiveBegin => depth += 1,
            Detail::SensitiveEnd => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    details.len()
}
