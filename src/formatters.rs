//! Per-detail-type text formatters and their registry.
//!
//! A formatter turns one detail variant into the value text of its record;
//! the registry maps variants to formatters and is treated as immutable
//! once a configuration is in use. User extension happens by registering
//! for a variant, not by subclassing anything.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::encoding::QUOTATION_MARK;
use crate::error::{Error, Result};
use crate::event::{Detail, DetailKind};
use crate::hexdump::{self, DumpOptions};

/// Capability producing the record value text for a detail.
pub trait DetailFormatter: Send + Sync {
    /// Identification string; doubles as the record key.
    fn id(&self) -> &str;

    /// Whether this formatter accepts `kind`.
    fn accepts(&self, kind: DetailKind) -> bool;

    /// Produce the value text for `detail`.
    ///
    /// Fails `Unsupported` for a variant outside
    /// [`accepts`](Self::accepts).
    fn format(&self, detail: &Detail) -> Result<String>;
}

fn unsupported(id: &str, detail: &Detail) -> Error {
    Error::Unsupported(format!(
        "{id} formatter cannot format {:?} details",
        detail.kind()
    ))
}

/// Formats [`Detail::Message`]: the text unchanged, CR and LF preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageFormatter;

impl DetailFormatter for MessageFormatter {
    fn id(&self) -> &str {
        "Message"
    }

    fn accepts(&self, kind: DetailKind) -> bool {
        kind == DetailKind::Message
    }

    fn format(&self, detail: &Detail) -> Result<String> {
        match detail {
            Detail::Message(text) => Ok(text.clone()),
            other => Err(unsupported(self.id(), other)),
        }
    }
}

/// Formats [`Detail::Binary`] as `Hex dump:` followed by a hex/transcript
/// dump.
///
/// Any quotation mark the transcript would contain is replaced with the
/// dump's substitute character, so the result is safe inside a quoted
/// value.
#[derive(Debug, Clone)]
pub struct BinaryFormatter {
    options: DumpOptions,
}

impl BinaryFormatter {
    /// A formatter rendering with the given dump options.
    pub fn new(options: DumpOptions) -> Self {
        BinaryFormatter { options }
    }
}

impl Default for BinaryFormatter {
    fn default() -> Self {
        BinaryFormatter::new(DumpOptions::default())
    }
}

impl DetailFormatter for BinaryFormatter {
    fn id(&self) -> &str {
        "Binary"
    }

    fn accepts(&self, kind: DetailKind) -> bool {
        kind == DetailKind::Binary
    }

    fn format(&self, detail: &Detail) -> Result<String> {
        match detail {
            Detail::Binary(bytes) => {
                if bytes.is_empty() {
                    return Ok("Hex dump:".to_string());
                }
                let dump = hexdump::dump(bytes, 0, bytes.len(), &self.options)?;
                let substitute = self.options.substitute.to_string();
                Ok(format!(
                    "Hex dump:\n{}",
                    dump.replace(QUOTATION_MARK as char, &substitute)
                ))
            }
            other => Err(unsupported(self.id(), other)),
        }
    }
}

/// Formats [`Detail::EventId`] as its fixed JSON projection.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventIdFormatter;

impl DetailFormatter for EventIdFormatter {
    fn id(&self) -> &str {
        "EventID"
    }

    fn accepts(&self, kind: DetailKind) -> bool {
        kind == DetailKind::EventId
    }

    fn format(&self, detail: &Detail) -> Result<String> {
        match detail {
            Detail::EventId(id) => id.to_json(),
            other => Err(unsupported(self.id(), other)),
        }
    }
}

/// Formats [`Detail::Exception`]: the causal chain walked outermost
/// first, one entry per cause with its frames indented beneath it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionFormatter;

impl DetailFormatter for ExceptionFormatter {
    fn id(&self) -> &str {
        "Exception"
    }

    fn accepts(&self, kind: DetailKind) -> bool {
        kind == DetailKind::Exception
    }

    fn format(&self, detail: &Detail) -> Result<String> {
        let Detail::Exception(info) = detail else {
            return Err(unsupported(self.id(), detail));
        };
        let mut out = String::new();
        let mut current = Some(info);
        let mut first = true;
        while let Some(entry) = current {
            if !first {
                out.push('\n');
                out.push_str("Caused by: ");
            }
            first = false;
            out.push_str(&entry.kind);
            if !entry.message.is_empty() {
                out.push_str(": ");
                out.push_str(&entry.message);
            }
            for frame in &entry.frames {
                out.push('\n');
                out.push_str("    at ");
                out.push_str(frame);
            }
            current = entry.cause.as_deref();
        }
        Ok(out)
    }
}

/// Registry of detail formatters keyed by variant.
///
/// The default registry carries the four built-ins (message, binary,
/// event-id, exception); registering for a variant replaces any existing
/// entry.
#[derive(Clone)]
pub struct FormatterRegistry {
    by_kind: HashMap<DetailKind, Arc<dyn DetailFormatter>>,
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        let mut registry = FormatterRegistry::empty();
        registry.register(DetailKind::Message, Arc::new(MessageFormatter));
        registry.register(DetailKind::Binary, Arc::new(BinaryFormatter::default()));
        registry.register(DetailKind::EventId, Arc::new(EventIdFormatter));
        registry.register(DetailKind::Exception, Arc::new(ExceptionFormatter));
        registry
    }
}

impl FormatterRegistry {
    /// A registry with no formatters at all.
    pub fn empty() -> Self {
        FormatterRegistry {
            by_kind: HashMap::new(),
        }
    }

    /// Register `formatter` for `kind`, replacing any existing entry.
    pub fn register(&mut self, kind: DetailKind, formatter: Arc<dyn DetailFormatter>) {
        self.by_kind.insert(kind, formatter);
    }

    /// The formatter registered for `kind`, if any.
    pub fn get(&self, kind: DetailKind) -> Option<&Arc<dyn DetailFormatter>> {
        self.by_kind.get(&kind)
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.by_kind.values().map(|v| v.id()).collect();
        ids.sort_unstable();
        f.debug_struct("FormatterRegistry")
            .field("formatters", &ids)
            .finish()
    }
}
