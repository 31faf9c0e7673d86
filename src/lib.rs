#![warn(missing_docs)]

//! # slf
//!
//! A self-describing structured logfile codec and router.
//!
//! slf serialises structured log events into a human-readable,
//! machine-parseable text stream, writes that stream into a rotated set
//! of size-capped files with bounded retention, mirrors entities to
//! optional sinks, and parses existing files back into typed records.
//! No daemon, no database — just files in a directory, each opening with
//! a self-describing `SLF.1` header.
//!
//! ## Quick Start
//!
//! ```
//! # use tempfile::tempdir;
//! use slf::{CancelToken, Config, Event, EventId, Router};
//!
//! # fn main() -> slf::Result<()> {
//! # let dir = tempdir().unwrap();
//! let config = Config::builder()
//!     .app_name("demo")
//!     .path(dir.path())
//!     .build()?;
//! let router = Router::new(config);
//!
//! let event = Event::new("Info")
//!     .with_hierarchy(["demo", "startup"])
//!     .with_event_id(EventId::new([1, 1], ["Demo", "Started"]))
//!     .with_message("service started");
//! router.forward(&[event], &CancelToken::new())?;
//! router.flush(&CancelToken::new())?;
//! router.stop();
//! # Ok(()) }
//! ```
//!
//! ## Core Concepts
//!
//! - **Entities** are self-delimited units — one header per file, then
//!   one per event — terminated by the entity separator byte.
//! - **Records** subdivide an entity and carry percent-encoded keys and
//!   backtick-quoted values; ornament bytes around them are for human
//!   eyes and discarded on parse.
//! - **The router** owns the active file exclusively, rolls it over at a
//!   size cap, retains a bounded set of predecessors, and fans each
//!   entity out to console mirrors and caller-supplied sinks without ever
//!   failing the producer.

mod cancel;
mod config;
pub mod encoding;
mod error;
mod event;
pub mod formatters;
mod header;
pub mod hexdump;
mod reader;
mod router;
mod sensitive;
mod sink;
pub mod timefmt;

pub use cancel::CancelToken;
pub use config::{
    Config, ConfigBuilder, DEFAULT_FILE_NAME_FORMAT, DEFAULT_KEEP_LOGFILES, DEFAULT_MAX_FILE_SIZE,
};
pub use error::{Error, Result};
pub use event::{
    Detail, DetailKind, EVENT_IDENTITY, Event, EventArg, EventId, ExceptionInfo, Level,
};
pub use formatters::{DetailFormatter, FormatterRegistry};
pub use header::{HEADER_IDENTITY, Header, HeaderParse, Identity};
pub use reader::{Element, MAX_BUFFER_SIZE, Reader};
pub use router::{FileSystem, OsFileSystem, Router};
pub use sensitive::Cipher;
pub use sink::{Sink, WriterSink, beautify};
pub use timefmt::LogTime;
