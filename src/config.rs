//! Router configuration: a plain value object built through a validating
//! builder.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::formatters::FormatterRegistry;
use crate::sensitive::Cipher;
use crate::sink::Sink;

/// Default logfile name template.
///
/// Recognised tokens: `{app-name}`, `{start-up-time}`, `{creation-time}`,
/// and `{seq-no}`.
pub const DEFAULT_FILE_NAME_FORMAT: &str = "{app-name}-{start-up-time}-{seq-no}.slf.log";
/// Default per-file byte cap (25 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 25 * 1024 * 1024;
/// Default count of historical files kept by retention.
pub const DEFAULT_KEEP_LOGFILES: usize = 5;

/// Configuration snapshot consumed by [`Router`](crate::Router).
///
/// Built through [`Config::builder`]; immutable once handed to the
/// router (a new snapshot replaces it wholesale via `reconfigure`).
pub struct Config {
    pub(crate) app_name: String,
    pub(crate) write_to_console: bool,
    pub(crate) write_to_debug_console: bool,
    pub(crate) write_to_disk: bool,
    pub(crate) path: PathBuf,
    pub(crate) file_name_format: String,
    pub(crate) max_file_size: u64,
    pub(crate) keep_logfiles: Option<usize>,
    pub(crate) formatters: FormatterRegistry,
    pub(crate) cipher: Option<Arc<dyn Cipher>>,
    pub(crate) sinks: Vec<Box<dyn Sink>>,
    pub(crate) console_beautified: bool,
}

impl Config {
    /// Start building a configuration from the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            app_name: None,
            write_to_console: false,
            write_to_debug_console: false,
            write_to_disk: true,
            path: PathBuf::from("./logs"),
            file_name_format: DEFAULT_FILE_NAME_FORMAT.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            keep_logfiles: Some(DEFAULT_KEEP_LOGFILES),
            formatters: FormatterRegistry::default(),
            cipher: None,
            sinks: Vec::new(),
            console_beautified: false,
        }
    }

    /// Application name stored in headers and file names.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Directory logfiles are written to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Logfile name template.
    pub fn file_name_format(&self) -> &str {
        &self.file_name_format
    }

    /// Per-file byte cap.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Historical files retained after a new file is created; `None`
    /// disables retention.
    pub fn keep_logfiles(&self) -> Option<usize> {
        self.keep_logfiles
    }

    /// The detail formatter registry.
    pub fn formatters(&self) -> &FormatterRegistry {
        &self.formatters
    }

    /// The cipher capability for sensitive blocks, when configured.
    pub fn cipher(&self) -> Option<&dyn Cipher> {
        self.cipher.as_deref()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_name", &self.app_name)
            .field("write_to_console", &self.write_to_console)
            .field("write_to_debug_console", &self.write_to_debug_console)
            .field("write_to_disk", &self.write_to_disk)
            .field("path", &self.path)
            .field("file_name_format", &self.file_name_format)
            .field("max_file_size", &self.max_file_size)
            .field("keep_logfiles", &self.keep_logfiles)
            .field("formatters", &self.formatters)
            .field("cipher", &self.cipher.is_some())
            .field("sinks", &self.sinks.len())
            .field("console_beautified", &self.console_beautified)
            .finish()
    }
}

/// Builder for [`Config`]. Unset options take the documented defaults.
pub struct ConfigBuilder {
    app_name: Option<String>,
    write_to_console: bool,
    write_to_debug_console: bool,
    write_to_disk: bool,
    path: PathBuf,
    file_name_format: String,
    max_file_size: u64,
    keep_logfiles: Option<usize>,
    formatters: FormatterRegistry,
    cipher: Option<Arc<dyn Cipher>>,
    sinks: Vec<Box<dyn Sink>>,
    console_beautified: bool,
}

impl ConfigBuilder {
    /// Application name; defaults to the host executable's name, or
    /// `"None"` when that cannot be determined.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Mirror each entity to standard output. Default off.
    pub fn write_to_console(mut self, on: bool) -> Self {
        self.write_to_console = on;
        self
    }

    /// Mirror each entity to the debug console (standard error).
    /// Default off.
    pub fn write_to_debug_console(mut self, on: bool) -> Self {
        self.write_to_debug_console = on;
        self
    }

    /// Enable the file sink. Default on.
    pub fn write_to_disk(mut self, on: bool) -> Self {
        self.write_to_disk = on;
        self
    }

    /// Directory for logfiles. Default `./logs`.
    pub fn path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.path = dir.into();
        self
    }

    /// Logfile name template; see [`DEFAULT_FILE_NAME_FORMAT`] for the
    /// recognised tokens.
    pub fn file_name_format(mut self, template: impl Into<String>) -> Self {
        self.file_name_format = template.into();
        self
    }

    /// Per-file byte cap; once a write takes the file to or past it, the
    /// file is closed and the next event opens a successor.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Historical files retained after a new file is created; `None`
    /// keeps everything.
    pub fn keep_logfiles(mut self, keep: Option<usize>) -> Self {
        self.keep_logfiles = keep;
        self
    }

    /// Replace the detail formatter registry.
    pub fn formatters(mut self, registry: FormatterRegistry) -> Self {
        self.formatters = registry;
        self
    }

    /// Cipher capability for sensitive blocks.
    pub fn cipher(mut self, cipher: Arc<dyn Cipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    /// Append an extra sink; sinks are served in registration order.
    pub fn sink(mut self, sink: Box<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Strip separator bytes from console mirrors. Default off.
    pub fn console_beautified(mut self, on: bool) -> Self {
        self.console_beautified = on;
        self
    }

    /// Validate and produce the configuration.
    ///
    /// Fails `InvalidArg` when the size cap is zero.
    pub fn build(self) -> Result<Config> {
        if self.max_file_size == 0 {
            return Err(Error::InvalidArg("maximum logfile size must be positive"));
        }
        Ok(Config {
            app_name: self.app_name.unwrap_or_else(default_app_name),
            write_to_console: self.write_to_console,
            write_to_debug_console: self.write_to_debug_console,
            write_to_disk: self.write_to_disk,
            path: self.path,
            file_name_format: self.file_name_format,
            max_file_size: self.max_file_size,
            keep_logfiles: self.keep_logfiles,
            formatters: self.formatters,
            cipher: self.cipher,
            sinks: self.sinks,
            console_beautified: self.console_beautified,
        })
    }
}

impl fmt::Debug for ConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigBuilder")
            .field("app_name", &self.app_name)
            .field("path", &self.path)
            .field("file_name_format", &self.file_name_format)
            .field("max_file_size", &self.max_file_size)
            .field("keep_logfiles", &self.keep_logfiles)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

fn default_app_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "None".to_string())
}
