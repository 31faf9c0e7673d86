//! The router: exclusive owner of the active logfile, size-capped
//! rollover, bounded retention, and sink fan-out.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use chrono::{DateTime, Local, Utc};
use fs2::FileExt;

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::header::Header;
use crate::reader::{Element, Reader};
use crate::sink;
use crate::timefmt::{self, LogTime};

/// Filesystem capability used for retention.
///
/// Failures propagate to retention, which swallows them per file.
pub trait FileSystem: Send {
    /// Paths of the files directly inside `dir`.
    fn enumerate(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Open `path` for reading.
    fn open_for_reading(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;

    /// Delete `path`.
    fn delete(&self, path: &Path) -> io::Result<()>;
}

/// [`FileSystem`] over `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn enumerate(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }
        Ok(paths)
    }

    fn open_for_reading(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(path)?))
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Observable process start time, captured on first use and stable for
/// the life of the process.
fn process_start() -> DateTime<Local> {
    static START: OnceLock<DateTime<Local>> = OnceLock::new();
    *START.get_or_init(Local::now)
}

fn start_up_time() -> LogTime {
    let start = process_start();
    LogTime::Offset(start.with_timezone(start.offset()))
}

struct ActiveFile {
    file: File,
    path: PathBuf,
    written: u64,
}

/// Routes serialised entities to the active logfile, the console mirrors,
/// and any extra sinks.
///
/// All operations serialise behind one binary lock; within a `forward`
/// call events are processed strictly in input order. Disk, console, and
/// sink faults are swallowed (reported through the `log` facade) —
/// emission is best-effort and never fails the producer. Cancellation is
/// always re-raised.
pub struct Router {
    inner: Mutex<Inner>,
}

struct Inner {
    config: Config,
    active: Option<ActiveFile>,
    seq_no: u64,
    fs: Box<dyn FileSystem>,
}

impl Router {
    /// A router over the OS filesystem.
    pub fn new(config: Config) -> Self {
        Self::with_filesystem(config, Box::new(OsFileSystem))
    }

    /// A router over a custom filesystem capability.
    pub fn with_filesystem(config: Config, fs: Box<dyn FileSystem>) -> Self {
        Router {
            inner: Mutex::new(Inner {
                config,
                active: None,
                seq_no: 0,
                fs,
            }),
        }
    }

    /// Replace the configuration snapshot.
    ///
    /// Any open file is retained; the next rollover uses the new
    /// settings.
    pub fn reconfigure(&self, config: Config) {
        self.lock().config = config;
    }

    /// Reserved start hook; currently nothing to start.
    pub fn start(&self) {}

    /// Flush and release the open file.
    ///
    /// Idempotent; a later `forward` simply opens a successor file.
    pub fn stop(&self) {
        self.lock().close_file();
    }

    /// Forward a batch of events to every enabled destination.
    ///
    /// Per-event serialisation, disk, console, and sink faults are
    /// swallowed; cancellation is re-raised. Within each destination the
    /// events land in input order.
    pub fn forward(&self, batch: &[Event], cancel: &CancelToken) -> Result<()> {
        let mut inner = self.lock();
        for event in batch {
            cancel.check()?;
            let text = match event.serialize(&inner.config) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("event dropped, serialisation failed: {e}");
                    continue;
                }
            };
            inner.deliver(&text, cancel)?;
        }
        Ok(())
    }

    /// Flush the open file and every extra sink.
    ///
    /// Per-sink flush failures are individually swallowed; the remaining
    /// sinks are still attempted. Cancellation is honoured at entry.
    pub fn flush(&self, cancel: &CancelToken) -> Result<()> {
        cancel.check()?;
        let mut inner = self.lock();
        if let Some(active) = inner.active.as_mut() {
            if let Err(e) = active.file.flush() {
                log::warn!("logfile flush failed: {e}");
            }
        }
        for sink in inner.config.sinks.iter_mut() {
            match sink.flush(cancel) {
                Ok(()) => {}
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => log::warn!("sink flush failed: {e}"),
            }
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Inner {
    fn deliver(&mut self, text: &str, cancel: &CancelToken) -> Result<()> {
        if self.config.write_to_disk {
            match self.write_to_disk(text, cancel) {
                Ok(()) => {}
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => log::warn!("disk write failed: {e}"),
            }
        }

        if self.config.write_to_console || self.config.write_to_debug_console {
            let display = if self.config.console_beautified {
                sink::beautify(text)
            } else {
                text.to_string()
            };
            if self.config.write_to_console {
                if let Err(e) = io::stdout().lock().write_all(display.as_bytes()) {
                    log::debug!("console write failed: {e}");
                }
            }
            if self.config.write_to_debug_console {
                if let Err(e) = io::stderr().lock().write_all(display.as_bytes()) {
                    log::debug!("debug console write failed: {e}");
                }
            }
        }

        for sink in self.config.sinks.iter_mut() {
            cancel.check()?;
            match sink.write(text, cancel) {
                Ok(()) => {}
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => log::warn!("sink write failed: {e}"),
            }
        }
        Ok(())
    }

    fn write_to_disk(&mut self, text: &str, cancel: &CancelToken) -> Result<()> {
        if self.active.is_none() {
            self.open_file(cancel)?;
        }
        let Some(active) = self.active.as_mut() else {
            return Err(Error::Internal("no active file after open".into()));
        };
        active.file.write_all(text.as_bytes())?;
        active.written += text.len() as u64;
        if active.written >= self.config.max_file_size {
            self.close_file();
        }
        Ok(())
    }

    /// Open the next logfile: run retention (or create the directory),
    /// bump the sequence number, and write a fresh header.
    fn open_file(&mut self, cancel: &CancelToken) -> Result<()> {
        if self.config.path.is_dir() {
            match self.run_retention(cancel) {
                Ok(()) => {}
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => log::warn!("retention failed: {e}"),
            }
        } else {
            fs::create_dir_all(&self.config.path)?;
        }

        self.seq_no += 1;
        let name = self.file_name(self.seq_no);
        let path = self.config.path.join(name);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        if let Err(e) = file.try_lock_exclusive() {
            log::debug!("advisory lock unavailable for {}: {e}", path.display());
        }

        let header = Header::new(self.config.app_name.clone(), start_up_time(), self.seq_no);
        let mut active = ActiveFile {
            file,
            path,
            written: 0,
        };
        let header_text = header.serialize();
        active.file.write_all(header_text.as_bytes())?;
        active.written += header_text.len() as u64;
        self.active = Some(active);
        Ok(())
    }

    fn close_file(&mut self) {
        if let Some(mut active) = self.active.take() {
            if let Err(e) = active.file.flush() {
                log::warn!("flush on close failed: {e}");
            }
            if let Err(e) = FileExt::unlock(&active.file) {
                log::debug!("unlock failed for {}: {e}", active.path.display());
            }
        }
    }

    fn file_name(&self, seq_no: u64) -> String {
        interpolate(&self.config.file_name_format, &self.config.app_name, seq_no)
    }

    /// Delete the oldest matching logfiles so that at most
    /// `keep_logfiles` of them survive the creation of the next file.
    fn run_retention(&mut self, cancel: &CancelToken) -> Result<()> {
        let Some(keep) = self.config.keep_logfiles else {
            return Ok(());
        };
        cancel.check()?;
        let paths = self.fs.enumerate(&self.config.path)?;
        let (prefix, suffix) =
            template_affixes(&self.file_name(1), &self.config.file_name_format);

        let mut ranked: Vec<(DateTime<Utc>, u64, PathBuf)> = Vec::new();
        for path in paths {
            cancel.check()?;
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(&prefix) || !name.ends_with(&suffix) {
                continue;
            }
            match self.read_header(&path, cancel) {
                Ok(header) => ranked.push((header.start_up.to_utc(None), header.seq_no, path)),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => log::debug!("retention skipped {}: {e}", path.display()),
            }
        }

        ranked.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        let doomed = ranked.len().saturating_sub(keep);
        for (_, _, path) in ranked.into_iter().take(doomed) {
            cancel.check()?;
            if let Err(e) = self.fs.delete(&path) {
                log::warn!("retention could not delete {}: {e}", path.display());
            }
        }
        Ok(())
    }

    fn read_header(&self, path: &Path, cancel: &CancelToken) -> Result<Header> {
        let stream = self.fs.open_for_reading(path)?;
        let mut reader = Reader::new(stream);
        match reader.next_element(cancel)? {
            Some(Element::Header(header)) => Ok(header),
            None => Err(Error::format("file has no header")),
        }
    }
}

/// Interpolate the file-name template's tokens.
fn interpolate(template: &str, app_name: &str, seq_no: u64) -> String {
    template
        .replace("{app-name}", app_name)
        .replace("{start-up-time}", &timefmt::file_stamp(&process_start()))
        .replace("{creation-time}", &timefmt::file_stamp(&Local::now()))
        .replace("{seq-no}", &seq_no.to_string())
}

/// Longest common prefix and suffix of a formatted file name and its raw
/// template; names matching both belonged (or could belong) to this
/// template.
fn template_affixes(formatted: &str, template: &str) -> (String, String) {
    let f: Vec<char> = formatted.chars().collect();
    let t: Vec<char> = template.chars().collect();
    let prefix_len = f.iter().zip(t.iter()).take_while(|(a, b)| a == b).count();
    let max_suffix = (f.len() - prefix_len).min(t.len() - prefix_len);
    let suffix_len = f
        .iter()
        .rev()
        .zip(t.iter().rev())
        .take_while(|(a, b)| a == b)
        .count()
        .min(max_suffix);
    (
        f[..prefix_len].iter().collect(),
        f[f.len() - suffix_len..].iter().collect(),
    )
}
