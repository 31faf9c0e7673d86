#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use slf::{CancelToken, Cipher, Error, Event, Header, LogTime, Result, Sink};

/// Entity separator as a char, for assertions on serialised text.
pub const ES: char = '\u{1E}';
/// Record separator as a char.
pub const RS: char = '\u{1F}';

/// Sink capturing every entity it receives.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

impl Sink for MemorySink {
    fn write(&mut self, text: &str, _cancel: &CancelToken) -> Result<()> {
        self.entries.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn flush(&mut self, _cancel: &CancelToken) -> Result<()> {
        Ok(())
    }
}

/// Sink failing every operation.
pub struct BrokenSink;

impl Sink for BrokenSink {
    fn write(&mut self, _text: &str, _cancel: &CancelToken) -> Result<()> {
        Err(std::io::Error::other("broken sink").into())
    }

    fn flush(&mut self, _cancel: &CancelToken) -> Result<()> {
        Err(std::io::Error::other("broken sink").into())
    }
}

/// Cipher shifting every byte up by one and hex-encoding the result.
pub struct ShiftCipher;

impl Cipher for ShiftCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        Ok(plaintext.iter().map(|b| b.wrapping_add(1)).collect())
    }

    fn serialise(&self, ciphertext: &[u8]) -> String {
        ciphertext.iter().map(|b| format!("{b:02X}")).collect()
    }
}

/// Cipher failing every encryption.
pub struct FailingCipher;

impl Cipher for FailingCipher {
    fn encrypt(&self, _plaintext: &[u8]) -> Result<Vec<u8>> {
        Err(Error::Unsupported("no key loaded".into()))
    }

    fn serialise(&self, _ciphertext: &[u8]) -> String {
        String::new()
    }
}

pub fn info_event(text: &str) -> Event {
    Event::new("Info").with_message(text)
}

/// Write a file containing just a serialised header.
pub fn write_header_file(dir: &Path, name: &str, app: &str, start_up: LogTime, seq_no: u64) {
    let header = Header::new(app, start_up, seq_no);
    std::fs::write(dir.join(name), header.serialize()).unwrap();
}

/// Sorted file names directly inside `dir`.
pub fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
