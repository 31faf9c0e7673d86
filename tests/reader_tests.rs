mod common;

use std::io::{self, Read};

use common::info_event;
use slf::timefmt;
use slf::{CancelToken, Config, Element, Error, Header, MAX_BUFFER_SIZE, Reader, Router};
use tempfile::tempdir;

fn header_bytes() -> Vec<u8> {
    let start = timefmt::parse_iso8601("2024-01-02T03:04:05.0000000Z").unwrap();
    Header::new("app", start, 3)
        .with_misc("k", "v")
        .serialize()
        .into_bytes()
}

#[test]
fn test_reads_header_then_none_on_empty_tail() {
    let bytes = header_bytes();
    let mut reader = Reader::new(&bytes[..]);
    let cancel = CancelToken::new();

    let Some(Element::Header(header)) = reader.next_element(&cancel).unwrap() else {
        panic!("expected the header element");
    };
    assert_eq!(header.app_name, "app");
    assert_eq!(header.seq_no, 3);
    assert_eq!(header.misc, vec![("k".to_string(), "v".to_string())]);
    assert_eq!(reader.next_element(&cancel).unwrap(), None);
}

#[test]
fn test_tail_after_header_is_reserved() {
    let mut bytes = header_bytes();
    bytes.extend_from_slice(b"INVALID\x1E");
    let mut reader = Reader::new(&bytes[..]);
    let cancel = CancelToken::new();

    assert!(matches!(
        reader.next_element(&cancel).unwrap(),
        Some(Element::Header(_))
    ));
    assert_eq!(reader.next_element(&cancel).unwrap(), None);
}

#[test]
fn test_non_header_bytes_fail_format() {
    let mut reader = Reader::new(&b"EVENT\x1F whatever\x1E"[..]);
    let err = reader.next_element(&CancelToken::new()).unwrap_err();
    assert!(matches!(err, Error::Format { .. }));
}

#[test]
fn test_empty_stream_returns_none() {
    let mut reader = Reader::new(&b""[..]);
    assert_eq!(reader.next_element(&CancelToken::new()).unwrap(), None);
}

#[test]
fn test_truncated_header_is_incomplete() {
    let bytes = header_bytes();
    let mut reader = Reader::new(&bytes[..bytes.len() - 1]);
    let err = reader.next_element(&CancelToken::new()).unwrap_err();
    assert!(matches!(err, Error::Format { .. }));
}

/// Hands out one byte per read call, forcing many buffer top-ups.
struct OneByteAtATime<R>(R);

impl<R: Read> Read for OneByteAtATime<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let take = buf.len().min(1);
        self.0.read(&mut buf[..take])
    }
}

#[test]
fn test_incremental_reads_assemble_the_header() {
    let bytes = header_bytes();
    let mut reader = Reader::new(OneByteAtATime(&bytes[..]));
    let Some(Element::Header(header)) =
        reader.next_element(&CancelToken::new()).unwrap()
    else {
        panic!("expected the header element");
    };
    assert_eq!(header.seq_no, 3);
}

#[test]
fn test_leading_entity_separator_tolerated() {
    let mut bytes = vec![0x1E];
    bytes.extend_from_slice(&header_bytes());
    let mut reader = Reader::new(&bytes[..]);
    assert!(matches!(
        reader.next_element(&CancelToken::new()).unwrap(),
        Some(Element::Header(_))
    ));
}

#[test]
fn test_cancellation_passes_through() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let bytes = header_bytes();
    let mut reader = Reader::new(&bytes[..]);
    assert!(matches!(
        reader.next_element(&cancel),
        Err(Error::Cancelled)
    ));
}

struct FailingStream;

impl Read for FailingStream {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("stream broke"))
    }
}

#[test]
fn test_io_error_passes_through() {
    let mut reader = Reader::new(FailingStream);
    assert!(matches!(
        reader.next_element(&CancelToken::new()),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_buffer_full_without_an_element_fails() {
    let mut bytes = b"SLF.1\x1F".to_vec();
    bytes.extend_from_slice(&vec![b'a'; MAX_BUFFER_SIZE + 1]);
    let mut reader = Reader::new(&bytes[..]);
    let err = reader.next_element(&CancelToken::new()).unwrap_err();
    assert!(matches!(err, Error::Format { .. }));
}

#[test]
fn test_reads_back_a_router_written_file() {
    let dir = tempdir().unwrap();
    let config = Config::builder()
        .app_name("roundtrip")
        .path(dir.path())
        .file_name_format("{seq-no}.slf.log")
        .build()
        .unwrap();
    let router = Router::new(config);
    router
        .forward(&[info_event("written then read")], &CancelToken::new())
        .unwrap();
    router.stop();

    let file = std::fs::File::open(dir.path().join("1.slf.log")).unwrap();
    let mut reader = Reader::new(file);
    let cancel = CancelToken::new();
    let Some(Element::Header(header)) = reader.next_element(&cancel).unwrap() else {
        panic!("expected the header element");
    };
    assert_eq!(header.app_name, "roundtrip");
    assert_eq!(header.seq_no, 1);
    // the event tail is reserved
    assert_eq!(reader.next_element(&cancel).unwrap(), None);
}
