use slf::Error;
use slf::hexdump::{self, DumpOptions};

fn plain() -> DumpOptions {
    DumpOptions {
        bytes_per_row: 8,
        offsets_header: false,
        address_column: false,
        substitute: '.',
    }
}

#[test]
fn test_single_row_hex_and_transcript() {
    let out = hexdump::dump(b"AB", 0, 2, &plain()).unwrap();
    let expected = format!("41 42{}  AB", "   ".repeat(6));
    assert_eq!(out, expected);
}

#[test]
fn test_rows_pad_hex_to_uniform_width() {
    let out = hexdump::dump(&[0x41; 10], 0, 10, &plain()).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("AAAAAAAA"));
    assert!(lines[1].ends_with("AA"));
    // the transcript column starts at the same position on every row
    assert_eq!(lines[0].rfind(' '), lines[1].rfind(' '));
}

#[test]
fn test_address_column_grows_to_even_nibble_count() {
    let opts = DumpOptions {
        bytes_per_row: 16,
        offsets_header: false,
        address_column: true,
        substitute: '.',
    };
    let data = vec![0u8; 300];
    let out = hexdump::dump(&data, 0, 300, &opts).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    // last address 0x12B needs three nibbles, rounded up to four
    assert!(lines[0].starts_with("0000  "));
    assert!(lines.last().unwrap().starts_with("0120  "));
}

#[test]
fn test_short_dump_uses_two_nibble_addresses() {
    let opts = DumpOptions {
        bytes_per_row: 4,
        offsets_header: false,
        address_column: true,
        substitute: '.',
    };
    let out = hexdump::dump(b"abcdef", 0, 6, &opts).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].starts_with("00  "));
    assert!(lines[1].starts_with("04  "));
}

#[test]
fn test_offsets_header_line() {
    let opts = DumpOptions {
        bytes_per_row: 4,
        offsets_header: true,
        address_column: false,
        substitute: '.',
    };
    let out = hexdump::dump(b"abcd", 0, 4, &opts).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "00 01 02 03");
    assert!(lines[1].starts_with("61 62 63 64"));
}

#[test]
fn test_transcript_substitutes_control_bytes() {
    let out = hexdump::dump(b"a\x00b\x1F", 0, 4, &plain()).unwrap();
    assert!(out.ends_with("a.b."));
}

#[test]
fn test_custom_substitute_char() {
    let mut opts = plain();
    opts.substitute = '?';
    let out = hexdump::dump(b"\x01", 0, 1, &opts).unwrap();
    assert!(out.ends_with('?'));
}

#[test]
fn test_length_clamps_to_available_data() {
    let out = hexdump::dump(b"abc", 1, 100, &plain()).unwrap();
    assert!(out.ends_with("bc"));
    assert!(out.starts_with("62 63"));
}

#[test]
fn test_offset_past_data_fails() {
    assert!(matches!(
        hexdump::dump(b"abc", 4, 1, &plain()),
        Err(Error::InvalidArg(_))
    ));
}

#[test]
fn test_zero_length_fails() {
    assert!(matches!(
        hexdump::dump(b"abc", 0, 0, &plain()),
        Err(Error::InvalidArg(_))
    ));
}

#[test]
fn test_zero_row_width_fails() {
    let mut opts = plain();
    opts.bytes_per_row = 0;
    assert!(matches!(
        hexdump::dump(b"abc", 0, 3, &opts),
        Err(Error::InvalidArg(_))
    ));
}
