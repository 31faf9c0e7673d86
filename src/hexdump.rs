//! Hex-and-transcript dumps for binary detail payloads.

use crate::error::{Error, Result};

/// Rendering options for [`dump`].
#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// Bytes rendered per row.
    pub bytes_per_row: usize,
    /// Emit a first line of per-column offsets.
    pub offsets_header: bool,
    /// Emit a leading address column on each row.
    pub address_column: bool,
    /// Character substituted for control bytes in the transcript.
    pub substitute: char,
}

impl Default for DumpOptions {
    fn default() -> Self {
        DumpOptions {
            bytes_per_row: 16,
            offsets_header: true,
            address_column: true,
            substitute: '.',
        }
    }
}

/// Render `len` bytes of `data` starting at `offset` as a hex dump with a
/// transcript column.
///
/// A length exceeding the available range clamps silently. Fails
/// `InvalidArg` when `offset` lies past the data, `len` is zero, or the
/// row width is zero.
pub fn dump(data: &[u8], offset: usize, len: usize, opts: &DumpOptions) -> Result<String> {
    if offset > data.len() {
        return Err(Error::InvalidArg("offset past end of data"));
    }
    if len == 0 {
        return Err(Error::InvalidArg("length must be positive"));
    }
    if opts.bytes_per_row == 0 {
        return Err(Error::InvalidArg("row width must be positive"));
    }

    let len = len.min(data.len() - offset);
    let end = offset + len;
    let addr_width = address_width(end.saturating_sub(1));

    let mut lines = Vec::with_capacity(len / opts.bytes_per_row + 2);
    if opts.offsets_header {
        let mut line = String::new();
        if opts.address_column {
            line.push_str(&" ".repeat(addr_width + 2));
        }
        for col in 0..opts.bytes_per_row {
            if col > 0 {
                line.push(' ');
            }
            line.push_str(&format!("{:02X}", col & 0xFF));
        }
        lines.push(line);
    }

    let mut pos = offset;
    while pos < end {
        let row = &data[pos..(pos + opts.bytes_per_row).min(end)];
        let mut line = String::new();
        if opts.address_column {
            line.push_str(&format!("{:0width$X}  ", pos, width = addr_width));
        }
        for col in 0..opts.bytes_per_row {
            if col > 0 {
                line.push(' ');
            }
            match row.get(col) {
                Some(b) => line.push_str(&format!("{b:02X}")),
                None => line.push_str("  "),
            }
        }
        line.push_str("  ");
        for b in row {
            line.push(transcript_char(*b, opts.substitute));
        }
        lines.push(line);
        pos += row.len();
    }
    Ok(lines.join("\n"))
}

/// Nibble count covering `last`, rounded up to an even width.
fn address_width(last: usize) -> usize {
    let mut width = 1;
    let mut value = last >> 4;
    while value > 0 {
        width += 1;
        value >>= 4;
    }
    width + (width % 2)
}

fn transcript_char(b: u8, substitute: char) -> char {
    if b < 0x20 || b == 0x7F {
        substitute
    } else {
        char::from(b)
    }
}
