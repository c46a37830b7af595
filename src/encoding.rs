// src/encoding.rs
//
// UTF-8 detection over a byte window. The body check walks lead and
// continuation bytes by bit pattern only; it does not reject overlong forms
// or surrogates, and it still accepts the legacy 5- and 6-byte sequences.

use crate::error::{Result, WorksheetError};
use std::{
    fs::File,
    io::{self, BufReader, Cursor, Read},
    path::Path,
};
use tracing::debug;

/// Chunk size used when reading a stream prefix.
pub const BUCKET_SIZE: usize = 1024;

/// Bytes inspected by the head check.
pub const HEAD_SIZE: usize = 3;

/// Longest lead byte accepted: `1111110x`.
pub const MAX_LEAD_SIZE: u32 = 6;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];

/// `0xxxxxxx`
#[inline]
pub fn is_single(byte: u8) -> bool {
    byte & 0x80 == 0
}

/// `10xxxxxx`
#[inline]
pub fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Leading 1-bits of a lead byte, i.e. the length of the sequence it opens.
///
/// `110xxxxx` → 2, `1110xxxx` → 3, up to `1111110x` → 6. A continuation byte
/// yields 1 and `0xFE`/`0xFF` yield 7 and 8; callers treat all of those as invalid.
#[inline]
pub fn lead_size(byte: u8) -> u32 {
    byte.leading_ones()
}

/// Is `data` a well-formed sequence of lead + continuation bytes?
///
/// Fails with `EmptyInput` on an empty slice. A sequence cut short by the end
/// of `data` is invalid.
pub fn is_valid_utf8(data: &[u8]) -> Result<bool> {
    if data.is_empty() {
        return Err(WorksheetError::EmptyInput);
    }
    Ok(walk(data))
}

fn walk(data: &[u8]) -> bool {
    let mut i = 0;
    while i < data.len() {
        let lead = data[i];
        if is_single(lead) {
            i += 1;
            continue;
        }

        let size = lead_size(lead);
        if !(2..=MAX_LEAD_SIZE).contains(&size) {
            return false;
        }

        let end = i + size as usize;
        match data.get(i + 1..end) {
            Some(tail) if tail.iter().all(|&b| is_continuation(b)) => i = end,
            _ => return false,
        }
    }
    true
}

/// True when `head` opens with a UTF-8 or UTF-16 byte-order mark.
///
/// Needs all three head bytes, even for the two-byte UTF-16 marks.
pub fn has_bom(head: &[u8]) -> bool {
    if head.len() < HEAD_SIZE {
        return false;
    }
    head.starts_with(&UTF16_LE_BOM) || head.starts_with(&UTF16_BE_BOM) || head.starts_with(&UTF8_BOM)
}

/// Read the first three bytes of `reader` and look for a byte-order mark.
/// Short input yields `false`, never an error.
pub fn check_head<R: Read>(reader: &mut R) -> io::Result<bool> {
    let head = read_head(reader)?;
    Ok(has_bom(&head))
}

fn read_head<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(HEAD_SIZE);
    reader.take(HEAD_SIZE as u64).read_to_end(&mut head)?;
    Ok(head)
}

/// Read at least `size` bytes in `BUCKET_SIZE` chunks, or everything when `size == 0`.
///
/// The result may overshoot `size` by up to one bucket and is shorter only if
/// the stream ends first.
pub fn read_prefix<R: Read>(reader: &mut R, size: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut bucket = [0u8; BUCKET_SIZE];
    loop {
        let n = match reader.read(&mut bucket) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        out.extend_from_slice(&bucket[..n]);
        if size > 0 && out.len() >= size {
            break;
        }
    }
    Ok(out)
}

/// Validate the first `check_size` bytes of `reader` (0: the whole stream).
///
/// When the window fills and the stream goes on past it, a multi-byte sequence
/// cut by the window edge is not held against the stream. A stream that ends
/// inside a sequence fails, wherever the window lies.
pub fn check_body<R: Read>(reader: &mut R, check_size: usize) -> Result<bool> {
    let data = read_prefix(reader, check_size)?;
    let end = if check_size > 0 && data.len() >= check_size && has_more(reader)? {
        window_end(&data)
    } else {
        data.len()
    };
    is_valid_utf8(&data[..end])
}

/// Whether at least one byte follows; consumes it.
fn has_more<R: Read>(reader: &mut R) -> io::Result<bool> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(n) => return Ok(n > 0),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Length of `data` without a trailing incomplete multi-byte sequence.
///
/// Only a real lead byte (2 to 6 leading 1-bits) is trimmed; `0xFE` and
/// `0xFF` stay in and fail the walk.
fn window_end(data: &[u8]) -> usize {
    let len = data.len();
    let floor = len.saturating_sub(MAX_LEAD_SIZE as usize);
    for i in (floor..len).rev() {
        let b = data[i];
        if is_continuation(b) {
            continue;
        }
        let size = lead_size(b);
        if (2..=MAX_LEAD_SIZE).contains(&size) && i + size as usize > len && i > 0 {
            return i;
        }
        break;
    }
    len
}

/// Decides whether a stream is UTF-8: a BOM settles it, otherwise the body is walked.
#[derive(Clone, Copy, Debug, Default)]
pub struct Utf8Checker {
    check_size: usize,
}

impl Utf8Checker {
    /// `check_size == 0` validates the whole stream.
    pub fn new(check_size: usize) -> Self {
        Self { check_size }
    }

    pub fn check_size(&self) -> usize {
        self.check_size
    }

    /// Consumes the stream once; the head bytes are replayed into the body check.
    pub fn check<R: Read>(&self, mut reader: R) -> Result<bool> {
        let head = read_head(&mut reader)?;
        if has_bom(&head) {
            debug!("byte-order mark found");
            return Ok(true);
        }
        let mut body = Cursor::new(head).chain(reader);
        check_body(&mut body, self.check_size)
    }

    #[tracing::instrument(level = "debug", skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn check_path<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        let file = File::open(path.as_ref())?;
        let verdict = self.check(BufReader::new(file))?;
        debug!(verdict, "encoding checked");
        Ok(verdict)
    }
}
