// src/source/mod.rs

pub mod csv;
pub mod iter;

use crate::error::{Result, WorksheetError};
use crate::format::{classify_path, Format};
use crate::read::RawRow;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};
use tracing::debug;

pub use self::csv::CsvRowSource;
pub use self::iter::IterRowSource;

/// What a row source hands back for each pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Row(RawRow),
    /// The physical row exists but could not be tokenized. Not fatal.
    Malformed(String),
    End,
}

/// Yields physical rows in order, starting with the header row.
///
/// `Err` is reserved for faults that make further reading pointless
/// (I/O on the underlying stream); a bad row is `Fetched::Malformed`.
pub trait RowSource {
    fn fetch(&mut self) -> Result<Fetched>;
}

impl<S: RowSource + ?Sized> RowSource for &mut S {
    fn fetch(&mut self) -> Result<Fetched> {
        (**self).fetch()
    }
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn fetch(&mut self) -> Result<Fetched> {
        (**self).fetch()
    }
}

/// Open a file as a row source, picking the reader by extension.
///
/// Only delimited text has a built-in reader; spreadsheet rows must be
/// decoded elsewhere and fed through [`IterRowSource`].
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn open_path<P: AsRef<Path>>(path: P) -> Result<CsvRowSource<BufReader<File>>> {
    let path = path.as_ref();
    match supported_format(path)? {
        Format::DelimitedText => {
            let file = File::open(path)?;
            debug!("opened delimited text");
            Ok(CsvRowSource::from_reader(BufReader::new(file)))
        }
        other => Err(WorksheetError::UnsupportedFormat(other)),
    }
}

/// Physical lines in a file, header included.
pub fn count_rows<P: AsRef<Path>>(path: P) -> Result<usize> {
    let path = path.as_ref();
    match supported_format(path)? {
        Format::DelimitedText => {
            let file = File::open(path)?;
            Ok(count_lines(BufReader::new(file))?)
        }
        other => Err(WorksheetError::UnsupportedFormat(other)),
    }
}

fn supported_format(path: &Path) -> Result<Format> {
    classify_path(path).ensure_supported(&path.display().to_string())
}

/// Count lines terminated by `\n`, `\r\n` or a lone `\r`; an unterminated
/// last line counts too.
pub fn count_lines<R: BufRead>(mut reader: R) -> io::Result<usize> {
    let mut lines = 0;
    let mut prev_cr = false;
    let mut open = false;

    loop {
        let buf = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if buf.is_empty() {
            break;
        }
        for &b in buf {
            match b {
                b'\n' => {
                    if !prev_cr {
                        lines += 1;
                    }
                    prev_cr = false;
                    open = false;
                }
                b'\r' => {
                    lines += 1;
                    prev_cr = true;
                    open = false;
                }
                _ => {
                    prev_cr = false;
                    open = true;
                }
            }
        }
        let n = buf.len();
        reader.consume(n);
    }

    if open {
        lines += 1;
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::{Cursor, Write};
    use tempfile::Builder;

    #[test]
    fn counts_all_terminator_styles() -> Result<()> {
        assert_eq!(count_lines(Cursor::new(""))?, 0);
        assert_eq!(count_lines(Cursor::new("a"))?, 1);
        assert_eq!(count_lines(Cursor::new("a\n"))?, 1);
        assert_eq!(count_lines(Cursor::new("a\nb"))?, 2);
        assert_eq!(count_lines(Cursor::new("a\r\nb\r\n"))?, 2);
        assert_eq!(count_lines(Cursor::new("a\rb\rc"))?, 3);
        assert_eq!(count_lines(Cursor::new("\n\n"))?, 2);
        Ok(())
    }

    #[test]
    fn crlf_split_across_buffers_counts_once() -> Result<()> {
        let text = "ab\r\ncd\r\n";
        let reader = BufReader::with_capacity(3, Cursor::new(text));
        assert_eq!(count_lines(reader)?, 2);
        Ok(())
    }

    #[test]
    fn count_rows_by_extension() -> Result<()> {
        let mut csv = Builder::new().suffix(".csv").tempfile()?;
        write!(csv, "id,name\n1,a\n2,b\n")?;
        assert_eq!(count_rows(csv.path())?, 3);

        let xlsx = Builder::new().suffix(".xlsx").tempfile()?;
        assert!(matches!(
            count_rows(xlsx.path()),
            Err(WorksheetError::UnsupportedFormat(Format::SpreadsheetLike))
        ));

        let txt = Builder::new().suffix(".txt").tempfile()?;
        assert!(matches!(
            count_rows(txt.path()),
            Err(WorksheetError::UnrecognizedFormat(_))
        ));
        Ok(())
    }

    #[test]
    fn open_path_rejects_before_opening() -> Result<()> {
        // the file does not exist; classification must fail first
        assert!(matches!(
            open_path("/nonexistent/data.json"),
            Err(WorksheetError::UnrecognizedFormat(_))
        ));
        assert!(matches!(
            open_path("/nonexistent/data.xls"),
            Err(WorksheetError::UnsupportedFormat(Format::SpreadsheetLike))
        ));
        assert!(matches!(
            open_path("/nonexistent/data.csv"),
            Err(WorksheetError::Io(_))
        ));
        Ok(())
    }
}
