use crate::error::Result;
use crate::read::RawRow;
use crate::source::{Fetched, RowSource};
use ::csv::{ByteRecord, ErrorKind, Reader, ReaderBuilder};
use encoding_rs::{Encoding, UTF_8};
use std::io::Read;

const BOM: char = '\u{feff}';

/// RFC 4180 rows from any byte stream.
///
/// Every field is reported as present text; records may be shorter or longer
/// than the header. Fields are decoded as UTF-8 unless another encoding is set
/// with [`CsvRowSource::with_encoding`]. A record that does not decode comes
/// back as `Fetched::Malformed` and reading carries on with the next one.
pub struct CsvRowSource<R: Read> {
    rdr: Reader<R>,
    record: ByteRecord,
    encoding: &'static Encoding,
    first: bool,
}

impl<R: Read> CsvRowSource<R> {
    pub fn from_reader(reader: R) -> Self {
        let rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // keep this so records with different field-counts work
            .from_reader(reader);
        Self::new(rdr)
    }

    /// Wrap a reader built elsewhere (custom delimiter, quoting, ...).
    /// It should be built with `has_headers(false)` so the header row is
    /// delivered like any other row.
    pub fn new(rdr: Reader<R>) -> Self {
        Self {
            rdr,
            record: ByteRecord::new(),
            encoding: UTF_8,
            first: true,
        }
    }

    /// Decode fields with `encoding` (e.g. `WINDOWS_1252`, `GBK`) instead of UTF-8.
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    fn decode_record(&self) -> std::result::Result<RawRow, String> {
        self.record
            .iter()
            .enumerate()
            .map(|(i, field)| {
                self.encoding
                    .decode_without_bom_handling_and_without_replacement(field)
                    .map(|text| (i, Some(text.into_owned())))
                    .ok_or_else(|| {
                        format!("field {} is not valid {}", i, self.encoding.name())
                    })
            })
            .collect()
    }

    pub fn into_inner(self) -> Reader<R> {
        self.rdr
    }
}

impl<R: Read> RowSource for CsvRowSource<R> {
    fn fetch(&mut self) -> Result<Fetched> {
        match self.rdr.read_byte_record(&mut self.record) {
            Ok(true) => {
                let first = std::mem::take(&mut self.first);
                let mut row = match self.decode_record() {
                    Ok(row) => row,
                    Err(reason) => return Ok(Fetched::Malformed(reason)),
                };
                if first {
                    if let Some(Some(head)) = row.get_mut(&0) {
                        if head.starts_with(BOM) {
                            head.remove(0);
                        }
                    }
                }
                Ok(Fetched::Row(row))
            }
            Ok(false) => Ok(Fetched::End),
            Err(e) if matches!(e.kind(), ErrorKind::Io(_)) => Err(e.into()),
            Err(e) => {
                self.first = false;
                Ok(Fetched::Malformed(e.to_string()))
            }
        }
    }
}
