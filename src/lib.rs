//! Streaming reads of tabular files into key → value records.
//!
//! The first row of a sheet names the columns; every later row comes back as
//! a [`Record`] keyed by those names, one row at a time, in pages, or all at
//! once. [`encoding`] answers whether a byte stream looks like UTF-8 before
//! it is handed to a row source.

pub mod config;
pub mod encoding;
pub mod error;
pub mod format;
pub mod read;
pub mod source;

pub use config::ReaderConfig;
pub use encoding::Utf8Checker;
pub use error::{Result, WorksheetError};
pub use format::{classify, Format};
pub use read::{
    build_keys, combine, read_line, read_sync, Flow, HeaderKeys, Page, PageListener, PageReader,
    Paginator, RawRow, ReadOutcome, ReadSession, Record, RowListener,
};
pub use source::{count_rows, open_path, CsvRowSource, Fetched, IterRowSource, RowSource};
