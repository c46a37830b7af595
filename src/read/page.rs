// src/read/page.rs

use crate::config::ReaderConfig;
use crate::error::{Result, WorksheetError};
use crate::read::{read_line, Flow, ReadOutcome, Record, RowListener};
use crate::source::RowSource;
use serde::Serialize;
use std::mem;
use tracing::debug;

/// Consecutive records plus the row index of the first one.
///
/// `records[i]` came from row `start_row + i`; rows that failed to tokenize
/// keep their slot as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub start_row: usize,
    pub records: Vec<Option<Record>>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Row index just past this page.
    pub fn end_row(&self) -> usize {
        self.start_row + self.records.len()
    }
}

pub trait PageListener {
    fn on_page(&mut self, page: Page) -> Flow;
}

impl<F> PageListener for F
where
    F: FnMut(Page) -> Flow,
{
    fn on_page(&mut self, page: Page) -> Flow {
        self(page)
    }
}

/// Buffers delivered rows and hands them on in pages of `page_size`.
///
/// A full page goes out as soon as its last row arrives; whatever is left
/// is only sent by [`Paginator::flush`].
pub struct Paginator<P> {
    page_size: usize,
    start_row: Option<usize>,
    buffer: Vec<Option<Record>>,
    listener: P,
    pages: usize,
}

impl<P: PageListener> Paginator<P> {
    pub fn new(page_size: usize, listener: P) -> Result<Self> {
        if page_size == 0 {
            return Err(WorksheetError::InvalidPageSize(page_size));
        }
        Ok(Self {
            page_size,
            start_row: None,
            buffer: Vec::with_capacity(page_size),
            listener,
            pages: 0,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Records waiting for the next page.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Pages sent so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn push(&mut self, row_index: usize, record: Option<Record>) -> Flow {
        if self.start_row.is_none() {
            self.start_row = Some(row_index);
        }

        if self.buffer.len() < self.page_size {
            self.buffer.push(record);
        }

        if self.buffer.len() >= self.page_size {
            return self.emit();
        }
        Flow::Continue
    }

    /// Send the partial page, if any.
    pub fn flush(&mut self) -> Flow {
        if self.buffer.is_empty() {
            return Flow::Continue;
        }
        self.emit()
    }

    pub fn into_inner(self) -> P {
        self.listener
    }

    fn emit(&mut self) -> Flow {
        let records = mem::replace(&mut self.buffer, Vec::with_capacity(self.page_size));
        let Some(start_row) = self.start_row.take() else {
            return Flow::Continue;
        };
        self.pages += 1;
        debug!(start_row, rows = records.len(), page = self.pages, "page ready");
        self.listener.on_page(Page { start_row, records })
    }
}

impl<P: PageListener> RowListener for Paginator<P> {
    fn on_row(&mut self, row_index: usize, record: Option<Record>) -> Flow {
        self.push(row_index, record)
    }
}

/// Page-by-page reads with a fixed page size.
#[derive(Debug, Clone, Copy)]
pub struct PageReader {
    page_size: usize,
}

impl PageReader {
    pub fn new(page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(WorksheetError::InvalidPageSize(page_size));
        }
        Ok(Self { page_size })
    }

    pub fn from_config(config: &ReaderConfig) -> Result<Self> {
        Self::new(config.page_size)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Read all of `source`, sending full pages as they fill and the
    /// remainder once the row loop ends, however it ended.
    #[tracing::instrument(level = "info", skip(self, source, listener), fields(page_size = self.page_size))]
    pub fn read<S, P>(&self, source: &mut S, listener: P) -> Result<ReadOutcome>
    where
        S: RowSource + ?Sized,
        P: PageListener,
    {
        let mut paginator = Paginator::new(self.page_size, listener)?;
        let outcome = read_line(source, &mut paginator)?;
        paginator.flush();
        debug!(pages = paginator.pages(), "paged read done");
        Ok(outcome)
    }
}
