use crate::error::Result;
use crate::read::RawRow;
use crate::source::{Fetched, RowSource};

/// Rows decoded by some other reader (a spreadsheet library, a test), in order.
///
/// A `None` item marks a row that reader failed to decode.
pub struct IterRowSource<I> {
    rows: I,
}

impl<I> IterRowSource<I>
where
    I: Iterator<Item = Option<RawRow>>,
{
    pub fn new<T>(rows: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            rows: rows.into_iter(),
        }
    }
}

impl<I> RowSource for IterRowSource<I>
where
    I: Iterator<Item = Option<RawRow>>,
{
    fn fetch(&mut self) -> Result<Fetched> {
        Ok(match self.rows.next() {
            Some(Some(row)) => Fetched::Row(row),
            Some(None) => Fetched::Malformed("row could not be decoded".into()),
            None => Fetched::End,
        })
    }
}
