// src/read/mod.rs
//
// Header-aware reading: the first physical row becomes the key row, every
// following row is combined with it into a `Record` and pushed to a listener.

pub mod combine;
pub mod keys;
pub mod page;
pub mod session;
pub mod sync;

use std::collections::{BTreeMap, HashMap};

pub use combine::combine;
pub use keys::build_keys;
pub use page::{Page, PageListener, PageReader, Paginator};
pub use session::{read_line, Flow, ReadOutcome, ReadSession, RowListener, SessionState};
pub use sync::read_sync;

/// One physical row as tokenized by a row source: column index → raw text.
///
/// A column may be present with `None` text; a column missing from the map
/// does not exist in this row at all.
pub type RawRow = BTreeMap<usize, Option<String>>;

/// Column index → trimmed, unique, non-empty key.
pub type HeaderKeys = BTreeMap<usize, String>;

/// One data row addressed by key.
pub type Record = HashMap<String, Option<String>>;

/// Build a `RawRow` from positional fields, every field present.
pub fn raw_row<I, S>(fields: I) -> RawRow
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fields
        .into_iter()
        .enumerate()
        .map(|(i, f)| (i, Some(f.into())))
        .collect()
}
