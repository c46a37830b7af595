// src/read/session.rs

use crate::error::{Result, WorksheetError};
use crate::read::{build_keys, combine, HeaderKeys, RawRow, Record};
use crate::source::{Fetched, RowSource};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Returned by a listener after every row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop reading now. Not an error; suppresses `on_complete`.
    Stop,
}

/// Receives data rows in strictly increasing row order.
pub trait RowListener {
    /// `record` is `None` when the row failed to tokenize upstream.
    fn on_row(&mut self, row_index: usize, record: Option<Record>) -> Flow;

    /// Called once when the source is exhausted, with the last data row index
    /// (`None` if there was no data row). Never called after a `Stop`.
    fn on_complete(&mut self, _last_row: Option<usize>) {}
}

impl<F> RowListener for F
where
    F: FnMut(usize, Option<Record>) -> Flow,
{
    fn on_row(&mut self, row_index: usize, record: Option<Record>) -> Flow {
        self(row_index, record)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    AwaitingHeader,
    Streaming,
    Completed,
    Stopped,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Stopped)
    }
}

/// How a read session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReadOutcome {
    /// Source exhausted; `last_row` is the last data row index seen.
    Completed { last_row: Option<usize> },
    /// A listener asked to stop after delivering `at_row`.
    Stopped { at_row: usize },
}

/// State of one read: the header keys and where we are in the row stream.
///
/// One session per read; it is not meant to be shared while a read is in
/// progress.
#[derive(Debug, Default)]
pub struct ReadSession {
    keys: Option<HeaderKeys>,
    state: SessionState,
    next_row: usize,
    last_data_row: Option<usize>,
}

impl ReadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Option<&HeaderKeys> {
        self.keys.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Index the next accepted row will get.
    pub fn next_row(&self) -> usize {
        self.next_row
    }

    /// Feed the next physical row.
    ///
    /// Row 0 builds the header keys and is never delivered; a bad header
    /// still uses up row 0. Later rows are combined and handed to `listener`.
    /// Once the session is terminal nothing more is delivered.
    pub fn accept<L>(&mut self, raw: Option<RawRow>, listener: &mut L) -> Result<Flow>
    where
        L: RowListener + ?Sized,
    {
        if self.state.is_terminal() {
            return Ok(Flow::Stop);
        }

        let row_index = self.next_row;
        self.next_row += 1;

        if self.state == SessionState::AwaitingHeader {
            self.state = SessionState::Streaming;
            let keys = build_keys(raw.as_ref())?;
            debug!(columns = keys.len(), "header captured");
            self.keys = Some(keys);
            return Ok(Flow::Continue);
        }

        let record = combine(self.keys.as_ref(), raw.as_ref())?;
        self.last_data_row = Some(row_index);

        let flow = listener.on_row(row_index, record);
        if flow == Flow::Stop {
            debug!(row_index, "listener stopped the read");
            self.state = SessionState::Stopped;
        }
        Ok(flow)
    }

    /// Mark the source as exhausted and fire `on_complete` once.
    ///
    /// A stopped session stays stopped and does not notify. A session that
    /// never saw a header row fails with `InvalidHeader`.
    pub fn finish<L>(&mut self, listener: &mut L) -> Result<ReadOutcome>
    where
        L: RowListener + ?Sized,
    {
        match self.state {
            SessionState::AwaitingHeader => Err(WorksheetError::InvalidHeader),
            SessionState::Streaming => {
                self.state = SessionState::Completed;
                listener.on_complete(self.last_data_row);
                Ok(self.outcome())
            }
            SessionState::Completed | SessionState::Stopped => Ok(self.outcome()),
        }
    }

    fn outcome(&self) -> ReadOutcome {
        match self.state {
            SessionState::Stopped => ReadOutcome::Stopped {
                at_row: self.last_data_row.unwrap_or(0),
            },
            _ => ReadOutcome::Completed {
                last_row: self.last_data_row,
            },
        }
    }
}

/// Pull every row from `source` through a fresh session into `listener`.
///
/// Rows that fail to tokenize are logged and delivered as `None`. Header
/// errors and I/O faults end the read with an error.
#[tracing::instrument(level = "info", skip_all)]
pub fn read_line<S, L>(source: &mut S, listener: &mut L) -> Result<ReadOutcome>
where
    S: RowSource + ?Sized,
    L: RowListener + ?Sized,
{
    let mut session = ReadSession::new();
    loop {
        let raw = match source.fetch()? {
            Fetched::Row(row) => Some(row),
            Fetched::Malformed(reason) => {
                warn!(row_index = session.next_row(), %reason, "row failed to tokenize, treating as empty");
                None
            }
            Fetched::End => break,
        };

        if session.accept(raw, listener)? == Flow::Stop {
            break;
        }
    }

    let outcome = session.finish(listener)?;
    info!(?outcome, rows = session.next_row(), "read finished");
    Ok(outcome)
}
