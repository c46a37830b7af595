// src/error.rs

use crate::format::Format;
use thiserror::Error;

/// Everything that can end a read session or an encoding check early.
///
/// Per-row tokenizing faults are deliberately absent: a row that fails to
/// tokenize is logged and delivered as an absent record, it never surfaces here.
#[derive(Debug, Error)]
pub enum WorksheetError {
    #[error("header row is missing or has no usable column")]
    InvalidHeader,

    #[error("duplicated key: {key}, column index: {column}")]
    DuplicateKey { key: String, column: usize },

    #[error("data row cannot be combined without header keys")]
    MissingHeader,

    #[error("page size must be positive, got {0}")]
    InvalidPageSize(usize),

    #[error("encoding check needs at least one byte")]
    EmptyInput,

    #[error("unrecognized worksheet type: {0:?}")]
    UnrecognizedFormat(String),

    #[error("no built-in row source for {0:?}")]
    UnsupportedFormat(Format),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, WorksheetError>;
