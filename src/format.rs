// src/format.rs

use crate::error::{Result, WorksheetError};
use serde::Serialize;
use std::path::Path;

pub const EXTENSION_CSV: &str = "csv";
pub const EXTENSION_XLS: &str = "xls";
pub const EXTENSION_XLSX: &str = "xlsx";

/// Kind of row container, decided from the file extension alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Format {
    /// `.csv`
    DelimitedText,
    /// `.xls` and `.xlsx`
    SpreadsheetLike,
    Unrecognized,
}

impl Format {
    /// Case-insensitive extension lookup, without the leading dot.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            EXTENSION_CSV => Format::DelimitedText,
            EXTENSION_XLS | EXTENSION_XLSX => Format::SpreadsheetLike,
            _ => Format::Unrecognized,
        }
    }

    pub fn is_delimited_text(self) -> bool {
        self == Format::DelimitedText
    }

    pub fn is_spreadsheet(self) -> bool {
        self == Format::SpreadsheetLike
    }

    /// Rejects `Unrecognized` so no row source is ever opened for it.
    pub fn ensure_supported(self, file_name: &str) -> Result<Self> {
        match self {
            Format::Unrecognized => Err(WorksheetError::UnrecognizedFormat(file_name.to_string())),
            other => Ok(other),
        }
    }
}

/// Classify a file name (or full path) by its extension.
pub fn classify(file_name: &str) -> Format {
    let ext = extension(file_name);
    if ext.is_empty() {
        Format::Unrecognized
    } else {
        Format::from_extension(ext)
    }
}

/// Classify the final component of `path`.
pub fn classify_path(path: &Path) -> Format {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(classify)
        .unwrap_or(Format::Unrecognized)
}

/// Text after the last `.`, or "" when there is none.
pub fn extension(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or("")
}
