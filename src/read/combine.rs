use crate::error::{Result, WorksheetError};
use crate::read::{HeaderKeys, RawRow, Record};

/// `{index => key}` and `{index => value}` -> `{key => value}`
///
/// An absent row stays absent. Columns without a key are dropped; a key whose
/// column is missing from the row maps to `None`.
pub fn combine(keys: Option<&HeaderKeys>, values: Option<&RawRow>) -> Result<Option<Record>> {
    let Some(values) = values else {
        return Ok(None);
    };

    let keys = match keys {
        Some(k) if !k.is_empty() => k,
        _ => return Err(WorksheetError::MissingHeader),
    };

    let record = keys
        .iter()
        .map(|(column, key)| (key.clone(), values.get(column).cloned().flatten()))
        .collect();
    Ok(Some(record))
}
