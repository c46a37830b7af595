use crate::error::Result;
use crate::read::{read_line, Flow, Record};
use crate::source::RowSource;
use tracing::{error, info};

/// Read every data row into memory, in row order.
///
/// Rows that could not be tokenized are logged and left out, so the result
/// can be shorter than the number of data rows.
#[tracing::instrument(level = "info", skip_all)]
pub fn read_sync<S>(source: &mut S) -> Result<Vec<Record>>
where
    S: RowSource + ?Sized,
{
    let mut records = Vec::new();
    let mut skipped = 0usize;

    read_line(source, &mut |row_index: usize, record: Option<Record>| {
        match record {
            Some(r) => records.push(r),
            None => {
                error!(row_index, "read nothing, skipping row");
                skipped += 1;
            }
        }
        Flow::Continue
    })?;

    info!(records = records.len(), skipped, "collected");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorksheetError;
    use crate::read::test_support::init_test_logging;
    use crate::read::{raw_row, RawRow};
    use crate::source::{CsvRowSource, IterRowSource};
    use anyhow::Result;
    use std::io::Cursor;

    #[test]
    fn collects_all_records_in_order() -> Result<()> {
        init_test_logging();
        let csv = "id, name ,,city\n1,ada,x,London\n2,bob\n3,cy,y,Paris,extra\n";
        let records = read_sync(&mut CsvRowSource::from_reader(Cursor::new(csv)))?;

        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["name"].as_deref(), Some("ada"));
        assert_eq!(records[0]["city"].as_deref(), Some("London"));
        assert_eq!(records[1]["city"], None);
        assert_eq!(records[2]["id"].as_deref(), Some("3"));
        assert!(records.iter().all(|r| r.len() == 3));
        Ok(())
    }

    #[test]
    fn absent_records_are_skipped() -> Result<()> {
        init_test_logging();
        let rows: Vec<Option<RawRow>> = vec![
            Some(raw_row(["k"])),
            Some(raw_row(["a"])),
            None,
            Some(raw_row(["c"])),
        ];
        let records = read_sync(&mut IterRowSource::new(rows))?;
        let values: Vec<_> = records
            .iter()
            .map(|r| r["k"].clone().unwrap_or_default())
            .collect();
        assert_eq!(values, vec!["a", "c"]);
        Ok(())
    }

    #[test]
    fn header_errors_surface() {
        let csv = "a,b,a\n1,2,3\n";
        let err = read_sync(&mut CsvRowSource::from_reader(Cursor::new(csv))).unwrap_err();
        assert!(matches!(err, WorksheetError::DuplicateKey { ref key, column: 2 } if key == "a"));
    }
}
