use crate::error::{Result, WorksheetError};
use crate::read::{HeaderKeys, RawRow};
use std::collections::HashSet;

/// Turn the header row into column index → key.
///
/// - blank cells (absent, empty or whitespace-only) are skipped, their column
///   gets no key
/// - keys are trimmed
/// - a key seen twice fails with `DuplicateKey`, naming the later column
/// - a header that yields no key at all fails with `InvalidHeader`
pub fn build_keys(raw: Option<&RawRow>) -> Result<HeaderKeys> {
    let raw = raw.ok_or(WorksheetError::InvalidHeader)?;

    let mut keys = HeaderKeys::new();
    let mut seen: HashSet<&str> = HashSet::with_capacity(raw.len());

    for (&column, value) in raw {
        let Some(value) = value.as_deref() else {
            continue;
        };
        let key = value.trim();
        if key.is_empty() {
            continue;
        }
        if !seen.insert(key) {
            return Err(WorksheetError::DuplicateKey {
                key: key.to_string(),
                column,
            });
        }
        keys.insert(column, key.to_string());
    }

    if keys.is_empty() {
        return Err(WorksheetError::InvalidHeader);
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::raw_row;
    use anyhow::Result;
    use proptest::prelude::*;

    #[test]
    fn keys_are_trimmed_and_positioned() -> Result<()> {
        let keys = build_keys(Some(&raw_row([" id", "name ", "\tcity\t"])))?;
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[&0], "id");
        assert_eq!(keys[&1], "name");
        assert_eq!(keys[&2], "city");
        Ok(())
    }

    #[test]
    fn blank_columns_are_skipped() -> Result<()> {
        let mut raw = raw_row(["id", "", "   ", "city"]);
        raw.insert(4, None);
        raw.insert(9, Some("late".into()));

        let keys = build_keys(Some(&raw))?;
        assert_eq!(keys.len(), 3);
        assert_eq!(keys.get(&0).map(String::as_str), Some("id"));
        assert!(!keys.contains_key(&1));
        assert!(!keys.contains_key(&2));
        assert_eq!(keys.get(&3).map(String::as_str), Some("city"));
        assert!(!keys.contains_key(&4));
        assert_eq!(keys.get(&9).map(String::as_str), Some("late"));
        Ok(())
    }

    #[test]
    fn duplicate_after_trimming_is_rejected() {
        let err = build_keys(Some(&raw_row(["id", "name", "x", " name "]))).unwrap_err();
        match err {
            WorksheetError::DuplicateKey { key, column } => {
                assert_eq!(key, "name");
                assert_eq!(column, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn absent_header_is_invalid() {
        assert!(matches!(build_keys(None), Err(WorksheetError::InvalidHeader)));
    }

    #[test]
    fn header_without_usable_column_is_invalid() {
        assert!(matches!(
            build_keys(Some(&RawRow::new())),
            Err(WorksheetError::InvalidHeader)
        ));
        let mut blank = raw_row(["", "  "]);
        blank.insert(2, None);
        assert!(matches!(
            build_keys(Some(&blank)),
            Err(WorksheetError::InvalidHeader)
        ));
    }

    proptest! {
        #[test]
        fn distinct_headers_map_back_to_positions(
            names in proptest::collection::hash_set("[a-z][a-z0-9_]{0,8}", 1..16)
        ) {
            let names: Vec<String> = names.into_iter().collect();
            let padded: Vec<String> = names.iter().map(|n| format!(" {n} ")).collect();
            let keys = build_keys(Some(&raw_row(padded))).unwrap();
            prop_assert_eq!(keys.len(), names.len());
            for (i, n) in names.iter().enumerate() {
                prop_assert_eq!(&keys[&i], n);
            }
        }

        #[test]
        fn any_repeated_header_is_rejected(
            names in proptest::collection::vec("[a-z]{1,4}", 2..10),
            a in 0usize..10,
            b in 0usize..10,
        ) {
            let len = names.len();
            let (a, b) = (a % len, b % len);
            prop_assume!(a != b);
            let mut names = names;
            names[b] = format!("  {}", names[a]);
            let result = build_keys(Some(&raw_row(names)));
            let is_duplicate = matches!(result, Err(WorksheetError::DuplicateKey { .. }));
            prop_assert!(is_duplicate);
        }
    }
}
