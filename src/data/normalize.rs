use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::model::{CellValue, DType, Dataset};

// ---------------------------------------------------------------------------
// Best-effort date coercion
// ---------------------------------------------------------------------------

/// Naive formats tried in order after RFC 3339 / RFC 2822.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
];

/// A column that was converted to a timezone-naive datetime column.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub column: String,
    /// Number of non-missing cells converted.
    pub converted: usize,
}

/// A column left exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct Unchanged {
    pub column: String,
    pub reason: UnchangedReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnchangedReason {
    /// Only text (object) columns are candidates.
    NotText,
    /// The whole-column attempt failed on this cell.
    Unparseable { row: usize, value: String },
    UnknownColumn,
}

/// Try to turn one object column into datetimes.
///
/// All-or-nothing: every non-missing cell must parse, otherwise the dataset
/// is not touched. Offsets are dropped, keeping the local wall-clock time.
pub fn normalize_column(dataset: &mut Dataset, column: &str) -> Result<Normalized, Unchanged> {
    let unchanged = |reason| Unchanged {
        column: column.to_string(),
        reason,
    };

    match dataset.dtype(column) {
        Some(DType::Object) => {}
        Some(_) => return Err(unchanged(UnchangedReason::NotText)),
        None => return Err(unchanged(UnchangedReason::UnknownColumn)),
    }

    let mut parsed: Vec<Option<NaiveDateTime>> = Vec::with_capacity(dataset.len());
    for (row, value) in dataset.values(column).enumerate() {
        match value {
            CellValue::Null => parsed.push(None),
            CellValue::Text(s) => match parse_naive_datetime(s) {
                Some(dt) => parsed.push(Some(dt)),
                None => {
                    return Err(unchanged(UnchangedReason::Unparseable {
                        row,
                        value: s.clone(),
                    }))
                }
            },
            CellValue::DateTime(dt) => parsed.push(Some(*dt)),
            other => {
                return Err(unchanged(UnchangedReason::Unparseable {
                    row,
                    value: other.to_string(),
                }))
            }
        }
    }

    let mut converted = 0;
    for (row, dt) in dataset.rows.iter_mut().zip(parsed) {
        if let Some(dt) = dt {
            row.cells
                .insert(column.to_string(), CellValue::DateTime(dt));
            converted += 1;
        }
    }
    dataset.set_dtype(column, DType::DateTime);

    Ok(Normalized {
        column: column.to_string(),
        converted,
    })
}

/// Run [`normalize_column`] over every column, returning one outcome per column
/// in column order.
pub fn normalize_dates(dataset: &mut Dataset) -> Vec<Result<Normalized, Unchanged>> {
    let names: Vec<String> = dataset.column_names().map(str::to_string).collect();
    names
        .iter()
        .map(|name| {
            let outcome = normalize_column(dataset, name);
            match &outcome {
                Ok(n) => log::debug!(
                    "Column '{}' parsed as datetime ({} cells)",
                    n.column,
                    n.converted
                ),
                Err(Unchanged {
                    reason: UnchangedReason::Unparseable { row, value },
                    ..
                }) => {
                    log::trace!("Column '{name}' kept as text: row {row} '{value}' is not a date")
                }
                Err(_) => {}
            }
            outcome
        })
        .collect()
}

/// Parse a date or date-time string, dropping any timezone offset.
pub fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%z") {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn converts_whole_column_and_strips_offsets() {
        let mut ds = Dataset::from_records(
            vec!["when".into()],
            vec![
                vec![text("2023-01-05")],
                vec![text("2023-02-01T10:00:00+05:30")],
                vec![CellValue::Null],
            ],
        );

        let outcome = normalize_column(&mut ds, "when");

        assert_eq!(
            outcome,
            Ok(Normalized {
                column: "when".into(),
                converted: 2
            })
        );
        assert_eq!(ds.dtype("when"), Some(DType::DateTime));
        assert_eq!(ds.rows[0].get("when"), &CellValue::DateTime(dt(2023, 1, 5, 0)));
        // wall-clock time kept, offset discarded
        assert_eq!(ds.rows[1].get("when"), &CellValue::DateTime(dt(2023, 2, 1, 10)));
        assert_eq!(ds.rows[2].get("when"), &CellValue::Null);
    }

    #[test]
    fn one_bad_cell_leaves_column_untouched() {
        let mut ds = Dataset::from_records(
            vec!["when".into()],
            vec![vec![text("2023-01-05")], vec![text("soon")]],
        );
        let before = ds.clone();

        let outcome = normalize_column(&mut ds, "when");

        assert_eq!(
            outcome,
            Err(Unchanged {
                column: "when".into(),
                reason: UnchangedReason::Unparseable {
                    row: 1,
                    value: "soon".into()
                }
            })
        );
        assert_eq!(ds, before);
    }

    #[test]
    fn non_text_columns_are_not_candidates() {
        let mut ds = Dataset::from_records(
            vec!["n".into()],
            vec![vec![CellValue::Integer(20230105)]],
        );
        let outcome = normalize_column(&mut ds, "n");
        assert!(matches!(
            outcome,
            Err(Unchanged {
                reason: UnchangedReason::NotText,
                ..
            })
        ));
    }

    #[test]
    fn normalize_dates_reports_every_column() {
        let mut ds = Dataset::from_records(
            vec!["d".into(), "name".into(), "n".into()],
            vec![vec![text("01/31/2024"), text("Alice"), CellValue::Integer(1)]],
        );
        let outcomes = normalize_dates(&mut ds);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].is_err());
        assert!(outcomes[2].is_err());
        assert_eq!(ds.rows[0].get("d"), &CellValue::DateTime(dt(2024, 1, 31, 0)));
    }
}
