use std::fmt;

use chrono::NaiveDateTime;

use crate::data::model::{CellValue, DType, Dataset};

/// Columns with fewer distinct values than this get a multi-select.
pub const CATEGORICAL_THRESHOLD: usize = 10;

/// Semantic kind of a column, deciding which control it gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Categorical,
    Numeric,
    Temporal,
    Text,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Classification::Categorical => "categorical",
            Classification::Numeric => "numeric",
            Classification::Temporal => "temporal",
            Classification::Text => "text",
        };
        f.write_str(s)
    }
}

/// Classify one column. First match wins:
///
/// 1. tagged categorical, or fewer than [`CATEGORICAL_THRESHOLD`] distinct values
/// 2. numeric dtype
/// 3. datetime dtype
/// 4. anything else is free text
///
/// A low-cardinality numeric column (a 1–5 rating) is therefore categorical.
pub fn classify(dataset: &Dataset, column: &str) -> Classification {
    let dtype = dataset.dtype(column).unwrap_or(DType::Object);
    if dtype == DType::Categorical || dataset.distinct_count(column) < CATEGORICAL_THRESHOLD {
        Classification::Categorical
    } else if dtype.is_numeric() {
        Classification::Numeric
    } else if dtype == DType::DateTime {
        Classification::Temporal
    } else {
        Classification::Text
    }
}

/// Summary statistics a control needs, matching the column's classification.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnStats {
    /// Distinct values in order of first appearance, missing included.
    Distinct(Vec<CellValue>),
    /// Observed bounds, `None` when every value is missing.
    Range { min: Option<f64>, max: Option<f64> },
    DateRange {
        min: Option<NaiveDateTime>,
        max: Option<NaiveDateTime>,
    },
    None,
}

/// One column's name, classification and cached statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub classification: Classification,
    pub stats: ColumnStats,
}

impl ColumnDescriptor {
    pub fn describe(dataset: &Dataset, column: &str) -> Self {
        let classification = classify(dataset, column);
        let stats = match classification {
            Classification::Categorical => ColumnStats::Distinct(dataset.distinct_values(column)),
            Classification::Numeric => {
                let mut min: Option<f64> = None;
                let mut max: Option<f64> = None;
                for v in dataset.values(column).filter_map(CellValue::as_f64) {
                    if v.is_nan() {
                        continue;
                    }
                    min = Some(min.map_or(v, |m| m.min(v)));
                    max = Some(max.map_or(v, |m| m.max(v)));
                }
                ColumnStats::Range { min, max }
            }
            Classification::Temporal => {
                let dates = || dataset.values(column).filter_map(CellValue::as_datetime);
                ColumnStats::DateRange {
                    min: dates().min(),
                    max: dates().max(),
                }
            }
            Classification::Text => ColumnStats::None,
        };
        ColumnDescriptor {
            name: column.to_string(),
            classification,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn single_column(name: &str, values: Vec<CellValue>) -> Dataset {
        Dataset::from_records(
            vec![name.to_string()],
            values.into_iter().map(|v| vec![v]).collect(),
        )
    }

    fn ints(range: std::ops::Range<i64>) -> Vec<CellValue> {
        range.map(CellValue::Integer).collect()
    }

    #[test]
    fn low_cardinality_is_categorical_whatever_the_dtype() {
        let age = single_column("Age", ints(0..5).into_iter().chain(ints(0..5)).collect());
        assert_eq!(classify(&age, "Age"), Classification::Categorical);

        let names = single_column(
            "Name",
            ["Alice", "Bob", "Anna"]
                .iter()
                .map(|s| CellValue::Text(s.to_string()))
                .collect(),
        );
        assert_eq!(classify(&names, "Name"), Classification::Categorical);
    }

    #[test]
    fn ten_distinct_numbers_are_numeric() {
        let ds = single_column("n", ints(0..10));
        assert_eq!(classify(&ds, "n"), Classification::Numeric);

        let ds = single_column("n", ints(0..9));
        assert_eq!(classify(&ds, "n"), Classification::Categorical);
    }

    #[test]
    fn missing_values_do_not_count_as_distinct() {
        let mut values = ints(0..9);
        values.push(CellValue::Null);
        let ds = single_column("n", values);
        assert_eq!(classify(&ds, "n"), Classification::Categorical);
    }

    #[test]
    fn tagged_categorical_wins_over_cardinality() {
        let mut ds = single_column("n", ints(0..50));
        ds.mark_categorical("n");
        assert_eq!(classify(&ds, "n"), Classification::Categorical);
    }

    #[test]
    fn datetimes_are_temporal_and_text_is_fallback() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..12)
            .map(|i| {
                CellValue::DateTime(
                    (start + chrono::Days::new(i)).and_hms_opt(0, 0, 0).unwrap(),
                )
            })
            .collect();
        let ds = single_column("d", dates);
        assert_eq!(classify(&ds, "d"), Classification::Temporal);

        let words = (0..12).map(|i| CellValue::Text(format!("w{i}"))).collect();
        let ds = single_column("w", words);
        assert_eq!(classify(&ds, "w"), Classification::Text);
    }

    #[test]
    fn numeric_stats_skip_missing() {
        let mut values: Vec<CellValue> =
            (0..20).map(|i| CellValue::Float(i as f64 * 0.5)).collect();
        values.push(CellValue::Null);
        let ds = single_column("x", values);

        let desc = ColumnDescriptor::describe(&ds, "x");

        assert_eq!(desc.classification, Classification::Numeric);
        assert_eq!(
            desc.stats,
            ColumnStats::Range {
                min: Some(0.0),
                max: Some(9.5)
            }
        );
    }

    #[test]
    fn categorical_stats_list_distinct_values_in_order() {
        let ds = single_column("Age", [5, 12, 8, 40, 5].map(CellValue::Integer).to_vec());
        let desc = ColumnDescriptor::describe(&ds, "Age");
        assert_eq!(
            desc.stats,
            ColumnStats::Distinct([5, 12, 8, 40].map(CellValue::Integer).to_vec())
        );
    }
}
