use std::collections::HashSet;

use chrono::NaiveDateTime;
use regex::Regex;

use super::control::{ControlSpec, ControlValue};
use super::error::FilterError;
use crate::data::model::{CellValue, Row};

// ---------------------------------------------------------------------------
// Row predicates
// ---------------------------------------------------------------------------

/// A row test over a single column, built from a control and its value.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Inactive control: every row passes.
    Always,
    /// Value is one of the selected values. An empty selection passes nothing.
    OneOf {
        column: String,
        selected: HashSet<CellValue>,
    },
    /// `min <= value <= max`; missing values fail.
    Between { column: String, min: f64, max: f64 },
    /// `start <= value <= end`; missing values fail.
    DateBetween {
        column: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// Pattern found anywhere in the cell's text.
    Matches { column: String, pattern: Regex },
}

impl Predicate {
    /// Build the predicate for `column` from its control and the user's value.
    ///
    /// A date range with other than two endpoints and an empty text pattern
    /// yield [`Predicate::Always`]. A pattern that is not a valid regular
    /// expression is matched as a literal substring.
    pub fn build(
        column: &str,
        spec: &ControlSpec,
        value: &ControlValue,
    ) -> Result<Self, FilterError> {
        if spec.kind() != value.kind() {
            return Err(FilterError::ControlMismatch {
                column: column.to_string(),
                expected: spec.kind(),
                found: value.kind(),
            });
        }

        let column = column.to_string();
        let predicate = match value {
            ControlValue::Selection(values) => Predicate::OneOf {
                column,
                selected: values.iter().cloned().collect(),
            },
            ControlValue::Range(min, max) => Predicate::Between {
                column,
                min: *min,
                max: *max,
            },
            ControlValue::Dates(dates) => match dates.as_slice() {
                [start, end] => match (start.and_hms_opt(0, 0, 0), end.and_hms_opt(0, 0, 0)) {
                    (Some(start), Some(end)) => Predicate::DateBetween { column, start, end },
                    _ => Predicate::Always,
                },
                _ => Predicate::Always,
            },
            ControlValue::Pattern(p) if p.is_empty() => Predicate::Always,
            ControlValue::Pattern(p) => {
                let compiled = Regex::new(p).or_else(|e| {
                    log::debug!("'{p}' is not a valid regex ({e}); matching literally");
                    Regex::new(&regex::escape(p))
                });
                match compiled {
                    Ok(pattern) => Predicate::Matches { column, pattern },
                    Err(e) => {
                        log::warn!("Ignoring text filter on '{column}': {e}");
                        Predicate::Always
                    }
                }
            }
        };
        Ok(predicate)
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Predicate::Always)
    }

    /// Test one row. `index` is only used to report a mismatch.
    pub fn test(&self, index: usize, row: &Row) -> Result<bool, FilterError> {
        let passes = match self {
            Predicate::Always => true,
            Predicate::OneOf { column, selected } => selected.contains(row.get(column)),
            Predicate::Between { column, min, max } => row
                .get(column)
                .as_f64()
                .is_some_and(|v| *min <= v && v <= *max),
            Predicate::DateBetween { column, start, end } => row
                .get(column)
                .as_datetime()
                .is_some_and(|v| *start <= v && v <= *end),
            Predicate::Matches { column, pattern } => match row.get(column) {
                CellValue::Text(s) => pattern.is_match(s),
                other => {
                    return Err(FilterError::TypeMismatch {
                        column: column.clone(),
                        row: index,
                        found: other.type_name(),
                    })
                }
            },
        };
        Ok(passes)
    }
}
