use std::fmt;

use chrono::NaiveDate;

use super::classify::{ColumnDescriptor, ColumnStats};
use crate::data::model::CellValue;

// ---------------------------------------------------------------------------
// Control specifications
// ---------------------------------------------------------------------------

/// Parameters of the control presented for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlSpec {
    /// Pick any subset of `options`; everything starts selected.
    MultiSelect { options: Vec<CellValue> },
    /// Two-handle slider over `[min, max]` in 100 steps.
    RangeSlider { min: f64, max: f64, step: f64 },
    /// Start/end date pickers; `None` bounds when the column has no dates.
    DateRange {
        min: Option<NaiveDate>,
        max: Option<NaiveDate>,
    },
    /// Substring or regular expression; empty means inactive.
    TextPattern,
}

/// Kind tag shared by [`ControlSpec`] and [`ControlValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    MultiSelect,
    RangeSlider,
    DateRange,
    TextPattern,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ControlKind::MultiSelect => "multi-select",
            ControlKind::RangeSlider => "range slider",
            ControlKind::DateRange => "date range",
            ControlKind::TextPattern => "text pattern",
        };
        f.write_str(s)
    }
}

impl ControlSpec {
    pub fn from_descriptor(desc: &ColumnDescriptor) -> Self {
        match &desc.stats {
            ColumnStats::Distinct(values) => ControlSpec::MultiSelect {
                options: values.clone(),
            },
            ColumnStats::Range { min, max } => {
                let (min, max) = match (min, max) {
                    (Some(min), Some(max)) => (*min, *max),
                    _ => (0.0, 0.0),
                };
                ControlSpec::RangeSlider {
                    min,
                    max,
                    step: (max - min) / 100.0,
                }
            }
            ColumnStats::DateRange { min, max } => ControlSpec::DateRange {
                min: min.map(|d| d.date()),
                max: max.map(|d| d.date()),
            },
            ColumnStats::None => ControlSpec::TextPattern,
        }
    }

    pub fn kind(&self) -> ControlKind {
        match self {
            ControlSpec::MultiSelect { .. } => ControlKind::MultiSelect,
            ControlSpec::RangeSlider { .. } => ControlKind::RangeSlider,
            ControlSpec::DateRange { .. } => ControlKind::DateRange,
            ControlSpec::TextPattern => ControlKind::TextPattern,
        }
    }

    /// The value a freshly presented control starts with: no narrowing.
    pub fn default_value(&self) -> ControlValue {
        match self {
            ControlSpec::MultiSelect { options } => ControlValue::Selection(options.clone()),
            ControlSpec::RangeSlider { min, max, .. } => ControlValue::Range(*min, *max),
            ControlSpec::DateRange { min, max } => {
                ControlValue::Dates(min.iter().chain(max.iter()).copied().collect())
            }
            ControlSpec::TextPattern => ControlValue::Pattern(String::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Control values
// ---------------------------------------------------------------------------

/// What the user currently has in a control.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    Selection(Vec<CellValue>),
    Range(f64, f64),
    /// Zero, one or two picked endpoints; only two activate the filter.
    Dates(Vec<NaiveDate>),
    Pattern(String),
}

impl ControlValue {
    pub fn kind(&self) -> ControlKind {
        match self {
            ControlValue::Selection(_) => ControlKind::MultiSelect,
            ControlValue::Range(..) => ControlKind::RangeSlider,
            ControlValue::Dates(_) => ControlKind::DateRange,
            ControlValue::Pattern(_) => ControlKind::TextPattern,
        }
    }
}

// ---------------------------------------------------------------------------
// Presenting controls
// ---------------------------------------------------------------------------

/// Identifies one control: the owning session's scope plus the column.
/// Keeps controls distinct across the two panes of dual-file mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlKey {
    pub scope: String,
    pub column: String,
}

impl ControlKey {
    pub fn new(scope: &str, column: &str) -> Self {
        Self {
            scope: scope.to_string(),
            column: column.to_string(),
        }
    }
}

impl fmt::Display for ControlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.scope, self.column)
    }
}

/// Something that shows a control and hands back the user's value.
///
/// `current` is the column's live value from the previous round, if any;
/// a presenter with nothing new to report should return it unchanged.
pub trait ControlPresenter {
    fn present(
        &mut self,
        key: &ControlKey,
        spec: &ControlSpec,
        current: Option<&ControlValue>,
    ) -> ControlValue;
}

/// Non-interactive presenter: keeps the live value, or the control's default.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPresenter;

impl ControlPresenter for DefaultPresenter {
    fn present(
        &mut self,
        _key: &ControlKey,
        spec: &ControlSpec,
        current: Option<&ControlValue>,
    ) -> ControlValue {
        current.cloned().unwrap_or_else(|| spec.default_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::classify::Classification;

    fn descriptor(stats: ColumnStats, classification: Classification) -> ColumnDescriptor {
        ColumnDescriptor {
            name: "c".into(),
            classification,
            stats,
        }
    }

    #[test]
    fn slider_spans_observed_range_in_100_steps() {
        let spec = ControlSpec::from_descriptor(&descriptor(
            ColumnStats::Range {
                min: Some(0.0),
                max: Some(100.0),
            },
            Classification::Numeric,
        ));
        assert_eq!(
            spec,
            ControlSpec::RangeSlider {
                min: 0.0,
                max: 100.0,
                step: 1.0
            }
        );
        assert_eq!(spec.default_value(), ControlValue::Range(0.0, 100.0));
    }

    #[test]
    fn all_missing_numeric_column_degenerates_to_zero_width() {
        let spec = ControlSpec::from_descriptor(&descriptor(
            ColumnStats::Range {
                min: None,
                max: None,
            },
            Classification::Numeric,
        ));
        assert_eq!(
            spec,
            ControlSpec::RangeSlider {
                min: 0.0,
                max: 0.0,
                step: 0.0
            }
        );
    }

    #[test]
    fn multiselect_defaults_to_everything() {
        let options = vec![CellValue::Integer(5), CellValue::Null];
        let spec = ControlSpec::from_descriptor(&descriptor(
            ColumnStats::Distinct(options.clone()),
            Classification::Categorical,
        ));
        assert_eq!(spec.default_value(), ControlValue::Selection(options));
    }

    #[test]
    fn date_range_defaults_to_column_bounds() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let spec = ControlSpec::from_descriptor(&descriptor(
            ColumnStats::DateRange {
                min: d1.and_hms_opt(8, 0, 0),
                max: d2.and_hms_opt(17, 30, 0),
            },
            Classification::Temporal,
        ));
        assert_eq!(
            spec,
            ControlSpec::DateRange {
                min: Some(d1),
                max: Some(d2)
            }
        );
        assert_eq!(spec.default_value(), ControlValue::Dates(vec![d1, d2]));

        let empty = ControlSpec::DateRange {
            min: None,
            max: None,
        };
        assert_eq!(empty.default_value(), ControlValue::Dates(Vec::new()));
    }

    #[test]
    fn text_pattern_starts_empty() {
        let spec =
            ControlSpec::from_descriptor(&descriptor(ColumnStats::None, Classification::Text));
        assert_eq!(spec.kind(), ControlKind::TextPattern);
        assert_eq!(spec.default_value(), ControlValue::Pattern(String::new()));
    }

    #[test]
    fn default_presenter_keeps_live_value() {
        let spec = ControlSpec::TextPattern;
        let key = ControlKey::new("cb1", "Name");
        let live = ControlValue::Pattern("^A".into());

        let mut presenter = DefaultPresenter;
        assert_eq!(presenter.present(&key, &spec, Some(&live)), live);
        assert_eq!(
            presenter.present(&key, &spec, None),
            ControlValue::Pattern(String::new())
        );
        assert_eq!(key.to_string(), "cb1_Name");
    }
}
