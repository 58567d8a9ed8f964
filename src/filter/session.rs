use std::collections::BTreeMap;

use super::classify::ColumnDescriptor;
use super::compose::FilterComposer;
use super::control::{ControlKey, ControlPresenter, ControlSpec, ControlValue};
use super::error::FilterError;
use super::predicate::Predicate;
use crate::data::model::{ColumnMeta, Dataset};
use crate::data::normalize::normalize_dates;

/// Where a session is in its last invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Filtering is switched off or has not run.
    Idle,
    /// Walking the chosen columns.
    Building,
    /// The last invocation produced a filtered dataset.
    Composed,
    /// The last invocation was aborted; its result must not be used.
    Failed,
}

/// Date-normalized copy of a source dataset, kept between invocations so
/// dates are parsed once per file rather than once per frame.
#[derive(Debug, Clone)]
struct WorkingCopy {
    source_rows: usize,
    source_columns: Vec<ColumnMeta>,
    dataset: Dataset,
}

impl WorkingCopy {
    fn of(source: &Dataset) -> Self {
        let mut dataset = source.clone();
        normalize_dates(&mut dataset);
        Self {
            source_rows: source.len(),
            source_columns: source.columns.clone(),
            dataset,
        }
    }

    /// Same shape as `source`. Content changes must go through
    /// [`FilterSession::reset`].
    fn matches(&self, source: &Dataset) -> bool {
        self.source_rows == source.len() && self.source_columns == source.columns
    }
}

// ---------------------------------------------------------------------------
// FilterSession
// ---------------------------------------------------------------------------

/// Filter state for one dataset: which columns the user chose, in order, and
/// the live value of each column's control.
///
/// Controls are addressed by [`ControlKey`] (`scope` + column), so two
/// sessions side by side never share values.
#[derive(Debug, Clone)]
pub struct FilterSession {
    scope: String,
    /// "Add filters" toggle. When off, [`apply`](Self::apply) returns the
    /// dataset as-is.
    pub enabled: bool,
    columns: Vec<String>,
    values: BTreeMap<String, ControlValue>,
    phase: Phase,
    working: Option<WorkingCopy>,
}

impl FilterSession {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            enabled: false,
            columns: Vec::new(),
            values: BTreeMap::new(),
            phase: Phase::Idle,
            working: None,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Chosen columns in the order they were chosen.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Add a column to filter on. Choosing a column twice is a no-op.
    pub fn choose(&mut self, column: &str) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
    }

    /// Stop filtering on a column and forget its control value.
    pub fn unchoose(&mut self, column: &str) {
        self.columns.retain(|c| c != column);
        self.values.remove(column);
    }

    pub fn is_chosen(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn value(&self, column: &str) -> Option<&ControlValue> {
        self.values.get(column)
    }

    pub fn set_value(&mut self, column: &str, value: ControlValue) {
        self.values.insert(column.to_string(), value);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Forget every chosen column, value and cached working copy, e.g. after
    /// loading a new file.
    pub fn reset(&mut self) {
        self.columns.clear();
        self.values.clear();
        self.phase = Phase::Idle;
        self.working = None;
    }

    /// Run one filtering invocation over `dataset`.
    ///
    /// Works on a copy: dates are normalized first, then each chosen column is
    /// classified, presented and folded into the selection, in choice order.
    /// The normalized copy is reused until [`reset`](Self::reset) or until a
    /// dataset of a different shape comes in.
    /// Every column's control is derived from the normalized, unfiltered copy,
    /// so bounds do not shrink as earlier columns narrow the rows.
    ///
    /// The first error aborts the invocation and leaves the session `Failed`.
    pub fn apply<P>(&mut self, dataset: &Dataset, presenter: &mut P) -> Result<Dataset, FilterError>
    where
        P: ControlPresenter + ?Sized,
    {
        if !self.enabled {
            self.phase = Phase::Idle;
            return Ok(dataset.clone());
        }
        self.phase = Phase::Building;

        let copy = match self.working.take() {
            Some(copy) if copy.matches(dataset) => copy,
            _ => WorkingCopy::of(dataset),
        };
        let working = &self.working.insert(copy).dataset;

        let mut composer = FilterComposer::new(working);
        for column in &self.columns {
            if working.column(column).is_none() {
                log::warn!("[{}] skipping unknown column '{column}'", self.scope);
                continue;
            }

            let descriptor = ColumnDescriptor::describe(working, column);
            let spec = ControlSpec::from_descriptor(&descriptor);
            let key = ControlKey::new(&self.scope, column);
            let current = self
                .values
                .get(column)
                .filter(|v| v.kind() == spec.kind());
            let value = presenter.present(&key, &spec, current);

            let step = Predicate::build(column, &spec, &value)
                .and_then(|predicate| composer.narrow(&predicate).map(|()| predicate));
            self.values.insert(column.clone(), value);

            match step {
                Ok(predicate) => log::debug!(
                    "[{}] {column} ({}): {} rows left{}",
                    self.scope,
                    descriptor.classification,
                    composer.selected().len(),
                    if predicate.is_active() { "" } else { ", filter inactive" }
                ),
                Err(e) => {
                    log::error!("[{}] filtering aborted: {e}", self.scope);
                    self.phase = Phase::Failed;
                    return Err(e);
                }
            }
        }

        self.phase = Phase::Composed;
        Ok(composer.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, DType};
    use crate::filter::control::DefaultPresenter;
    use chrono::NaiveDate;

    /// Answers from a fixed table, records every control it was shown.
    #[derive(Default)]
    struct Scripted {
        answers: BTreeMap<String, ControlValue>,
        shown: Vec<(ControlKey, ControlSpec)>,
    }

    impl Scripted {
        fn answer(mut self, column: &str, value: ControlValue) -> Self {
            self.answers.insert(column.to_string(), value);
            self
        }
    }

    impl ControlPresenter for Scripted {
        fn present(
            &mut self,
            key: &ControlKey,
            spec: &ControlSpec,
            current: Option<&ControlValue>,
        ) -> ControlValue {
            self.shown.push((key.clone(), spec.clone()));
            self.answers
                .get(&key.column)
                .or(current)
                .cloned()
                .unwrap_or_else(|| spec.default_value())
        }
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn column(name: &str, values: Vec<CellValue>) -> Dataset {
        Dataset::from_records(
            vec![name.to_string()],
            values.into_iter().map(|v| vec![v]).collect(),
        )
    }

    fn session(columns: &[&str]) -> FilterSession {
        let mut s = FilterSession::new("cb1");
        s.enabled = true;
        for c in columns {
            s.choose(c);
        }
        s
    }

    #[test]
    fn disabled_session_returns_input_untouched() {
        let ds = column("d", vec![text("2024-01-01")]);
        let mut s = FilterSession::new("cb1");
        s.choose("d");

        let out = s.apply(&ds, &mut DefaultPresenter).unwrap();

        assert_eq!(out, ds);
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn enabled_session_normalizes_dates_on_a_working_copy() {
        let ds = column("d", vec![text("2024-01-01")]);
        let mut s = session(&[]);

        let out = s.apply(&ds, &mut DefaultPresenter).unwrap();

        assert_eq!(out.dtype("d"), Some(DType::DateTime));
        assert_eq!(ds.dtype("d"), Some(DType::Object));
        assert_eq!(s.phase(), Phase::Composed);
    }

    #[test]
    fn categorical_selection_picks_matching_rows() {
        let ds = column("Age", [5, 12, 8, 40, 5].map(CellValue::Integer).to_vec());
        let mut s = session(&["Age"]);
        let mut presenter = Scripted::default().answer(
            "Age",
            ControlValue::Selection(vec![CellValue::Integer(5), CellValue::Integer(40)]),
        );

        let out = s.apply(&ds, &mut presenter).unwrap();

        assert_eq!(out.rows, vec![ds.rows[0].clone(), ds.rows[3].clone(), ds.rows[4].clone()]);
        assert!(matches!(presenter.shown[0].1, ControlSpec::MultiSelect { .. }));
    }

    #[test]
    fn default_selection_is_identity_and_empty_selection_is_nothing() {
        let ds = column("Grade", ["b", "a", "c", "a"].map(text).to_vec());

        let mut s = session(&["Grade"]);
        assert_eq!(s.apply(&ds, &mut DefaultPresenter).unwrap(), ds);

        let mut presenter =
            Scripted::default().answer("Grade", ControlValue::Selection(Vec::new()));
        assert!(s.apply(&ds, &mut presenter).unwrap().is_empty());
    }

    #[test]
    fn fifty_scores_get_a_hundred_step_slider() {
        let scores = (0..50).map(|i| CellValue::Float(i as f64 * 100.0 / 49.0)).collect();
        let ds = column("Score", scores);
        let mut s = session(&["Score"]);
        let mut presenter = Scripted::default();

        s.apply(&ds, &mut presenter).unwrap();

        assert_eq!(
            presenter.shown[0].1,
            ControlSpec::RangeSlider {
                min: 0.0,
                max: 100.0,
                step: 1.0
            }
        );
        assert_eq!(s.value("Score"), Some(&ControlValue::Range(0.0, 100.0)));
    }

    #[test]
    fn text_pattern_example() {
        // enough other names to get past the categorical threshold
        let names = ["Alice", "Bob", "Anna"]
            .map(text)
            .into_iter()
            .chain((0..10).map(|i| text(&format!("Zed{i}"))))
            .collect();
        let ds = column("Name", names);
        let mut s = session(&["Name"]);
        let mut presenter = Scripted::default().answer("Name", ControlValue::Pattern("^A".into()));

        let out = s.apply(&ds, &mut presenter).unwrap();

        assert_eq!(presenter.shown[0].1, ControlSpec::TextPattern);
        assert_eq!(out.rows, vec![ds.rows[0].clone(), ds.rows[2].clone()]);
    }

    #[test]
    fn single_date_endpoint_leaves_column_unfiltered() {
        let dates = (1..=12).map(|d| text(&format!("2024-03-{d:02}"))).collect();
        let ds = column("When", dates);
        let mut s = session(&["When"]);
        let picked = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let mut presenter = Scripted::default().answer("When", ControlValue::Dates(vec![picked]));

        let out = s.apply(&ds, &mut presenter).unwrap();

        assert_eq!(out.len(), 12);
        assert!(matches!(presenter.shown[0].1, ControlSpec::DateRange { .. }));
    }

    #[test]
    fn two_date_endpoints_narrow_inclusively() {
        let dates = (1..=12).map(|d| text(&format!("2024-03-{d:02}"))).collect();
        let ds = column("When", dates);
        let mut s = session(&["When"]);
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let mut presenter =
            Scripted::default().answer("When", ControlValue::Dates(vec![day(3), day(6)]));

        let out = s.apply(&ds, &mut presenter).unwrap();

        assert_eq!(out.len(), 4);
    }

    #[test]
    fn bounds_come_from_the_unfiltered_dataset() {
        let records = (0..20)
            .map(|i| vec![CellValue::Integer(i), CellValue::Float(i as f64 * 10.0)])
            .collect();
        let ds = Dataset::from_records(vec!["a".into(), "b".into()], records);
        let mut s = session(&["a", "b"]);
        let mut presenter = Scripted::default().answer("a", ControlValue::Range(0.0, 4.0));

        let out = s.apply(&ds, &mut presenter).unwrap();

        assert_eq!(out.len(), 5);
        // b's slider still spans the full column, not just the 5 rows left
        assert_eq!(
            presenter.shown[1].1,
            ControlSpec::RangeSlider {
                min: 0.0,
                max: 190.0,
                step: 1.9
            }
        );
    }

    #[test]
    fn mismatch_aborts_the_invocation() {
        let mut values: Vec<CellValue> = (0..12).map(|i| text(&format!("n{i}"))).collect();
        values.push(CellValue::Null);
        let ds = Dataset::from_records(
            vec!["Note".into()],
            values.into_iter().map(|v| vec![v]).collect(),
        );
        let mut s = session(&["Note"]);
        let mut presenter = Scripted::default().answer("Note", ControlValue::Pattern("n1".into()));

        let err = s.apply(&ds, &mut presenter).unwrap_err();

        assert!(matches!(err, FilterError::TypeMismatch { row: 12, .. }));
        assert_eq!(s.phase(), Phase::Failed);
    }

    #[test]
    fn keys_carry_the_session_scope() {
        let ds = column("Age", [1, 2].map(CellValue::Integer).to_vec());
        let mut left = FilterSession::new("cb1");
        let mut right = FilterSession::new("cb2");
        for s in [&mut left, &mut right] {
            s.enabled = true;
            s.choose("Age");
        }
        let mut presenter = Scripted::default();

        left.apply(&ds, &mut presenter).unwrap();
        right.apply(&ds, &mut presenter).unwrap();

        let keys: Vec<String> = presenter.shown.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["cb1_Age", "cb2_Age"]);
    }

    #[test]
    fn stale_value_of_another_kind_is_not_offered() {
        let ds = column("Age", [1, 2].map(CellValue::Integer).to_vec());
        let mut s = session(&["Age"]);
        s.set_value("Age", ControlValue::Pattern("x".into()));

        let out = s.apply(&ds, &mut DefaultPresenter).unwrap();

        assert_eq!(out, ds);
        assert!(matches!(s.value("Age"), Some(ControlValue::Selection(_))));
    }

    #[test]
    fn choosing_is_ordered_and_deduplicated() {
        let mut s = FilterSession::new("k");
        s.choose("b");
        s.choose("a");
        s.choose("b");
        assert_eq!(s.columns(), &["b".to_string(), "a".to_string()]);

        s.set_value("b", ControlValue::Pattern("x".into()));
        s.unchoose("b");
        assert!(!s.is_chosen("b"));
        assert_eq!(s.value("b"), None);
    }

    #[test]
    fn working_copy_is_reused_until_reset() {
        let ds = column("d", vec![text("2024-01-01")]);
        let mut s = session(&[]);

        let first = s.apply(&ds, &mut DefaultPresenter).unwrap();
        let second = s.apply(&ds, &mut DefaultPresenter).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.dtype("d"), Some(DType::DateTime));

        // Same shape, new content: only a reset picks it up.
        let reloaded = column("d", vec![text("2025-06-30")]);
        s.reset();
        s.enabled = true;
        let out = s.apply(&reloaded, &mut DefaultPresenter).unwrap();
        assert_eq!(out.rows[0].get("d").to_string(), "2025-06-30 00:00:00");
    }

    #[test]
    fn dataset_of_another_shape_replaces_the_working_copy() {
        let mut s = session(&["Grade"]);
        let ds = column("d", vec![text("2024-01-01")]);
        s.apply(&ds, &mut DefaultPresenter).unwrap();

        let other = column("Grade", ["b", "a"].map(text).to_vec());
        let out = s.apply(&other, &mut DefaultPresenter).unwrap();

        assert_eq!(out, other);
    }
}

