use super::error::FilterError;
use super::predicate::Predicate;
use crate::data::model::Dataset;

/// Boolean row-selection vector, one entry per row of the dataset it was
/// computed against.
pub type Mask = Vec<bool>;

// ---------------------------------------------------------------------------
// Sequential narrowing
// ---------------------------------------------------------------------------

/// Folds predicates into a selection over one dataset.
///
/// Each [`narrow`](FilterComposer::narrow) only tests the rows that survived
/// the previous ones, so a later predicate never sees (or fails on) a row an
/// earlier one removed. Row order is never changed.
#[derive(Debug)]
pub struct FilterComposer<'a> {
    dataset: &'a Dataset,
    /// Indices into `dataset.rows` still selected, ascending.
    selected: Vec<usize>,
}

impl<'a> FilterComposer<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            selected: (0..dataset.len()).collect(),
        }
    }

    /// AND `predicate` into the selection.
    pub fn narrow(&mut self, predicate: &Predicate) -> Result<(), FilterError> {
        if !predicate.is_active() {
            return Ok(());
        }
        let mut kept = Vec::with_capacity(self.selected.len());
        for &i in &self.selected {
            if predicate.test(i, &self.dataset.rows[i])? {
                kept.push(i);
            }
        }
        self.selected = kept;
        Ok(())
    }

    /// Indices of the rows selected so far.
    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    /// The selection as a mask over the full dataset.
    pub fn mask(&self) -> Mask {
        let mut mask = vec![false; self.dataset.len()];
        for &i in &self.selected {
            mask[i] = true;
        }
        mask
    }

    /// Copy the selected rows into a new dataset with the same columns.
    pub fn finish(self) -> Dataset {
        apply_mask(self.dataset, &self.mask())
    }
}

/// Keep the rows whose mask entry is `true`, in order.
pub fn apply_mask(dataset: &Dataset, mask: &[bool]) -> Dataset {
    Dataset {
        columns: dataset.columns.clone(),
        rows: dataset
            .rows
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect(),
    }
}

/// Apply `predicates` in order and return the surviving rows.
pub fn compose(dataset: &Dataset, predicates: &[Predicate]) -> Result<Dataset, FilterError> {
    let mut composer = FilterComposer::new(dataset);
    for predicate in predicates {
        composer.narrow(predicate)?;
    }
    Ok(composer.finish())
}
