use thiserror::Error;

use super::control::ControlKind;

/// Failures that abort a filtering invocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// A text pattern was matched against a cell that holds no text.
    #[error("column '{column}', row {row}: cannot match a text pattern against a {found} value")]
    TypeMismatch {
        column: String,
        row: usize,
        found: &'static str,
    },

    /// The presenter answered a control with a value of another kind.
    #[error("column '{column}': expected a {expected} value, got a {found} value")]
    ControlMismatch {
        column: String,
        expected: ControlKind,
        found: ControlKind,
    },
}
