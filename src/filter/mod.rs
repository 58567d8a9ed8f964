/// Filter layer: turns per-column user choices into a row selection.
///
/// Architecture:
/// ```text
///   Dataset ──► normalize (dates) ──► working copy
///                                        │
///        for each chosen column, in order ▼
///   ┌──────────┐   ┌─────────┐   ┌────────────┐   ┌───────────┐
///   │ classify │──►│ control │──►│ presenter  │──►│ predicate │
///   └──────────┘   └─────────┘   └────────────┘   └───────────┘
///                                                       │
///                                                       ▼
///                                                 ┌──────────┐
///                                                 │ compose  │  narrow rows
///                                                 └──────────┘
/// ```
///
/// [`session::FilterSession`] drives one pass of this per invocation.

pub mod classify;
pub mod compose;
pub mod control;
pub mod error;
pub mod predicate;
pub mod session;
