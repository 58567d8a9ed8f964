use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a tabular dataset
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Used as a key in sets downstream, so `CellValue` must be `Ord` and `Hash`.
#[derive(Debug, Clone)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Timezone-naive timestamp.
    DateTime(NaiveDateTime),
    Null,
}

// -- Manual Eq/Ord/Hash so we can put CellValue in ordered and hashed sets --
// Equality, ordering and hashing all agree: floats compare by `total_cmp`
// and every NaN is one value.

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
                DateTime(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => canonical_float(*a).total_cmp(&canonical_float(*b)),
            (Text(a), Text(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => canonical_float(*f).to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::DateTime(d) => d.hash(state),
            CellValue::Null => {}
        }
    }
}

fn canonical_float(v: f64) -> f64 {
    if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::DateTime(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64` for range comparisons.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Text(_) => "text",
            CellValue::Integer(_) => "integer",
            CellValue::Float(_) => "float",
            CellValue::Bool(_) => "bool",
            CellValue::DateTime(_) => "datetime",
            CellValue::Null => "missing",
        }
    }
}

// ---------------------------------------------------------------------------
// Column metadata
// ---------------------------------------------------------------------------

/// Storage type of a column, analogous to a Pandas dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Int,
    Float,
    Bool,
    DateTime,
    /// Mixed or textual values.
    Object,
    /// Explicitly tagged as categorical, regardless of the values.
    Categorical,
}

impl DType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DType::Int | DType::Float | DType::Bool)
    }

    /// Infer the storage type from a column's cells. Missing cells are ignored;
    /// a column with no present values is a float column (all NaN).
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a CellValue>) -> DType {
        let mut seen: Option<DType> = None;
        for cell in cells {
            let kind = match cell {
                CellValue::Null => continue,
                CellValue::Integer(_) => DType::Int,
                CellValue::Float(_) => DType::Float,
                CellValue::Bool(_) => DType::Bool,
                CellValue::DateTime(_) => DType::DateTime,
                CellValue::Text(_) => return DType::Object,
            };
            seen = Some(match (seen, kind) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some(DType::Int), DType::Float) | (Some(DType::Float), DType::Int) => DType::Float,
                _ => return DType::Object,
            });
        }
        seen.unwrap_or(DType::Float)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub name: String,
    pub dtype: DType,
}

// ---------------------------------------------------------------------------
// Row – one record of the table
// ---------------------------------------------------------------------------

/// A single row: column name → value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub cells: BTreeMap<String, CellValue>,
}

impl Row {
    /// Value of `column`, `Null` when the row has no such cell.
    pub fn get(&self, column: &str) -> &CellValue {
        static NULL: CellValue = CellValue::Null;
        self.cells.get(column).unwrap_or(&NULL)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// An ordered table with a fixed, shared set of columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    /// Columns in file order.
    pub columns: Vec<ColumnMeta>,
    /// Rows in file order.
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset from a header and positional records, inferring a
    /// dtype for every column.
    ///
    /// Empty headers become `Unnamed: {i}` and repeated headers get a `.N`
    /// suffix, so names are unique. Short records are padded with `Null`, and
    /// NaN floats are stored as `Null` since both mean "missing".
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<CellValue>>) -> Self {
        let names = unique_column_names(headers);

        let mut rows: Vec<Row> = records
            .into_iter()
            .map(|record| {
                let mut cells = BTreeMap::new();
                let mut values = record.into_iter();
                for name in &names {
                    let value = match values.next() {
                        Some(CellValue::Float(f)) if f.is_nan() => CellValue::Null,
                        Some(value) => value,
                        None => CellValue::Null,
                    };
                    cells.insert(name.clone(), value);
                }
                Row { cells }
            })
            .collect();

        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let dtype = DType::infer(rows.iter().map(|r| r.get(&name)));
            if dtype == DType::Float {
                widen_integers(&mut rows, &name);
            }
            columns.push(ColumnMeta { name, dtype });
        }

        Dataset { columns, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn dtype(&self, name: &str) -> Option<DType> {
        self.column(name).map(|c| c.dtype)
    }

    pub fn set_dtype(&mut self, name: &str, dtype: DType) {
        if let Some(col) = self.columns.iter_mut().find(|c| c.name == name) {
            col.dtype = dtype;
        }
    }

    /// Tag a column as categorical so it always gets a multi-select.
    pub fn mark_categorical(&mut self, name: &str) {
        self.set_dtype(name, DType::Categorical);
    }

    /// Iterate over one column's values in row order.
    pub fn values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a CellValue> + 'a {
        self.rows.iter().map(move |r| r.get(column))
    }

    /// Distinct values of a column in order of first appearance, `Null` included.
    pub fn distinct_values(&self, column: &str) -> Vec<CellValue> {
        let mut seen = HashSet::new();
        self.values(column)
            .filter(|v| seen.insert((*v).clone()))
            .cloned()
            .collect()
    }

    /// Number of distinct non-missing values in a column.
    pub fn distinct_count(&self, column: &str) -> usize {
        self.values(column)
            .filter(|v| !v.is_null())
            .collect::<HashSet<_>>()
            .len()
    }
}

fn unique_column_names(headers: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(headers.len());
    for (i, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            header
        };
        let mut name = base.clone();
        let mut n = 1;
        while taken.contains(&name) {
            name = format!("{base}.{n}");
            n += 1;
        }
        taken.insert(name.clone());
        names.push(name);
    }
    names
}

fn widen_integers(rows: &mut [Row], column: &str) {
    for row in rows {
        if let Some(cell) = row.cells.get_mut(column) {
            if let CellValue::Integer(i) = *cell {
                *cell = CellValue::Float(i as f64);
            }
        }
    }
}
