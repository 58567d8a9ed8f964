use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Date32Array, Float32Array, Float64Array, Int32Array,
    Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use calamine::{open_workbook_auto, Data, DataType as _, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Kind of input file, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Spreadsheet,
    Json,
    Parquet,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(SourceKind::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceKind::Spreadsheet),
            "json" => Ok(SourceKind::Json),
            "parquet" | "pq" => Ok(SourceKind::Parquet),
            other => bail!("Unsupported file extension: .{other}"),
        }
    }

    /// Whether a sheet must be chosen before loading.
    pub fn has_sheets(self) -> bool {
        self == SourceKind::Spreadsheet
    }
}

/// Extensions offered in the open-file dialog.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "csv", "xlsx", "xlsm", "xlsb", "xls", "ods", "json", "parquet", "pq",
];

/// Load a dataset from a file. Dispatch by extension.
///
/// `sheet` selects a worksheet for spreadsheet input (first sheet when
/// `None`) and is ignored for the other formats.
pub fn load_file(path: &Path, sheet: Option<&str>) -> Result<Dataset> {
    match SourceKind::from_path(path)? {
        SourceKind::Csv => load_csv(path),
        SourceKind::Spreadsheet => load_spreadsheet(path, sheet),
        SourceKind::Json => load_json(path),
        SourceKind::Parquet => load_parquet(path),
    }
}

/// List the worksheet names of a spreadsheet file, in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    let workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;
    Ok(workbook.sheet_names().to_vec())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Each column gets a single type inferred from all of its fields.
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut raw: Vec<Vec<String>> = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        raw.push(record.iter().map(str::to_string).collect());
    }

    let kinds: Vec<CsvKind> = (0..headers.len())
        .map(|i| infer_csv_kind(raw.iter().filter_map(|r| r.get(i).map(String::as_str))))
        .collect();

    let records = raw
        .into_iter()
        .map(|fields| {
            fields
                .iter()
                .zip(&kinds)
                .map(|(field, kind)| kind.parse(field))
                .collect()
        })
        .collect();

    Ok(Dataset::from_records(headers, records))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CsvKind {
    Integer,
    Float,
    Bool,
    Text,
}

impl CsvKind {
    fn parse(self, field: &str) -> CellValue {
        if field.is_empty() {
            return CellValue::Null;
        }
        let parsed = match self {
            CsvKind::Integer => field.trim().parse().ok().map(CellValue::Integer),
            CsvKind::Float => field.trim().parse().ok().map(CellValue::Float),
            CsvKind::Bool => parse_bool(field).map(CellValue::Bool),
            CsvKind::Text => None,
        };
        parsed.unwrap_or_else(|| CellValue::Text(field.to_string()))
    }
}

fn infer_csv_kind<'a>(fields: impl Iterator<Item = &'a str>) -> CsvKind {
    let mut ints = true;
    let mut floats = true;
    let mut bools = true;
    for field in fields.filter(|f| !f.is_empty()) {
        let trimmed = field.trim();
        ints &= trimmed.parse::<i64>().is_ok();
        floats &= trimmed.parse::<f64>().is_ok();
        bools &= parse_bool(field).is_some();
        if !ints && !floats && !bools {
            return CsvKind::Text;
        }
    }
    if ints {
        CsvKind::Integer
    } else if floats {
        CsvKind::Float
    } else if bools {
        CsvKind::Bool
    } else {
        CsvKind::Text
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Load one worksheet. The first row is the header.
fn load_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;

    let range = match sheet {
        Some(name) => workbook
            .worksheet_range(name)
            .with_context(|| format!("reading sheet '{name}'"))?,
        None => workbook
            .worksheet_range_at(0)
            .context("workbook has no worksheets")?
            .context("reading first sheet")?,
    };

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Dataset::default());
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|c| match c {
            Data::Empty => String::new(),
            other => other.as_string().unwrap_or_else(|| other.to_string()),
        })
        .collect();

    let records = rows
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();

    Ok(Dataset::from_records(headers, records))
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            CellValue::Integer(*f as i64)
        }
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(cell.to_string())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "region": "North", "amount": 120.5 },
///   ...
/// ]
/// ```
///
/// Columns are the union of keys, in order of first appearance.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(Dataset::from_records(headers, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file as written by **Pandas** (`df.to_parquet()`) or
/// **Polars** (`df.write_parquet()`). Scalar columns map onto cell values;
/// anything else is rendered to text.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let record = batch
                .columns()
                .iter()
                .map(|col| extract_cell(col, row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {row}"))?;
            records.push(record);
        }
    }

    Ok(Dataset::from_records(headers, records))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => match any.downcast_ref::<StringArray>() {
            Some(s) => CellValue::Text(s.value(row).to_string()),
            None => bail!("expected StringArray"),
        },
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => match any.downcast_ref::<Int32Array>() {
            Some(arr) => CellValue::Integer(arr.value(row) as i64),
            None => bail!("expected Int32Array"),
        },
        DataType::Int64 => match any.downcast_ref::<Int64Array>() {
            Some(arr) => CellValue::Integer(arr.value(row)),
            None => bail!("expected Int64Array"),
        },
        DataType::Float32 => match any.downcast_ref::<Float32Array>() {
            Some(arr) => CellValue::Float(arr.value(row) as f64),
            None => bail!("expected Float32Array"),
        },
        DataType::Float64 => match any.downcast_ref::<Float64Array>() {
            Some(arr) => CellValue::Float(arr.value(row)),
            None => bail!("expected Float64Array"),
        },
        DataType::Boolean => match any.downcast_ref::<BooleanArray>() {
            Some(arr) => CellValue::Bool(arr.value(row)),
            None => bail!("expected BooleanArray"),
        },
        DataType::Date32 => match any
            .downcast_ref::<Date32Array>()
            .and_then(|arr| arr.value_as_date(row))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            Some(dt) => CellValue::DateTime(dt),
            None => CellValue::Null,
        },
        // Timestamps and the rest go through their display form; timestamps
        // then parse back in the date normalizer.
        _ => CellValue::Text(
            array_value_to_string(col, row).context("formatting parquet value")?,
        ),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::DType;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_columns_get_one_type_each() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "people.csv",
            "Name,Age,Score,Member,Joined\n\
             Alice,5,1.5,true,2023-01-01\n\
             Bob,12,,False,2023-02-01\n\
             Anna,8,3,TRUE,not a date\n",
        );

        let ds = load_file(&path, None).unwrap();

        assert_eq!(ds.len(), 3);
        let names: Vec<&str> = ds.column_names().collect();
        assert_eq!(names, vec!["Name", "Age", "Score", "Member", "Joined"]);
        assert_eq!(ds.dtype("Name"), Some(DType::Object));
        assert_eq!(ds.dtype("Age"), Some(DType::Int));
        assert_eq!(ds.dtype("Score"), Some(DType::Float));
        assert_eq!(ds.dtype("Member"), Some(DType::Bool));
        assert_eq!(ds.dtype("Joined"), Some(DType::Object));
        assert_eq!(ds.rows[1].get("Score"), &CellValue::Null);
        assert_eq!(ds.rows[2].get("Score"), &CellValue::Float(3.0));
        assert_eq!(ds.rows[1].get("Member"), &CellValue::Bool(false));
    }

    #[test]
    fn csv_mixed_column_stays_text() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "codes.csv", "code\n10\nA7\n");
        let ds = load_file(&path, None).unwrap();
        assert_eq!(ds.rows[0].get("code"), &CellValue::Text("10".into()));
    }

    #[test]
    fn csv_nan_cells_are_missing_and_survive_default_filters() {
        use crate::filter::classify::{classify, Classification};
        use crate::filter::control::DefaultPresenter;
        use crate::filter::session::FilterSession;

        let dir = TempDir::new().unwrap();
        let mut contents = String::from("x\n1\n2\n3\n");
        for _ in 0..5 {
            contents.push_str("NaN\nnan\n");
        }
        let path = write_file(&dir, "x.csv", &contents);
        let ds = load_file(&path, None).unwrap();

        assert_eq!(ds.dtype("x"), Some(DType::Float));
        assert_eq!(ds.rows[3].get("x"), &CellValue::Null);
        assert_eq!(ds.distinct_count("x"), 3);
        assert_eq!(classify(&ds, "x"), Classification::Categorical);

        let mut session = FilterSession::new("cb1");
        session.enabled = true;
        session.choose("x");
        let out = session.apply(&ds, &mut DefaultPresenter).unwrap();
        assert_eq!(out.len(), ds.len());
    }

    #[test]
    fn json_records_union_keys() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "rows.json",
            r#"[{"region": "North", "amount": 10}, {"region": "South", "note": null}]"#,
        );

        let ds = load_file(&path, None).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.columns.len(), 3);
        assert_eq!(ds.rows[1].get("amount"), &CellValue::Null);
        assert_eq!(ds.rows[0].get("amount"), &CellValue::Integer(10));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("table.txt"), None).unwrap_err();
        assert!(err.to_string().contains(".txt"));
    }

    #[test]
    fn source_kind_by_extension() {
        assert_eq!(SourceKind::from_path(Path::new("a.CSV")).unwrap(), SourceKind::Csv);
        assert!(SourceKind::from_path(Path::new("a.xlsx")).unwrap().has_sheets());
        assert_eq!(
            SourceKind::from_path(Path::new("a.pq")).unwrap(),
            SourceKind::Parquet
        );
    }
}
