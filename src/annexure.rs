use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime, Timelike};
use rust_xlsxwriter::{
    Color, ExcelDateTime, Format, FormatBorder, FormatPattern, Workbook, XlsxError,
};
use thiserror::Error;

use crate::data::model::{CellValue, Dataset};

/// Header fill colour.
const HEADER_GREY: u32 = 0x808080;
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Xlsx(#[from] XlsxError),

    #[error("creating {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0} does not fit in a worksheet")]
    TooLarge(String),
}

// ---------------------------------------------------------------------------
// Annexure writer
// ---------------------------------------------------------------------------

/// Path of the annexure called `name` inside `output_dir`.
///
/// The name is used verbatim and an existing file is overwritten.
pub fn annexure_path(output_dir: &Path, name: &str) -> PathBuf {
    output_dir.join(format!("{name}.xlsx"))
}

/// Write `dataset` as annexure `name` under `output_dir`, creating the
/// directory if needed. Returns the written path.
pub fn create_annexure(
    dataset: &Dataset,
    output_dir: &Path,
    name: &str,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(output_dir).map_err(|source| ExportError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let path = annexure_path(output_dir, name);
    write_annexure(dataset, &path)?;
    log::info!("Wrote annexure {} ({} rows)", path.display(), dataset.len());
    Ok(path)
}

/// Write a single-sheet workbook: bold grey header, thin borders on every
/// cell, columns sized to their content.
pub fn write_annexure(dataset: &Dataset, path: &Path) -> Result<(), ExportError> {
    let header_format = Format::new()
        .set_bold()
        .set_font_size(11)
        .set_font_color(Color::Black)
        .set_background_color(Color::RGB(HEADER_GREY))
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin);
    let cell_format = Format::new().set_border(FormatBorder::Thin);
    let datetime_format = Format::new()
        .set_border(FormatBorder::Thin)
        .set_num_format(DATETIME_FORMAT);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1")?;

    for (c, column) in dataset.columns.iter().enumerate() {
        let col = column_index(c)?;
        sheet.write_string_with_format(0, col, &column.name, &header_format)?;

        for (r, row) in dataset.rows.iter().enumerate() {
            let row_no = row_index(r + 1)?;
            match row.get(&column.name) {
                CellValue::Text(s) => {
                    sheet.write_string_with_format(row_no, col, s, &cell_format)?;
                }
                CellValue::Integer(i) => {
                    sheet.write_number_with_format(row_no, col, *i as f64, &cell_format)?;
                }
                CellValue::Float(f) if f.is_finite() => {
                    sheet.write_number_with_format(row_no, col, *f, &cell_format)?;
                }
                CellValue::Bool(b) => {
                    sheet.write_boolean_with_format(row_no, col, *b, &cell_format)?;
                }
                CellValue::DateTime(dt) => {
                    let excel = excel_datetime(dt)?;
                    sheet.write_datetime_with_format(row_no, col, &excel, &datetime_format)?;
                }
                CellValue::Float(_) | CellValue::Null => {
                    sheet.write_blank(row_no, col, &cell_format)?;
                }
            }
        }
    }

    for (c, width) in column_widths(dataset).into_iter().enumerate() {
        sheet.set_column_width(column_index(c)?, width)?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Width per column: `(longest text + 2) * 1.2`, over the header and every
/// cell's display text. Missing cells count as empty.
pub fn column_widths(dataset: &Dataset) -> Vec<f64> {
    dataset
        .columns
        .iter()
        .map(|column| {
            let longest = dataset
                .values(&column.name)
                .map(|v| v.to_string().chars().count())
                .chain(std::iter::once(column.name.chars().count()))
                .max()
                .unwrap_or(0);
            (longest as f64 + 2.0) * 1.2
        })
        .collect()
}

fn excel_datetime(dt: &NaiveDateTime) -> Result<ExcelDateTime, ExportError> {
    let year = u16::try_from(dt.year())
        .map_err(|_| ExportError::TooLarge(format!("year {}", dt.year())))?;
    let seconds = dt.second() as f64 + dt.nanosecond() as f64 / 1e9;
    let excel = ExcelDateTime::from_ymd(year, dt.month() as u8, dt.day() as u8)?
        .and_hms(dt.hour() as u16, dt.minute() as u8, seconds)?;
    Ok(excel)
}

fn column_index(c: usize) -> Result<u16, ExportError> {
    u16::try_from(c).map_err(|_| ExportError::TooLarge(format!("column {}", c + 1)))
}

fn row_index(r: usize) -> Result<u32, ExportError> {
    u32::try_from(r).map_err(|_| ExportError::TooLarge(format!("row {}", r + 1)))
}
