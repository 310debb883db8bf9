//! Export functionality
//!
//! Serialises a [`DataFrameModel`] for download:
//! - CSV (quoted, `\n`-separated text)
//! - XLSX (single `Data` worksheet)
//!
//! Both exporters flatten the index exactly like the table projection, except
//! that an unnamed simple index is left out of the export entirely.

pub mod csv;
pub mod filename;
pub mod sheet;

use crate::data::model::{CellValue, DataFrameModel, FrameIndex, InvalidDataError};
use crate::data::projection::index_display_labels;

pub use self::csv::{to_csv, to_csv_ordered};
pub use filename::sanitize_filename;
pub use sheet::{sheet_records, to_sheet, to_sheet_ordered, SheetRecord, SHEET_NAME};

pub const CSV_MIME_TYPE: &str = "text/csv;charset=utf-8";
pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Error during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    InvalidData(#[from] InvalidDataError),
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("Spreadsheet error: {0}")]
    Sheet(#[from] rust_xlsxwriter::XlsxError),
    #[error("{0} exceeds the spreadsheet limits")]
    TooLarge(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => CSV_MIME_TYPE,
            ExportFormat::Xlsx => XLSX_MIME_TYPE,
        }
    }
}

/// An export ready to hand to a download helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBlob {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Sanitized `<base>.<ext>`; an unusable base name becomes `export`.
pub fn export_file_name(base_name: &str, format: ExportFormat) -> String {
    let stem = sanitize_filename(base_name);
    let stem = if stem.is_empty() { "export" } else { stem.as_str() };
    format!("{stem}.{}", format.extension())
}

/// Export `model` in `format`, in the original row order.
pub fn export(
    model: &DataFrameModel,
    format: ExportFormat,
    base_name: &str,
) -> Result<ExportBlob, ExportError> {
    let bytes = match format {
        ExportFormat::Csv => to_csv(model)?.into_bytes(),
        ExportFormat::Xlsx => to_sheet(model)?,
    };
    Ok(ExportBlob {
        file_name: export_file_name(base_name, format),
        mime_type: format.mime_type(),
        bytes,
    })
}

/// Header cells contributed by the index.
///
/// A simple index is exported only when its level is named; a multi-level
/// index always exports every level, using the `#<level>` fallback.
pub fn index_export_headers(model: &DataFrameModel) -> Vec<String> {
    match &model.index {
        FrameIndex::Multi(_) => index_display_labels(model),
        FrameIndex::Simple(labels) if labels.is_empty() => Vec::new(),
        FrameIndex::Simple(_) => model.index_name(0).map(str::to_string).into_iter().collect(),
    }
}

// ---------------------------------------------------------------------------
// Shared row layout
// ---------------------------------------------------------------------------

/// Header and per-row cell order shared by the CSV and sheet exporters.
pub(crate) struct ExportLayout<'a> {
    model: &'a DataFrameModel,
    index_levels: usize,
    column_count: usize,
    headers: Vec<String>,
}

impl<'a> ExportLayout<'a> {
    pub(crate) fn new(model: &'a DataFrameModel) -> Result<Self, ExportError> {
        let (columns, _) = model.checked_parts()?;
        let mut headers = index_export_headers(model);
        let index_levels = headers.len();
        headers.extend(columns.iter().cloned());
        Ok(Self {
            model,
            index_levels,
            column_count: columns.len(),
            headers,
        })
    }

    pub(crate) fn headers(&self) -> &[String] {
        &self.headers
    }

    pub(crate) fn row_count(&self) -> usize {
        self.model.row_count()
    }

    /// Index cells followed by data cells of `row`.
    pub(crate) fn cells(&self, row: usize) -> impl Iterator<Item = &'a CellValue> {
        let model = self.model;
        let index = (0..self.index_levels).map(move |level| model.index.value(row, level));
        let data = (0..self.column_count).map(move |col| model.cell(row, col));
        index.chain(data)
    }

    /// Reject row orders that reference rows the frame does not have.
    pub(crate) fn check_order(&self, order: &[usize]) -> Result<(), ExportError> {
        let rows = self.row_count();
        match order.iter().find(|&&row| row >= rows) {
            Some(row) => Err(InvalidDataError(format!(
                "row {row} is out of range for a frame with {rows} rows"
            ))
            .into()),
            None => Ok(()),
        }
    }
}
