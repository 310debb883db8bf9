//! Spreadsheet (XLSX) exporter.

use std::collections::BTreeMap;

use rust_xlsxwriter::{Workbook, Worksheet};

use super::{ExportError, ExportLayout};
use crate::data::model::{CellValue, DataFrameModel};

/// Largest integer magnitude an XLSX numeric cell (an `f64`) holds exactly.
const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Name of the single worksheet.
pub const SHEET_NAME: &str = "Data";

/// One exported row: header name → value. Duplicate header names share a key,
/// the rightmost value wins.
pub type SheetRecord = BTreeMap<String, CellValue>;

/// Headers and keyed records for the sheet, in the original row order.
pub fn sheet_records(model: &DataFrameModel) -> Result<(Vec<String>, Vec<SheetRecord>), ExportError> {
    let layout = ExportLayout::new(model)?;
    let records = (0..layout.row_count())
        .map(|row| record(&layout, row))
        .collect();
    Ok((layout.headers().to_vec(), records))
}

/// Export `model` as an XLSX workbook in the original row order.
pub fn to_sheet(model: &DataFrameModel) -> Result<Vec<u8>, ExportError> {
    let (headers, records) = sheet_records(model)?;
    write_workbook(&headers, &records)
}

/// Export `model` as XLSX with rows in `order` (original row indices).
pub fn to_sheet_ordered(model: &DataFrameModel, order: &[usize]) -> Result<Vec<u8>, ExportError> {
    let layout = ExportLayout::new(model)?;
    layout.check_order(order)?;
    let records: Vec<_> = order.iter().map(|&row| record(&layout, row)).collect();
    write_workbook(layout.headers(), &records)
}

fn record(layout: &ExportLayout<'_>, row: usize) -> SheetRecord {
    layout
        .headers()
        .iter()
        .cloned()
        .zip(layout.cells(row).cloned())
        .collect()
}

/// Write a header row, then one row per record. Map iteration order is not
/// the column order, so cells are looked up header by header.
fn write_workbook(headers: &[String], records: &[SheetRecord]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col_num(col)?, header.as_str())?;
    }
    for (i, record) in records.iter().enumerate() {
        let row = row_num(i + 1)?;
        for (col, header) in headers.iter().enumerate() {
            if let Some(value) = record.get(header) {
                write_cell(worksheet, row, col_num(col)?, value)?;
            }
        }
    }

    log::debug!(
        "wrote sheet '{SHEET_NAME}' with {} columns x {} rows",
        headers.len(),
        records.len()
    );
    Ok(workbook.save_to_buffer()?)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
) -> Result<(), ExportError> {
    match value {
        CellValue::Null => {}
        CellValue::String(s) => {
            worksheet.write_string(row, col, s.as_str())?;
        }
        CellValue::Integer(i) if i.unsigned_abs() <= MAX_EXACT_INTEGER => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        // beyond 2^53 a numeric cell would round
        CellValue::Integer(i) => {
            worksheet.write_string(row, col, i.to_string().as_str())?;
        }
        CellValue::Float(v) if v.is_finite() => {
            worksheet.write_number(row, col, *v)?;
        }
        // NaN / Infinity have no numeric cell representation
        CellValue::Float(_) => {
            worksheet.write_string(row, col, value.to_string().as_str())?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}

fn row_num(row: usize) -> Result<u32, ExportError> {
    u32::try_from(row).map_err(|_| ExportError::TooLarge(format!("row {row}")))
}

fn col_num(col: usize) -> Result<u16, ExportError> {
    u16::try_from(col).map_err(|_| ExportError::TooLarge(format!("column {col}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::FrameIndex;

    #[test]
    fn test_records_are_keyed_by_export_headers() {
        let model = DataFrameModel::new(
            ["amount", "note"],
            vec![
                vec!["1,500".into(), CellValue::Null],
                vec![CellValue::Integer(200), "ok".into()],
            ],
        )
        .with_index(FrameIndex::Simple(vec!["a".into(), "b".into()]))
        .with_index_names(["id"]);

        let (headers, records) = sheet_records(&model).unwrap();
        assert_eq!(headers, vec!["id", "amount", "note"]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], CellValue::from("a"));
        assert_eq!(records[0]["note"], CellValue::Null);
        assert_eq!(records[1]["amount"], CellValue::Integer(200));
    }

    #[test]
    fn test_unnamed_simple_index_has_no_key() {
        let model = DataFrameModel::new(["v"], vec![vec!["x".into()]])
            .with_index(FrameIndex::Simple(vec!["r".into()]));
        let (headers, records) = sheet_records(&model).unwrap();
        assert_eq!(headers, vec!["v"]);
        assert_eq!(records[0].len(), 1);
    }

    #[test]
    fn test_duplicate_headers_share_a_key() {
        let model = DataFrameModel::new(["x", "x"], vec![vec!["first".into(), "second".into()]]);
        let (headers, records) = sheet_records(&model).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(records[0].len(), 1);
        assert_eq!(records[0]["x"], CellValue::from("second"));
    }

    #[test]
    fn test_workbook_is_a_zip_container() {
        let model = DataFrameModel::new(
            ["f", "b", "nan"],
            vec![vec![
                CellValue::Float(1.25),
                CellValue::Bool(true),
                CellValue::Float(f64::NAN),
            ]],
        );
        let bytes = to_sheet(&model).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_missing_data_is_invalid_data() {
        let model = DataFrameModel {
            columns: Some(vec!["x".into()]),
            ..Default::default()
        };
        assert!(matches!(to_sheet(&model), Err(ExportError::InvalidData(_))));
    }

    #[test]
    fn test_ordered_sheet_rejects_unknown_rows() {
        let model = DataFrameModel::new(["x"], vec![vec!["1".into()]]);
        assert!(to_sheet_ordered(&model, &[0, 0]).is_ok());
        assert!(to_sheet_ordered(&model, &[3]).is_err());
    }
}
