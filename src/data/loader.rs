use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, DataFrameModel, FrameIndex};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Options for [`load_file_with`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Leading CSV columns to restore as index levels (their headers become
    /// the index names).
    pub csv_index_columns: usize,
}

/// Load a data frame from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.json`    – the wire shape `{ columns, data, index, index_names }`
/// * `.csv`     – header row + rows, every cell read as text
/// * `.parquet` – Arrow columns; pandas index columns become the index
pub fn load_file(path: &Path) -> Result<DataFrameModel> {
    load_file_with(path, &LoadOptions::default())
}

pub fn load_file_with(path: &Path, options: &LoadOptions) -> Result<DataFrameModel> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let model = match ext.as_str() {
        "json" => {
            let file = File::open(path).context("opening JSON file")?;
            read_json(file)?
        }
        "csv" => {
            let file = File::open(path).context("opening CSV file")?;
            read_csv(file, options.csv_index_columns)?
        }
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    log::debug!(
        "loaded {} rows x {} columns from {}",
        model.row_count(),
        model.columns().len(),
        path.display()
    );
    Ok(model)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (pandas `df.to_json(orient='split')` plus `index_names`):
///
/// ```json
/// {
///   "columns": ["amount", "status"],
///   "data": [["1,500", "open"], ["200", null]],
///   "index": ["a", "b"],
///   "index_names": ["id"]
/// }
/// ```
pub fn read_json<R: Read>(reader: R) -> Result<DataFrameModel> {
    serde_json::from_reader(reader).context("parsing data frame JSON")
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Read CSV with a header row. Empty fields become `Null`, everything else
/// stays text so that inference sees exactly what was written.
pub fn read_csv<R: Read>(reader: R, index_columns: usize) -> Result<DataFrameModel> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let n_index = index_columns.min(headers.len());
    let mut index_rows = Vec::new();
    let mut data = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let mut cells: Vec<CellValue> = (0..headers.len())
            .map(|i| match record.get(i) {
                Some("") | None => CellValue::Null,
                Some(text) => CellValue::String(text.to_string()),
            })
            .collect();
        let values = cells.split_off(n_index);
        index_rows.push(cells);
        data.push(values);
    }

    let index = match n_index {
        0 => FrameIndex::default(),
        1 => FrameIndex::Simple(index_rows.into_iter().flatten().collect()),
        _ => FrameIndex::Multi(index_rows),
    };
    let index_names = (n_index > 0).then(|| {
        headers[..n_index]
            .iter()
            .map(|h| Some(h.clone()))
            .collect()
    });

    Ok(DataFrameModel {
        columns: Some(headers[n_index..].to_vec()),
        data: Some(data),
        index,
        index_names,
    })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file as a data frame.
///
/// Index columns are taken from the pandas metadata (`index_columns`) when
/// present, otherwise from columns named `__index_level_<n>__`. Index columns
/// with a generated name are unnamed levels.
fn load_parquet(path: &Path) -> Result<DataFrameModel> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let pandas_index = pandas_index_columns(schema.metadata());
    let is_index = |name: &str| match &pandas_index {
        Some(names) => names.iter().any(|n| n == name),
        None => is_generated_index_name(name),
    };

    let mut index_cols: Vec<(usize, String)> = Vec::new();
    let mut data_cols: Vec<(usize, String)> = Vec::new();
    for (i, field) in schema.fields().iter().enumerate() {
        let entry = (i, field.name().clone());
        if is_index(field.name().as_str()) {
            index_cols.push(entry);
        } else {
            data_cols.push(entry);
        }
    }
    // Keep the pandas level order when it is known.
    if let Some(names) = &pandas_index {
        index_cols.sort_by_key(|(_, name)| names.iter().position(|n| n == name));
    }

    let mut index_rows: Vec<Vec<CellValue>> = Vec::new();
    let mut data: Vec<Vec<CellValue>> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            index_rows.push(
                index_cols
                    .iter()
                    .map(|(i, _)| extract_cell(batch.column(*i), row))
                    .collect::<Result<_>>()?,
            );
            data.push(
                data_cols
                    .iter()
                    .map(|(i, _)| extract_cell(batch.column(*i), row))
                    .collect::<Result<_>>()?,
            );
        }
    }

    let index = match index_cols.len() {
        0 => FrameIndex::default(),
        1 => FrameIndex::Simple(index_rows.into_iter().flatten().collect()),
        _ => FrameIndex::Multi(index_rows),
    };
    let index_names = (!index_cols.is_empty()).then(|| {
        index_cols
            .iter()
            .map(|(_, name)| (!is_generated_index_name(name)).then(|| name.clone()))
            .collect()
    });

    Ok(DataFrameModel {
        columns: Some(data_cols.into_iter().map(|(_, name)| name).collect()),
        data: Some(data),
        index,
        index_names,
    })
}

// -- Parquet / Arrow helpers --

fn is_generated_index_name(name: &str) -> bool {
    name.strip_prefix("__index_level_")
        .and_then(|rest| rest.strip_suffix("__"))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Column names listed in the pandas `index_columns` metadata. Range indexes
/// are stored as objects rather than names and are skipped.
fn pandas_index_columns(metadata: &HashMap<String, String>) -> Option<Vec<String>> {
    let raw = metadata.get("pandas")?;
    let parsed: JsonValue = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("ignoring unreadable pandas metadata: {e}");
            return None;
        }
    };
    let names = parsed
        .get("index_columns")?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    Some(names)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            CellValue::Float(col.as_primitive::<Float32Type>().value(row).into())
        }
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        // dates, timestamps, decimals, unsigned ints...: their display text
        _ => CellValue::String(
            array_value_to_string(col, row)
                .with_context(|| format!("formatting {:?} value", col.data_type()))?,
        ),
    };
    Ok(value)
}
