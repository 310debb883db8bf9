//! Tabular data adapter for dashboard tables.
//!
//! A [`DataFrameModel`] (columns × rows with an optional simple or
//! multi-level row index) is turned into:
//! - a [`TableProjection`] of typed column descriptors and keyed row records
//!   for a generic table widget ([`project`]),
//! - CSV text ([`to_csv`]) or an XLSX workbook ([`to_sheet`]) that flatten
//!   the index the same way.
//!
//! Every operation is a pure function over an immutable model.

pub mod data;
pub mod export;

pub use data::filter::{
    compare_cells, filtered_indices, sorted_indices, unique_values, ColumnFilter, FilterState,
    SortDirection,
};
pub use data::inference::{
    infer_column_type, infer_frame_types, parse_numeric, ColumnType, FrameTypes,
};
pub use data::loader::{load_file, load_file_with, read_csv, read_json, LoadOptions};
pub use data::model::{CellValue, DataFrameModel, FrameIndex, InvalidDataError};
pub use data::projection::{project, ColumnDescriptor, RowRecord, TableProjection};
pub use export::{
    export, export_file_name, sanitize_filename, sheet_records, to_csv, to_csv_ordered, to_sheet,
    to_sheet_ordered, ExportBlob, ExportError, ExportFormat,
};
