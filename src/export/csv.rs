//! CSV exporter.
//!
//! Every field is wrapped in double quotes with inner quotes doubled, fields
//! are separated by `,` and records joined by `\n` (no trailing newline).
//! Null cells render as `""`.

use csv::{QuoteStyle, Terminator, WriterBuilder};

use super::{ExportError, ExportLayout};
use crate::data::model::DataFrameModel;

/// Export `model` as CSV text in the original row order.
///
/// # Example
///
/// ```rust
/// use frame_adapter::{to_csv, DataFrameModel, FrameIndex};
///
/// let model = DataFrameModel::new(["amount"], vec![vec!["1,500".into()], vec!["200".into()]])
///     .with_index(FrameIndex::Simple(vec!["a".into(), "b".into()]))
///     .with_index_names(["id"]);
///
/// let csv = to_csv(&model).unwrap();
/// assert_eq!(csv, "\"id\",\"amount\"\n\"a\",\"1,500\"\n\"b\",\"200\"");
/// ```
pub fn to_csv(model: &DataFrameModel) -> Result<String, ExportError> {
    let layout = ExportLayout::new(model)?;
    write_csv(&layout, 0..layout.row_count())
}

/// Export `model` as CSV with rows in `order` (original row indices), e.g. the
/// order of a sorted or filtered table view.
pub fn to_csv_ordered(model: &DataFrameModel, order: &[usize]) -> Result<String, ExportError> {
    let layout = ExportLayout::new(model)?;
    layout.check_order(order)?;
    write_csv(&layout, order.iter().copied())
}

fn write_csv<I>(layout: &ExportLayout<'_>, rows: I) -> Result<String, ExportError>
where
    I: Iterator<Item = usize>,
{
    // No fields at all: every record is an empty line.
    if layout.headers().is_empty() {
        return Ok(vec![""; rows.count() + 1].join("\n"));
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(layout.headers())?;
    for row in rows {
        writer.write_record(layout.cells(row).map(|cell| cell.to_string()))?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    let mut text = String::from_utf8(bytes)?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}
