use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::{CellValue, DataFrameModel};

// ---------------------------------------------------------------------------
// ColumnType – the classification driving sort, filter and formatting
// ---------------------------------------------------------------------------

/// Inferred type of a column or index level.
///
/// There is no "mixed" type: a single non-numeric value makes the whole
/// column `Text`, and a column without any values is `Text` as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    /// Numeric, no value carried a decimal separator.
    Number,
    /// Numeric, at least one value carried `.` or `,`.
    Decimal,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Number | ColumnType::Decimal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Decimal => "decimal",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Parse a cell's text as a finite number, accepting `,` as decimal separator.
pub fn parse_numeric(text: &str) -> Option<f64> {
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Classify a sequence of values, scanning top to bottom.
///
/// Absent values (null or empty string) are skipped. The scan stops at the
/// first value that does not parse as a number.
pub fn infer_column_type<'a, I>(values: I) -> ColumnType
where
    I: IntoIterator<Item = &'a CellValue>,
{
    let mut seen_numeric = false;
    let mut has_decimal_marker = false;

    for value in values {
        if value.is_absent() {
            continue;
        }
        let text = value.to_string();
        let trimmed = text.trim();
        if parse_numeric(trimmed).is_none() {
            return ColumnType::Text;
        }
        seen_numeric = true;
        has_decimal_marker |= trimmed.contains(['.', ',']);
    }

    match (seen_numeric, has_decimal_marker) {
        (false, _) => ColumnType::Text,
        (true, true) => ColumnType::Decimal,
        (true, false) => ColumnType::Number,
    }
}

/// Types of every index level and every data column of a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameTypes {
    pub index_levels: Vec<ColumnType>,
    pub columns: Vec<ColumnType>,
}

pub fn infer_frame_types(model: &DataFrameModel) -> FrameTypes {
    let index_levels = (0..model.index.level_count())
        .map(|level| infer_column_type(model.index.level_values(level)))
        .collect();
    let columns = (0..model.columns().len())
        .map(|col| infer_column_type(model.column_values(col)))
        .collect();
    FrameTypes {
        index_levels,
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::FrameIndex;

    fn strings(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    #[test]
    fn test_boundary_classifications() {
        assert_eq!(infer_column_type(&strings(&["3,14", "2.7"])), ColumnType::Decimal);
        assert_eq!(infer_column_type(&strings(&["1", "2", "3"])), ColumnType::Number);
        assert_eq!(infer_column_type(&strings(&["1", "abc"])), ColumnType::Text);
    }

    #[test]
    fn test_empty_and_all_absent_columns_are_text() {
        assert_eq!(infer_column_type(&Vec::<CellValue>::new()), ColumnType::Text);
        let absent = vec![CellValue::Null, CellValue::from(""), CellValue::Null];
        assert_eq!(infer_column_type(&absent), ColumnType::Text);
    }

    #[test]
    fn test_absent_values_contribute_no_evidence() {
        let values = vec![CellValue::Null, CellValue::from("4"), CellValue::from("")];
        assert_eq!(infer_column_type(&values), ColumnType::Number);
    }

    #[test]
    fn test_native_numbers() {
        let ints = vec![CellValue::Integer(1), CellValue::Integer(-7)];
        assert_eq!(infer_column_type(&ints), ColumnType::Number);

        let floats = vec![CellValue::Integer(1), CellValue::Float(2.5)];
        assert_eq!(infer_column_type(&floats), ColumnType::Decimal);

        // 3.0 stringifies to "3"
        let whole = vec![CellValue::Float(3.0)];
        assert_eq!(infer_column_type(&whole), ColumnType::Number);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(infer_column_type(&strings(&[" 12 ", "7\t"])), ColumnType::Number);
        assert_eq!(infer_column_type(&strings(&["   "])), ColumnType::Text);
    }

    #[test]
    fn test_non_finite_and_non_numeric_text() {
        assert_eq!(infer_column_type(&strings(&["inf"])), ColumnType::Text);
        assert_eq!(infer_column_type(&strings(&["NaN"])), ColumnType::Text);
        assert_eq!(infer_column_type(&strings(&["1,000.5"])), ColumnType::Text);
        assert_eq!(infer_column_type(&[CellValue::Bool(true)]), ColumnType::Text);
    }

    #[test]
    fn test_classification_is_idempotent_and_order_independent() {
        let values = strings(&["1", "2,5", "", "7"]);
        let first = infer_column_type(&values);
        assert_eq!(first, infer_column_type(&values));

        let mut reversed = values.clone();
        reversed.reverse();
        assert_eq!(first, infer_column_type(&reversed));
        assert_eq!(first, ColumnType::Decimal);

        let mut with_text = strings(&["x", "1", "2"]);
        assert_eq!(infer_column_type(&with_text), ColumnType::Text);
        with_text.rotate_left(1);
        assert_eq!(infer_column_type(&with_text), ColumnType::Text);
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("2,5"), Some(2.5));
        assert_eq!(parse_numeric(" -2 "), Some(-2.0));
        assert_eq!(parse_numeric("1e3"), Some(1000.0));
        assert_eq!(parse_numeric("abc"), None);
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("infinity"), None);
    }

    #[test]
    fn test_frame_types_cover_index_levels_and_columns() {
        let model = DataFrameModel::new(
            ["amount", "label"],
            vec![
                vec!["1,500".into(), "x".into()],
                vec!["200".into(), CellValue::Null],
            ],
        )
        .with_index(FrameIndex::Multi(vec![
            vec!["a".into(), CellValue::Integer(1)],
            vec!["b".into(), CellValue::Integer(2)],
        ]));

        let types = infer_frame_types(&model);
        assert_eq!(types.index_levels, vec![ColumnType::Text, ColumnType::Number]);
        assert_eq!(types.columns, vec![ColumnType::Decimal, ColumnType::Text]);
    }

    #[test]
    fn test_column_type_serializes_lowercase() {
        let json = serde_json::to_string(&ColumnType::Decimal).unwrap();
        assert_eq!(json, r#""decimal""#);
        assert_eq!(ColumnType::Number.to_string(), "number");
    }
}
