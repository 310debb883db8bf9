use std::collections::BTreeMap;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::inference::{infer_frame_types, ColumnType};
use super::model::{CellValue, DataFrameModel, FrameIndex, NULL_CELL};

/// Field key of a simple index column.
pub const INDEX_FIELD: &str = "index";

/// Key of the row back-reference in a serialised [`RowRecord`].
pub const ORIGINAL_INDEX_KEY: &str = "originalIndex";

/// Field key of one level of a multi-level index.
pub fn index_level_field(level: usize) -> String {
    format!("index_level_{level}")
}

/// Field key of a data column: its label, except that a column labelled
/// `originalIndex` is moved to `originalIndex_value`.
pub fn data_field(label: &str) -> String {
    if label == ORIGINAL_INDEX_KEY {
        format!("{label}_value")
    } else {
        label.to_string()
    }
}

// ---------------------------------------------------------------------------
// Projection types
// ---------------------------------------------------------------------------

/// One column of the rendered table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub label: String,
    /// Key aligning this column with [`RowRecord::values`].
    pub field: String,
    pub inferred_type: ColumnType,
    /// Level number, set for multi-level index columns only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_index: Option<usize>,
}

/// One row of the rendered table, keyed by [`ColumnDescriptor::field`].
///
/// Serialises as a flat object: `originalIndex` followed by the values.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    /// Position of the row in the source `data`.
    pub original_index: usize,
    pub values: BTreeMap<String, CellValue>,
}

impl Serialize for RowRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(ORIGINAL_INDEX_KEY, &self.original_index)?;
        // the back-reference key is never emitted twice
        for (field, value) in &self.values {
            if field != ORIGINAL_INDEX_KEY {
                map.serialize_entry(field, value)?;
            }
        }
        map.end()
    }
}

impl RowRecord {
    /// Value under `field`; unknown fields read as `Null`.
    pub fn get(&self, field: &str) -> &CellValue {
        self.values.get(field).unwrap_or(&NULL_CELL)
    }
}

/// What a generic table widget needs: typed columns and keyed rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TableProjection {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<RowRecord>,
}

impl TableProjection {
    pub fn column(&self, field: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Inferred type of `field`, `Text` for unknown fields.
    pub fn column_type(&self, field: &str) -> ColumnType {
        self.column(field)
            .map_or(ColumnType::Text, |c| c.inferred_type)
    }
}

// ---------------------------------------------------------------------------
// Index flattening
// ---------------------------------------------------------------------------

/// Field keys of the index columns, in level order.
pub fn index_fields(index: &FrameIndex) -> Vec<String> {
    match index {
        FrameIndex::Multi(_) => (0..index.level_count()).map(index_level_field).collect(),
        FrameIndex::Simple(labels) if labels.is_empty() => Vec::new(),
        FrameIndex::Simple(_) => vec![INDEX_FIELD.to_string()],
    }
}

/// Display labels of the index columns: the level name, or `#<level>`
/// (`#` for a simple index) when unnamed.
pub fn index_display_labels(model: &DataFrameModel) -> Vec<String> {
    match &model.index {
        FrameIndex::Multi(_) => (0..model.index.level_count())
            .map(|level| {
                model
                    .index_name(level)
                    .map_or_else(|| format!("#{level}"), str::to_string)
            })
            .collect(),
        FrameIndex::Simple(labels) if labels.is_empty() => Vec::new(),
        FrameIndex::Simple(_) => {
            vec![model.index_name(0).unwrap_or("#").to_string()]
        }
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Project a frame into table columns and row records.
///
/// Column order is fixed: index levels first, then data columns in their
/// original order. Rows keep the order of `data`.
pub fn project(model: &DataFrameModel) -> TableProjection {
    let types = infer_frame_types(model);
    let index_fields = index_fields(&model.index);
    let index_labels = index_display_labels(model);

    let mut columns = Vec::with_capacity(index_fields.len() + model.columns().len());
    for (level, (field, label)) in index_fields.iter().zip(index_labels).enumerate() {
        columns.push(ColumnDescriptor {
            label,
            field: field.clone(),
            inferred_type: types.index_levels[level],
            level_index: model.index.is_multi().then_some(level),
        });
    }
    for (col, label) in model.columns().iter().enumerate() {
        columns.push(ColumnDescriptor {
            label: label.clone(),
            field: data_field(label),
            inferred_type: types.columns[col],
            level_index: None,
        });
    }

    // Data columns are inserted after the index fields, so a column labelled
    // like an index field replaces the index value in the record.
    let rows = (0..model.row_count())
        .map(|row| {
            let mut values = BTreeMap::new();
            for (level, field) in index_fields.iter().enumerate() {
                values.insert(field.clone(), model.index.value(row, level).clone());
            }
            for (col, label) in model.columns().iter().enumerate() {
                values.insert(data_field(label), model.cell(row, col).clone());
            }
            RowRecord {
                original_index: row,
                values,
            }
        })
        .collect();

    log::debug!(
        "projected {} columns x {} rows",
        columns.len(),
        model.row_count()
    );
    TableProjection { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount_frame() -> DataFrameModel {
        DataFrameModel::new(["amount"], vec![vec!["1,500".into()], vec!["200".into()]])
            .with_index(FrameIndex::Simple(vec!["a".into(), "b".into()]))
            .with_index_names(["id"])
    }

    #[test]
    fn test_named_simple_index_projection() {
        let projection = project(&amount_frame());

        assert_eq!(
            projection.columns,
            vec![
                ColumnDescriptor {
                    label: "id".into(),
                    field: "index".into(),
                    inferred_type: ColumnType::Text,
                    level_index: None,
                },
                ColumnDescriptor {
                    label: "amount".into(),
                    field: "amount".into(),
                    inferred_type: ColumnType::Decimal,
                    level_index: None,
                },
            ]
        );
        assert_eq!(projection.rows.len(), 2);
        assert_eq!(projection.rows[1].original_index, 1);
        assert_eq!(projection.rows[1].get("index"), &CellValue::from("b"));
        assert_eq!(projection.rows[1].get("amount"), &CellValue::from("200"));
    }

    #[test]
    fn test_unnamed_simple_index_uses_hash_label() {
        let model = DataFrameModel::new(["v"], vec![vec![CellValue::Integer(1)]])
            .with_index(FrameIndex::Simple(vec![CellValue::Integer(10)]));
        let projection = project(&model);

        assert_eq!(projection.columns[0].label, "#");
        assert_eq!(projection.columns[0].field, INDEX_FIELD);
        assert_eq!(projection.columns[0].inferred_type, ColumnType::Number);
    }

    #[test]
    fn test_multi_index_levels_come_first() {
        let mut model = DataFrameModel::new(["v"], vec![vec![CellValue::Integer(1)]; 2])
            .with_index(FrameIndex::Multi(vec![
                vec!["north".into(), CellValue::Integer(2023)],
                vec!["south".into(), CellValue::Integer(2024)],
            ]));
        model.index_names = Some(vec![Some("region".into()), None]);
        let projection = project(&model);

        let summary: Vec<_> = projection
            .columns
            .iter()
            .map(|c| (c.label.as_str(), c.field.as_str(), c.level_index))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("region", "index_level_0", Some(0)),
                ("#1", "index_level_1", Some(1)),
                ("v", "v", None),
            ]
        );
        assert_eq!(projection.columns[1].inferred_type, ColumnType::Number);
        assert_eq!(
            projection.rows[1].get("index_level_1"),
            &CellValue::Integer(2024)
        );
    }

    #[test]
    fn test_column_count_is_independent_of_row_count() {
        let mut model = amount_frame();
        let with_rows = project(&model).columns.len();
        model.data = Some(Vec::new());
        let projection = project(&model);

        assert_eq!(with_rows, 2);
        assert_eq!(projection.columns.len(), 2);
        assert!(projection.rows.is_empty());
    }

    #[test]
    fn test_empty_index_contributes_no_column() {
        let model = DataFrameModel::new(["a", "b"], vec![]);
        let projection = project(&model);
        assert_eq!(projection.columns.len(), 2);
        assert!(projection.columns.iter().all(|c| c.inferred_type == ColumnType::Text));
    }

    #[test]
    fn test_index_only_frame() {
        let model = DataFrameModel::new(Vec::<String>::new(), vec![vec![], vec![]])
            .with_index(FrameIndex::Simple(vec!["x".into(), "y".into()]));
        let projection = project(&model);

        assert_eq!(projection.columns.len(), 1);
        assert_eq!(projection.rows[0].values.len(), 1);
    }

    #[test]
    fn test_ragged_multi_index_first_row_wins() {
        let model = DataFrameModel::new(["v"], vec![vec![CellValue::Integer(1)]; 3])
            .with_index(FrameIndex::Multi(vec![
                vec!["a".into(), "x".into()],
                vec!["b".into()],
                vec!["c".into(), "z".into(), "extra".into()],
            ]));
        let projection = project(&model);

        assert_eq!(projection.columns.len(), 3);
        assert_eq!(projection.rows[1].get("index_level_1"), &CellValue::Null);
        assert!(!projection.rows[2].values.contains_key("index_level_2"));
    }

    #[test]
    fn test_reserved_key_collision_lets_data_column_win() {
        let model = DataFrameModel::new(["index"], vec![vec!["data".into()]])
            .with_index(FrameIndex::Simple(vec!["label".into()]));
        let projection = project(&model);

        // Both descriptors share the field key; the record holds the data value.
        assert_eq!(projection.columns.len(), 2);
        assert_eq!(projection.columns[0].field, projection.columns[1].field);
        assert_eq!(projection.rows[0].get("index"), &CellValue::from("data"));
        assert_eq!(projection.rows[0].original_index, 0);
    }

    #[test]
    fn test_original_index_column_keeps_back_reference() {
        let model =
            DataFrameModel::new(["originalIndex", "v"], vec![vec!["x".into(), "y".into()]; 2]);
        let projection = project(&model);

        assert_eq!(projection.columns[0].label, "originalIndex");
        assert_eq!(projection.columns[0].field, "originalIndex_value");
        assert_eq!(projection.rows[1].get("originalIndex_value"), &CellValue::from("x"));

        let text = serde_json::to_string(&projection.rows[1]).unwrap();
        assert_eq!(text.matches("\"originalIndex\"").count(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["originalIndex"], serde_json::json!(1));
        assert_eq!(parsed["originalIndex_value"], serde_json::json!("x"));
    }

    #[test]
    fn test_hand_built_record_never_repeats_back_reference() {
        let record = RowRecord {
            original_index: 3,
            values: BTreeMap::from([(ORIGINAL_INDEX_KEY.to_string(), CellValue::from("x"))]),
        };
        let parsed = serde_json::to_value(&record).unwrap();
        assert_eq!(parsed, serde_json::json!({"originalIndex": 3}));
    }

    #[test]
    fn test_projection_serializes_to_widget_shape() {
        let projection = project(&amount_frame());
        let json = serde_json::to_value(&projection).unwrap();

        assert_eq!(
            json["columns"][1],
            serde_json::json!({"label": "amount", "field": "amount", "inferredType": "decimal"})
        );
        assert_eq!(
            json["rows"][0],
            serde_json::json!({"originalIndex": 0, "index": "a", "amount": "1,500"})
        );
    }
}
