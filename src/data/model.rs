use std::fmt;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CellValue – a single cell (or index label) of the frame
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as it arrives from the JSON wire shape.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

pub(crate) static NULL_CELL: CellValue = CellValue::Null;

impl CellValue {
    /// Null and the empty string carry no type evidence and export as `""`.
    pub fn is_absent(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Try to interpret the value as an `f64` without any text parsing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

/// Default string conversion used for display, inference and export.
/// `Null` renders as the empty string.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) if v.is_nan() => write!(f, "NaN"),
            CellValue::Float(v) if v.is_infinite() => {
                write!(f, "{}", if *v > 0.0 { "Infinity" } else { "-Infinity" })
            }
            // -0.0 prints as "0"
            CellValue::Float(v) if *v == 0.0 => write!(f, "0"),
            // exponent form outside [1e-6, 1e21), with an explicit `+`
            CellValue::Float(v) if v.abs() >= 1e21 || v.abs() < 1e-6 => {
                let text = format!("{v:e}");
                match text.split_once('e') {
                    Some((mantissa, exp)) if !exp.starts_with('-') => {
                        write!(f, "{mantissa}e+{exp}")
                    }
                    _ => f.write_str(&text),
                }
            }
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl From<JsonValue> for CellValue {
    fn from(val: JsonValue) -> Self {
        match val {
            JsonValue::String(s) => CellValue::String(s),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Integer(i)
                } else if n.is_u64() {
                    // beyond i64: keep the exact digits
                    CellValue::String(n.to_string())
                } else if let Some(f) = n.as_f64() {
                    CellValue::Float(f)
                } else {
                    CellValue::String(n.to_string())
                }
            }
            JsonValue::Bool(b) => CellValue::Bool(b),
            JsonValue::Null => CellValue::Null,
            other => CellValue::String(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(CellValue::Null, Into::into)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::String(s) => serializer.serialize_str(s),
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            CellValue::Float(v) => serializer.serialize_f64(*v),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Null => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(CellValue::from)
    }
}

// ---------------------------------------------------------------------------
// FrameIndex – simple or multi-level row labels
// ---------------------------------------------------------------------------

/// Row labels of a frame.
///
/// A multi-level index is recognised by its first entry being an array; an
/// absent or empty index is an empty simple index.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameIndex {
    Simple(Vec<CellValue>),
    Multi(Vec<Vec<CellValue>>),
}

impl Default for FrameIndex {
    fn default() -> Self {
        FrameIndex::Simple(Vec::new())
    }
}

impl FrameIndex {
    /// Build an index from raw JSON entries, deciding the flavour from the first one.
    pub fn from_entries(entries: Vec<JsonValue>) -> Self {
        let is_multi = matches!(entries.first(), Some(JsonValue::Array(_)));
        if !is_multi {
            return FrameIndex::Simple(entries.into_iter().map(CellValue::from).collect());
        }
        let rows = entries
            .into_iter()
            .map(|entry| match entry {
                JsonValue::Array(levels) => levels.into_iter().map(CellValue::from).collect(),
                scalar => vec![CellValue::from(scalar)],
            })
            .collect();
        FrameIndex::Multi(rows)
    }

    /// Number of index entries (one per row in a well-formed frame).
    pub fn len(&self) -> usize {
        match self {
            FrameIndex::Simple(labels) => labels.len(),
            FrameIndex::Multi(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, FrameIndex::Multi(_))
    }

    /// Number of index levels. The first row decides for a multi-level index.
    pub fn level_count(&self) -> usize {
        match self {
            FrameIndex::Simple(labels) if labels.is_empty() => 0,
            FrameIndex::Simple(_) => 1,
            FrameIndex::Multi(rows) => rows.first().map_or(0, Vec::len),
        }
    }

    /// Label of `row` at `level`; missing entries read as `Null`.
    pub fn value(&self, row: usize, level: usize) -> &CellValue {
        let found = match self {
            FrameIndex::Simple(labels) if level == 0 => labels.get(row),
            FrameIndex::Simple(_) => None,
            FrameIndex::Multi(rows) => rows.get(row).and_then(|r| r.get(level)),
        };
        found.unwrap_or(&NULL_CELL)
    }

    /// All labels of one level, top to bottom.
    pub fn level_values(&self, level: usize) -> impl Iterator<Item = &CellValue> + '_ {
        (0..self.len()).map(move |row| self.value(row, level))
    }
}

impl Serialize for FrameIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FrameIndex::Simple(labels) => labels.serialize(serializer),
            FrameIndex::Multi(rows) => rows.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FrameIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Option::<Vec<JsonValue>>::deserialize(deserializer)?;
        Ok(FrameIndex::from_entries(entries.unwrap_or_default()))
    }
}

// ---------------------------------------------------------------------------
// DataFrameModel – the wire contract
// ---------------------------------------------------------------------------

/// Raised when a frame lacks the parts an exporter needs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid data frame: {0}")]
pub struct InvalidDataError(pub String);

/// A labeled 2-D dataset as produced by the upstream API:
/// `{ columns, data, index, index_names? }`.
///
/// `columns` and `data` are optional so that a payload missing either can be
/// represented and rejected by the exporters instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrameModel {
    #[serde(
        default,
        deserialize_with = "deserialize_labels",
        skip_serializing_if = "Option::is_none"
    )]
    pub columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Vec<CellValue>>>,
    #[serde(default)]
    pub index: FrameIndex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_names: Option<Vec<Option<String>>>,
}

/// Column labels may arrive as numbers (e.g. integer column names); keep their text.
fn deserialize_labels<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    let labels = Option::<Vec<JsonValue>>::deserialize(deserializer)?;
    Ok(labels.map(|labels| {
        labels
            .into_iter()
            .map(|label| CellValue::from(label).to_string())
            .collect()
    }))
}

impl DataFrameModel {
    /// A frame with the given columns and rows and an empty index.
    pub fn new<I, S>(columns: I, data: Vec<Vec<CellValue>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: Some(columns.into_iter().map(Into::into).collect()),
            data: Some(data),
            index: FrameIndex::default(),
            index_names: None,
        }
    }

    pub fn with_index(mut self, index: FrameIndex) -> Self {
        self.index = index;
        self
    }

    pub fn with_index_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index_names = Some(names.into_iter().map(|n| Some(n.into())).collect());
        self
    }

    /// Column labels; empty when absent.
    pub fn columns(&self) -> &[String] {
        self.columns.as_deref().unwrap_or_default()
    }

    /// Data rows; empty when absent.
    pub fn rows(&self) -> &[Vec<CellValue>] {
        self.data.as_deref().unwrap_or_default()
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }

    /// Cell at (`row`, `col`); cells missing from a short row read as `Null`.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows()
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&NULL_CELL)
    }

    /// All cells of one column, top to bottom.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &CellValue> + '_ {
        (0..self.row_count()).map(move |row| self.cell(row, col))
    }

    /// Name of an index level, if one was provided and is non-empty.
    pub fn index_name(&self, level: usize) -> Option<&str> {
        self.index_names
            .as_ref()?
            .get(level)?
            .as_deref()
            .filter(|name| !name.is_empty())
    }

    /// Check that `columns` and `data` are present and return them.
    ///
    /// Shape anomalies that the readers tolerate (ragged rows, an index whose
    /// length differs from the row count, ragged multi-level rows) are only
    /// reported at debug level.
    pub fn checked_parts(&self) -> Result<(&[String], &[Vec<CellValue>]), InvalidDataError> {
        let columns = self
            .columns
            .as_deref()
            .ok_or_else(|| InvalidDataError("missing 'columns'".to_string()))?;
        let data = self
            .data
            .as_deref()
            .ok_or_else(|| InvalidDataError("missing 'data'".to_string()))?;

        if let Some(row) = data.iter().position(|r| r.len() != columns.len()) {
            log::debug!(
                "row {row} has {} cells but the frame has {} columns",
                data[row].len(),
                columns.len()
            );
        }
        if !self.index.is_empty() && self.index.len() != data.len() {
            log::debug!(
                "index has {} entries but the frame has {} rows",
                self.index.len(),
                data.len()
            );
        }
        if let FrameIndex::Multi(rows) = &self.index {
            let levels = self.index.level_count();
            if let Some(row) = rows.iter().position(|r| r.len() != levels) {
                log::debug!(
                    "index row {row} has {} levels, using {levels} from the first row",
                    rows[row].len()
                );
            }
        }
        Ok((columns, data))
    }
}
