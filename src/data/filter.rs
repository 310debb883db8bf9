use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::inference::{parse_numeric, ColumnType};
use super::model::CellValue;
use super::projection::TableProjection;

// ---------------------------------------------------------------------------
// Sorting: comparators chosen by inferred column type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, PartialEq)]
enum SortKey {
    Number(f64),
    /// Lower-cased text first, original text as tie break.
    Text(String, String),
}

/// Absent cells, and cells of numeric columns that do not parse, have no key.
fn sort_key(value: &CellValue, column_type: ColumnType) -> Option<SortKey> {
    if value.is_absent() {
        return None;
    }
    let text = value.to_string();
    if column_type.is_numeric() {
        parse_numeric(&text).map(SortKey::Number)
    } else {
        Some(SortKey::Text(text.to_lowercase(), text))
    }
}

fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
        (SortKey::Text(la, a), SortKey::Text(lb, b)) => la.cmp(lb).then_with(|| a.cmp(b)),
        (SortKey::Number(_), SortKey::Text(..)) => Ordering::Less,
        (SortKey::Text(..), SortKey::Number(_)) => Ordering::Greater,
    }
}

fn compare_directed(
    a: &CellValue,
    b: &CellValue,
    column_type: ColumnType,
    direction: SortDirection,
) -> Ordering {
    match (sort_key(a, column_type), sort_key(b, column_type)) {
        (Some(ka), Some(kb)) => {
            let ord = compare_keys(&ka, &kb);
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        }
        // keyless cells go last in both directions
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ascending comparator for two cells of a column of `column_type`.
///
/// Numeric columns compare by value (`"1,5"` equals `1.5`), text columns
/// case-insensitively. Absent cells sort last.
pub fn compare_cells(a: &CellValue, b: &CellValue, column_type: ColumnType) -> Ordering {
    compare_directed(a, b, column_type, SortDirection::Ascending)
}

/// Original row indices of `projection` sorted by `field`. The sort is stable.
pub fn sorted_indices(
    projection: &TableProjection,
    field: &str,
    direction: SortDirection,
) -> Vec<usize> {
    let column_type = projection.column_type(field);
    let mut rows: Vec<_> = projection.rows.iter().collect();
    rows.sort_by(|a, b| compare_directed(a.get(field), b.get(field), column_type, direction));
    rows.iter().map(|r| r.original_index).collect()
}

// ---------------------------------------------------------------------------
// Filtering: per-column predicates
// ---------------------------------------------------------------------------

/// A predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFilter {
    /// Case-insensitive substring match; an empty needle matches everything.
    Contains(String),
    /// Inclusive numeric range; non-numeric and absent cells fail.
    Range { min: Option<f64>, max: Option<f64> },
    /// Displayed value must be one of the selected values. Nothing selected
    /// hides every row.
    OneOf(BTreeSet<String>),
}

impl ColumnFilter {
    pub fn matches(&self, value: &CellValue) -> bool {
        match self {
            ColumnFilter::Contains(needle) if needle.is_empty() => true,
            ColumnFilter::Contains(needle) => value
                .to_string()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            ColumnFilter::Range { min, max } => {
                let Some(v) = parse_numeric(&value.to_string()) else {
                    return false;
                };
                min.map_or(true, |lo| v >= lo) && max.map_or(true, |hi| v <= hi)
            }
            ColumnFilter::OneOf(selected) => selected.contains(&value.to_string()),
        }
    }
}

/// Active filters: field key → predicate. Fields without an entry are unfiltered.
pub type FilterState = BTreeMap<String, ColumnFilter>;

/// Original indices of rows passing every active filter, in display order.
pub fn filtered_indices(projection: &TableProjection, filters: &FilterState) -> Vec<usize> {
    projection
        .rows
        .iter()
        .filter(|row| {
            filters
                .iter()
                .all(|(field, filter)| filter.matches(row.get(field)))
        })
        .map(|row| row.original_index)
        .collect()
}

/// Sorted set of displayed values of `field`, for building a `OneOf` selector.
pub fn unique_values(projection: &TableProjection, field: &str) -> BTreeSet<String> {
    projection
        .rows
        .iter()
        .map(|row| row.get(field).to_string())
        .collect()
}
