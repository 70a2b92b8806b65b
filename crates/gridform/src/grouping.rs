//! Folds flat data rows into grouped dataset records.
//!
//! Group boundaries are signaled only by the group-key column: a non-blank
//! value that differs (case-insensitively) from the last one seen starts a
//! new record; a blank value (typically a merged span continuing from the
//! row above) extends the current record.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::input::SheetGrid;
use crate::matching::normalize_name;
use crate::schema::SchemaModel;

/// Numeric cells decode with a trailing `.0`; stripped before storage.
static NUMERIC_ARTIFACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.0$").unwrap());

/// One accumulated child attribute of a grouped record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePair {
    pub name: String,
    pub description: String,
}

/// A logical record reconstructed from one or more contributing rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedRecord {
    /// Resolved group identity: trimmed, case preserved for display.
    pub group_key: String,
    /// Regular field values keyed by the column's template spelling.
    /// Later contributing rows overwrite earlier ones (last write wins).
    pub fields: IndexMap<String, String>,
    /// Child attributes in row-encounter order, one per contributing row.
    pub children: Vec<AttributePair>,
}

impl GroupedRecord {
    fn new(group_key: String) -> Self {
        Self {
            group_key,
            fields: IndexMap::new(),
            children: Vec::new(),
        }
    }
}

/// Fold the sheet's data rows into grouped records.
///
/// `data_start_row` is the sample-derived header height; scanning begins at
/// the row after it. When the schema resolves no special roles, or the
/// group-key column is absent from the mapping, no record can ever start
/// and the result is empty. That is a defined outcome, not an error.
pub fn group_records(
    grid: &SheetGrid,
    schema: &SchemaModel,
    mapping: &IndexMap<String, usize>,
    data_start_row: usize,
) -> Vec<GroupedRecord> {
    let mut records: Vec<GroupedRecord> = Vec::new();

    let Some(bindings) = schema.role_bindings() else {
        return records;
    };

    let group_col = mapping.get(&normalize_name(&bindings.group_key_field)).copied();
    let attr_col = mapping.get(&normalize_name(&bindings.attribute_name_field)).copied();
    let attr_desc_col = mapping
        .get(&normalize_name(&bindings.attribute_description_field))
        .copied();

    // The group-key column is not excluded: its value is a regular field
    // of the record as well as the grouping signal.
    let attribute_fields = [
        normalize_name(&bindings.attribute_name_field),
        normalize_name(&bindings.attribute_description_field),
    ];

    let mut last_group_key = String::new();

    for row in (data_start_row + 1)..grid.height() {
        if grid.is_row_empty(row) {
            continue;
        }

        let group_key = effective(grid, row, group_col).trim().to_string();

        if !group_key.is_empty() && group_key.to_lowercase() != last_group_key.to_lowercase() {
            log::debug!("new record detected at row {row}: {group_key}");
            records.push(GroupedRecord::new(group_key.clone()));
            last_group_key = group_key;
        }

        let Some(current) = records.last_mut() else {
            // Continuation row before any record started; nothing to extend.
            continue;
        };

        for (normalized, &col) in mapping {
            if attribute_fields.iter().any(|f| f == normalized) {
                continue;
            }
            let value = clean_numeric_value(effective(grid, row, Some(col)));
            current.fields.insert(schema.original_name(normalized).to_string(), value);
        }

        // One pair per contributing row, even when both halves are blank.
        current.children.push(AttributePair {
            name: effective(grid, row, attr_col).trim().to_string(),
            description: effective(grid, row, attr_desc_col).trim().to_string(),
        });
    }

    log::info!("total records parsed: {}", records.len());
    records
}

/// Strip the decoder's `.0` suffix from integral numeric values.
pub fn clean_numeric_value(value: &str) -> String {
    if NUMERIC_ARTIFACT.is_match(value) {
        value[..value.len() - 2].to_string()
    } else {
        value.trim().to_string()
    }
}

fn effective<'a>(grid: &'a SheetGrid, row: usize, col: Option<usize>) -> &'a str {
    match col {
        Some(col) => grid.effective_value(row, col),
        None => "",
    }
}
